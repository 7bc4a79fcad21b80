mod app;

use action::Action;
use app::App;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Read;
use std::{error::Error, fs, io, time::Duration};

/// A graph editor for Turing machine programs with a Terminal User Interface.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tur-graph-tui programs/parity.tm
  echo '0->1:0,1/R;1->0:1,0/L;' | tur-graph-tui")]
struct Cli {
    /// Path to a transition program file (.tm).
    /// If not provided, the application will load the built-in programs.
    /// Can also pipe program content via stdin.
    program_file: Option<String>,
}

/// Represents the state of the application loop.
#[derive(PartialEq)]
enum AppState {
    Running,
    ShouldQuit,
}

/// A wrapper around the terminal to ensure it's restored on drop.
struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    /// Creates a new TUI with mouse capture enabled.
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Restore the terminal to its original state.
        // The results are ignored as we can't do much about errors during drop.
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Load the program before initializing the TUI.
    // This way, if loading fails, we can print the error to stderr without
    // interfering with the terminal's alternate screen.
    let app = match load_program(&cli) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize the TUI. The `Tui` struct will handle cleanup on drop.
    let mut tui = Tui::new()?;

    // Run the application.
    run_app(&mut tui.terminal, app)?;

    Ok(())
}

/// Builds the app from CLI arguments.
///
/// It tries to load from a file path, then from stdin, and finally
/// falls back to the built-in programs.
fn load_program(cli: &Cli) -> Result<App, String> {
    if let Some(file_path) = &cli.program_file {
        fs::read_to_string(file_path)
            .map_err(|e| format!("Failed to read file '{}': {}", file_path, e))
            .and_then(|content| App::new_from_program_string(&content))
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))
            .and_then(|_| App::new_from_program_string(&buffer))
    } else {
        App::new_default()
    }
}

/// Runs the main application loop.
fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if handle_key_event(&mut app, key) == AppState::ShouldQuit {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => handle_mouse_event(&mut app, mouse),
            _ => {}
        }
    }
}

/// Handles key events and updates the application state.
fn handle_key_event(app: &mut App, key: KeyEvent) -> AppState {
    if let Some(action) = app.keymap.get(&key) {
        match action {
            Action::Quit => return AppState::ShouldQuit,
            Action::ZoomIn => app.zoom_in(),
            Action::ZoomOut => app.zoom_out(),
            Action::ResetView => app.reset_view(),
            Action::AddState => app.add_state(),
            Action::SelectNext => app.select_next(),
            Action::CycleRead => app.cycle_read(),
            Action::CycleWrite => app.cycle_write(),
            Action::CycleDirection => app.cycle_direction(),
            Action::Export => app.export(),
            Action::ResetGraph => app.reset_graph(),
            Action::ToggleHelp => app.toggle_help(),
            Action::PreviousProgram => app.previous_program(),
            Action::NextProgram => app.next_program(),
        }
    }
    AppState::Running
}

/// Routes mouse events to the graph canvas.
///
/// Left button drags states or pans, right button drags out a new transition and the
/// wheel zooms around the pointer.
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    let (column, row) = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.pointer_start(column, row),
        MouseEventKind::Down(MouseButton::Right) => app.pointer_start_transition(column, row),
        MouseEventKind::Drag(MouseButton::Left | MouseButton::Right) => {
            app.pointer_moved(column, row)
        }
        MouseEventKind::Up(MouseButton::Left | MouseButton::Right) => app.pointer_end(column, row),
        MouseEventKind::ScrollUp => app.zoom_at(column, row, app::ZOOM_STEP),
        MouseEventKind::ScrollDown => app.zoom_at(column, row, 1.0 / app::ZOOM_STEP),
        _ => {}
    }
}
