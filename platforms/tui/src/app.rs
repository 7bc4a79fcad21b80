use action::Action;
use keymap::{Config, KeyMapConfig};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine},
        Block, BorderType, Borders, Padding, Paragraph, Wrap,
    },
    Frame,
};
use tur_graph::{
    analyze_graph,
    arrow::{Arrow, EdgeShape},
    geometry::{arc_polyline, quad_polyline},
    Direction as Move, DrawCommand, GraphModel, InteractionController, Outcome, Point, Program,
    ProgramLoader, ProgramManager, Scene, Selection, Symbol, Transition, Viewport,
};

const BLOCK_PADDING: Padding = Padding::new(1, 1, 0, 0);

/// Device units covered by one terminal cell. Braille markers give 2x4 dots per cell, so
/// these keep dots square.
const CELL_WIDTH: f64 = 10.0;
const CELL_HEIGHT: f64 = 20.0;
/// Device size used to place states before the first frame is drawn.
const DEFAULT_CANVAS: (f64, f64) = (800.0, 480.0);
const CURVE_SEGMENTS: usize = 16;

/// Zoom factor of one wheel notch or key press.
pub const ZOOM_STEP: f64 = 1.25;

pub struct App {
    graph: GraphModel,
    controller: InteractionController,
    scene: Scene,
    /// Inner area of the canvas block, in terminal cells.
    canvas_area: Rect,
    selected: Option<usize>,
    current_program_index: usize,
    program_name: String,
    message: String,
    show_help: bool,
    pub(crate) keymap: Config<Action>,
    // Indicates if the program was loaded from a file/stdin, disabling program switching
    program_loaded_from_source: bool,
}

impl App {
    pub fn new_default() -> Result<Self, String> {
        let program = ProgramManager::get_program_by_index(0)
            .map_err(|e| format!("Failed to load built-in program: {}", e))?;

        Ok(Self::from_program(program, false, "Press 'h' for help."))
    }

    pub fn new_from_program_string(program_content: &str) -> Result<Self, String> {
        let program = ProgramLoader::load_program_from_string(program_content, "Custom")
            .map_err(|e| format!("Failed to load program: {}", e))?;

        Ok(Self::from_program(
            program,
            true,
            "Program loaded from source. Press 'h' for help.",
        ))
    }

    fn from_program(program: Program, from_source: bool, message: &str) -> Self {
        let (width, height) = DEFAULT_CANVAS;
        let report = GraphModel::load_algorithm(&program.source(), width, height);
        let mut controller = InteractionController::new(Viewport::new(width, height));
        let scene = controller.redraw(&report.graph).scene;

        Self {
            graph: report.graph,
            controller,
            scene,
            canvas_area: Rect::default(),
            selected: None,
            current_program_index: 0,
            program_name: program.name,
            message: message.to_string(),
            show_help: false,
            keymap: Action::keymap_config(),
            program_loaded_from_source: from_source,
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let margin_size = Margin::new(1, 0); // Define margin size
        let inner_area = f.area().inner(margin_size);

        // Main vertical chunks: Program Info, Middle (Canvas + Side panel), Status
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Program info
                Constraint::Min(0),    // Middle section (flexible height)
                Constraint::Length(3), // Status
            ])
            .split(inner_area);

        self.render_program_info(f, main_chunks[0]);

        let middle_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(70), // Graph canvas
                Constraint::Length(1),
                Constraint::Percentage(30), // Program text / Help
            ])
            .split(main_chunks[1]);

        self.render_canvas(f, middle_chunks[0]);

        if self.show_help {
            self.render_help(f, middle_chunks[2]);
        } else {
            self.render_program_text(f, middle_chunks[2]);
        }

        self.render_status(f, main_chunks[2]);
    }

    fn render_program_info(&self, f: &mut Frame, area: Rect) {
        let name = if self.program_loaded_from_source {
            format!("{} (Custom)", self.program_name)
        } else {
            format!(
                "{} ({}/{})",
                self.program_name,
                self.current_program_index + 1,
                ProgramManager::get_program_count()
            )
        };

        let text = Line::from(vec![
            Span::styled("Program: ", Style::default().fg(Color::Yellow)),
            Span::raw(name),
            Span::styled(" | States: ", Style::default().fg(Color::Yellow)),
            Span::raw(self.graph.state_count().to_string()),
            Span::styled(" | Transitions: ", Style::default().fg(Color::Yellow)),
            Span::raw(self.graph.transition_count().to_string()),
            Span::styled(" | Zoom: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{:.2}x", self.controller.viewport().zoom())),
        ]);

        let paragraph = Paragraph::new(text)
            .block(block("Tur Graph - Transition Editor (TUI)").title_alignment(Alignment::Center));

        f.render_widget(paragraph, area);
    }

    fn render_canvas(&mut self, f: &mut Frame, area: Rect) {
        let outer = block("Graph");
        let inner = outer.inner(area);

        if inner != self.canvas_area {
            self.canvas_area = inner;
            let (width, height) = device_size(inner);
            self.scene = self.controller.resize(&self.graph, width, height).scene;
        }

        let (width, height) = device_size(inner);
        let scene = &self.scene;
        let selected = self.selected;

        let canvas = Canvas::default()
            .block(outer)
            .marker(Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(move |ctx| paint_scene(ctx, scene, height, selected));

        f.render_widget(canvas, area);
    }

    fn render_program_text(&self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .graph
            .transitions()
            .iter()
            .enumerate()
            .map(|(index, transition)| {
                let text = format!("{:>3}  {}", index, transition);
                if Some(index) == self.selected {
                    Line::from(Span::styled(
                        text,
                        Style::default()
                            .bg(Color::Yellow)
                            .fg(Color::Black)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(text)
                }
            })
            .collect();

        let paragraph = section("Program", lines).wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = vec![
            Line::from("Mouse:"),
            Line::from("  Left drag on a state - Move it"),
            Line::from("  Left drag on the canvas - Scroll"),
            Line::from("  Left click on an edge - Select it"),
            Line::from("  Right drag between states - New transition"),
            Line::from("  Wheel - Zoom"),
            Line::from(""),
            Line::from("Keys:"),
            Line::from("  a - Add a state"),
            Line::from("  Tab - Select next transition"),
            Line::from("  r / w / m - Change read / write / move"),
            Line::from("  i / o - Zoom in / out"),
            Line::from("  c - Reset view"),
            Line::from("  e - Export program text"),
            Line::from("  x - Clear the graph"),
            Line::from(if self.program_loaded_from_source {
                "  ← → - Program switching disabled (loaded from file/stdin)"
            } else {
                "  ← → - Switch programs"
            }),
            Line::from("  h - Toggle this help"),
            Line::from("  q - Quit"),
        ];

        let paragraph = section("Help", help_text).wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let outer = block("Status");
        let inner = outer.inner(area);

        let selection = match self.selected.and_then(|index| self.graph.transition(index)) {
            Some(transition) => format!("Selected: {}", transition),
            None => "No selection".to_string(),
        };
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(selection.len() as u16),
            ])
            .split(inner);

        let status = Line::from(Span::raw(self.message.as_str()));
        let selection = Text::from(
            Line::from(Span::styled(selection, Style::default().fg(Color::Yellow)))
                .right_aligned(),
        );

        f.render_widget(outer, area);
        f.render_widget(status, chunks[0]);
        f.render_widget(selection, chunks[1]);
    }

    /// Maps a terminal cell to device coordinates, `None` outside the canvas.
    fn device_point(&self, column: u16, row: u16) -> Option<Point> {
        let area = self.canvas_area;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;

        inside.then(|| {
            Point::new(
                f64::from(column - area.x) * CELL_WIDTH + CELL_WIDTH / 2.0,
                f64::from(row - area.y) * CELL_HEIGHT + CELL_HEIGHT / 2.0,
            )
        })
    }

    fn apply(&mut self, outcome: Outcome) {
        self.scene = outcome.scene;

        if let Some(selection) = outcome.selection {
            let index = selection.index();
            self.selected = Some(index);
            self.message = match (selection, self.graph.transition(index)) {
                (Selection::Created(_), Some(transition)) => {
                    format!("Created transition {}: {}", index, transition)
                }
                (_, Some(transition)) => format!("Selected transition {}: {}", index, transition),
                (_, None) => format!("Selected transition {}", index),
            };
        }
    }

    fn redraw(&mut self) {
        let outcome = self.controller.redraw(&self.graph);
        self.apply(outcome);
    }

    pub fn pointer_start(&mut self, column: u16, row: u16) {
        if let Some(pos) = self.device_point(column, row) {
            let outcome = self.controller.start(&self.graph, pos);
            self.apply(outcome);
        }
    }

    pub fn pointer_start_transition(&mut self, column: u16, row: u16) {
        if let Some(pos) = self.device_point(column, row) {
            let outcome = self.controller.start_create_transition(&self.graph, pos);
            self.apply(outcome);
        }
    }

    pub fn pointer_moved(&mut self, column: u16, row: u16) {
        let outcome = match self.device_point(column, row) {
            Some(pos) => self.controller.moved(&mut self.graph, pos),
            None => self.controller.leave(&self.graph),
        };
        self.apply(outcome);
    }

    pub fn pointer_end(&mut self, column: u16, row: u16) {
        let outcome = match self.device_point(column, row) {
            Some(pos) => self.controller.end(&mut self.graph, pos),
            None => self.controller.leave(&self.graph),
        };
        self.apply(outcome);
    }

    pub fn zoom_at(&mut self, column: u16, row: u16, factor: f64) {
        if let Some(pos) = self.device_point(column, row) {
            let outcome = self.controller.zoom(&self.graph, factor, pos);
            self.apply(outcome);
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_centered(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_centered(1.0 / ZOOM_STEP);
    }

    fn zoom_centered(&mut self, factor: f64) {
        let (width, height) = self.controller.viewport().size();
        let center = Point::new(width / 2.0, height / 2.0);
        let outcome = self.controller.zoom(&self.graph, factor, center);
        self.apply(outcome);
    }

    pub fn reset_view(&mut self) {
        let outcome = self.controller.reset_view(&self.graph);
        self.apply(outcome);
        self.message = "View reset".to_string();
    }

    pub fn add_state(&mut self) {
        let area = self.controller.viewport().viewport_rect();
        let pos = self.graph.determine_pos(area);
        let id = self.graph.add_state(pos);

        self.redraw();
        self.message = format!("Added state {}", id);
    }

    pub fn select_next(&mut self) {
        let count = self.graph.transition_count();
        if count == 0 {
            self.message = "No transitions to select".to_string();
            return;
        }

        let index = self.selected.map_or(0, |index| (index + 1) % count);
        self.selected = Some(index);
        self.message = format!("Selected transition {}", index);
    }

    pub fn cycle_read(&mut self) {
        self.edit_selected(|t| (t.read.toggled(), t.write, t.direction));
    }

    pub fn cycle_write(&mut self) {
        self.edit_selected(|t| (t.read, t.write.toggled(), t.direction));
    }

    pub fn cycle_direction(&mut self) {
        self.edit_selected(|t| (t.read, t.write, t.direction.next()));
    }

    fn edit_selected<F>(&mut self, edit: F)
    where
        F: FnOnce(&Transition) -> (Symbol, Symbol, Move),
    {
        let Some(index) = self.selected else {
            self.message = "Select a transition first (click an edge or press Tab)".to_string();
            return;
        };
        let Some(transition) = self.graph.transition(index).copied() else {
            self.selected = None;
            return;
        };

        let (read, write, direction) = edit(&transition);
        match self.graph.update_transition(index, read, write, direction) {
            Ok(()) => {
                self.redraw();
                if let Some(updated) = self.graph.transition(index) {
                    self.message = format!("Transition {}: {}", index, updated);
                }
            }
            Err(e) => self.message = format!("Error: {}", e),
        }
    }

    pub fn export(&mut self) {
        let text = self.graph.export_graph();
        self.message = if text.is_empty() {
            "Graph is empty".to_string()
        } else {
            match analyze_graph(&self.graph) {
                Ok(()) => format!("Exported: {}", text),
                Err(e) => format!("Exported: {} ({})", text, e),
            }
        };
    }

    pub fn reset_graph(&mut self) {
        self.graph.reset();
        self.selected = None;
        self.redraw();
        self.message = "Graph cleared".to_string();
    }

    pub fn next_program(&mut self) {
        if self.program_loaded_from_source {
            self.message = "Cannot switch programs when loaded from file/stdin.".to_string();
            return;
        }
        let count = ProgramManager::get_program_count();
        self.current_program_index = (self.current_program_index + 1) % count;
        self.load_current_program();
    }

    pub fn previous_program(&mut self) {
        if self.program_loaded_from_source {
            self.message = "Cannot switch programs when loaded from file/stdin.".to_string();
            return;
        }
        let count = ProgramManager::get_program_count();
        self.current_program_index = if self.current_program_index == 0 {
            count - 1
        } else {
            self.current_program_index - 1
        };
        self.load_current_program();
    }

    fn load_current_program(&mut self) {
        let program = match ProgramManager::get_program_by_index(self.current_program_index) {
            Ok(program) => program,
            Err(e) => {
                self.message = format!("Error: {}", e);
                return;
            }
        };

        self.controller.reset_view(&self.graph);
        let (width, height) = match self.controller.viewport().bounding_size() {
            (w, h) if w > 0.0 && h > 0.0 => (w, h),
            _ => DEFAULT_CANVAS,
        };

        self.graph = GraphModel::load_algorithm(&program.source(), width, height).graph;
        self.selected = None;
        self.redraw();
        self.message = format!(
            "Loaded program: {} ({} states)",
            program.name,
            self.graph.state_count()
        );
        self.program_name = program.name;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

/// Device size of a canvas area given in terminal cells.
fn device_size(area: Rect) -> (f64, f64) {
    (
        f64::from(area.width) * CELL_WIDTH,
        f64::from(area.height) * CELL_HEIGHT,
    )
}

/// Replays a scene onto the canvas. Canvas y grows upwards, device y grows downwards.
fn paint_scene(ctx: &mut Context, scene: &Scene, height: f64, selected: Option<usize>) {
    let transform = scene.transform;
    let to_canvas = |p: Point| {
        let device = transform.apply(p);
        (device.x, height - device.y)
    };

    let mut labels = Vec::new();

    for command in &scene.commands {
        match command {
            DrawCommand::Clear(_) => {}
            DrawCommand::GridLine { from, to } => {
                polyline(ctx, &[to_canvas(*from), to_canvas(*to)], Color::DarkGray);
            }
            DrawCommand::State { id, center, radius } => {
                let (x, y) = to_canvas(*center);
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: radius * transform.zoom,
                    color: Color::White,
                });
                labels.push((x, y, id.to_string(), Color::White));
            }
            DrawCommand::Edge { index, arrow } => {
                let color = if Some(*index) == selected {
                    Color::Yellow
                } else {
                    Color::Cyan
                };
                let points: Vec<(f64, f64)> =
                    edge_points(arrow).into_iter().map(to_canvas).collect();
                polyline(ctx, &points, color);

                let head = arrow.head;
                let (tip, left, right) = (
                    to_canvas(head.tip),
                    to_canvas(head.left),
                    to_canvas(head.right),
                );
                polyline(ctx, &[left, tip, right, left], color);

                let (x, y) = to_canvas(arrow.label_pos);
                labels.push((x, y, arrow.label.clone(), color));
            }
            DrawCommand::Preview { from, to } => {
                polyline(ctx, &[to_canvas(*from), to_canvas(*to)], Color::Gray);
            }
        }
    }

    ctx.layer();
    for (x, y, text, color) in labels {
        ctx.print(x, y, Span::styled(text, Style::default().fg(color)));
    }
}

fn edge_points(arrow: &Arrow) -> Vec<Point> {
    match arrow.shape {
        EdgeShape::Line { start, end } => vec![start, end],
        EdgeShape::Curve {
            start,
            control,
            end,
        } => quad_polyline(start, control, end, CURVE_SEGMENTS),
        EdgeShape::Loop {
            center,
            radius,
            start_angle,
            end_angle,
            ..
        } => arc_polyline(center, radius, start_angle, end_angle, CURVE_SEGMENTS),
    }
}

fn polyline(ctx: &mut Context, points: &[(f64, f64)], color: Color) {
    for pair in points.windows(2) {
        let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
        ctx.draw(&CanvasLine::new(x1, y1, x2, y2, color));
    }
}

fn section<'a>(title: &'a str, content: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(content).block(block(title))
}

fn block(title: &str) -> Block {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {title} "))
        .padding(BLOCK_PADDING)
}
