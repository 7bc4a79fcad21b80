use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;
use tur_graph::{
    analyze, encode, encode_pretty, parse, parse_algorithm, render, svg::to_svg, GraphModel,
    ProgramLoader, RenderBounds, TransitionMap, Viewport,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report malformed statements and conflicting rules
    Check {
        /// The program file (.tm). Reads stdin when omitted
        program: Option<String>,
    },
    /// Print the program in canonical notation
    Format {
        /// The program file (.tm). Reads stdin when omitted
        program: Option<String>,

        /// Put every statement on its own line
        #[clap(short, long)]
        pretty: bool,
    },
    /// Print the deterministic transition map as JSON
    Map {
        /// The program file (.tm). Reads stdin when omitted
        program: Option<String>,
    },
    /// Lay the program out as a graph and write it as SVG
    Render {
        /// The program file (.tm). Reads stdin when omitted
        program: Option<String>,

        #[clap(flatten)]
        layout: LayoutArgs,

        /// Write the SVG to this file instead of stdout
        #[clap(short, long)]
        output: Option<String>,
    },
    /// Print the laid-out graph as JSON
    Snapshot {
        /// The program file (.tm). Reads stdin when omitted
        program: Option<String>,

        #[clap(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Args)]
struct LayoutArgs {
    /// Width of the area states are placed in
    #[clap(long, default_value_t = 800.0)]
    width: f64,

    /// Height of the area states are placed in
    #[clap(long, default_value_t = 600.0)]
    height: f64,

    /// Seed for state placement, for reproducible layouts
    #[clap(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs a subcommand. `Ok(false)` means the command ran but found problems.
fn run(command: Command) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Check { program } => check(&read_program(program.as_deref())?),
        Command::Format { program, pretty } => {
            let transitions = parse(&read_program(program.as_deref())?)?;
            if pretty {
                print!("{}", encode_pretty(&transitions));
            } else {
                println!("{}", encode(&transitions));
            }
            Ok(true)
        }
        Command::Map { program } => {
            let transitions = parse(&read_program(program.as_deref())?)?;
            let map = TransitionMap::from_transitions(&transitions);
            println!("{}", serde_json::to_string_pretty(&map)?);
            Ok(true)
        }
        Command::Render {
            program,
            layout,
            output,
        } => {
            let graph = build_graph(&read_program(program.as_deref())?, &layout);
            let viewport = Viewport::new(layout.width, layout.height);
            let mut bounds = RenderBounds::new(viewport.viewport_rect());
            let svg = to_svg(&render(&graph, &viewport, &mut bounds, None))?;

            match output {
                Some(path) => {
                    fs::write(&path, svg)
                        .map_err(|e| format!("Failed to write file '{}': {}", path, e))?;
                    info!("Wrote {}", path);
                }
                None => print!("{}", svg),
            }
            Ok(true)
        }
        Command::Snapshot { program, layout } => {
            let graph = build_graph(&read_program(program.as_deref())?, &layout);
            println!("{}", serde_json::to_string_pretty(&graph)?);
            Ok(true)
        }
    }
}

/// Reports every malformed statement and the first determinism conflict.
fn check(text: &str) -> Result<bool, Box<dyn Error>> {
    let entries = parse_algorithm(text);
    let mut transitions = Vec::new();
    let mut malformed = 0;

    for entry in entries {
        match entry {
            Ok(transition) => transitions.push(transition),
            Err(e) => {
                malformed += 1;
                eprintln!("{}", e);
            }
        }
    }

    let deterministic = match analyze(&transitions) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("{}", e);
            false
        }
    };

    println!(
        "{} transitions, {} malformed statements",
        transitions.len(),
        malformed
    );
    Ok(malformed == 0 && deterministic)
}

fn build_graph(text: &str, layout: &LayoutArgs) -> GraphModel {
    let mut rng = match layout.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let report = GraphModel::load_algorithm_with(text, layout.width, layout.height, &mut rng);
    for e in &report.skipped {
        warn!("{}", e);
    }
    report.graph
}

/// Reads a program file, or stdin when no path is given, and strips its comments.
fn read_program(path: Option<&str>) -> Result<String, String> {
    let content = if let Some(path) = path {
        fs::read_to_string(path).map_err(|e| format!("Failed to read file '{}': {}", path, e))?
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        return Err("No program given. Pass a file or pipe a program via stdin.".to_string());
    };

    Ok(ProgramLoader::program_text(&content))
}
