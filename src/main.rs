use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use cellisp::Interpreter;
use clap::Parser;
use log::{LevelFilter, info};

/// Evaluates cellisp source and prints each top-level result.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Source file to evaluate.
    #[arg(conflicts_with = "eval")]
    file: Option<PathBuf>,

    /// Evaluate this expression string instead of a file.
    #[arg(short, long, value_name = "EXPR")]
    eval: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let (source_name, input) = match (&args.file, args.eval) {
        (Some(path), _) => match fs::read_to_string(path) {
            Ok(contents) => (path.display().to_string(), contents),
            Err(err) => {
                eprintln!("Error reading {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        (None, Some(expr)) => ("<eval>".to_string(), expr),
        (None, None) => {
            eprintln!("Nothing to evaluate: pass a FILE or --eval EXPR (or run the `repl` binary)");
            return ExitCode::from(2);
        }
    };

    info!("evaluating {} ({} bytes)", source_name, input.len());
    let interpreter = Interpreter::new();
    match interpreter.eval_each(&input, |node| println!("{}", node)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.pretty_print(&source_name, &input).is_err() {
                eprintln!("Error: {}", err);
            }
            ExitCode::FAILURE
        }
    }
}
