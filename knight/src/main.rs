//! Knight interpreter CLI

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use knight::error::report_error;
use knight::interp::{Globals, Interpreter};
use knight::parser::parse_program;

#[derive(Parser)]
#[command(name = "knight", version = knight::options::VERSION, about = "Knight - a tree-walking interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a Knight program
    Run {
        #[command(flatten)]
        input: Input,
    },
    /// Parse and dump the syntax tree (debug)
    Parse {
        #[command(flatten)]
        input: Input,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        #[command(flatten)]
        input: Input,
    },
    /// Start an interactive session
    Repl,
}

/// Program text, given inline or read from a file
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Input {
    /// Source given on the command line
    #[arg(short = 'e', long = "expr", value_name = "EXPR")]
    expr: Option<String>,
    /// Source file
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: Option<PathBuf>,
}

impl Input {
    /// Returns `(filename, source)`.
    fn load(self) -> std::io::Result<(String, String)> {
        match (self.expr, self.file) {
            (Some(expr), _) => Ok(("<expr>".to_string(), expr)),
            (None, Some(path)) => {
                let source = std::fs::read_to_string(&path)?;
                Ok((path.display().to_string(), source))
            }
            (None, None) => Ok(("<expr>".to_string(), String::new())),
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { input } => run(input),
        Command::Parse { input } => parse_input(input),
        Command::Tokens { input } => tokenize_input(input),
        Command::Repl => repl(),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Logging stays off unless `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run(input: Input) -> Result<i32, Box<dyn std::error::Error>> {
    let (filename, source) = input.load()?;
    let globals = Arc::new(Globals::new());

    let program = match parse_program(&source, &globals) {
        Ok(program) => program,
        Err(err) => {
            report_error(&filename, &source, &err);
            return Ok(1);
        }
    };

    let mut interpreter = Interpreter::new(globals);
    match interpreter.execute(&program) {
        Ok(_) => Ok(0),
        Err(err) => match err.quit_code() {
            Some(code) => Ok(code),
            None => {
                eprintln!("Error: {}", err.message);
                Ok(1)
            }
        },
    }
}

fn parse_input(input: Input) -> Result<i32, Box<dyn std::error::Error>> {
    let (filename, source) = input.load()?;
    let globals = Globals::new();

    match parse_program(&source, &globals) {
        Ok(program) => {
            println!("{program}");
            Ok(0)
        }
        Err(err) => {
            report_error(&filename, &source, &err);
            Ok(1)
        }
    }
}

fn tokenize_input(input: Input) -> Result<i32, Box<dyn std::error::Error>> {
    let (filename, source) = input.load()?;

    let tokens = match knight::lexer::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            report_error(&filename, &source, &err);
            return Ok(1);
        }
    };
    for (tok, span) in &tokens {
        println!("{tok} @ {}..{}", span.start, span.end);
    }

    Ok(0)
}

fn repl() -> Result<i32, Box<dyn std::error::Error>> {
    let mut repl = knight::repl::Repl::new()?;
    repl.run()?;
    Ok(0)
}
