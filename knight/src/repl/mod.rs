//! REPL (Read-Eval-Print Loop) for Knight
//!
//! Every line is a complete program run against one variable store, so
//! assignments carry over from line to line.

use crate::interp::{Globals, Interpreter};
use crate::parser::parse_program;
use crate::value::Value;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use std::sync::Arc;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".knight_history";

/// Result of evaluating one line
#[derive(Debug)]
enum Outcome {
    Value(Value),
    Failed(String),
    Quit(i32),
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    interpreter: Interpreter,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new() -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let interpreter = Interpreter::new(Arc::new(Globals::new()));
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            interpreter,
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Knight {}", crate::options::VERSION);
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if let Some(quit) = self.handle_command(line) {
                        if quit {
                            break;
                        }
                        continue;
                    }

                    match self.eval_line(line) {
                        Outcome::Value(value) if value.is_null() => {}
                        Outcome::Value(value) => println!("{}", value.dump()),
                        Outcome::Failed(message) => eprintln!("{message}"),
                        Outcome::Quit(code) => {
                            println!("Quit with status {code}");
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle a REPL command such as `:help`.
    ///
    /// Returns `None` for anything else, including Knight code that starts
    /// with the `:` operator; otherwise whether to leave the loop.
    fn handle_command(&mut self, cmd: &str) -> Option<bool> {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                Some(true)
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                Some(false)
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                Some(false)
            }
            _ => None,
        }
    }

    fn print_help(&self) {
        println!("Knight REPL Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :clear          Clear the screen");
        println!();
        println!("Each line is parsed as one Knight expression, e.g.");
        println!("  ; = n 10 * n n");
        println!("  OUTPUT + \"hello \" \"world\"");
        println!("Variables persist between lines.");
    }

    fn eval_line(&mut self, line: &str) -> Outcome {
        let program = match parse_program(line, self.interpreter.globals()) {
            Ok(program) => program,
            Err(err) => return Outcome::Failed(format!("Parse error: {}", err.message())),
        };

        match self.interpreter.execute(&program) {
            Ok(value) => Outcome::Value(value),
            Err(err) => match err.quit_code() {
                Some(code) => Outcome::Quit(code),
                None => Outcome::Failed(err.to_string()),
            },
        }
    }
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
