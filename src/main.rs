mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod highlighter;
mod parser;
mod reader;
mod sandbox;
mod value;

use clap::Parser;
use config::{FsConfig, WELCOME_FOOTER, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use env::Environment;
use highlighter::LispHelper;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use sandbox::Sandbox;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

const HISTORY_FILE: &str = ".blisp_history";

/// An interactive interpreter for Blisp, a small Lisp-family language.
#[derive(Parser, Debug)]
#[command(name = "blisp")]
#[command(version = config::VERSION)]
#[command(about = "An interactive interpreter for Blisp, a small Lisp-family language")]
struct CliArgs {
    /// Script files to load, in order, before the prompt starts.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Directory `(load ...)` is permitted to read from (repeatable).
    #[arg(long = "fs-sandbox", value_name = "PATH", action = clap::ArgAction::Append)]
    fs_sandbox: Vec<PathBuf>,

    /// Maximum file size in bytes that `(load ...)` will read.
    #[arg(long = "max-file-size", value_name = "BYTES", default_value_t = 10 * 1024 * 1024)]
    max_file_size: usize,

    /// Skip loading and saving the REPL history file.
    #[arg(long = "no-history")]
    no_history: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let fs_config = FsConfig {
        allowed_paths: if args.fs_sandbox.is_empty() {
            FsConfig::default().allowed_paths
        } else {
            args.fs_sandbox.clone()
        },
        max_file_size: args.max_file_size,
    };
    builtins::set_sandbox(Sandbox::new(fs_config)?);

    let env = Environment::new();
    builtins::register_all(&env);

    // Files on the command line are trusted input (§6.3): each is read
    // directly and its top-level expressions evaluated in order, before
    // the interactive prompt starts. The `(load ...)` builtin, by
    // contrast, only ever reads through the sandbox above.
    for path in &args.files {
        run_file(path, &env);
    }

    run_repl(&env, &args)
}

/// Reads a script file directly (bypassing the sandbox) and evaluates
/// its top-level expressions in order, printing any resulting Error.
fn run_file(path: &Path, env: &Rc<Environment>) {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Cannot read {}: {e}", path.display());
            return;
        }
    };

    let root = match parser::parse_program(&contents) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Parse error in {}: {e}", path.display());
            return;
        }
    };

    for expr in reader::read_program(&root) {
        let result = eval::eval(env, expr);
        if result.is_error() {
            eprintln!("{result}");
        }
    }
}

fn run_repl(env: &Rc<Environment>, args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let rl = Rc::new(RefCell::new(
        Editor::with_config(config).map_err(|e| format!("failed to initialize REPL: {e}"))?,
    ));
    rl.borrow_mut().set_helper(Some(LispHelper::new()));

    if !args.no_history {
        let _ = rl.borrow_mut().load_history(HISTORY_FILE);
    }

    // `exit` terminates the process from inside the evaluator (see
    // `spec.md` §9 open question 4): it must still flush REPL history
    // before calling `std::process::exit`.
    let no_history = args.no_history;
    let rl_for_teardown = rl.clone();
    builtins::set_teardown_hook(move || {
        if !no_history {
            let _ = rl_for_teardown.borrow_mut().save_history(HISTORY_FILE);
        }
    });

    println!("{WELCOME_MESSAGE} {}", config::VERSION);
    println!("{WELCOME_SUBTITLE}");
    println!("{WELCOME_FOOTER}");

    loop {
        let readline = rl.borrow_mut().readline("blisp> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                eval_line(env, &line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    if !args.no_history {
        let _ = rl.borrow_mut().save_history(HISTORY_FILE);
    }

    Ok(())
}

/// Parses a line as a program and prints the result of each top-level
/// expression, matching the REPL contract in `spec.md` §6.3.
fn eval_line(env: &Rc<Environment>, line: &str) {
    match parser::parse_program(line) {
        Ok(root) => {
            for expr in reader::read_program(&root) {
                let result = eval::eval(env, expr);
                println!("=> {}", LispHelper::highlight_output(&result));
            }
        }
        Err(e) => eprintln!("Parse error: {e}"),
    }
}
