//! Cinder Language CLI
//!
//! Command-line interface for the Cinder programming language.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use cinder_lang::{run_in, Diagnostic, Lexer, Runtime, Value, VERSION};

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        println!("Cinder v{} - Language Interpreter", VERSION);
        println!("Type 'exit' to quit\n");
        repl();
        return;
    }

    let mut show_tokens = false;
    let mut filename: Option<&String> = None;

    for arg in &args[1..] {
        match arg.as_str() {
            "--tokens" | "-t" => show_tokens = true,
            "--help" | "-h" => {
                print_help();
                return;
            }
            "--version" | "-V" => {
                println!("cinder {}", VERSION);
                return;
            }
            _ if arg.starts_with('-') => {
                eprintln!("Unknown flag: {}", arg);
                print_usage();
                process::exit(1);
            }
            _ => filename = Some(arg),
        }
    }

    let Some(file) = filename else {
        eprintln!("Error: No input file specified");
        print_usage();
        process::exit(1);
    };

    let result = if show_tokens {
        show_file_tokens(file)
    } else {
        run_file(file)
    };

    if let Err(message) = result {
        eprint!("{}", message);
        process::exit(1);
    }
}

/// Install a tracing subscriber when `RUST_LOG` is set
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true).with_writer(io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn print_usage() {
    eprintln!("Usage: cinder [OPTIONS] [script]");
    eprintln!("       cinder --help");
}

fn print_help() {
    println!("Cinder v{} - A small imperative toy language", VERSION);
    println!();
    println!("USAGE:");
    println!("    cinder [OPTIONS] [script]");
    println!();
    println!("OPTIONS:");
    println!("    -t, --tokens     Show tokenization output (lexer only)");
    println!("    -h, --help       Show this help message");
    println!("    -V, --version    Show the version");
    println!();
    println!("EXAMPLES:");
    println!("    cinder script.cin            Run a Cinder script");
    println!("    cinder --tokens script.cin   Show tokens from lexer");
    println!("    cinder                       Start interactive REPL");
    println!();
    println!("Set RUST_LOG=cinder_lang=debug to trace evaluation.");
}

fn read_source(filename: &str) -> Result<String, String> {
    fs::read_to_string(filename)
        .map_err(|e| format!("Failed to read file '{}': {}\n", filename, e))
}

/// Run a Cinder script from a file
fn run_file(filename: &str) -> Result<(), String> {
    let source = read_source(filename)?;
    let mut runtime = Runtime::new();

    run_in(&mut runtime, &source, Some(filename))
        .map(|_| ())
        .map_err(|e| Diagnostic::with_source(&e, &source).to_string())
}

/// Show tokens from lexing a file
fn show_file_tokens(filename: &str) -> Result<(), String> {
    let source = read_source(filename)?;

    let tokens = Lexer::new(&source, Some(filename))
        .tokenize()
        .map_err(|e| Diagnostic::with_source(&e, &source).to_string())?;

    println!("Tokens for '{}':", filename);
    println!("{}", "=".repeat(60));

    for (i, token) in tokens.iter().enumerate() {
        println!(
            "{:4}: {:8} {:24} | {:?}",
            i,
            format!("{}:{}", token.location.line, token.location.column),
            format!("{:?}", token.token_type),
            token.lexeme
        );
    }

    println!("{}", "=".repeat(60));
    println!("Total tokens: {}", tokens.len());

    Ok(())
}

/// Start an interactive REPL (Read-Eval-Print Loop)
///
/// One runtime lives for the whole session, so declarations persist.
fn repl() {
    let mut runtime = Runtime::new();
    let mut line_number = 1;

    loop {
        print!("cinder:{} > ", line_number);
        // A failed flush only loses the prompt
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {
                let input = input.trim();

                if input == "exit" || input == "quit" {
                    break;
                }

                if input.is_empty() {
                    continue;
                }

                match run_in(&mut runtime, input, Some("<repl>")) {
                    Ok(Value::Void) => {}
                    Ok(value) => println!("{}", value),
                    Err(e) => eprint!("{}", Diagnostic::with_source(&e, input)),
                }

                line_number += 1;
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }

    println!("\nGoodbye!");
}
