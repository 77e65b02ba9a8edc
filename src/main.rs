mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod printer;
mod reader;
mod value;

use clap::Parser;
use config::{MAX_LINE_BYTES, PROMPT, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use eval::eval_top_level;
use printer::pr_str;
use reader::read_str;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::path::PathBuf;

/// A minimal trampolined Lisp evaluator
#[derive(Parser, Debug)]
#[command(name = "mal-core")]
#[command(version = config::VERSION)]
#[command(about = "A minimal trampolined Lisp evaluator")]
struct CliArgs {
    /// Script file to run via load-file (otherwise starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let env = builtins::new_root_env();

    if let Some(script_path) = args.script {
        let form = format!("(load-file {:?})", script_path.display().to_string());
        let expr = read_str(&form).map_err(|e| format!("PARSE ERROR: {e}"))?;
        eval_top_level(expr, env).map_err(|e| format!("RUNTIME ERROR: {e}"))?;
        return Ok(());
    }

    let config = Config::builder().auto_add_history(true).build();
    let mut rl = DefaultEditor::with_config(config)?;

    let history_file = ".mal_history";
    let _ = rl.load_history(history_file);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.len() >= MAX_LINE_BYTES {
                    eprintln!("RUNTIME ERROR: input line exceeds {MAX_LINE_BYTES} bytes");
                    std::process::exit(1);
                }

                match read_str(&line) {
                    Ok(expr) => match eval_top_level(expr, env.clone()) {
                        Ok(result) => println!("{}", pr_str(&result, true)),
                        Err(e) => eprintln!("RUNTIME ERROR: {e}"),
                    },
                    Err(e) => eprintln!("PARSE ERROR: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("RUNTIME ERROR: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
