//! CLI tool to check, tokenize, dump and format scripts.

use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fscript::{Frontend, ParserConfig, std_plugins};

#[derive(Parser, Debug)]
#[command(name = "fscript", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON file with parser settings and limits.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<String>,

    /// Tokens of lookahead available to grammar extensions.
    #[arg(long, value_name = "K", global = true)]
    lookahead: Option<usize>,

    /// Parse without the standard plugins (synonyms, dates, print, URIs).
    #[arg(long, global = true)]
    no_plugins: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that scripts parse
    Check { files: Vec<String> },
    /// Print the tokens of each script
    Tokens { files: Vec<String> },
    /// Print the syntax tree of each script
    Ast {
        /// Emit JSON instead of the debug tree
        #[arg(long)]
        json: bool,
        files: Vec<String>,
    },
    /// Print each script in canonical form
    Fmt { files: Vec<String> },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| ParserConfig::from_json(&text).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{path}: {e}");
                return ExitCode::from(2);
            }
        },
        None => ParserConfig::new(),
    };
    if let Some(k) = cli.lookahead {
        config = config.lookahead(k);
    }

    let files = match &cli.command {
        Command::Check { files }
        | Command::Tokens { files }
        | Command::Ast { files, .. }
        | Command::Fmt { files } => files,
    };
    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        let mut frontend = Frontend::new(config.clone().file(path.as_str()));
        if !cli.no_plugins {
            if let Err(e) = std_plugins::register_defaults(&mut frontend) {
                eprintln!("{path}: {e}");
                return ExitCode::from(2);
            }
        }

        if let Command::Tokens { .. } = cli.command {
            match frontend.tokenize(&content) {
                Ok(tokens) => {
                    for data in tokens {
                        println!(
                            "{}:{}\t{:?}\t{}",
                            data.span.line,
                            data.span.column,
                            data.kind(),
                            data.text().escape_debug()
                        );
                    }
                }
                Err(e) => {
                    eprintln!("{path}: {e}");
                    had_error = true;
                }
            }
            continue;
        }

        let program = match frontend.parse(&content) {
            Ok(program) => program,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        match cli.command {
            Command::Check { .. } => {
                eprintln!(
                    "{path}: valid ({} statement(s), {} scope(s))",
                    program.statements.len(),
                    program.symbols.scope_count()
                );
            }
            Command::Ast { json: true, .. } => match serde_json::to_string_pretty(&program) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("{path}: {e}");
                    had_error = true;
                }
            },
            Command::Ast { json: false, .. } => println!("{program:#?}"),
            Command::Fmt { .. } => print!("{}", fscript::format(&program)),
            Command::Tokens { .. } => {}
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
