use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use knit_driver::{BuildError, Compiler, Config};
use knit_lexer::TokenKind;

const DEFAULT_CONFIG: &str = "knit.config.json";

#[derive(Parser)]
#[command(
    name = "knit",
    version,
    about = "A small module bundler with a webpack-style loader pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle the configured entries
    Build {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,

        /// Print build stats as JSON
        #[arg(long)]
        json: bool,

        /// Top-level config overrides, `key=value`
        overrides: Vec<String>,
    },

    /// Run the loader chain for one request and print the result
    RunLoaders {
        /// Config file; the current directory is the root without one
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,

        /// Request, optionally with inline loaders (`raw-loader!./a.txt`)
        request: String,
    },

    /// Lex a file and show tokens (debug)
    Lex {
        input: PathBuf,

        /// Show token positions
        #[arg(short, long)]
        positions: bool,
    },

    /// Parse a file and show the syntax tree (debug)
    Parse { input: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            verbose,
            json,
            overrides,
        } => {
            init_tracing(verbose);
            build_command(&config, &overrides, json)
        }
        Commands::RunLoaders {
            config,
            verbose,
            request,
        } => {
            init_tracing(verbose);
            run_loaders_command(config.as_deref(), &request)
        }
        Commands::Lex { input, positions } => lex_command(&input, positions),
        Commands::Parse { input } => parse_command(&input),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "knit=debug" } else { "knit=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn build_command(config_path: &Path, overrides: &[String], json: bool) -> ExitCode {
    let result = Config::load(config_path, overrides)
        .map_err(BuildError::from)
        .and_then(Compiler::new)
        .and_then(|mut compiler| compiler.run());

    let stats = match result {
        Ok(stats) => stats,
        Err(err) => {
            report_build_error(&err);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match stats.to_json().and_then(|value| serde_json::to_string_pretty(&value)) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("error: can't serialize stats: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", stats.summary());
    }
    ExitCode::SUCCESS
}

fn run_loaders_command(config_path: Option<&Path>, request: &str) -> ExitCode {
    let config = match config_path {
        Some(path) => Config::load(path, &[]),
        None if Path::new(DEFAULT_CONFIG).is_file() => Config::load(Path::new(DEFAULT_CONFIG), &[]),
        None => Ok(Config::default()),
    };

    let result = config
        .map_err(BuildError::from)
        .and_then(Compiler::new)
        .and_then(|compiler| compiler.run_loaders(request))
        .and_then(|output| {
            output
                .into_content()
                .map_err(|source| BuildError::Loader {
                    module: request.to_string(),
                    source,
                })
        });

    match result {
        Ok(content) => {
            print!("{}", content.to_text());
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_build_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn lex_command(input: &Path, positions: bool) -> ExitCode {
    let source = match fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let filename = input.to_string_lossy().to_string();
    let tokens = knit_lexer::tokenize(&source);

    println!("Tokens for {}:\n", filename);
    println!("{}", "=".repeat(80));
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof {
            println!("\n{:4} | {:?}", i, token.kind);
            break;
        }
        if positions {
            println!(
                "{:4} | {:20?} | {:?} | {}..{}",
                i, token.kind, token.value, token.span.start, token.span.end
            );
        } else {
            println!("{:4} | {:20?} | {:?}", i, token.kind, token.value);
        }
    }
    println!("{}", "=".repeat(80));
    println!("\nTotal tokens: {}", tokens.len());

    let errors: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Error).collect();
    if errors.is_empty() {
        return ExitCode::SUCCESS;
    }
    println!("\nLexer errors found: {}", errors.len());
    for token in errors {
        report_error("E0001", "Lexical error", &token.value, token.span.start, token.span.end, &filename, &source);
    }
    ExitCode::FAILURE
}

fn parse_command(input: &Path) -> ExitCode {
    let source = match fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let filename = input.to_string_lossy().to_string();

    match knit_parser::parse_module(&source) {
        Ok(program) => {
            println!("{:#?}", program);
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for err in &errors {
                report_error("E1000", "Parse error", &err.message, err.span.start, err.span.end, &filename, &source);
            }
            ExitCode::FAILURE
        }
    }
}

fn report_build_error(err: &BuildError) {
    if let BuildError::Parse {
        path,
        source_text,
        errors,
    } = err
    {
        let filename = path.to_string_lossy().to_string();
        for parse_error in errors {
            report_error(
                "E1000",
                "Parse error",
                &parse_error.message,
                parse_error.span.start,
                parse_error.span.end,
                &filename,
                source_text,
            );
        }
        return;
    }

    eprintln!("error: {err}");
}

fn report_error(code: &str, title: &str, message: &str, start: usize, end: usize, filename: &str, source: &str) {
    let span = (filename, start..end);
    let printed = Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(title)
        .with_label(Label::new(span).with_message(message).with_color(Color::Red))
        .finish()
        .eprint((filename, Source::from(source)));
    if printed.is_err() {
        eprintln!("{filename}:{start}..{end}: {title}: {message}");
    }
}
