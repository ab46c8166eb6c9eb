// algoritmo: pseudocode front end and control-flow lowering

use std::cell::Cell;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use algoritmo::events::{Event, EventEmitter, EventKind};
use algoritmo::parser::lexer::tokenize;
use algoritmo::pipeline::CompileError;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Pseudocode source file
    file: PathBuf,

    /// Print the token stream before compiling
    #[arg(short, long)]
    tokens: bool,

    /// Print the lowered node graph of every module
    #[arg(short, long)]
    graph: bool,

    /// Log filter, e.g. `algoritmo=debug`; overrides RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("algoritmo=warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !args.file.exists() {
        eprintln!("Error: File '{}' not found", args.file.display());
        std::process::exit(1);
    }
    let source = fs::read_to_string(&args.file)?;

    // Lexical errors are left to the listener below
    if args.tokens {
        if let Ok(tokens) = tokenize(&source) {
            for token in tokens {
                println!("{:>4}:{:<3} {}", token.location.line, token.location.column, token.kind);
            }
        }
    }

    // Errors from parsing are printed as they are broadcast
    let lexical_errors = Cell::new(0usize);
    let mut events = EventEmitter::new();
    events.on(EventKind::LexicalError, |event| {
        if let Event::LexicalError(error) = event {
            eprintln!("{}", error);
            lexical_errors.set(lexical_errors.get() + 1);
        }
    });
    events.on(EventKind::SyntaxError, |event| {
        if let Event::SyntaxError(error) = event {
            eprintln!("{}", error);
        }
    });

    eprintln!("Compiling {}...", args.file.display());
    let program = match algoritmo::compile(&source, &mut events) {
        Ok(program) => program,
        Err(CompileError::Type(reports)) => {
            for report in &reports {
                eprintln!("{}", report);
            }
            std::process::exit(1);
        }
        Err(error) => {
            if error.stage() == algoritmo::pipeline::Stage::Lexical {
                eprintln!("{} lexical error(s)", lexical_errors.get());
            }
            std::process::exit(1);
        }
    };

    eprintln!(
        "OK: {} module(s), {} node(s) in main",
        program.modules.len() + 1,
        program.main.graph.len()
    );

    if args.graph {
        println!("{}", program.main);
        let mut names: Vec<_> = program.modules.keys().collect();
        names.sort();
        for name in names {
            if let Some(module) = program.modules.get(name) {
                println!("{}", module);
            }
        }
    }

    Ok(())
}
