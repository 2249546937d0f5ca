//! # cellgrid-cli
//!
//! Command-line interface for the cellgrid formula engine.

mod commands;

use anyhow::{Context, Result};
use cellgrid_sheet::Sheet;
use clap::Parser;
use colored::Colorize;
use commands::{Command, OutputFormat};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// cellgrid - A reactive formula grid
#[derive(Parser)]
#[command(name = "cellgrid")]
#[command(author, version, about = "Reactive formula grid", long_about = None)]
struct Cli {
    /// Script file to execute, one command per line
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Execute an inline command (repeatable)
    #[arg(short = 'e', long = "execute")]
    execute: Vec<String>,

    /// Start REPL mode (after running FILE and -e commands)
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,

    /// Output format (table, json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "table")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let mut sheet = Sheet::new();

    if cli.file.is_none() && cli.execute.is_empty() && !cli.interactive {
        // No arguments - show help
        Cli::parse_from(["cellgrid", "--help"]);
        return Ok(());
    }

    if let Some(file) = &cli.file {
        let source = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read file: {}", file.display()))?;
        run_script(&mut sheet, &source, cli.format)
            .with_context(|| format!("In {}", file.display()))?;
        tracing::info!("Ran {} ({} cells occupied)", file.display(), sheet.len());
    }

    for (idx, command) in cli.execute.iter().enumerate() {
        run_line(&mut sheet, command, cli.format)
            .with_context(|| format!("In -e #{}: {command}", idx + 1))?;
    }

    if cli.interactive {
        run_repl(&mut sheet, cli.format)?;
    }

    Ok(())
}

/// Run one command line against the sheet, printing to stdout.
fn run_line(sheet: &mut Sheet, line: &str, format: OutputFormat) -> Result<()> {
    let Some(command) = Command::parse(line)? else {
        return Ok(());
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    command.execute(sheet, format, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Run a script: one command per line, stopping at the first error.
fn run_script(sheet: &mut Sheet, source: &str, format: OutputFormat) -> Result<()> {
    for (idx, line) in source.lines().enumerate() {
        run_line(sheet, line, format).with_context(|| format!("line {}", idx + 1))?;
    }
    Ok(())
}

/// Run the REPL.
fn run_repl(sheet: &mut Sheet, format: OutputFormat) -> Result<()> {
    println!(
        "{} {} - Interactive Mode",
        "cellgrid".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "Type {} for help, {} to exit\n",
        ":help".yellow(),
        ":quit".yellow()
    );

    let mut rl = DefaultEditor::new()?;
    let history_path = dirs_history_path();

    // Load history if available
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = "cellgrid> ".green().bold().to_string();

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed.is_empty() {
                    continue;
                }

                // Add to history
                let _ = rl.add_history_entry(line.as_str());

                // Handle REPL commands
                if trimmed.starts_with(':') {
                    match trimmed {
                        ":quit" | ":q" | ":exit" => break,
                        ":help" | ":h" | ":?" => print_help(),
                        _ => println!("{} Unknown command: {}", "Error:".red().bold(), trimmed),
                    }
                    continue;
                }

                if let Err(e) = run_line(sheet, &line, format) {
                    println!("{} {e:#}", "Error:".red().bold());
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
            Err(e) => {
                println!("{} {e}", "Error:".red().bold());
                break;
            }
        }
    }

    // Save history
    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

/// Get the history file path.
fn dirs_history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|mut p| {
        p.push("cellgrid");
        let _ = std::fs::create_dir_all(&p);
        p.push("history.txt");
        p
    })
}

/// Print REPL help.
fn print_help() {
    println!("{}", "cellgrid REPL Commands:".cyan().bold());
    println!("  {}    Show this help", ":help, :h, :?".yellow());
    println!("  {}  Exit the REPL", ":quit, :q, :exit".yellow());
    println!();
    println!("{}", "Sheet Commands:".cyan().bold());
    println!("  {}  Set a cell (text, 'escaped text or =formula)", "set <CELL> <text>".yellow());
    println!("  {}         Show a cell's value", "get <CELL>".yellow());
    println!("  {}       Remove a cell's content", "clear <CELL>".yellow());
    println!("  {}             Print all values", "values".yellow());
    println!("  {}              Print all raw texts", "texts".yellow());
    println!("  {}               Print the printable size", "size".yellow());
    println!("  {}        Show precedents and dependents", "deps <CELL>".yellow());
    println!();
    println!("{}", "Examples:".cyan().bold());
    println!("  set A1 10");
    println!("  set B1 =A1*2+1");
    println!("  get B1");
}
