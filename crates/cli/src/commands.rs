//! Line-oriented commands shared by the REPL, `-e` and script files.

use anyhow::{bail, Context, Result};
use cellgrid_sheet::{Position, Sheet, Value};
use std::io::Write;

/// Output format for query results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Tab-separated output (default)
    #[default]
    Table,
}

/// One parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { pos: Position, text: String },
    Get(Position),
    Clear(Position),
    Values,
    Texts,
    Size,
    Deps(Position),
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.trim_end().is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let (keyword, rest) = split_word(trimmed);
        let command = match keyword.to_ascii_lowercase().as_str() {
            "set" => {
                let (cell, text) = split_word(rest.trim_start());
                Command::Set {
                    pos: parse_cell(cell)?,
                    text: text.to_string(),
                }
            }
            "get" => Command::Get(single_cell(rest)?),
            "clear" => Command::Clear(single_cell(rest)?),
            "deps" => Command::Deps(single_cell(rest)?),
            "values" => no_args(Command::Values, rest)?,
            "texts" => no_args(Command::Texts, rest)?,
            "size" => no_args(Command::Size, rest)?,
            other => bail!("Unknown command: {other}"),
        };
        Ok(Some(command))
    }

    /// Run against `sheet`, writing any output to `out`.
    pub fn execute<W: Write>(&self, sheet: &mut Sheet, format: OutputFormat, out: &mut W) -> Result<()> {
        match self {
            Command::Set { pos, text } => sheet.set_cell(*pos, text)?,
            Command::Clear(pos) => sheet.clear_cell(*pos)?,
            Command::Get(pos) => {
                let cell = sheet.get_cell(*pos)?;
                match format {
                    OutputFormat::Table => {
                        let value = cell.map(|c| c.value().to_string()).unwrap_or_default();
                        writeln!(out, "{value}")?;
                    }
                    OutputFormat::Json => {
                        let json = serde_json::json!({
                            "cell": pos.to_a1(),
                            "value": cell.map_or(serde_json::Value::Null, |c| value_to_json(&c.value())),
                            "text": cell.map(|c| c.text()),
                        });
                        writeln!(out, "{json}")?;
                    }
                }
            }
            Command::Values => write_grid(out, &sheet.values(), format)?,
            Command::Texts => write_grid(out, &sheet.texts(), format)?,
            Command::Size => {
                let size = sheet.printable_size();
                match format {
                    OutputFormat::Table => writeln!(out, "{size}")?,
                    OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&size)?)?,
                }
            }
            Command::Deps(pos) => {
                let precedents = names(&sheet.precedents_of(*pos)?);
                let dependents = names(&sheet.dependents_of(*pos)?);
                match format {
                    OutputFormat::Table => {
                        writeln!(out, "precedents: {}", precedents.join(" "))?;
                        writeln!(out, "dependents: {}", dependents.join(" "))?;
                    }
                    OutputFormat::Json => {
                        let json = serde_json::json!({
                            "cell": pos.to_a1(),
                            "precedents": precedents,
                            "dependents": dependents,
                        });
                        writeln!(out, "{json}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Split off the first whitespace-delimited word. The remainder keeps all
/// but the one separating whitespace character.
fn split_word(input: &str) -> (&str, &str) {
    match input.find(char::is_whitespace) {
        Some(idx) => {
            let sep_len = input[idx..].chars().next().map_or(1, char::len_utf8);
            (&input[..idx], &input[idx + sep_len..])
        }
        None => (input, ""),
    }
}

fn parse_cell(cell: &str) -> Result<Position> {
    if cell.is_empty() {
        bail!("Missing cell reference");
    }
    Position::parse_a1(cell).with_context(|| format!("Invalid cell reference '{cell}'"))
}

fn single_cell(rest: &str) -> Result<Position> {
    let rest = rest.trim();
    let (cell, extra) = split_word(rest);
    if !extra.trim().is_empty() {
        bail!("Unexpected arguments after {cell}: {}", extra.trim());
    }
    parse_cell(cell)
}

fn no_args(command: Command, rest: &str) -> Result<Command> {
    if rest.trim().is_empty() {
        Ok(command)
    } else {
        bail!("Command takes no arguments: {}", rest.trim())
    }
}

fn names(positions: &[Position]) -> Vec<String> {
    positions.iter().map(Position::to_a1).collect()
}

/// Convert a cell value to JSON: numbers as numbers, text as strings,
/// errors as their display label.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Error(err) => serde_json::Value::String(err.label().to_string()),
    }
}

fn write_grid<W: Write>(out: &mut W, rows: &[Vec<String>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for row in rows {
                writeln!(out, "{}", row.join("\t"))?;
            }
        }
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(rows)?)?,
    }
    Ok(())
}
