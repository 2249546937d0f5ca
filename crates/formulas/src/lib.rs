//! # cellgrid Formulas
//!
//! Formula parsing, printing, and evaluation against a pluggable cell source.

use cellgrid_primitives::{ErrorValue, Position, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod ast;
pub mod parser;
pub mod utils;

pub use ast::{BinaryOperator, FormulaAst, FormulaExpr, UnaryOperator};
pub use parser::parse_formula;
pub use utils::{is_a_formula, unescape, ESCAPE_SIGN, FORMULA_SIGN};

/// Whole-string decimal literal: optional sign, digits with an optional
/// fraction, optional exponent. No surrounding whitespace, no `inf`/`nan`.
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid regex"));

/// Formula errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Read access to the cells a formula refers to.
pub trait CellSource {
    /// Value of the cell at `pos`, or `None` when no cell exists there.
    fn cell_value(&self, pos: Position) -> Option<Value>;
}

impl<S: CellSource + ?Sized> CellSource for &S {
    fn cell_value(&self, pos: Position) -> Option<Value> {
        (**self).cell_value(pos)
    }
}

/// Result of evaluating a formula. Formulas never produce text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FormulaValue {
    Number(f64),
    Error(ErrorValue),
}

impl From<FormulaValue> for Value {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Number(n) => Value::Number(n),
            FormulaValue::Error(err) => Value::Error(err),
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => write!(f, "{n}"),
            FormulaValue::Error(err) => write!(f, "{err}"),
        }
    }
}

/// Parse a cell's text as a number for use in arithmetic.
///
/// Empty text counts as zero; anything that is not a plain decimal literal
/// is a `#VAL!` error.
pub fn text_to_number(text: &str) -> Result<f64, ErrorValue> {
    if text.is_empty() {
        return Ok(0.0);
    }
    if !DECIMAL_RE.is_match(text) {
        return Err(ErrorValue::Value);
    }
    text.parse::<f64>().map_err(|_| ErrorValue::Value)
}

/// Number a referenced cell contributes to arithmetic.
fn coerce_reference<S: CellSource + ?Sized>(source: &S, pos: Position) -> Result<f64, ErrorValue> {
    if !pos.is_valid() {
        return Err(ErrorValue::Ref);
    }
    match source.cell_value(pos) {
        None => Ok(0.0),
        Some(Value::Number(n)) => Ok(n),
        Some(Value::Text(text)) => text_to_number(&text),
        Some(Value::Error(err)) => Err(err),
    }
}

/// A parsed formula, ready to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    ast: FormulaAst,
}

impl Formula {
    /// Parse the expression part of a formula (without the leading `=`).
    pub fn parse(expression: &str) -> Result<Self, FormulaError> {
        Ok(Self {
            ast: parse_formula(expression)?,
        })
    }

    pub fn ast(&self) -> &FormulaAst {
        &self.ast
    }

    /// Evaluate against `source`. Resolution and arithmetic errors come back
    /// as [`FormulaValue::Error`].
    pub fn evaluate<S: CellSource + ?Sized>(&self, source: &S) -> FormulaValue {
        match self.ast.execute(&|pos| coerce_reference(source, pos)) {
            Ok(n) if n.is_finite() => FormulaValue::Number(n),
            Ok(_) => FormulaValue::Error(ErrorValue::Arithmetic),
            Err(err) => FormulaValue::Error(err),
        }
    }

    /// Canonical expression text, without the leading `=`.
    pub fn expression(&self) -> String {
        self.ast.print_formula()
    }

    /// Referenced positions in source order, duplicates and invalid
    /// positions included.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.ast.cells().to_vec()
    }
}
