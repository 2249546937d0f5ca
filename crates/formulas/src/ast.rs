//! Formula expression tree: evaluation and canonical printing.

use cellgrid_primitives::{ErrorValue, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormulaExpr {
    /// Numeric literal
    Number(f64),
    /// Cell reference; malformed references hold [`Position::NONE`]
    CellRef(Position),
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        expr: Box<FormulaExpr>,
    },
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Subtract => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide => lhs / rhs,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Negate => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precedence {
    Add,
    Sub,
    Mul,
    Div,
    Unary,
    Atom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Whether `child`, printed as the `side` operand of `parent`, needs
/// parentheses to parse back into the same tree.
fn needs_parens(parent: Precedence, child: Precedence, side: Side) -> bool {
    use Precedence::{Add, Div, Mul, Sub, Unary};
    match (parent, child) {
        (Sub, Add | Sub) => side == Side::Right,
        (Mul | Div | Unary, Add | Sub) => true,
        (Div, Mul | Div) => side == Side::Right,
        _ => false,
    }
}

impl FormulaExpr {
    fn precedence(&self) -> Precedence {
        match self {
            FormulaExpr::Number(_) | FormulaExpr::CellRef(_) => Precedence::Atom,
            FormulaExpr::UnaryOp { .. } => Precedence::Unary,
            FormulaExpr::BinaryOp { op, .. } => match op {
                BinaryOperator::Add => Precedence::Add,
                BinaryOperator::Subtract => Precedence::Sub,
                BinaryOperator::Multiply => Precedence::Mul,
                BinaryOperator::Divide => Precedence::Div,
            },
        }
    }

    /// Evaluate the expression, resolving each cell reference through `resolve`.
    ///
    /// The first error returned by the resolver aborts the whole evaluation.
    pub fn execute<F>(&self, resolve: &F) -> Result<f64, ErrorValue>
    where
        F: Fn(Position) -> Result<f64, ErrorValue>,
    {
        match self {
            FormulaExpr::Number(n) => Ok(*n),
            FormulaExpr::CellRef(pos) => resolve(*pos),
            FormulaExpr::UnaryOp { op, expr } => {
                let value = expr.execute(resolve)?;
                Ok(match op {
                    UnaryOperator::Plus => value,
                    UnaryOperator::Negate => -value,
                })
            }
            FormulaExpr::BinaryOp { op, left, right } => {
                let lhs = left.execute(resolve)?;
                let rhs = right.execute(resolve)?;
                Ok(op.apply(lhs, rhs))
            }
        }
    }

    fn collect_cells(&self, cells: &mut Vec<Position>) {
        match self {
            FormulaExpr::Number(_) => {}
            FormulaExpr::CellRef(pos) => cells.push(*pos),
            FormulaExpr::UnaryOp { expr, .. } => expr.collect_cells(cells),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_cells(cells);
                right.collect_cells(cells);
            }
        }
    }
}

fn write_operand(
    f: &mut fmt::Formatter<'_>,
    expr: &FormulaExpr,
    parent: Precedence,
    side: Side,
) -> fmt::Result {
    if needs_parens(parent, expr.precedence(), side) {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => write!(f, "{n}"),
            FormulaExpr::CellRef(pos) if pos.is_valid() => write!(f, "{pos}"),
            FormulaExpr::CellRef(_) => f.write_str(ErrorValue::Ref.label()),
            FormulaExpr::UnaryOp { op, expr } => {
                f.write_str(op.symbol())?;
                write_operand(f, expr, Precedence::Unary, Side::Right)
            }
            FormulaExpr::BinaryOp { op, left, right } => {
                let precedence = self.precedence();
                write_operand(f, left, precedence, Side::Left)?;
                f.write_str(op.symbol())?;
                write_operand(f, right, precedence, Side::Right)
            }
        }
    }
}

/// A parsed formula body together with the cells it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaAst {
    root: FormulaExpr,
    cells: Vec<Position>,
}

impl FormulaAst {
    pub fn new(root: FormulaExpr) -> Self {
        let mut cells = Vec::new();
        root.collect_cells(&mut cells);
        Self { root, cells }
    }

    pub fn root(&self) -> &FormulaExpr {
        &self.root
    }

    /// Referenced positions in source order, duplicates and invalid
    /// positions included.
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    pub fn execute<F>(&self, resolve: &F) -> Result<f64, ErrorValue>
    where
        F: Fn(Position) -> Result<f64, ErrorValue>,
    {
        self.root.execute(resolve)
    }

    /// Canonical source text with the minimum parentheses.
    pub fn print_formula(&self) -> String {
        self.root.to_string()
    }
}
