use cellgrid_formulas::FormulaError;
use cellgrid_primitives::Position;
use thiserror::Error;

/// Errors that abort a sheet operation. The sheet is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("Invalid position: row {}, col {}", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("Formula syntax error: {0}")]
    FormulaSyntax(#[from] FormulaError),

    #[error("Circular dependency: {}", format_cycle(.cycle))]
    CircularDependency { cycle: Vec<Position> },
}

fn format_cycle(cycle: &[Position]) -> String {
    cycle
        .iter()
        .map(Position::to_a1)
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, SheetError>;
