//! Reactive cell grid for cellgrid
//!
//! A [`Sheet`] stores text and formulas by position, tracks which cells read
//! which, rejects edits that would create a reference cycle, and keeps
//! memoized formula values coherent across edits.
//!
//! # Examples
//!
//! ## Formulas and recalculation
//!
//! ```
//! use cellgrid_primitives::{Position, Value};
//! use cellgrid_sheet::Sheet;
//!
//! let mut sheet = Sheet::new();
//! let a1 = Position::from_a1("A1");
//! let b1 = Position::from_a1("B1");
//!
//! sheet.set_cell(a1, "2").unwrap();
//! sheet.set_cell(b1, "=A1*(A1+1)").unwrap();
//! assert_eq!(sheet.value_at(b1).unwrap(), Value::Number(6.0));
//!
//! sheet.set_cell(a1, "3").unwrap();
//! assert_eq!(sheet.value_at(b1).unwrap(), Value::Number(12.0));
//! ```
//!
//! ## Rejected cycles
//!
//! ```
//! use cellgrid_primitives::Position;
//! use cellgrid_sheet::{Sheet, SheetError};
//!
//! let mut sheet = Sheet::new();
//! sheet.set_cell(Position::from_a1("A1"), "=B1").unwrap();
//! let err = sheet.set_cell(Position::from_a1("B1"), "=A1").unwrap_err();
//! assert!(matches!(err, SheetError::CircularDependency { .. }));
//! ```
//!
//! ## Printing
//!
//! ```
//! use cellgrid_primitives::Position;
//! use cellgrid_sheet::Sheet;
//!
//! let mut sheet = Sheet::new();
//! sheet.set_cell(Position::from_a1("A1"), "1").unwrap();
//! sheet.set_cell(Position::from_a1("B2"), "=A1/0").unwrap();
//!
//! let mut out = Vec::new();
//! sheet.print_values(&mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "1\t\n\t#ARITHM!\n");
//! ```

mod cell;
mod error;
mod graph;
mod sheet;

pub use error::{Result, SheetError};
pub use sheet::{CellRef, Sheet};

pub use cellgrid_formulas::{CellSource, FormulaError};
pub use cellgrid_primitives::{ErrorValue, Position, Size, Value};
