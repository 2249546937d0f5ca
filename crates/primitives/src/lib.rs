//! # cellgrid primitives
//!
//! Core primitives for the cell grid: positions, printable sizes and the
//! tri-state value a cell evaluates to.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod address;

use address::{column_index_to_letters, column_letters_to_index};

/// Maximum number of letters in the column part of an A1 reference.
pub const MAX_POSITION_LETTERS: usize = 3;

/// A cell coordinate in the grid (0-based).
///
/// Ordering is row-major, which gives deterministic iteration when
/// positions are used as keys of ordered collections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const MAX_ROWS: i32 = 16_384;
    pub const MAX_COLS: i32 = 16_384;

    /// Sentinel for a malformed or out-of-range coordinate.
    pub const NONE: Position = Position { row: -1, col: -1 };

    /// Create a new position
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Check that the coordinate lies inside the grid bounds.
    pub fn is_valid(&self) -> bool {
        (0..Self::MAX_ROWS).contains(&self.row) && (0..Self::MAX_COLS).contains(&self.col)
    }

    /// Parse the formula-grammar form of an A1 reference.
    ///
    /// Column letters must be uppercase. Any malformed or out-of-range input
    /// yields [`Position::NONE`] instead of an error, so that formula trees
    /// can carry broken references and report them as `#REF!` later.
    pub fn from_a1(s: &str) -> Self {
        let split = s
            .find(|c: char| !c.is_ascii_uppercase())
            .unwrap_or(s.len());
        let (letters, digits) = s.split_at(split);

        if letters.is_empty() || letters.len() > MAX_POSITION_LETTERS {
            return Self::NONE;
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Self::NONE;
        }

        let Ok(row) = digits.parse::<i32>() else {
            return Self::NONE;
        };
        let Ok(col) = column_letters_to_index(letters) else {
            return Self::NONE;
        };

        let pos = Self::new(row - 1, col as i32);
        if pos.is_valid() {
            pos
        } else {
            Self::NONE
        }
    }

    /// Parse a user-supplied A1 reference, reporting why it was rejected.
    ///
    /// Unlike [`Position::from_a1`] this accepts lowercase column letters
    /// and surrounding whitespace.
    pub fn parse_a1(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let split = trimmed
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (letters, digits) = trimmed.split_at(split);

        if letters.is_empty() || letters.len() > MAX_POSITION_LETTERS {
            return Err(AddressError::InvalidColumn(trimmed.to_string()));
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressError::InvalidRow(trimmed.to_string()));
        }

        let row: i32 = digits
            .parse()
            .map_err(|_| AddressError::OutOfRange(trimmed.to_string()))?;
        let col = column_letters_to_index(&letters.to_ascii_uppercase())?;

        let pos = Self::new(row - 1, col as i32);
        if pos.is_valid() {
            Ok(pos)
        } else {
            Err(AddressError::OutOfRange(trimmed.to_string()))
        }
    }

    /// Convert to A1 notation. Invalid positions have no A1 form.
    pub fn to_a1(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        format!("{}{}", column_index_to_letters(self.col as u32), self.row + 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Dimensions of the printable area of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

impl Size {
    pub const EMPTY: Size = Size { rows: 0, cols: 0 };

    pub const fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Observable value of a cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(ErrorValue),
}

impl Value {
    /// Empty text, the value of a cell with no content.
    pub fn empty() -> Self {
        Value::Text(String::new())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<ErrorValue> {
        match self {
            Value::Error(err) => Some(*err),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Error(err) => write!(f, "{err}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<ErrorValue> for Value {
    fn from(err: ErrorValue) -> Self {
        Value::Error(err)
    }
}

/// Formula evaluation errors. These are values, not faults: they are
/// cached and displayed like any other result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorValue {
    Ref,        // #REF!
    Value,      // #VAL!
    Arithmetic, // #ARITHM!
}

impl ErrorValue {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ref => "#REF!",
            Self::Value => "#VAL!",
            Self::Arithmetic => "#ARITHM!",
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors that can occur when parsing user-supplied addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Empty cell reference")]
    Empty,
    #[error("Invalid column: {0}")]
    InvalidColumn(String),
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    #[error("Cell reference out of range: {0}")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_a1_basic() {
        assert_eq!(Position::from_a1("A1"), Position::new(0, 0));
        assert_eq!(Position::from_a1("C3"), Position::new(2, 2));
        assert_eq!(Position::from_a1("AA10"), Position::new(9, 26));
        assert_eq!(Position::from_a1("XFD16384"), Position::new(16_383, 16_383));
    }

    #[test]
    fn test_from_a1_invalid_is_none() {
        assert_eq!(Position::from_a1(""), Position::NONE);
        assert_eq!(Position::from_a1("a1"), Position::NONE);
        assert_eq!(Position::from_a1("A0"), Position::NONE);
        assert_eq!(Position::from_a1("A"), Position::NONE);
        assert_eq!(Position::from_a1("1A"), Position::NONE);
        assert_eq!(Position::from_a1("A1B"), Position::NONE);
        assert_eq!(Position::from_a1("A+1"), Position::NONE);
        assert_eq!(Position::from_a1("ABCD1"), Position::NONE);
        assert_eq!(Position::from_a1("XFE1"), Position::NONE);
        assert_eq!(Position::from_a1("A16385"), Position::NONE);
        assert_eq!(Position::from_a1("A99999999999"), Position::NONE);
    }

    #[test]
    fn test_parse_a1_reports_reason() {
        assert_eq!(Position::parse_a1(" b2 "), Ok(Position::new(1, 1)));
        assert_eq!(Position::parse_a1(""), Err(AddressError::Empty));
        assert!(matches!(
            Position::parse_a1("1A"),
            Err(AddressError::InvalidColumn(_))
        ));
        assert!(matches!(
            Position::parse_a1("B"),
            Err(AddressError::InvalidRow(_))
        ));
        assert!(matches!(
            Position::parse_a1("A0"),
            Err(AddressError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_validity_bounds() {
        assert!(Position::new(0, 0).is_valid());
        assert!(!Position::NONE.is_valid());
        assert!(!Position::new(Position::MAX_ROWS, 0).is_valid());
        assert!(!Position::new(0, Position::MAX_COLS).is_valid());
        assert!(!Position::new(-5, 3).is_valid());
    }

    #[test]
    fn test_position_order_is_row_major() {
        let mut positions = vec![
            Position::new(1, 0),
            Position::new(0, 5),
            Position::new(0, 1),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![Position::new(0, 1), Position::new(0, 5), Position::new(1, 0)]
        );
    }

    #[test]
    fn test_display_impls() {
        assert_eq!(format!("{}", Position::new(0, 0)), "A1");
        assert_eq!(format!("{}", Position::new(9, 26)), "AA10");
        assert_eq!(format!("{}", Position::NONE), "");
        assert_eq!(format!("{}", Size::new(2, 3)), "2x3");
    }

    #[test]
    fn test_error_labels() {
        assert_eq!(ErrorValue::Ref.label(), "#REF!");
        assert_eq!(ErrorValue::Value.label(), "#VAL!");
        assert_eq!(ErrorValue::Arithmetic.label(), "#ARITHM!");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Text("abc".to_string()).to_string(), "abc");
        assert_eq!(Value::Error(ErrorValue::Arithmetic).to_string(), "#ARITHM!");
        assert_eq!(Value::empty().to_string(), "");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Number(2.0).as_number(), Some(2.0));
        assert_eq!(Value::Text("x".to_string()).as_text(), Some("x"));
        assert_eq!(Value::Error(ErrorValue::Ref).as_error(), Some(ErrorValue::Ref));
        assert!(Value::from(ErrorValue::Value).is_error());
        assert!(!Value::from(1.0).is_error());
    }
}
