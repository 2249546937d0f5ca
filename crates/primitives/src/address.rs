//! Column-letter helpers for A1 references.

use crate::{AddressError, Position};

/// Convert column index to letters (0 -> A, 1 -> B, 25 -> Z, 26 -> AA, etc.).
pub fn column_index_to_letters(index: u32) -> String {
    let mut n = index;
    let mut out = String::new();
    loop {
        let rem = (n % 26) as u8;
        out.push((b'A' + rem) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    out.chars().rev().collect()
}

/// Convert column letters to a zero-based index (A -> 0, Z -> 25, AA -> 26, etc.).
pub fn column_letters_to_index(col: &str) -> Result<u32, AddressError> {
    if col.is_empty() {
        return Err(AddressError::InvalidColumn(col.to_string()));
    }
    let mut result: u32 = 0;
    for ch in col.chars() {
        if !ch.is_ascii_uppercase() {
            return Err(AddressError::InvalidColumn(col.to_string()));
        }
        let value = u32::from(ch as u8 - b'A' + 1);
        result = result
            .checked_mul(26)
            .and_then(|v| v.checked_add(value))
            .ok_or_else(|| AddressError::InvalidColumn(col.to_string()))?;
    }
    Ok(result - 1)
}

/// Iterate the positions of a `rows x cols` rectangle anchored at A1 in
/// row-major order.
pub fn positions_in(rows: i32, cols: i32) -> impl Iterator<Item = Position> {
    (0..rows.max(0)).flat_map(move |row| (0..cols.max(0)).map(move |col| Position::new(row, col)))
}
