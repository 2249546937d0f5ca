/// Leading character that marks cell text as a formula.
pub const FORMULA_SIGN: char = '=';

/// Leading character that forces cell text to be stored as a literal.
pub const ESCAPE_SIGN: char = '\'';

/// Check if text is a formula: the formula sign followed by at least one
/// more character. A lone `=` is plain text.
pub fn is_a_formula(text: &str) -> bool {
    text.len() > 1 && text.starts_with(FORMULA_SIGN)
}

/// Strip a single leading escape sign, if present.
pub fn unescape(text: &str) -> &str {
    text.strip_prefix(ESCAPE_SIGN).unwrap_or(text)
}
