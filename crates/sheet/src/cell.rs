use cellgrid_formulas::{is_a_formula, unescape, CellSource, Formula, FormulaError, FORMULA_SIGN};
use cellgrid_primitives::{Position, Value};
use once_cell::unsync::OnceCell;
use std::collections::BTreeSet;

/// What a cell holds.
#[derive(Debug, Clone)]
pub(crate) enum Content {
    Empty,
    /// Plain text, stored verbatim including any leading escape sign.
    Text(String),
    /// Parsed formula plus its memoized value. The cache is filled on the
    /// read path and only ever emptied through `&mut` invalidation.
    Formula {
        formula: Formula,
        cache: OnceCell<Value>,
    },
}

impl Content {
    /// Classify raw cell text: `""` is empty, `=` followed by at least one
    /// character is a formula, anything else is text.
    pub(crate) fn from_text(text: &str) -> Result<Self, FormulaError> {
        if text.is_empty() {
            return Ok(Content::Empty);
        }
        if is_a_formula(text) {
            let formula = Formula::parse(&text[FORMULA_SIGN.len_utf8()..])?;
            return Ok(Content::Formula {
                formula,
                cache: OnceCell::new(),
            });
        }
        Ok(Content::Text(text.to_string()))
    }
}

/// One grid slot: its content and the positions whose formulas read it.
#[derive(Debug, Clone)]
pub(crate) struct Cell {
    content: Content,
    dependents: BTreeSet<Position>,
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

impl Cell {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            content: Content::Empty,
            dependents: BTreeSet::new(),
        }
    }

    pub(crate) fn with_content(content: Content) -> Self {
        Self {
            content,
            dependents: BTreeSet::new(),
        }
    }

    pub(crate) fn into_content(self) -> Content {
        self.content
    }

    /// Swap in new content, keeping the dependent set.
    pub(crate) fn set_content(&mut self, content: Content) {
        self.content = content;
    }

    /// Observable value. Formula cells evaluate against `source` on the first
    /// read and serve the cached value until invalidated.
    pub(crate) fn value<S: CellSource + ?Sized>(&self, source: &S) -> Value {
        match &self.content {
            Content::Empty => Value::empty(),
            Content::Text(text) => Value::Text(unescape(text).to_string()),
            Content::Formula { formula, cache } => cache
                .get_or_init(|| {
                    let value = Value::from(formula.evaluate(source));
                    tracing::trace!("Evaluated ={} -> {}", formula.expression(), value);
                    value
                })
                .clone(),
        }
    }

    /// Raw text as entered; formulas are reprinted in canonical form.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.content {
            Content::Empty => String::new(),
            Content::Text(text) => text.clone(),
            Content::Formula { formula, .. } => {
                format!("{}{}", FORMULA_SIGN, formula.expression())
            }
        }
    }

    /// Positions named by this cell's formula, in source order, duplicates
    /// and invalid positions included.
    #[must_use]
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.references().to_vec()
    }

    pub(crate) fn references(&self) -> &[Position] {
        match &self.content {
            Content::Formula { formula, .. } => formula.ast().cells(),
            _ => &[],
        }
    }

    /// Valid, deduplicated references: the cells this one has back-edges in.
    pub(crate) fn precedents(&self) -> BTreeSet<Position> {
        self.references()
            .iter()
            .copied()
            .filter(Position::is_valid)
            .collect()
    }

    #[must_use]
    pub fn is_formula(&self) -> bool {
        matches!(self.content, Content::Formula { .. })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.content, Content::Empty)
    }

    /// Whether a computed value is currently memoized. Always false for
    /// non-formula cells.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        match &self.content {
            Content::Formula { cache, .. } => cache.get().is_some(),
            _ => false,
        }
    }

    /// Drop the memoized value. Returns whether there was one.
    pub(crate) fn invalidate_cache(&mut self) -> bool {
        match &mut self.content {
            Content::Formula { cache, .. } => cache.take().is_some(),
            _ => false,
        }
    }

    #[must_use]
    pub fn dependents(&self) -> &BTreeSet<Position> {
        &self.dependents
    }

    pub(crate) fn add_dependent(&mut self, pos: Position) {
        self.dependents.insert(pos);
    }

    pub(crate) fn remove_dependent(&mut self, pos: Position) {
        self.dependents.remove(&pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgrid_primitives::ErrorValue;
    use std::cell::Cell as Counter;

    struct NoCells;

    impl CellSource for NoCells {
        fn cell_value(&self, _pos: Position) -> Option<Value> {
            None
        }
    }

    struct CountingSource<'a>(&'a Counter<usize>);

    impl CellSource for CountingSource<'_> {
        fn cell_value(&self, _pos: Position) -> Option<Value> {
            self.0.set(self.0.get() + 1);
            Some(Value::Number(2.0))
        }
    }

    fn cell(text: &str) -> Cell {
        Cell::with_content(Content::from_text(text).unwrap())
    }

    #[test]
    fn test_classification() {
        assert!(cell("").is_empty());
        assert!(cell("=1").is_formula());
        assert!(!cell("=").is_formula());
        assert!(!cell("'=1").is_formula());
        assert!(!cell("12").is_formula());
        assert!(Content::from_text("=1+").is_err());
    }

    #[test]
    fn test_values_and_texts() {
        let empty = cell("");
        assert_eq!(empty.value(&NoCells), Value::empty());
        assert_eq!(empty.text(), "");

        let escaped = cell("'=A1");
        assert_eq!(escaped.value(&NoCells), Value::Text("=A1".to_string()));
        assert_eq!(escaped.text(), "'=A1");

        let sign = cell("=");
        assert_eq!(sign.value(&NoCells), Value::Text("=".to_string()));
        assert_eq!(sign.text(), "=");

        let formula = cell("= 1 + (2)");
        assert_eq!(formula.value(&NoCells), Value::Number(3.0));
        assert_eq!(formula.text(), "=1+2");
    }

    #[test]
    fn test_formula_cache_lifecycle() {
        let reads = Counter::new(0);
        let source = CountingSource(&reads);
        let mut formula = cell("=A1*A1");

        assert!(!formula.is_cached());
        assert_eq!(formula.value(&source), Value::Number(4.0));
        assert_eq!(reads.get(), 2);
        assert!(formula.is_cached());

        assert_eq!(formula.value(&source), Value::Number(4.0));
        assert_eq!(reads.get(), 2);

        assert!(formula.invalidate_cache());
        assert!(!formula.is_cached());
        assert!(!formula.invalidate_cache());

        assert_eq!(formula.value(&source), Value::Number(4.0));
        assert_eq!(reads.get(), 4);
    }

    #[test]
    fn test_errors_are_cached() {
        let mut formula = cell("=1/0");
        assert_eq!(
            formula.value(&NoCells),
            Value::Error(ErrorValue::Arithmetic)
        );
        assert!(formula.is_cached());
        assert!(formula.invalidate_cache());
    }

    #[test]
    fn test_references_and_precedents() {
        let formula = cell("=B1+A1+B1+ZZZZ1");
        assert_eq!(
            formula.referenced_cells(),
            vec![
                Position::new(0, 1),
                Position::new(0, 0),
                Position::new(0, 1),
                Position::NONE,
            ]
        );
        let precedents: Vec<_> = formula.precedents().into_iter().collect();
        assert_eq!(precedents, vec![Position::new(0, 0), Position::new(0, 1)]);

        assert!(cell("text").referenced_cells().is_empty());
    }

    #[test]
    fn test_set_content_keeps_dependents() {
        let mut target = cell("1");
        target.add_dependent(Position::new(3, 3));
        target.set_content(Content::Empty);
        assert!(target.is_empty());
        assert!(target.dependents().contains(&Position::new(3, 3)));
        target.remove_dependent(Position::new(3, 3));
        assert!(target.dependents().is_empty());
    }
}
