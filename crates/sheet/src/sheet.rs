use crate::cell::{Cell, Content};
use crate::error::{Result, SheetError};
use crate::graph::{self, CellMap};
use cellgrid_formulas::CellSource;
use cellgrid_primitives::address::positions_in;
use cellgrid_primitives::{Position, Size, Value};
use std::collections::BTreeSet;
use std::io::{self, Write};

/// A grid of cells with formula dependency tracking.
///
/// Formula values are computed lazily and memoized; every edit drops the
/// memoized values of the edited cell and of everything that reads it,
/// directly or transitively.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    cells: CellMap,
    occupied: BTreeSet<Position>,
}

/// Read-only view of one occupied cell.
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    sheet: &'a Sheet,
    pos: Position,
    cell: &'a Cell,
}

impl<'a> CellRef<'a> {
    #[must_use]
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Evaluated value; formula results are memoized.
    #[must_use]
    pub fn value(&self) -> Value {
        self.sheet.evaluate(self.pos, self.cell)
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.cell.text()
    }

    #[must_use]
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.cell.referenced_cells()
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cell.is_cached()
    }

    #[must_use]
    pub fn is_formula(&self) -> bool {
        self.cell.is_formula()
    }
}

fn ensure_valid(pos: Position) -> Result<()> {
    if pos.is_valid() {
        Ok(())
    } else {
        Err(SheetError::InvalidPosition(pos))
    }
}

impl Sheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content of a cell from raw text.
    ///
    /// `""` empties the cell, `=` followed by an expression installs a
    /// formula, and anything else is stored as text. A leading `'` keeps
    /// formula-looking text literal. On error the sheet is unchanged.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        ensure_valid(pos)?;

        // Same text means same content, so nothing downstream can be stale.
        if self.occupied.contains(&pos) && self.cells.get(&pos).is_some_and(|c| c.text() == text)
        {
            return Ok(());
        }

        let content = Content::from_text(text)?;
        let candidate = Cell::with_content(content);

        if let Some(cycle) = graph::find_cycle(&self.cells, pos, candidate.references()) {
            tracing::warn!("Rejected circular reference at {}", pos);
            return Err(SheetError::CircularDependency { cycle });
        }

        let new_precedents = candidate.precedents();
        let old_precedents = self
            .cells
            .get(&pos)
            .map(Cell::precedents)
            .unwrap_or_default();

        for stale in old_precedents.difference(&new_precedents) {
            self.detach(*stale, pos);
        }

        self.cells
            .entry(pos)
            .or_default()
            .set_content(candidate.into_content());
        for precedent in &new_precedents {
            self.cells.entry(*precedent).or_default().add_dependent(pos);
        }
        self.occupied.insert(pos);

        let dropped = graph::invalidate(&mut self.cells, pos);
        tracing::debug!(
            "Set {} to {:?} ({} precedents, {} cached values dropped)",
            pos,
            text,
            new_precedents.len(),
            dropped
        );
        Ok(())
    }

    /// Look up an occupied cell. Positions that were never set, or were
    /// cleared, are `None`.
    pub fn get_cell(&self, pos: Position) -> Result<Option<CellRef<'_>>> {
        ensure_valid(pos)?;
        Ok(self.occupied_cell(pos).map(|cell| CellRef {
            sheet: self,
            pos,
            cell,
        }))
    }

    /// Remove a cell's content. Formulas that still reference the position
    /// see it as absent (zero) from now on.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        ensure_valid(pos)?;
        if !self.occupied.remove(&pos) {
            return Ok(());
        }

        let dropped = graph::invalidate(&mut self.cells, pos);
        let precedents = self
            .cells
            .get(&pos)
            .map(Cell::precedents)
            .unwrap_or_default();
        for precedent in precedents {
            self.detach(precedent, pos);
        }
        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.set_content(Content::Empty);
        }
        self.prune_placeholder(pos);

        tracing::debug!("Cleared {} ({} cached values dropped)", pos, dropped);
        Ok(())
    }

    /// Smallest rectangle anchored at A1 covering every occupied cell.
    #[must_use]
    pub fn printable_size(&self) -> Size {
        self.occupied.iter().fold(Size::EMPTY, |size, pos| {
            Size::new(size.rows.max(pos.row + 1), size.cols.max(pos.col + 1))
        })
    }

    /// Value at `pos`, empty text when nothing is there.
    pub fn value_at(&self, pos: Position) -> Result<Value> {
        Ok(self
            .get_cell(pos)?
            .map_or_else(Value::empty, |cell| cell.value()))
    }

    /// Text at `pos`, empty when nothing is there.
    pub fn text_at(&self, pos: Position) -> Result<String> {
        Ok(self
            .get_cell(pos)?
            .map(|cell| cell.text())
            .unwrap_or_default())
    }

    /// Rendered values of the printable area, row by row.
    #[must_use]
    pub fn values(&self) -> Vec<Vec<String>> {
        self.render(|cell| cell.value().to_string())
    }

    /// Raw texts of the printable area, row by row.
    #[must_use]
    pub fn texts(&self) -> Vec<Vec<String>> {
        self.render(|cell| cell.text())
    }

    /// Write values of the printable area: tab between columns, newline after
    /// each row.
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_rows(out, &self.values())
    }

    /// Write texts of the printable area in the same layout as
    /// [`Sheet::print_values`].
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_rows(out, &self.texts())
    }

    /// Cells whose formulas reference `pos` directly.
    pub fn dependents_of(&self, pos: Position) -> Result<Vec<Position>> {
        ensure_valid(pos)?;
        Ok(self
            .cells
            .get(&pos)
            .map(|cell| cell.dependents().iter().copied().collect())
            .unwrap_or_default())
    }

    /// Valid cells referenced directly by the formula at `pos`, sorted and
    /// deduplicated.
    pub fn precedents_of(&self, pos: Position) -> Result<Vec<Position>> {
        ensure_valid(pos)?;
        Ok(self
            .occupied_cell(pos)
            .map(|cell| cell.precedents().into_iter().collect())
            .unwrap_or_default())
    }

    /// Occupied positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.occupied.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    fn occupied_cell(&self, pos: Position) -> Option<&Cell> {
        if self.occupied.contains(&pos) {
            self.cells.get(&pos)
        } else {
            None
        }
    }

    fn render<F>(&self, render_cell: F) -> Vec<Vec<String>>
    where
        F: Fn(CellRef<'_>) -> String,
    {
        let size = self.printable_size();
        let mut rows = vec![vec![String::new(); size.cols as usize]; size.rows as usize];
        for pos in positions_in(size.rows, size.cols) {
            if let Some(cell) = self.occupied_cell(pos) {
                rows[pos.row as usize][pos.col as usize] = render_cell(CellRef {
                    sheet: self,
                    pos,
                    cell,
                });
            }
        }
        rows
    }

    /// Evaluate `cell` at `pos`, computing uncached precedents bottom-up first
    /// so that the nested reads below only ever hit memoized values.
    fn evaluate(&self, pos: Position, cell: &Cell) -> Value {
        if cell.is_formula() && !cell.is_cached() {
            for precedent in graph::evaluation_order(&self.cells, pos) {
                if let Some(pending) = self.cells.get(&precedent) {
                    pending.value(self);
                }
            }
        }
        cell.value(self)
    }

    /// Remove the back-edge `precedent -> dependent`.
    fn detach(&mut self, precedent: Position, dependent: Position) {
        if let Some(cell) = self.cells.get_mut(&precedent) {
            cell.remove_dependent(dependent);
        }
        self.prune_placeholder(precedent);
    }

    /// Drop an implicit empty cell once nothing references it.
    fn prune_placeholder(&mut self, pos: Position) {
        if self.occupied.contains(&pos) {
            return;
        }
        if self
            .cells
            .get(&pos)
            .is_some_and(|cell| cell.is_empty() && cell.dependents().is_empty())
        {
            self.cells.remove(&pos);
        }
    }

    #[cfg(test)]
    pub(crate) fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl CellSource for Sheet {
    fn cell_value(&self, pos: Position) -> Option<Value> {
        self.cells.get(&pos).map(|cell| self.evaluate(pos, cell))
    }
}

fn write_rows<W: Write>(out: &mut W, rows: &[Vec<String>]) -> io::Result<()> {
    for row in rows {
        writeln!(out, "{}", row.join("\t"))?;
    }
    Ok(())
}
