use std::collections::BTreeMap;

use super::{Cell, CellValue};

static EMPTY_VALUE: CellValue = CellValue::Empty;

/// A loaded workbook.
///
/// Keeps the original archive bytes so that saving only re-serializes the
/// sheets that were touched.
#[derive(Debug, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// Original XLSX bytes (needed for ZIP roundtrip).
    pub(crate) source: Option<Vec<u8>>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Whether any sheet was modified since load.
    pub fn is_dirty(&self) -> bool {
        self.sheets.iter().any(|s| s.dirty)
    }
}

/// A single worksheet: a sparse grid addressed by 1-based `(row, col)`.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    /// ZIP path of the worksheet part, e.g. `xl/worksheets/sheet1.xml`.
    pub(crate) path: String,
    pub(crate) rows: BTreeMap<u32, BTreeMap<u32, Cell>>,
    /// Last row of the current extent; may exceed the last stored row when
    /// blank rows were appended.
    pub(crate) max_row: u32,
    pub(crate) max_col: u32,
    pub(crate) dirty: bool,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn with_path(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// Last row of the current extent (0 for an empty sheet).
    pub fn row_count(&self) -> u32 {
        self.max_row
    }

    /// Last column of the current extent (0 for an empty sheet).
    pub fn column_count(&self) -> u32 {
        self.max_col
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(&row)?.get(&col)
    }

    /// Value at `(row, col)`; positions beyond the extent read as empty.
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        self.cell(row, col).map_or(&EMPTY_VALUE, |c| &c.value)
    }

    /// Values of one row from column 1 to the sheet's last column.
    pub fn row_values(&self, row: u32) -> Vec<CellValue> {
        (1..=self.max_col).map(|col| self.value(row, col).clone()).collect()
    }

    /// Write a value, keeping the cell's style and dropping any formula.
    ///
    /// Writing `Empty` to an unstyled cell removes it entirely.
    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue) {
        if row == 0 || col == 0 {
            return;
        }
        self.dirty = true;

        let row_cells = self.rows.entry(row).or_default();
        let styled = row_cells.get(&col).map(|c| c.style_idx.is_some());
        match (styled, value.is_empty()) {
            (Some(false) | None, true) => {
                row_cells.remove(&col);
                if row_cells.is_empty() {
                    self.rows.remove(&row);
                }
                return;
            }
            (Some(_), _) => {
                if let Some(cell) = row_cells.get_mut(&col) {
                    cell.value = value;
                    cell.formula = None;
                }
            }
            (None, false) => {
                row_cells.insert(
                    col,
                    Cell {
                        value,
                        ..Cell::default()
                    },
                );
            }
        }

        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }

    /// Visit every non-empty cell of a row in column order.
    pub fn for_each_non_empty_cell<F>(&self, row: u32, mut f: F)
    where
        F: FnMut(u32, &CellValue),
    {
        if let Some(cells) = self.rows.get(&row) {
            for (&col, cell) in cells {
                if !cell.value.is_empty() {
                    f(col, &cell.value);
                }
            }
        }
    }

    /// Whether the row holds no values (styled blank cells do not count).
    pub fn is_row_empty(&self, row: u32) -> bool {
        self.rows
            .get(&row)
            .map_or(true, |cells| cells.values().all(|c| c.value.is_empty()))
    }

    /// Append a row after the current extent, `values[0]` landing in column 1.
    ///
    /// Returns the new row number. The extent grows even when every value is
    /// empty, so consecutive appends never overwrite each other.
    pub fn append_row(&mut self, values: Vec<CellValue>) -> u32 {
        let row = self.max_row.saturating_add(1);
        for (col, value) in (1u32..).zip(values) {
            self.set_cell(row, col, value);
        }
        self.max_row = row;
        self.dirty = true;
        row
    }

    /// Remove every cell in rows `>= from`. Returns how many non-empty rows
    /// were cleared.
    pub fn clear_rows_from(&mut self, from: u32) -> u32 {
        let removed = self.rows.split_off(&from.max(1));
        let cleared = removed
            .values()
            .filter(|cells| cells.values().any(|c| !c.value.is_empty()))
            .count();
        if self.max_row >= from {
            self.dirty = true;
        }
        self.recompute_extent();
        u32::try_from(cleared).unwrap_or(u32::MAX)
    }

    /// Delete `count` rows starting at `start`, shifting later rows up.
    ///
    /// Returns the number of rows removed from the current extent.
    pub fn delete_rows(&mut self, start: u32, count: u32) -> u32 {
        if start == 0 || count == 0 || start > self.max_row {
            return 0;
        }
        let end = start.saturating_add(count);
        let deleted = end.min(self.max_row.saturating_add(1)) - start;

        let mut tail = self.rows.split_off(&start);
        let kept_tail = tail.split_off(&end);
        for (row, cells) in kept_tail {
            self.rows.insert(row - count, cells);
        }

        self.max_row -= deleted;
        self.max_col = self.stored_max_col();
        self.dirty = true;
        deleted
    }

    /// Iterate stored rows as `(row, cells)` in row order.
    pub(crate) fn stored_rows(&self) -> impl Iterator<Item = (u32, &BTreeMap<u32, Cell>)> {
        self.rows.iter().map(|(&r, cells)| (r, cells))
    }

    /// Insert a parsed cell without marking the sheet dirty.
    pub(crate) fn load_cell(&mut self, row: u32, col: u32, cell: Cell) {
        if row == 0 || col == 0 {
            return;
        }
        self.rows.entry(row).or_default().insert(col, cell);
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }

    fn stored_max_col(&self) -> u32 {
        self.rows
            .values()
            .filter_map(|cells| cells.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }

    fn recompute_extent(&mut self) {
        self.max_row = self.rows.keys().next_back().copied().unwrap_or(0);
        self.max_col = self.stored_max_col();
    }
}
