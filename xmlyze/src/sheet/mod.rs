pub mod reference;

use std::ops::Range;

pub use reference::{CellRef, column_index, column_name};

/// How the spreadsheet reader tagged a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Absent or blank cell.
    Empty,
    Text,
    Numeric,
    /// The cell refers to an embedded image; its value is the image path.
    Image,
}

/// One resolved cell value.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: String,
    pub kind: CellKind,
    /// Byte span in the source text the sheet was read from, if any.
    pub span: Option<Range<usize>>,
}

impl Cell {
    /// Build a cell from the reader's `(value, is_image)` pair.
    pub fn new(value: impl Into<String>, is_image: bool) -> Self {
        let kind = if is_image { CellKind::Image } else { CellKind::Text };
        Cell {
            value: value.into(),
            kind,
            span: None,
        }
    }

    pub fn empty() -> Self {
        Cell {
            value: String::new(),
            kind: CellKind::Empty,
            span: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::new(value, false)
    }

    pub fn numeric(value: impl Into<String>) -> Self {
        Cell {
            value: value.into(),
            kind: CellKind::Numeric,
            span: None,
        }
    }

    pub fn image(path: impl Into<String>) -> Self {
        Cell::new(path, true)
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    /// True when the trimmed content starts with the `//` comment marker.
    pub fn is_comment(&self) -> bool {
        self.value.trim().starts_with("//")
    }

    /// True when the cell carries content: non-empty and not a comment.
    pub fn has_content(&self) -> bool {
        classify(self) != Classification::Empty && !self.is_comment()
    }
}

/// The classifier's view of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Empty,
    Text,
    Image,
}

/// Classify one cell. Numbers are text; anything blank after trimming is empty.
pub fn classify(cell: &Cell) -> Classification {
    if cell.value.trim().is_empty() {
        return Classification::Empty;
    }
    match cell.kind {
        CellKind::Image => Classification::Image,
        CellKind::Empty | CellKind::Text | CellKind::Numeric => Classification::Text,
    }
}

/// One spreadsheet row, cells in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Zero-based row index within the sheet.
    pub index: usize,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(index: usize, cells: Vec<Cell>) -> Self {
        Row { index, cells }
    }

    /// Build a row from cells addressed by column, filling gaps with empty cells.
    /// A later cell for an already-filled column replaces the earlier one.
    pub fn from_sparse(index: usize, cells: impl IntoIterator<Item = (usize, Cell)>) -> Self {
        let mut row = Vec::new();
        for (column, cell) in cells {
            if column >= row.len() {
                row.resize_with(column + 1, Cell::empty);
            }
            row[column] = cell;
        }
        Row { index, cells: row }
    }

    /// Build a row of text cells. Convenient for tests and plain-text readers.
    pub fn from_strings<S: AsRef<str>>(index: usize, values: &[S]) -> Self {
        let cells = values
            .iter()
            .map(|v| {
                if v.as_ref().is_empty() {
                    Cell::empty()
                } else {
                    Cell::text(v.as_ref())
                }
            })
            .collect();
        Row { index, cells }
    }

    /// A command row has a non-empty, non-comment first cell.
    pub fn is_command_row(&self) -> bool {
        self.cells.first().is_some_and(Cell::has_content)
    }

    pub fn cell_ref(&self, column: usize) -> CellRef {
        CellRef::new(self.index, column)
    }
}
