use std::collections::BTreeMap;
use std::mem;
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use xmlyze::sheet::{Cell, CellRef, Row};

use super::rich_data::ImageIndex;
use super::{XlsxError, attribute, push_reference, push_text, xml_error};

/// The shared string table. Rich text runs are joined; phonetic runs are dropped.
pub fn shared_strings(xml: &str, part: &str) -> Result<Vec<String>, XlsxError> {
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;
    let mut in_phonetic = false;

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" => in_text = in_item && !in_phonetic,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(e)) if in_text => push_text(&mut current, &e, part)?,
            Ok(Event::GeneralRef(e)) if in_text => push_reference(&mut current, &e),
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = false;
                    strings.push(mem::take(&mut current));
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
    }
    Ok(strings)
}

/// A `<c>` element being read.
struct PendingCell {
    row: usize,
    column: usize,
    kind: Option<String>,
    value_metadata: Option<usize>,
    value: String,
    inline: String,
}

struct PendingRow {
    index: usize,
    cells: BTreeMap<usize, Cell>,
}

/// Every row of the worksheet, in order. Rows the sheet skips come back empty
/// so row indices match the sheet.
pub fn rows(
    xml: &str,
    part: &str,
    shared: &[String],
    images: &ImageIndex,
) -> Result<Vec<Row>, XlsxError> {
    let mut rows = Vec::new();
    let mut row: Option<PendingRow> = None;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline = false;
    let mut in_text = false;
    let mut in_phonetic = false;

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    if let Some(done) = row.take() {
                        finish_row(&mut rows, done);
                    }
                    row = Some(start_row(&e, rows.len()));
                }
                b"c" => {
                    if let Some(current) = row.as_ref() {
                        cell = Some(start_cell(&e, current)?);
                    }
                }
                b"v" => in_value = cell.is_some(),
                b"is" => in_inline = cell.is_some(),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = in_inline && !in_phonetic,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    if let Some(done) = row.take() {
                        finish_row(&mut rows, done);
                    }
                    let empty = start_row(&e, rows.len());
                    finish_row(&mut rows, empty);
                }
                b"c" => {
                    if let Some(current) = row.as_mut() {
                        let pending = start_cell(&e, current)?;
                        let column = pending.column;
                        current.cells.insert(column, build_cell(pending, shared, images)?);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(pending) = cell.as_mut() {
                    if in_value {
                        push_text(&mut pending.value, &e, part)?;
                    } else if in_text {
                        push_text(&mut pending.inline, &e, part)?;
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(pending) = cell.as_mut() {
                    if in_value {
                        push_reference(&mut pending.value, &e);
                    } else if in_text {
                        push_reference(&mut pending.inline, &e);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                b"c" => {
                    if let (Some(pending), Some(current)) = (cell.take(), row.as_mut()) {
                        let column = pending.column;
                        current.cells.insert(column, build_cell(pending, shared, images)?);
                    }
                }
                b"row" => {
                    if let Some(done) = row.take() {
                        finish_row(&mut rows, done);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
    }
    if let Some(done) = row.take() {
        finish_row(&mut rows, done);
    }
    Ok(rows)
}

fn start_row(element: &BytesStart, next: usize) -> PendingRow {
    let index = attribute(element, b"r")
        .and_then(|r| r.trim().parse::<usize>().ok())
        .and_then(|r| r.checked_sub(1))
        .unwrap_or(next);
    PendingRow {
        index,
        cells: BTreeMap::new(),
    }
}

/// Cells without an `r` attribute follow the previous cell in the row.
fn start_cell(element: &BytesStart, row: &PendingRow) -> Result<PendingCell, XlsxError> {
    let (row_index, column) = match attribute(element, b"r") {
        Some(reference) => {
            let at = CellRef::from_str(&reference)
                .map_err(|_| XlsxError::InvalidCellRef(reference.clone()))?;
            (at.row, at.column)
        }
        None => (row.index, row.cells.keys().next_back().map_or(0, |c| c + 1)),
    };
    Ok(PendingCell {
        row: row_index,
        column,
        kind: attribute(element, b"t"),
        value_metadata: attribute(element, b"vm").and_then(|vm| vm.trim().parse().ok()),
        value: String::new(),
        inline: String::new(),
    })
}

fn finish_row(rows: &mut Vec<Row>, row: PendingRow) {
    while rows.len() < row.index {
        rows.push(Row::new(rows.len(), Vec::new()));
    }
    rows.push(Row::from_sparse(rows.len(), row.cells));
}

fn build_cell(
    cell: PendingCell,
    shared: &[String],
    images: &ImageIndex,
) -> Result<Cell, XlsxError> {
    let reference = CellRef::new(cell.row, cell.column).to_string();
    let built = match cell.kind.as_deref() {
        Some("s") => {
            let text = cell
                .value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| shared.get(index))
                .ok_or_else(|| XlsxError::SharedString {
                    cell: reference,
                    value: cell.value.clone(),
                })?;
            text_cell(text)
        }
        Some("inlineStr") => text_cell(&cell.inline),
        Some("str") => text_cell(&cell.value),
        Some("b") => text_cell(if cell.value.trim() == "1" { "TRUE" } else { "FALSE" }),
        Some("e") => match cell.value_metadata {
            Some(vm) => {
                let part = images
                    .resolve(vm)
                    .ok_or(XlsxError::UnresolvedImage { cell: reference })?;
                Cell::image(part)
            }
            None => text_cell(&cell.value),
        },
        _ if cell.value.trim().is_empty() => Cell::empty(),
        _ => Cell::numeric(cell.value),
    };
    Ok(built)
}

fn text_cell(value: &str) -> Cell {
    if value.trim().is_empty() {
        Cell::empty()
    } else {
        Cell::text(value)
    }
}
