//! Sheet readers: CSV and TOML text, and `.xlsx` workbooks.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use toml::Spanned;

use xmlyze::sheet::{Cell, Row, column_index};

use crate::xlsx::{self, XlsxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Toml,
    Xlsx,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Option<SheetFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SheetFormat::Csv),
            "toml" => Some(SheetFormat::Toml),
            "xlsx" => Some(SheetFormat::Xlsx),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("unsupported sheet format '{0}' (expected .csv, .toml or .xlsx)")]
    UnsupportedFormat(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid workbook: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid TOML sheet: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("row {row}: `{column}` is not a column name")]
    InvalidColumn { row: usize, column: String },

    #[error("row {row}: unsupported cell value {value}")]
    InvalidCell { row: usize, value: String },

    #[error("row {row}: expected an array of cells or a table keyed by column")]
    InvalidRow { row: usize },
}

/// A sheet as read from disk.
#[derive(Debug)]
pub struct Sheet {
    pub rows: Vec<Row>,
    /// The text cell spans point into; empty for workbooks.
    pub source: String,
    /// Pictures carried inside the file, keyed by image cell value.
    pub images: BTreeMap<String, Vec<u8>>,
}

/// Read a sheet, choosing the reader by the file extension of `path`.
pub fn load_sheet(path: &Path) -> Result<Sheet, SheetError> {
    let format = SheetFormat::from_path(path)
        .ok_or_else(|| SheetError::UnsupportedFormat(path.display().to_string()))?;
    let io_error = |source: io::Error| SheetError::Io {
        path: path.display().to_string(),
        source,
    };

    match format {
        SheetFormat::Xlsx => {
            let file = File::open(path).map_err(io_error)?;
            let workbook = xlsx::read_xlsx(BufReader::new(file))?;
            Ok(Sheet {
                rows: workbook.rows,
                source: String::new(),
                images: workbook.images,
            })
        }
        SheetFormat::Csv | SheetFormat::Toml => {
            let source = std::fs::read_to_string(path).map_err(io_error)?;
            let rows = if format == SheetFormat::Csv {
                parse_csv(&source)?
            } else {
                parse_toml(&source)?
            };
            Ok(Sheet {
                rows,
                source,
                images: BTreeMap::new(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Every CSV line is one row, blank lines included. Cells that parse as numbers
/// are tagged numeric; CSV has no way to mark images.
pub fn parse_csv(source: &str) -> Result<Vec<Row>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source.as_bytes());

    let mut rows: Vec<Row> = Vec::new();
    let mut record = csv::StringRecord::new();
    // where the previous record's content ends; `None` before the first record
    let mut previous_end: Option<usize> = None;

    while reader.read_record(&mut record)? {
        let gap_start = previous_end.unwrap_or(0);
        let position = record
            .position()
            .map_or(gap_start, |p| p.byte() as usize)
            .clamp(gap_start, source.len());
        // the reported position may sit before the empty lines the reader skipped
        let rest = &source[position..];
        let start = position + rest.len() - rest.trim_start_matches(&['\r', '\n'][..]).len();

        // the reader passes over empty lines; each one is a blank row
        let breaks = count_line_breaks(&source[gap_start..start]);
        let blank_lines = match previous_end {
            Some(_) => breaks.saturating_sub(1),
            None => breaks,
        };
        push_blank_rows(&mut rows, blank_lines);

        let end = (reader.position().byte() as usize).clamp(start, source.len());
        let content = source[start..end].trim_end_matches(&['\r', '\n'][..]);
        let line_end = start + content.len();

        let mut cursor = start;
        let mut cells = Vec::with_capacity(record.len());
        for field in record.iter() {
            let span = match source[cursor..line_end].find(field) {
                Some(found) if !field.is_empty() => {
                    let field_start = cursor + found;
                    cursor = field_start + field.len();
                    field_start..cursor
                }
                _ => start..line_end,
            };
            cells.push(csv_cell(field).with_span(span));
        }
        rows.push(Row::new(rows.len(), cells));
        previous_end = Some(line_end);
    }

    // blank lines after the last record; the first break only terminates it
    let trailing = count_line_breaks(&source[previous_end.unwrap_or(0)..]);
    let blank_lines = match previous_end {
        Some(_) => trailing.saturating_sub(1),
        None => trailing,
    };
    push_blank_rows(&mut rows, blank_lines);

    Ok(rows)
}

/// `\r\n`, `\n` and a lone `\r` each count as one break.
fn count_line_breaks(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut count = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\n' => count += 1,
            b'\r' if bytes.get(i + 1) != Some(&b'\n') => count += 1,
            _ => {}
        }
    }
    count
}

fn push_blank_rows(rows: &mut Vec<Row>, count: usize) {
    for _ in 0..count {
        rows.push(Row::new(rows.len(), Vec::new()));
    }
}

fn csv_cell(field: &str) -> Cell {
    if field.trim().is_empty() {
        Cell::empty()
    } else if field.trim().parse::<f64>().is_ok() {
        Cell::numeric(field)
    } else {
        Cell::text(field)
    }
}

// ---------------------------------------------------------------------------
// TOML
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TomlSheet {
    #[serde(default)]
    rows: Vec<Spanned<toml::Value>>,
}

/// Read `rows = [...]`. Each row is an array of cells or a table keyed by column
/// letters; a cell is a string, a number, a boolean, or `{ image = "path" }`.
pub fn parse_toml(source: &str) -> Result<Vec<Row>, SheetError> {
    let sheet: TomlSheet = toml::from_str(source)?;
    let mut rows = Vec::with_capacity(sheet.rows.len());

    for (index, spanned) in sheet.rows.into_iter().enumerate() {
        let span = spanned.span();
        let row = match spanned.into_inner() {
            toml::Value::Array(values) => {
                let cells = values
                    .into_iter()
                    .map(|value| toml_cell(index, value).map(|cell| cell.with_span(span.clone())))
                    .collect::<Result<Vec<_>, _>>()?;
                Row::new(index, cells)
            }
            toml::Value::Table(table) => {
                let mut cells = BTreeMap::new();
                for (key, value) in table {
                    let column = column_index(&key).ok_or_else(|| SheetError::InvalidColumn {
                        row: index + 1,
                        column: key.clone(),
                    })?;
                    cells.insert(column, toml_cell(index, value)?.with_span(span.clone()));
                }
                Row::from_sparse(index, cells)
            }
            _ => return Err(SheetError::InvalidRow { row: index + 1 }),
        };
        rows.push(row);
    }

    Ok(rows)
}

fn toml_cell(index: usize, value: toml::Value) -> Result<Cell, SheetError> {
    let cell = match value {
        toml::Value::String(s) if s.trim().is_empty() => Cell::empty(),
        toml::Value::String(s) => Cell::text(s),
        toml::Value::Integer(n) => Cell::numeric(n.to_string()),
        toml::Value::Float(f) => Cell::numeric(f.to_string()),
        toml::Value::Boolean(b) => Cell::text(b.to_string()),
        toml::Value::Table(table) => {
            let image = match table.get("image") {
                Some(toml::Value::String(path)) if table.len() == 1 => Some(path.clone()),
                _ => None,
            };
            match image {
                Some(path) => Cell::image(path),
                None => {
                    return Err(SheetError::InvalidCell {
                        row: index + 1,
                        value: toml::Value::Table(table).to_string(),
                    });
                }
            }
        }
        other => {
            return Err(SheetError::InvalidCell {
                row: index + 1,
                value: other.to_string(),
            });
        }
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlyze::sheet::CellKind;

    fn values(row: &Row) -> Vec<&str> {
        row.cells.iter().map(|c| c.value.as_str()).collect()
    }

    #[test]
    fn csv_rows_and_spans() {
        let source = "p,style=heading\n,Hello\n,12\n";
        let rows = parse_csv(source).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(values(&rows[0]), vec!["p", "style=heading"]);
        assert_eq!(rows[1].cells[0].kind, CellKind::Empty);
        assert_eq!(rows[2].cells[1].kind, CellKind::Numeric);

        let span = rows[1].cells[1].span.clone().unwrap();
        assert_eq!(&source[span], "Hello");
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn csv_blank_lines_become_blank_rows() {
        let rows = parse_csv("p\n\n,text\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].cells.iter().all(|c| !c.has_content()));
        assert_eq!(values(&rows[2]), vec!["", "text"]);
    }

    #[test]
    fn csv_crlf_blank_lines_count_once() {
        let rows = parse_csv("p\r\n,a\r\n\r\n,b\r\n").unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[2].cells.iter().all(|c| !c.has_content()));
        assert_eq!(values(&rows[3]), vec!["", "b"]);

        let crlf = xmlyze::parser::Parser::new(rows, 0).parse().unwrap();
        let lf = xmlyze::parser::Parser::new(parse_csv("p\n,a\n\n,b\n").unwrap(), 0)
            .parse()
            .unwrap();
        assert_eq!(crlf.blocks[0].body, lf.blocks[0].body);
        assert_eq!(crlf.blocks[0].body.len(), 3);
    }

    #[test]
    fn csv_errors_after_blank_lines_point_at_the_right_row() {
        let rows = parse_csv("p\r\n\r\nbogus\r\n").unwrap();
        let err = xmlyze::parser::Parser::new(rows, 0).parse().unwrap_err();
        assert_eq!(
            err.kind,
            xmlyze::ErrorKind::UnknownCommand("bogus".to_string())
        );
        assert_eq!(err.origin.unwrap().cell.to_string(), "A3");
    }

    #[test]
    fn csv_trailing_and_leading_blank_lines() {
        assert_eq!(parse_csv("p\n\n").unwrap().len(), 2);
        assert_eq!(parse_csv("p\r\n\r\n\r\n").unwrap().len(), 3);
        assert_eq!(parse_csv("p\n").unwrap().len(), 1);
        assert_eq!(parse_csv("p").unwrap().len(), 1);

        let rows = parse_csv("\n\np,style=x\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(values(&rows[2]), vec!["p", "style=x"]);
        assert_eq!(rows[2].index, 2);

        let script = xmlyze::parser::Parser::new(parse_csv("p\n\n").unwrap(), 0)
            .parse()
            .unwrap();
        assert_eq!(
            script.blocks[0].body,
            vec![xmlyze::block::BodyEntry::Text(String::new())]
        );
    }

    #[test]
    fn csv_spans_survive_crlf() {
        let source = "p\r\n\r\n,Hello\r\n";
        let rows = parse_csv(source).unwrap();
        let span = rows[2].cells[1].span.clone().unwrap();
        assert_eq!(&source[span], "Hello");
    }

    #[test]
    fn csv_quoted_fields() {
        let rows = parse_csv("p\n,\"Hello, world\"\n").unwrap();
        assert_eq!(rows[1].cells[1].value, "Hello, world");
    }

    #[test]
    fn toml_dense_sparse_and_images() {
        let source = r#"
rows = [
    ["s", "name=Body", "size=11"],
    { A = "p", C = "style=body" },
    ["", { image = "media/a.png" }],
    ["", 42],
]
"#;
        let rows = parse_toml(source).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(values(&rows[1]), vec!["p", "", "style=body"]);
        assert_eq!(rows[2].cells[1].kind, CellKind::Image);
        assert_eq!(rows[2].cells[1].value, "media/a.png");
        assert_eq!(rows[3].cells[1].kind, CellKind::Numeric);

        let span = rows[0].cells[0].span.clone().unwrap();
        assert!(source[span].starts_with("[\"s\""));
    }

    #[test]
    fn toml_rejects_bad_columns_and_cells() {
        assert!(matches!(
            parse_toml("rows = [{ A1 = \"p\" }]"),
            Err(SheetError::InvalidColumn { row: 1, .. })
        ));
        assert!(matches!(
            parse_toml("rows = [[\"p\", [1, 2]]]"),
            Err(SheetError::InvalidCell { row: 1, .. })
        ));
        assert!(matches!(
            parse_toml("rows = [\"p\"]"),
            Err(SheetError::InvalidRow { row: 1 })
        ));
    }

    #[test]
    fn format_by_extension() {
        assert_eq!(SheetFormat::from_path(Path::new("a.CSV")), Some(SheetFormat::Csv));
        assert_eq!(SheetFormat::from_path(Path::new("a.toml")), Some(SheetFormat::Toml));
        assert_eq!(SheetFormat::from_path(Path::new("a.xlsx")), Some(SheetFormat::Xlsx));
        assert_eq!(SheetFormat::from_path(Path::new("a.ods")), None);
        assert!(matches!(
            load_sheet(Path::new("a.ods")),
            Err(SheetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn loads_text_sheets_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.csv");
        std::fs::write(&path, "p,style=x\n,hello\n").unwrap();

        let sheet = load_sheet(&path).unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.source, "p,style=x\n,hello\n");
        assert!(sheet.images.is_empty());

        let missing = load_sheet(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, SheetError::Io { .. }));
    }

    #[test]
    fn workbook_errors_surface_as_sheet_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xlsx");
        std::fs::write(&path, "not a zip").unwrap();
        assert!(matches!(load_sheet(&path), Err(SheetError::Xlsx(XlsxError::Zip(_)))));
    }
}
