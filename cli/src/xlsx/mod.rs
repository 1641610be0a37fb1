//! `.xlsx` workbooks: the first worksheet, its shared strings, and pictures
//! placed in cells.

mod rich_data;
mod worksheet;

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use xmlyze::sheet::{CellKind, Row};

use rich_data::ImageIndex;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const FALLBACK_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("not a readable workbook: {0}")]
    Zip(#[from] ZipError),

    #[error("cannot read workbook: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML in `{part}`: {message}")]
    Xml { part: String, message: String },

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("cell {cell}: `{value}` is not a shared string index")]
    SharedString { cell: String, value: String },

    #[error("cell {cell}: the picture it shows is not in the workbook")]
    UnresolvedImage { cell: String },

    #[error("`{0}` is not a cell reference")]
    InvalidCellRef(String),
}

/// The first worksheet of a workbook.
#[derive(Debug)]
pub struct Workbook {
    pub rows: Vec<Row>,
    /// Picture bytes for every image cell, keyed by the cell value.
    pub images: BTreeMap<String, Vec<u8>>,
}

pub fn read_xlsx<R: Read + Seek>(reader: R) -> Result<Workbook, XlsxError> {
    let mut package = Package::new(reader)?;

    let sheet_part = first_worksheet(&mut package)?;
    let shared = match package.text(SHARED_STRINGS_PART)? {
        Some(xml) => worksheet::shared_strings(&xml, SHARED_STRINGS_PART)?,
        None => Vec::new(),
    };
    let image_index = ImageIndex::load(&mut package)?;
    let sheet_xml = package.text(&sheet_part)?.ok_or(XlsxError::NoWorksheet)?;
    let rows = worksheet::rows(&sheet_xml, &sheet_part, &shared, &image_index)?;

    let mut images = BTreeMap::new();
    for cell in rows.iter().flat_map(|row| &row.cells) {
        if cell.kind != CellKind::Image || images.contains_key(&cell.value) {
            continue;
        }
        if let Some(data) = package.bytes(&cell.value)? {
            images.insert(cell.value.clone(), data);
        }
    }

    debug!(
        sheet = %sheet_part,
        rows = rows.len(),
        shared_strings = shared.len(),
        images = images.len(),
        "read workbook"
    );
    Ok(Workbook { rows, images })
}

/// The part name of the first `<sheet>` listed in the workbook.
fn first_worksheet<R: Read + Seek>(package: &mut Package<R>) -> Result<String, XlsxError> {
    let Some(xml) = package.text(WORKBOOK_PART)? else {
        return Ok(FALLBACK_SHEET_PART.to_string());
    };

    let mut reader = Reader::from_str(&xml);
    let rel_id = loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                break attribute(&e, b"id");
            }
            Ok(Event::Eof) => return Err(XlsxError::NoWorksheet),
            Err(e) => return Err(xml_error(WORKBOOK_PART, e)),
            _ => {}
        }
    };

    let relationships = package.relationships(WORKBOOK_PART)?;
    Ok(rel_id
        .and_then(|id| relationships.get(&id).cloned())
        .unwrap_or_else(|| FALLBACK_SHEET_PART.to_string()))
}

/// Read access to the parts of an OPC package.
struct Package<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    fn new(reader: R) -> Result<Self, XlsxError> {
        Ok(Package {
            archive: ZipArchive::new(reader)?,
        })
    }

    fn bytes(&mut self, part: &str) -> Result<Option<Vec<u8>>, XlsxError> {
        let mut file = match self.archive.by_name(part) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    fn text(&mut self, part: &str) -> Result<Option<String>, XlsxError> {
        match self.bytes(part)? {
            Some(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|e| xml_error(part, e)),
            None => Ok(None),
        }
    }

    /// Relationship id -> resolved part name, for the relationships of `part`.
    fn relationships(&mut self, part: &str) -> Result<HashMap<String, String>, XlsxError> {
        let rels_part = relationships_part(part);
        let Some(xml) = self.text(&rels_part)? else {
            return Ok(HashMap::new());
        };

        let mut map = HashMap::new();
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    if attribute(&e, b"TargetMode").as_deref() == Some("External") {
                        continue;
                    }
                    if let (Some(id), Some(target)) =
                        (attribute(&e, b"Id"), attribute(&e, b"Target"))
                    {
                        map.insert(id, resolve_target(part, &target));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(xml_error(&rels_part, e)),
                _ => {}
            }
        }
        Ok(map)
    }
}

/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`
fn relationships_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of the part that owns it.
fn resolve_target(part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}

/// The unescaped value of the attribute whose local name is `name`.
fn attribute(element: &BytesStart, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| {
            let raw = std::str::from_utf8(&attr.value).ok()?;
            Some(match quick_xml::escape::unescape(raw) {
                Ok(value) => value.into_owned(),
                Err(_) => raw.to_string(),
            })
        })
}

fn push_text(out: &mut String, raw: &[u8], part: &str) -> Result<(), XlsxError> {
    let text = std::str::from_utf8(raw).map_err(|e| xml_error(part, e))?;
    match quick_xml::escape::unescape(text) {
        Ok(text) => out.push_str(&text),
        Err(_) => out.push_str(text),
    }
    Ok(())
}

/// Append the text an entity or character reference stands for.
fn push_reference(out: &mut String, raw: &[u8]) {
    let Ok(name) = std::str::from_utf8(raw) else {
        return;
    };
    let resolved = match name.strip_prefix('#') {
        Some(code) => {
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse().ok(),
            };
            value.and_then(char::from_u32).map(String::from)
        }
        None => quick_xml::escape::resolve_predefined_entity(name).map(String::from),
    };
    match resolved {
        Some(text) => out.push_str(&text),
        None => {
            out.push('&');
            out.push_str(name);
            out.push(';');
        }
    }
}

fn xml_error(part: &str, error: impl std::fmt::Display) -> XlsxError {
    XlsxError::Xml {
        part: part.to_string(),
        message: error.to_string(),
    }
}
