//! Pictures placed in cells. Such a cell is an error cell whose `vm` attribute
//! points through the value metadata to a rich value, and from there through
//! the rich value relationships to a media part.

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::Event;

use super::{Package, XlsxError, attribute, push_reference, push_text, xml_error};

const METADATA_PART: &str = "xl/metadata.xml";
const RICH_VALUE_PART: &str = "xl/richData/rdrichvalue.xml";
const STRUCTURE_PART: &str = "xl/richData/rdrichvaluestructure.xml";
const RELATIONS_PART: &str = "xl/richData/richValueRel.xml";

const IMAGE_KEY: &str = "_rvRel:LocalImageIdentifier";

/// Media part for each value metadata record, by position.
#[derive(Debug, Default)]
pub struct ImageIndex {
    targets: Vec<Option<String>>,
}

impl ImageIndex {
    pub fn load<R: Read + Seek>(package: &mut Package<R>) -> Result<Self, XlsxError> {
        let Some(rich_values) = package.text(RICH_VALUE_PART)? else {
            return Ok(ImageIndex::default());
        };
        let rich_values = rich_values_of(&rich_values)?;
        let key_positions = match package.text(STRUCTURE_PART)? {
            Some(xml) => image_key_positions(&xml)?,
            None => Vec::new(),
        };
        let relation_ids = match package.text(RELATIONS_PART)? {
            Some(xml) => relation_ids(&xml)?,
            None => Vec::new(),
        };
        let relationships = package.relationships(RELATIONS_PART)?;

        // Without a metadata part, value metadata n is rich value n.
        let value_to_rich: Vec<Option<usize>> = match package.text(METADATA_PART)? {
            Some(xml) => value_metadata(&xml)?,
            None => (0..rich_values.len()).map(Some).collect(),
        };

        let targets = value_to_rich
            .into_iter()
            .map(|rich| {
                let value = rich_values.get(rich?)?;
                let position = value
                    .structure
                    .and_then(|s| key_positions.get(s).copied().flatten())
                    .unwrap_or(0);
                let relation: usize = value.values.get(position)?.trim().parse().ok()?;
                relationships.get(relation_ids.get(relation)?).cloned()
            })
            .collect();
        Ok(ImageIndex { targets })
    }

    /// The media part for a cell's one-based `vm` attribute.
    pub fn resolve(&self, value_metadata: usize) -> Option<&str> {
        self.targets
            .get(value_metadata.checked_sub(1)?)?
            .as_deref()
    }
}

struct RichValue {
    structure: Option<usize>,
    values: Vec<String>,
}

fn rich_values_of(xml: &str) -> Result<Vec<RichValue>, XlsxError> {
    let mut values = Vec::new();
    let mut current: Option<RichValue> = None;
    let mut text: Option<String> = None;

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"rv" => {
                    current = Some(RichValue {
                        structure: attribute(&e, b"s").and_then(|s| s.trim().parse().ok()),
                        values: Vec::new(),
                    })
                }
                b"v" => text = Some(String::new()),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"v" => {
                if let Some(value) = current.as_mut() {
                    value.values.push(String::new());
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(text) = text.as_mut() {
                    push_text(text, &e, RICH_VALUE_PART)?;
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(text) = text.as_mut() {
                    push_reference(text, &e);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => {
                    if let (Some(value), Some(text)) = (current.as_mut(), text.take()) {
                        value.values.push(text);
                    }
                }
                b"rv" => values.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(RICH_VALUE_PART, e)),
            _ => {}
        }
    }
    Ok(values)
}

/// For each structure, where its image identifier key sits among its keys.
fn image_key_positions(xml: &str) -> Result<Vec<Option<usize>>, XlsxError> {
    let mut positions = Vec::new();
    let mut keys: Vec<String> = Vec::new();

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"s" => keys.clear(),
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"k" => {
                keys.push(attribute(&e, b"n").unwrap_or_default());
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"s" => positions.push(None),
            Ok(Event::End(e)) if e.local_name().as_ref() == b"s" => {
                positions.push(keys.iter().position(|k| k == IMAGE_KEY));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(STRUCTURE_PART, e)),
            _ => {}
        }
    }
    Ok(positions)
}

fn relation_ids(xml: &str) -> Result<Vec<String>, XlsxError> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"rel" => {
                ids.push(attribute(&e, b"id").unwrap_or_default());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(RELATIONS_PART, e)),
            _ => {}
        }
    }
    Ok(ids)
}

/// Rich value index for each value metadata block. Blocks that point at
/// anything other than rich value metadata map to `None`.
fn value_metadata(xml: &str) -> Result<Vec<Option<usize>>, XlsxError> {
    let mut rich_blocks: Vec<Option<usize>> = Vec::new();
    let mut metadata_types: Vec<String> = Vec::new();
    let mut in_rich_future = false;
    let mut in_values = false;
    let mut value_blocks: Vec<Option<(usize, usize)>> = Vec::new();

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"metadataType" => metadata_types.push(attribute(&e, b"name").unwrap_or_default()),
                b"futureMetadata" => {
                    in_rich_future = attribute(&e, b"name").as_deref() == Some("XLRICHVALUE");
                }
                b"bk" if in_rich_future => rich_blocks.push(None),
                b"rvb" if in_rich_future => {
                    if let Some(last) = rich_blocks.last_mut() {
                        *last = attribute(&e, b"i").and_then(|i| i.trim().parse().ok());
                    }
                }
                b"valueMetadata" => in_values = true,
                b"bk" if in_values => value_blocks.push(None),
                b"rc" if in_values => {
                    let record = attribute(&e, b"t")
                        .and_then(|t| t.trim().parse().ok())
                        .zip(attribute(&e, b"v").and_then(|v| v.trim().parse().ok()));
                    if let Some(last) = value_blocks.last_mut().filter(|last| last.is_none()) {
                        *last = record;
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"futureMetadata" => in_rich_future = false,
                b"valueMetadata" => in_values = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(METADATA_PART, e)),
            _ => {}
        }
    }

    // `rc t` is a one-based index into the metadata types.
    let rich_type = metadata_types
        .iter()
        .position(|name| name == "XLRICHVALUE")
        .map(|p| p + 1);
    Ok(value_blocks
        .into_iter()
        .map(|record| {
            let (kind, value) = record?;
            if rich_type.is_some_and(|t| t != kind) {
                return None;
            }
            rich_blocks.get(value).copied().flatten()
        })
        .collect())
}
