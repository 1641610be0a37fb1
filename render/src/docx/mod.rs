//! WordprocessingML output: a `.docx` package holding a style part, one
//! paragraph per node and inline pictures for image nodes.

mod image;
mod media;
mod parts;

use std::io::{self, Seek, Write};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::document::{Document, Node};

pub use image::ImageFormat;
pub use media::MediaStore;

/// A4 portrait, in twips.
pub const PAGE_WIDTH: u32 = 11906;
pub const PAGE_HEIGHT: u32 = 16838;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("cannot write document package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("cannot write document: {0}")]
    Io(#[from] io::Error),

    #[error("cannot load image `{path}`: {error}")]
    Image {
        path: String,
        #[source]
        error: io::Error,
    },

    #[error("image `{0}` is not a PNG, JPEG, GIF or BMP file")]
    UnsupportedImage(String),

    #[error("cannot build document XML")]
    Format(#[from] std::fmt::Error),
}

/// An image part in the package, shared by every node with the same source.
#[derive(Debug)]
struct Picture {
    rel_id: String,
    /// Relative to `word/`.
    target: String,
    format: ImageFormat,
    width_emu: i64,
    height_emu: i64,
    data: Vec<u8>,
}

/// Write `document` as a `.docx` package. Image nodes are loaded through `media`.
pub fn write_docx<W: Write + Seek>(
    document: &Document,
    media: &MediaStore,
    writer: W,
) -> Result<W, DocxError> {
    let pictures = collect_pictures(document, media)?;

    let mut zip = ZipWriter::new(writer);
    add_part(&mut zip, "[Content_Types].xml", parts::content_types(&pictures)?.as_bytes())?;
    add_part(&mut zip, "_rels/.rels", parts::package_relationships().as_bytes())?;
    add_part(&mut zip, "word/document.xml", parts::document(document, &pictures)?.as_bytes())?;
    add_part(&mut zip, "word/styles.xml", parts::styles(document)?.as_bytes())?;
    add_part(
        &mut zip,
        "word/_rels/document.xml.rels",
        parts::document_relationships(&pictures)?.as_bytes(),
    )?;
    for picture in pictures.values() {
        add_part(&mut zip, &format!("word/{}", picture.target), &picture.data)?;
    }

    debug!(
        paragraphs = document.nodes.len(),
        styles = document.styles.len(),
        pictures = pictures.len(),
        "wrote docx package"
    );
    Ok(zip.finish()?)
}

/// Write `document` into an in-memory `.docx`.
pub fn to_docx_bytes(document: &Document, media: &MediaStore) -> Result<Vec<u8>, DocxError> {
    let cursor = write_docx(document, media, io::Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

fn add_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    content: &[u8],
) -> Result<(), DocxError> {
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(content)?;
    Ok(())
}

fn collect_pictures(
    document: &Document,
    media: &MediaStore,
) -> Result<IndexMap<String, Picture>, DocxError> {
    let text_width = PAGE_WIDTH.saturating_sub(document.page_margin.saturating_mul(2));
    let max_width_emu = i64::from(text_width) * image::EMU_PER_TWIP;

    let mut pictures: IndexMap<String, Picture> = IndexMap::new();
    for node in &document.nodes {
        let Node::Image { source, .. } = node else {
            continue;
        };
        if pictures.contains_key(source) {
            continue;
        }

        let data = media.load(source).map_err(|error| DocxError::Image {
            path: source.clone(),
            error,
        })?;
        let format = ImageFormat::detect(&data)
            .ok_or_else(|| DocxError::UnsupportedImage(source.clone()))?;
        let (width_emu, height_emu) =
            image::extent_emu(image::pixel_size(&data, format), max_width_emu);

        // rId1 is the style part
        let number = pictures.len() + 1;
        pictures.insert(
            source.clone(),
            Picture {
                rel_id: format!("rId{}", number + 1),
                target: format!("media/image{}.{}", number, format.extension()),
                format,
                width_emu,
                height_emu,
                data,
            },
        );
    }
    Ok(pictures)
}
