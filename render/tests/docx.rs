use std::io::{Cursor, Read};

use render::docx::to_docx_bytes;
use render::{DocxError, MediaStore, RenderConfig, render};
use xmlyze::parser::Parser;
use xmlyze::sheet::{Cell, Row};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data
}

fn document(rows: Vec<Row>) -> render::Document {
    let script = Parser::new(rows, 0).parse().expect("parse failed");
    render(&script, &RenderConfig::default())
        .expect("render failed")
        .document
}

fn part(package: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(package)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[test]
fn paragraphs_carry_their_style_id() {
    let doc = document(vec![
        Row::from_strings(0, &["s", "name=Heading One", "size=16", "color=f00"]),
        Row::from_strings(1, &["p", "style=heading one"]),
        Row::from_strings(2, &["", "Fish & Chips"]),
        Row::from_strings(3, &["p"]),
        Row::from_strings(4, &["", "plain"]),
    ]);
    let package = to_docx_bytes(&doc, &MediaStore::new()).unwrap();

    let body = part(&package, "word/document.xml");
    assert!(body.contains(
        r#"<w:p><w:pPr><w:pStyle w:val="HeadingOne"/></w:pPr><w:r><w:t xml:space="preserve">Fish &amp; Chips</w:t></w:r></w:p>"#
    ));
    assert!(body.contains(r#"<w:pStyle w:val="Normal"/>"#));
    assert!(body.contains(
        r#"<w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134""#
    ));
    assert!(body.contains(r#"<w:type w:val="continuous"/>"#));
}

#[test]
fn style_part_holds_every_descriptor() {
    let doc = document(vec![
        Row::from_strings(0, &["s", "name=Heading One", "size=16", "color=f00"]),
        Row::from_strings(1, &["s", "name=Quote", "parent=heading one", "font=Georgia"]),
    ]);
    let package = to_docx_bytes(&doc, &MediaStore::new()).unwrap();
    let styles = part(&package, "word/styles.xml");

    assert!(styles.contains(r#"w:default="1" w:styleId="Normal""#));
    assert!(styles.contains(r#"w:customStyle="1" w:styleId="HeadingOne"><w:name w:val="Heading One"/><w:basedOn w:val="Normal"/>"#));
    assert!(styles.contains(r#"<w:color w:val="ff0000"/><w:sz w:val="32"/><w:szCs w:val="32"/>"#));
    assert!(styles.contains(r#"w:styleId="Quote"><w:name w:val="Quote"/><w:basedOn w:val="HeadingOne"/>"#));
    assert!(styles.contains(r#"<w:rFonts w:ascii="Georgia" w:hAnsi="Georgia" w:cs="Georgia"/>"#));
    assert!(styles.contains(r#"<w:rFonts w:ascii="Aptos""#));
}

#[test]
fn declared_default_style_is_not_duplicated() {
    let doc = document(vec![Row::from_strings(0, &["s", "name=normal", "size=11"])]);
    let package = to_docx_bytes(&doc, &MediaStore::new()).unwrap();
    let styles = part(&package, "word/styles.xml");
    assert_eq!(styles.matches(r#"w:styleId="Normal""#).count(), 1);
    assert!(styles.contains(r#"w:default="1" w:styleId="Normal"><w:name w:val="normal"/><w:next"#));
}

#[test]
fn images_are_embedded_once_and_drawn_inline() {
    let doc = document(vec![
        Row::from_strings(0, &["p"]),
        Row::new(1, vec![Cell::empty(), Cell::image("media/chart.png")]),
        Row::new(2, vec![Cell::empty(), Cell::image("media/chart.png")]),
    ]);
    let mut media = MediaStore::new();
    media.insert("media/chart.png", png(96, 48));
    let package = to_docx_bytes(&doc, &media).unwrap();

    let body = part(&package, "word/document.xml");
    assert_eq!(body.matches(r#"<a:blip r:embed="rId2"/>"#).count(), 2);
    assert!(body.contains(r#"<wp:extent cx="914400" cy="457200"/>"#));
    assert!(body.contains(r#"<wp:docPr id="2" name="chart.png"/>"#));

    let rels = part(&package, "word/_rels/document.xml.rels");
    assert!(rels.contains(r#"Id="rId2""#));
    assert!(rels.contains(r#"Target="media/image1.png""#));
    assert!(!rels.contains(r#"Id="rId3""#));

    let types = part(&package, "[Content_Types].xml");
    assert!(types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));

    let mut archive = zip::ZipArchive::new(Cursor::new(&package[..])).unwrap();
    let mut image = Vec::new();
    archive
        .by_name("word/media/image1.png")
        .unwrap()
        .read_to_end(&mut image)
        .unwrap();
    assert_eq!(image, png(96, 48));
}

#[test]
fn images_load_from_the_media_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("pics")).unwrap();
    std::fs::write(dir.path().join("pics/logo.png"), png(10, 10)).unwrap();

    let doc = document(vec![
        Row::from_strings(0, &["p"]),
        Row::new(1, vec![Cell::empty(), Cell::image("pics/logo.png")]),
    ]);
    let package = to_docx_bytes(&doc, &MediaStore::with_root(dir.path())).unwrap();
    assert!(part(&package, "word/document.xml").contains("name=\"logo.png\""));
}

#[test]
fn wide_images_shrink_to_the_text_width() {
    let doc = document(vec![
        Row::from_strings(0, &["p"]),
        Row::new(1, vec![Cell::empty(), Cell::image("wide.png")]),
    ]);
    let mut media = MediaStore::new();
    media.insert("wide.png", png(4000, 1000));
    let package = to_docx_bytes(&doc, &media).unwrap();

    // (11906 - 2 * 1134) twips of text width
    let width = (11906 - 2 * 1134) * 635;
    assert!(part(&package, "word/document.xml")
        .contains(&format!(r#"<wp:extent cx="{}" cy="{}"/>"#, width, width / 4)));
}

#[test]
fn missing_and_unknown_images_fail() {
    let doc = document(vec![
        Row::from_strings(0, &["p"]),
        Row::new(1, vec![Cell::empty(), Cell::image("nowhere/ghost.png")]),
    ]);
    let err = to_docx_bytes(&doc, &MediaStore::new()).unwrap_err();
    assert!(matches!(err, DocxError::Image { ref path, .. } if path == "nowhere/ghost.png"));

    let mut media = MediaStore::new();
    media.insert("nowhere/ghost.png", b"plain text".to_vec());
    let err = to_docx_bytes(&doc, &media).unwrap_err();
    assert!(matches!(err, DocxError::UnsupportedImage(_)));
}

#[test]
fn multi_line_cells_become_line_breaks() {
    let doc = document(vec![
        Row::from_strings(0, &["p"]),
        Row::from_strings(1, &["", "first\nsecond"]),
    ]);
    let package = to_docx_bytes(&doc, &MediaStore::new()).unwrap();
    assert!(part(&package, "word/document.xml").contains(
        r#"<w:t xml:space="preserve">first</w:t><w:br/><w:t xml:space="preserve">second</w:t>"#
    ));
}
