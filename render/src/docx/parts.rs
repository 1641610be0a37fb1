//! XML for the individual package parts.

use std::collections::BTreeSet;
use std::fmt::Write;

use indexmap::IndexMap;
use quick_xml::escape::escape;

use xmlyze::style::{DEFAULT_COLOR, DEFAULT_SIZE, FALLBACK_FONT, StyleDescriptor};

use super::{PAGE_HEIGHT, PAGE_WIDTH, Picture};
use crate::document::{Document, Node};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Paragraph spacing shared by every generated style: single line, no gaps.
const SPACING: &str = r#"<w:spacing w:before="0" w:after="0" w:line="276" w:lineRule="auto"/>"#;

pub fn content_types(pictures: &IndexMap<String, Picture>) -> Result<String, std::fmt::Error> {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let formats: BTreeSet<_> = pictures
        .values()
        .map(|p| (p.format.extension(), p.format.content_type()))
        .collect();
    for (extension, content_type) in formats {
        write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            extension, content_type
        )?;
    }

    xml.push_str(r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    xml.push_str("</Types>");
    Ok(xml)
}

pub fn package_relationships() -> String {
    format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/officeDocument" Target="word/document.xml"/></Relationships>"#,
        XML_DECLARATION, REL_BASE
    )
}

pub fn document_relationships(
    pictures: &IndexMap<String, Picture>,
) -> Result<String, std::fmt::Error> {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    write!(
        xml,
        r#"<Relationship Id="rId1" Type="{}/styles" Target="styles.xml"/>"#,
        REL_BASE
    )?;
    for picture in pictures.values() {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}/image" Target="{}"/>"#,
            picture.rel_id, REL_BASE, picture.target
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

pub fn document(
    document: &Document,
    pictures: &IndexMap<String, Picture>,
) -> Result<String, std::fmt::Error> {
    let mut xml = String::from(XML_DECLARATION);
    write!(
        xml,
        r#"<w:document xmlns:w="{}" xmlns:r="{}" xmlns:wp="{}" xmlns:a="{}" xmlns:pic="{}"><w:body>"#,
        NS_W, NS_R, NS_WP, NS_A, NS_PIC
    )?;

    let mut drawing_id = 0;
    for node in &document.nodes {
        write!(
            xml,
            r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr>"#,
            escape(node.style())
        )?;
        match node {
            Node::Paragraph { text, .. } => text_run(&mut xml, text)?,
            Node::Image { source, .. } => {
                if let Some(picture) = pictures.get(source) {
                    drawing_id += 1;
                    drawing(&mut xml, picture, source, drawing_id)?;
                }
            }
        }
        xml.push_str("</w:p>");
    }

    let margin = document.page_margin;
    write!(
        xml,
        r#"<w:sectPr><w:type w:val="continuous"/><w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#,
        PAGE_WIDTH,
        PAGE_HEIGHT,
        m = margin
    )?;
    xml.push_str("</w:body></w:document>");
    Ok(xml)
}

/// Line breaks inside a cell become `w:br`.
fn text_run(xml: &mut String, text: &str) -> std::fmt::Result {
    if text.is_empty() {
        return Ok(());
    }
    xml.push_str("<w:r>");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        write!(
            xml,
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            escape(line.trim_end_matches('\r'))
        )?;
    }
    xml.push_str("</w:r>");
    Ok(())
}

fn drawing(xml: &mut String, picture: &Picture, source: &str, id: u32) -> std::fmt::Result {
    let name = escape(source.rsplit(['/', '\\']).next().unwrap_or(source));
    let (cx, cy) = (picture.width_emu, picture.height_emu);
    write!(
        xml,
        concat!(
            r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
            r#"<wp:docPr id="{id}" name="{name}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="{ns_pic}"><pic:pic>"#,
            r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        ),
        cx = cx,
        cy = cy,
        id = id,
        name = name,
        ns_pic = NS_PIC,
        rel = picture.rel_id,
    )
}

pub fn styles(document: &Document) -> Result<String, std::fmt::Error> {
    let mut xml = String::from(XML_DECLARATION);
    write!(xml, r#"<w:styles xmlns:w="{}">"#, NS_W)?;
    write!(
        xml,
        r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{f}" w:hAnsi="{f}" w:cs="{f}"/><w:sz w:val="{s}"/><w:szCs w:val="{s}"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr>{}</w:pPr></w:pPrDefault></w:docDefaults>"#,
        SPACING,
        f = FALLBACK_FONT,
        s = DEFAULT_SIZE
    )?;

    let default_id = document.default_style.as_str();
    if !document.styles.iter().any(|style| style.id == default_id) {
        let builtin = StyleDescriptor {
            id: default_id.to_string(),
            name: default_id.to_string(),
            parent: None,
            color: DEFAULT_COLOR.to_string(),
            font: FALLBACK_FONT.to_string(),
            size: DEFAULT_SIZE,
        };
        write_style(&mut xml, &builtin, default_id)?;
    }
    for descriptor in &document.styles {
        write_style(&mut xml, descriptor, default_id)?;
    }

    xml.push_str("</w:styles>");
    Ok(xml)
}

fn write_style(xml: &mut String, style: &StyleDescriptor, default_id: &str) -> std::fmt::Result {
    let is_default = style.id == default_id;
    let id = escape(&style.id);
    write!(xml, r#"<w:style w:type="paragraph""#)?;
    if is_default {
        xml.push_str(r#" w:default="1""#);
    } else {
        xml.push_str(r#" w:customStyle="1""#);
    }
    write!(
        xml,
        r#" w:styleId="{}"><w:name w:val="{}"/>"#,
        id,
        escape(&style.name)
    )?;

    let based_on = match &style.parent {
        Some(parent) if parent != &style.id => Some(parent.as_str()),
        _ if !is_default => Some(default_id),
        _ => None,
    };
    if let Some(parent) = based_on {
        write!(xml, r#"<w:basedOn w:val="{}"/>"#, escape(parent))?;
    }
    write!(
        xml,
        r#"<w:next w:val="{}"/><w:uiPriority w:val="1"/><w:qFormat/>"#,
        escape(default_id)
    )?;

    let font = escape(&style.font);
    write!(
        xml,
        r#"<w:pPr>{}</w:pPr><w:rPr><w:rFonts w:ascii="{f}" w:hAnsi="{f}" w:cs="{f}"/><w:color w:val="{}"/><w:sz w:val="{s}"/><w:szCs w:val="{s}"/></w:rPr></w:style>"#,
        SPACING,
        style.color,
        f = font,
        s = style.size
    )
}
