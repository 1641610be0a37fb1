use pretty_assertions::assert_eq;

use xmlyze::ErrorKind;
use xmlyze::parser::Parser;
use xmlyze::sheet::Row;
use xmlyze::style::{
    DEFAULT_COLOR, DEFAULT_SIZE, FALLBACK_FONT, StyleDescriptor, normalize_color, parse_size,
    to_identifier,
};

fn style_from_row(cells: &[&str]) -> Result<StyleDescriptor, xmlyze::Error> {
    let script = Parser::new(vec![Row::from_strings(0, cells)], 0)
        .parse()
        .expect("style row should parse");
    StyleDescriptor::from_block(&script.blocks[0])
}

#[test]
fn identifiers() {
    assert_eq!(to_identifier("Heading One"), "HeadingOne");
    assert_eq!(to_identifier("my_style-2"), "MyStyle2");
    assert_eq!(to_identifier("  heading  "), "Heading");
    assert_eq!(to_identifier("BIG title"), "BigTitle");
    assert_eq!(to_identifier("--"), "");
}

#[test]
fn identifiers_keep_only_ascii_letters_and_digits() {
    assert_eq!(to_identifier("Café Title"), "CafTitle");
    assert_eq!(to_identifier("Überschrift"), "Berschrift");
    assert_eq!(to_identifier("日本"), "");

    let err = style_from_row(&["s", "name=日本"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStyleName("日本".to_string()));
}

#[test]
fn colors() {
    assert_eq!(normalize_color("abc"), Ok("aabbcc".to_string()));
    assert_eq!(normalize_color("ABCDEF"), Ok("ABCDEF".to_string()));
    assert_eq!(normalize_color("12"), Err(ErrorKind::InvalidColor("12".to_string())));
    assert_eq!(
        normalize_color("zz0000"),
        Err(ErrorKind::InvalidColor("zz0000".to_string()))
    );
    assert_eq!(normalize_color("xyz"), Err(ErrorKind::InvalidColor("xyz".to_string())));
}

#[test]
fn sizes_are_stored_in_half_points() {
    assert_eq!(parse_size("12"), Ok(24));
    assert_eq!(parse_size(" 9 "), Ok(18));
    assert_eq!(parse_size("large"), Err(ErrorKind::InvalidSize("large".to_string())));
    assert_eq!(parse_size("-4"), Err(ErrorKind::InvalidSize("-4".to_string())));
    assert_eq!(parse_size("12.5"), Err(ErrorKind::InvalidSize("12.5".to_string())));
}

#[test]
fn defaults() {
    let style = style_from_row(&["style", "name=Body"]).unwrap();
    assert_eq!(
        style,
        StyleDescriptor {
            id: "Body".to_string(),
            name: "Body".to_string(),
            parent: None,
            color: DEFAULT_COLOR.to_string(),
            font: FALLBACK_FONT.to_string(),
            size: DEFAULT_SIZE,
        }
    );
    assert_eq!(style.font, "Aptos");
}

#[test]
fn full_style() {
    let style = style_from_row(&[
        "s",
        "name=Heading One",
        "parent=body text",
        "color=f00",
        "size=16",
        "font=Georgia",
    ])
    .unwrap();
    assert_eq!(style.id, "HeadingOne");
    assert_eq!(style.name, "Heading One");
    assert_eq!(style.parent.as_deref(), Some("BodyText"));
    assert_eq!(style.color, "ff0000");
    assert_eq!(style.size, 32);
    assert_eq!(style.font, "Georgia");
}

#[test]
fn last_occurrence_wins() {
    let style = style_from_row(&["s", "name=a", "size=10", "name=b", "size=11"]).unwrap();
    assert_eq!(style.id, "B");
    assert_eq!(style.size, 22);
}

#[test]
fn missing_name() {
    let err = style_from_row(&["style", "color=zz0000"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingStyleName);
    // located at the command cell
    assert_eq!(err.origin.unwrap().cell.to_string(), "A1");
}

#[test]
fn invalid_color_once_named() {
    let err = style_from_row(&["style", "name=x", "color=zz0000"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidColor("zz0000".to_string()));
    assert_eq!(err.origin.unwrap().cell.to_string(), "C1");
}

#[test]
fn invalid_size() {
    let err = style_from_row(&["style", "name=x", "size=large"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidSize("large".to_string()));
}

#[test]
fn name_without_identifier_characters() {
    let err = style_from_row(&["style", "name=***"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStyleName("***".to_string()));
}

#[test]
fn canonical_constructor_derives_identifier() {
    let style = StyleDescriptor::new("quote block", None, "777777", "Georgia", 20);
    assert_eq!(style.id, "QuoteBlock");
    assert_eq!(style.name, "quote block");
}
