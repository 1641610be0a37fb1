use std::io::Write;

use pretty_assertions::assert_eq;

use render::{ConfigError, Node, RenderConfig, Rendered, render};
use xmlyze::ErrorKind;
use xmlyze::parser::Parser;
use xmlyze::sheet::{Cell, Row};

fn sheet(values: &[&[&str]]) -> Vec<Row> {
    values
        .iter()
        .enumerate()
        .map(|(i, row)| Row::from_strings(i, row))
        .collect()
}

fn run(values: &[&[&str]]) -> Result<Rendered, xmlyze::Error> {
    let script = Parser::new(sheet(values), 0).parse().expect("parse failed");
    render(&script, &RenderConfig::default())
}

fn paragraph(style: &str, text: &str) -> Node {
    Node::Paragraph {
        style: style.to_string(),
        text: text.to_string(),
    }
}

#[test]
fn styled_paragraph() {
    let rendered = run(&[
        &["style", "name=heading", "size=16"],
        &["p", "style=heading"],
        &["", "Hello"],
        &["", "World"],
    ])
    .unwrap();

    assert_eq!(
        rendered.document.nodes,
        vec![paragraph("Heading", "Hello"), paragraph("Heading", "World")]
    );
    assert_eq!(rendered.document.styles.len(), 1);
    assert_eq!(rendered.document.styles[0].size, 32);
    assert!(rendered.warnings.is_empty());
}

#[test]
fn style_reference_uses_identifier_derivation() {
    let rendered = run(&[&["s", "name=Heading One"], &["p", "style=heading-one"], &["", "x"]]).unwrap();
    assert_eq!(rendered.document.nodes, vec![paragraph("HeadingOne", "x")]);
}

#[test]
fn unstyled_paragraph_uses_default_style() {
    let rendered = run(&[&["p"], &["", "plain"]]).unwrap();
    assert_eq!(rendered.document.nodes, vec![paragraph("Normal", "plain")]);

    let rendered = run(&[&["p", "style=normal"], &["", "plain"]]).unwrap();
    assert_eq!(rendered.document.nodes, vec![paragraph("Normal", "plain")]);
}

#[test]
fn styles_may_follow_their_paragraphs() {
    let rendered = run(&[&["p", "style=late"], &["", "x"], &["s", "name=late"]]).unwrap();
    assert_eq!(rendered.document.nodes, vec![paragraph("Late", "x")]);
}

#[test]
fn unresolved_style_reference() {
    let err = run(&[&["p", "style=missing"], &["", "x"]]).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::UnresolvedStyleReference("missing".to_string())
    );
    assert_eq!(err.origin.unwrap().cell.to_string(), "B1");
}

#[test]
fn style_errors_abort_rendering() {
    let err = run(&[&["s", "color=fff"], &["p"], &["", "x"]]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingStyleName);
}

#[test]
fn images_and_blank_lines() {
    let rows = vec![
        Row::from_strings(0, &["p"]),
        Row::new(1, vec![Cell::empty(), Cell::image("media/chart.png")]),
        Row::from_strings(2, &[""]),
        Row::from_strings(3, &["", "caption"]),
    ];
    let script = Parser::new(rows, 0).parse().unwrap();
    let rendered = render(&script, &RenderConfig::default()).unwrap();
    assert_eq!(
        rendered.document.nodes,
        vec![
            Node::Image {
                style: "Normal".to_string(),
                source: "media/chart.png".to_string(),
            },
            paragraph("Normal", ""),
            paragraph("Normal", "caption"),
        ]
    );
    assert_eq!(
        rendered.document.outline(),
        "[Normal] <image media/chart.png>\n[Normal] \n[Normal] caption\n"
    );
}

#[test]
fn duplicate_style_arguments_warn() {
    let rendered = run(&[
        &["s", "name=a"],
        &["s", "name=b"],
        &["p", "style=a", "style=b"],
        &["", "x"],
    ])
    .unwrap();
    assert_eq!(rendered.document.nodes, vec![paragraph("B", "x")]);
    assert_eq!(rendered.warnings.len(), 1);
    assert!(rendered.warnings[0].message.contains("2 `style` arguments"));
    assert_eq!(rendered.warnings[0].origin.as_ref().unwrap().cell.to_string(), "A3");
}

#[test]
fn redeclared_style_warns_and_replaces() {
    let rendered = run(&[&["s", "name=a", "size=10"], &["s", "name=A", "size=14"]]).unwrap();
    assert_eq!(rendered.document.styles.len(), 1);
    assert_eq!(rendered.document.styles[0].size, 28);
    assert!(rendered.warnings[0].message.contains("declared more than once"));
}

#[test]
fn unknown_parent_and_style_body_warn() {
    let rendered = run(&[&["s", "name=child", "parent=ghost"], &["", "ignored"]]).unwrap();
    let messages: Vec<&str> = rendered.warnings.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "body content under style `child` is ignored",
            "style `Child` inherits from unknown style `Ghost`",
        ]
    );
    assert!(rendered.document.nodes.is_empty());
}

#[test]
fn parent_may_be_the_default_style() {
    let rendered = run(&[&["s", "name=quote", "parent=Normal"]]).unwrap();
    assert!(rendered.warnings.is_empty());
}

#[test]
fn document_display() {
    let rendered = run(&[
        &["s", "name=Title", "parent=normal", "color=00f", "font=Georgia"],
        &["p", "style=title"],
        &["", "Report"],
    ])
    .unwrap();
    assert_eq!(
        rendered.document.to_string(),
        "@page margin=1134\n\
         @style Title name=\"Title\" parent=Normal color=0000ff font=\"Georgia\" size=24\n\
         [Title] Report\n"
    );
}

#[test]
fn config_defaults_and_overrides() {
    assert_eq!(RenderConfig::from_toml_str("").unwrap(), RenderConfig::default());

    let config = RenderConfig::from_toml_str("page_margin = 1440\ndefault_style = \"Body Text\"").unwrap();
    assert_eq!(config.page_margin, 1440);

    let script = Parser::new(sheet(&[&["p"], &["", "x"]]), 0).parse().unwrap();
    let rendered = render(&script, &config).unwrap();
    assert_eq!(rendered.document.nodes, vec![paragraph("BodyText", "x")]);
    assert_eq!(rendered.document.page_margin, 1440);

    assert!(matches!(
        RenderConfig::from_toml_str("margin = 3"),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "page_margin = 720").unwrap();
    let config = RenderConfig::load(file.path()).unwrap();
    assert_eq!(config.page_margin, 720);
    assert_eq!(config.default_style, "Normal");

    let missing = file.path().with_extension("missing");
    assert!(matches!(
        RenderConfig::load(&missing),
        Err(ConfigError::Io { .. })
    ));
}
