use std::fmt;

use xmlyze::style::StyleDescriptor;

/// The rendered document: page setup, style table, and content in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Twips.
    pub page_margin: u32,
    /// Identifier of the style unstyled paragraphs use.
    pub default_style: String,
    pub styles: Vec<StyleDescriptor>,
    pub nodes: Vec<Node>,
}

/// One line of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Paragraph { style: String, text: String },
    Image { style: String, source: String },
}

impl Node {
    pub fn style(&self) -> &str {
        match self {
            Node::Paragraph { style, .. } | Node::Image { style, .. } => style,
        }
    }
}

impl Document {
    /// The content lines only, one per node.
    pub fn outline(&self) -> String {
        self.nodes.iter().map(|node| format!("{}\n", node)).collect()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Paragraph { style, text } => write!(f, "[{}] {}", style, text),
            Node::Image { style, source } => write!(f, "[{}] <image {}>", style, source),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@page margin={}", self.page_margin)?;
        for style in &self.styles {
            write!(f, "@style {} name={:?}", style.id, style.name)?;
            if let Some(parent) = &style.parent {
                write!(f, " parent={}", parent)?;
            }
            writeln!(
                f,
                " color={} font={:?} size={}",
                style.color, style.font, style.size
            )?;
        }
        for node in &self.nodes {
            writeln!(f, "{}", node)?;
        }
        Ok(())
    }
}
