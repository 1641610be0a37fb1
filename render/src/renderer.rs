use tracing::{debug, warn};

use xmlyze::block::{BodyEntry, CodeBlock};
use xmlyze::command::Command;
use xmlyze::{Error, ErrorKind, Script};

use crate::config::RenderConfig;
use crate::document::{Document, Node};
use crate::registry::StyleRegistry;
use crate::warning::Warning;

/// A rendered document plus the warnings raised along the way.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub document: Document,
    pub warnings: Vec<Warning>,
}

/// Render a script in two passes: register every style, then lay out paragraphs.
/// Styles may therefore be declared after the paragraphs that use them.
pub fn render(script: &Script, config: &RenderConfig) -> xmlyze::Result<Rendered> {
    let mut warnings = Vec::new();
    let registry = StyleRegistry::collect(&script.blocks, &config.default_style, &mut warnings)?;

    let mut nodes = Vec::new();
    for block in &script.blocks {
        match block.command {
            Command::Paragraph => render_paragraph(block, &registry, &mut nodes, &mut warnings)?,
            // registered in the first pass
            Command::Style => {}
        }
    }

    for warning in &warnings {
        warn!("{}", warning);
    }
    debug!(nodes = nodes.len(), styles = registry.len(), "rendered document");

    Ok(Rendered {
        document: Document {
            page_margin: config.page_margin,
            default_style: registry.default_id().to_string(),
            styles: registry.iter().cloned().collect(),
            nodes,
        },
        warnings,
    })
}

fn render_paragraph(
    block: &CodeBlock,
    registry: &StyleRegistry,
    nodes: &mut Vec<Node>,
    warnings: &mut Vec<Warning>,
) -> xmlyze::Result<()> {
    let references: Vec<_> = block.arguments_named("style").collect();
    if references.len() > 1 {
        warnings.push(Warning::new(
            format!(
                "paragraph has {} `style` arguments; using the last one",
                references.len()
            ),
            block.origin.clone(),
        ));
    }

    let style = match references.last() {
        Some(arg) => registry.resolve(&arg.value).ok_or_else(|| {
            Error::new(
                ErrorKind::UnresolvedStyleReference(arg.value.clone()),
                arg.origin.clone(),
            )
        })?,
        None => registry.default_id().to_string(),
    };

    for entry in &block.body {
        nodes.push(match entry {
            BodyEntry::Text(text) => Node::Paragraph {
                style: style.clone(),
                text: text.clone(),
            },
            BodyEntry::Image(source) => Node::Image {
                style: style.clone(),
                source: source.clone(),
            },
        });
    }
    Ok(())
}
