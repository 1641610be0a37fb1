use indexmap::IndexMap;
use tracing::debug;

use xmlyze::block::CodeBlock;
use xmlyze::command::Command;
use xmlyze::style::{StyleDescriptor, to_identifier};
use xmlyze::token::Origin;

use crate::warning::Warning;

/// Every declared style, keyed by identifier, in declaration order.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: IndexMap<String, StyleDescriptor>,
    /// Identifier of the built-in default style.
    default_id: String,
}

impl StyleRegistry {
    pub fn new(default_style: &str) -> Self {
        StyleRegistry {
            styles: IndexMap::new(),
            default_id: to_identifier(default_style),
        }
    }

    /// Resolve every Style block. A redeclared identifier replaces the earlier
    /// descriptor in place.
    pub fn collect(
        blocks: &[CodeBlock],
        default_style: &str,
        warnings: &mut Vec<Warning>,
    ) -> xmlyze::Result<Self> {
        let mut registry = StyleRegistry::new(default_style);
        let mut parents: Vec<(String, String, Option<Origin>)> = Vec::new();

        for block in blocks.iter().filter(|b| b.command == Command::Style) {
            let style = StyleDescriptor::from_block(block)?;
            debug!(id = %style.id, "registered style");

            if !block.body.is_empty() {
                warnings.push(Warning::new(
                    format!("body content under style `{}` is ignored", style.name),
                    block.origin.clone(),
                ));
            }
            if let Some(parent) = &style.parent {
                parents.push((style.id.clone(), parent.clone(), block.origin.clone()));
            }
            if let Some(previous) = registry.styles.insert(style.id.clone(), style) {
                warnings.push(Warning::new(
                    format!(
                        "style `{}` is declared more than once; the last declaration wins",
                        previous.id
                    ),
                    block.origin.clone(),
                ));
            }
        }

        for (id, parent, origin) in parents {
            if !registry.contains(&parent) {
                warnings.push(Warning::new(
                    format!("style `{}` inherits from unknown style `{}`", id, parent),
                    origin,
                ));
            }
        }

        Ok(registry)
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// True for a declared identifier or the default style.
    pub fn contains(&self, id: &str) -> bool {
        id == self.default_id || self.styles.contains_key(id)
    }

    /// Map a paragraph's `style` value to a known identifier.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let id = to_identifier(reference);
        self.contains(&id).then_some(id)
    }

    pub fn get(&self, id: &str) -> Option<&StyleDescriptor> {
        self.styles.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleDescriptor> {
        self.styles.values()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
