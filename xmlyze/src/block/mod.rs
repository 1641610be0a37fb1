pub mod argument;

use std::fmt;

pub use argument::Argument;

use crate::command::Command;
use crate::token::Origin;

/// One line of body content under a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEntry {
    Text(String),
    /// Path or reference of an embedded image.
    Image(String),
}

impl BodyEntry {
    /// An empty text line.
    pub fn is_blank(&self) -> bool {
        matches!(self, BodyEntry::Text(text) if text.is_empty())
    }
}

/// One parsed instruction: a command, its arguments, and its body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub command: Command,
    /// Source order. Duplicate names are kept.
    pub arguments: Vec<Argument>,
    pub body: Vec<BodyEntry>,
    /// Cell holding the command name.
    pub origin: Option<Origin>,
}

impl CodeBlock {
    pub fn new(command: Command, origin: Option<Origin>) -> Self {
        CodeBlock {
            command,
            arguments: Vec::new(),
            body: Vec::new(),
            origin,
        }
    }

    /// The last argument with this name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().rev().find(|arg| arg.name == name)
    }

    /// Every argument with this name, in source order.
    pub fn arguments_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Argument> + 'a {
        self.arguments.iter().filter(move |arg| arg.name == name)
    }

    /// Drop leading and trailing blank lines. A single-entry body is left alone so
    /// a deliberate lone blank line survives.
    pub fn trim_body(&mut self) {
        if self.body.len() <= 1 {
            return;
        }
        let start = self
            .body
            .iter()
            .position(|entry| !entry.is_blank())
            .unwrap_or(self.body.len());
        let end = self
            .body
            .iter()
            .rposition(|entry| !entry.is_blank())
            .map_or(start, |last| last + 1);
        self.body.truncate(end);
        self.body.drain(..start);
    }
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.arguments {
            write!(f, " {}", arg)?;
        }
        writeln!(f)?;
        for entry in &self.body {
            match entry {
                BodyEntry::Text(text) => writeln!(f, "  | {}", text)?,
                BodyEntry::Image(path) => writeln!(f, "  ! {}", path)?,
            }
        }
        Ok(())
    }
}
