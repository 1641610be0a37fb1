//! The command schema: which names open a code block and which arguments each accepts.
//!
//! Adding a command means adding a variant, its aliases, and its arguments below.
//! The compiler points at every `match` that needs the new arm.

use std::fmt;

use phf::phf_map;

/// A recognized instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Paragraph,
    Style,
}

/// Alias -> command. Keys are lower-case.
static ALIASES: phf::Map<&'static str, Command> = phf_map! {
    "paragraph" => Command::Paragraph,
    "p" => Command::Paragraph,
    "style" => Command::Style,
    "s" => Command::Style,
};

impl Command {
    pub const ALL: [Command; 2] = [Command::Paragraph, Command::Style];

    /// Resolve a command name or alias, case-insensitively.
    pub fn from_alias(alias: &str) -> Option<Command> {
        ALIASES
            .get(alias)
            .or_else(|| ALIASES.get(alias.trim().to_lowercase().as_str()))
            .copied()
    }

    /// Canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Command::Paragraph => "paragraph",
            Command::Style => "style",
        }
    }

    pub fn legal_arguments(self) -> &'static [&'static str] {
        match self {
            Command::Paragraph => &["style"],
            Command::Style => &["name", "parent", "color", "size", "font"],
        }
    }

    /// `name` must already be lower-cased.
    pub fn accepts(self, name: &str) -> bool {
        self.legal_arguments().contains(&name)
    }

    /// Every alias that resolves to this command, sorted.
    pub fn aliases(self) -> Vec<&'static str> {
        let mut aliases: Vec<&'static str> = ALIASES
            .entries()
            .filter(|(_, command)| **command == self)
            .map(|(alias, _)| *alias)
            .collect();
        aliases.sort_unstable();
        aliases
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
