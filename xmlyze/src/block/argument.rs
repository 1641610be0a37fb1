use std::fmt;

use crate::error::ErrorKind;
use crate::token::Origin;

/// A `name=value` pair attached to a code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Trimmed, lower-case.
    pub name: String,
    /// Trimmed; may contain further `=` characters.
    pub value: String,
    pub origin: Option<Origin>,
}

impl Argument {
    /// Split an argument payload on its first `=`.
    pub fn parse(payload: &str) -> Result<Argument, ErrorKind> {
        let (name, value) = payload
            .split_once('=')
            .ok_or_else(|| ErrorKind::MalformedArgument(payload.to_string()))?;
        Ok(Argument {
            name: name.trim().to_lowercase(),
            value: value.trim().to_string(),
            origin: None,
        })
    }

    pub fn at(mut self, origin: Option<Origin>) -> Self {
        self.origin = origin;
        self
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
