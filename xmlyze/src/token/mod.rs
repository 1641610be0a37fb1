use std::fmt;
use std::ops::Range;

use crate::sheet::CellRef;

/// Where a token (or anything built from it) came from in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub cell: CellRef,
    /// Byte span in the source text, when the reader tracked one.
    pub span: Option<Range<usize>>,
}

impl Origin {
    pub fn new(cell: CellRef, span: Option<Range<usize>>) -> Self {
        Origin { cell, span }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Command,
    Argument,
    Text,
    Image,
}

/// The atomic unit of the parsed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub origin: Option<Origin>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Token {
            kind,
            value: value.into(),
            origin: None,
        }
    }

    pub fn command(value: impl Into<String>) -> Self {
        Token::new(TokenKind::Command, value)
    }

    pub fn argument(value: impl Into<String>) -> Self {
        Token::new(TokenKind::Argument, value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Token::new(TokenKind::Text, value)
    }

    pub fn image(value: impl Into<String>) -> Self {
        Token::new(TokenKind::Image, value)
    }

    pub fn at(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// A blank-line token: Text with an empty payload.
    pub fn is_blank(&self) -> bool {
        self.kind == TokenKind::Text && self.value.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.value)?;
        if let Some(origin) = &self.origin {
            write!(f, " @ {}", origin.cell)?;
        }
        Ok(())
    }
}
