use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

use crate::command::Command;
use crate::token::Origin;

/// Everything that can stop a run. None of these are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("argument `{0}` appears before any command")]
    ArgumentWithoutCommand(String),

    #[error("malformed argument `{0}`: expected `name=value`")]
    MalformedArgument(String),

    #[error("unknown argument `{name}` for command `{command}`")]
    UnknownArgument { command: Command, name: String },

    #[error("style has no `name` argument")]
    MissingStyleName,

    #[error("style name `{0}` has no letters or digits to build an identifier from")]
    InvalidStyleName(String),

    #[error("invalid color `{0}`: expected 3 or 6 hex digits")]
    InvalidColor(String),

    #[error("invalid size `{0}`: expected a whole number of points")]
    InvalidSize(String),

    #[error("unresolved style reference `{0}`")]
    UnresolvedStyleReference(String),
}

/// An error kind plus the cell it was detected at, when known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: Option<Origin>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(kind: ErrorKind, origin: Option<Origin>) -> Self {
        Error { kind, origin }
    }

    /// Render as a codespan diagnostic against the sheet source registered as `file_id`.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let mut diagnostic = Diagnostic::error().with_message(self.kind.to_string());
        if let Some(origin) = &self.origin {
            if let Some(span) = &origin.span {
                diagnostic = diagnostic.with_labels(vec![Label::primary(file_id, span.clone())]);
            }
            diagnostic = diagnostic.with_notes(vec![format!("at cell {}", origin.cell)]);
        }
        diagnostic
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { kind, origin: None }
    }
}
