use std::fmt;

use codespan_reporting::diagnostic::{Diagnostic, Label};

use xmlyze::token::Origin;

/// Something suspicious that does not stop rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub origin: Option<Origin>,
}

impl Warning {
    pub fn new(message: impl Into<String>, origin: Option<Origin>) -> Self {
        Warning {
            message: message.into(),
            origin,
        }
    }

    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let mut diagnostic = Diagnostic::warning().with_message(&self.message);
        if let Some(origin) = &self.origin {
            if let Some(span) = &origin.span {
                diagnostic = diagnostic.with_labels(vec![Label::primary(file_id, span.clone())]);
            }
            diagnostic = diagnostic.with_notes(vec![format!("at cell {}", origin.cell)]);
        }
        diagnostic
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(origin) = &self.origin {
            write!(f, " (at {})", origin.cell)?;
        }
        Ok(())
    }
}
