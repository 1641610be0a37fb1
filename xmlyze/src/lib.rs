pub mod block;
pub mod command;
pub mod error;
pub mod parser;
pub mod sheet;
pub mod style;
pub mod token;

pub use error::{Error, ErrorKind, Result};

use crate::block::CodeBlock;

/// A parsed sheet: the ordered instruction blocks ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Code blocks in row order.
    pub blocks: Vec<CodeBlock>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
