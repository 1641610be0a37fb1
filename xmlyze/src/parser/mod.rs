pub mod assembler;
pub mod tokenizer;

pub use assembler::assemble;
pub use tokenizer::{tokenize_row, tokenize_rows};

use crate::Script;
use crate::error::Result;
use crate::sheet::Row;
use crate::token::Token;

/// Parser entry point.
pub struct Parser {
    rows: Vec<Row>,
    file_id: usize,
}

impl Parser {
    pub fn new(rows: Vec<Row>, file_id: usize) -> Self {
        Parser { rows, file_id }
    }

    /// The flat token stream for the whole sheet.
    pub fn tokens(&self) -> Vec<Token> {
        tokenize_rows(&self.rows)
    }

    /// Parse the sheet into a complete Script. Stops at the first error.
    pub fn parse(&self) -> Result<Script> {
        let blocks = assemble(self.tokens())?;
        Ok(Script {
            blocks,
            source_id: self.file_id,
        })
    }
}
