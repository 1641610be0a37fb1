use tracing::debug;

use crate::block::{Argument, BodyEntry, CodeBlock};
use crate::command::Command;
use crate::error::{Error, ErrorKind, Result};
use crate::token::{Token, TokenKind};

/// Fold a token stream into code blocks.
///
/// Arguments and body entries attach to the most recently opened block. Body
/// content before the first command has nowhere to go and is dropped.
pub fn assemble(tokens: impl IntoIterator<Item = Token>) -> Result<Vec<CodeBlock>> {
    let mut state = AssembleState::new();
    for token in tokens {
        state.push(token)?;
    }
    Ok(state.finish())
}

struct AssembleState {
    blocks: Vec<CodeBlock>,
    /// Index of the open block in `blocks`.
    open: Option<usize>,
}

impl AssembleState {
    fn new() -> Self {
        AssembleState {
            blocks: Vec::new(),
            open: None,
        }
    }

    fn push(&mut self, token: Token) -> Result<()> {
        match token.kind {
            TokenKind::Command => {
                let command = Command::from_alias(&token.value).ok_or_else(|| {
                    Error::new(ErrorKind::UnknownCommand(token.value.clone()), token.origin.clone())
                })?;
                self.blocks.push(CodeBlock::new(command, token.origin));
                self.open = Some(self.blocks.len() - 1);
            }
            TokenKind::Argument => {
                let Some(index) = self.open else {
                    return Err(Error::new(
                        ErrorKind::ArgumentWithoutCommand(token.value),
                        token.origin,
                    ));
                };
                let block = &mut self.blocks[index];
                let argument = Argument::parse(&token.value)
                    .map_err(|kind| Error::new(kind, token.origin.clone()))?;
                if !block.command.accepts(&argument.name) {
                    return Err(Error::new(
                        ErrorKind::UnknownArgument {
                            command: block.command,
                            name: argument.name,
                        },
                        token.origin,
                    ));
                }
                block.arguments.push(argument.at(token.origin));
            }
            TokenKind::Text | TokenKind::Image => {
                let Some(index) = self.open else {
                    debug!(token = %token, "dropping body content before first command");
                    return Ok(());
                };
                let entry = match token.kind {
                    TokenKind::Image => BodyEntry::Image(token.value),
                    _ => BodyEntry::Text(token.value),
                };
                self.blocks[index].body.push(entry);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<CodeBlock> {
        for block in &mut self.blocks {
            block.trim_body();
            debug!(
                command = %block.command,
                arguments = block.arguments.len(),
                body = block.body.len(),
                "assembled block"
            );
        }
        self.blocks
    }
}
