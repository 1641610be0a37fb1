use tracing::trace;

use crate::sheet::{Cell, Classification, Row, classify};
use crate::token::{Origin, Token, TokenKind};

// ---------------------------------------------------------------------------
// Row tokenizer
// ---------------------------------------------------------------------------

/// Tokenize one row.
///
/// A command row yields a Command token followed by one Argument token per
/// remaining non-empty, non-comment cell. A body row yields exactly one token:
/// the first cell with content as Text or Image, or an empty Text token for a
/// blank line.
pub fn tokenize_row(row: &Row) -> Vec<Token> {
    if row.is_command_row() {
        tokenize_command_row(row)
    } else {
        vec![tokenize_body_row(row)]
    }
}

fn tokenize_command_row(row: &Row) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(row.cells.len());
    let mut cells = row.cells.iter().enumerate();

    if let Some((column, first)) = cells.next() {
        tokens.push(
            Token::command(first.value.trim().to_lowercase()).at(origin_of(row, column, first)),
        );
    }

    for (column, cell) in cells {
        if !cell.has_content() {
            continue;
        }
        tokens.push(Token::argument(cell.value.trim()).at(origin_of(row, column, cell)));
    }

    tokens
}

fn tokenize_body_row(row: &Row) -> Token {
    let content = row
        .cells
        .iter()
        .enumerate()
        .find(|(_, cell)| cell.has_content());

    match content {
        Some((column, cell)) => {
            let kind = match classify(cell) {
                Classification::Image => TokenKind::Image,
                Classification::Text | Classification::Empty => TokenKind::Text,
            };
            Token::new(kind, cell.value.as_str()).at(origin_of(row, column, cell))
        }
        None => {
            let span = row.cells.first().and_then(|cell| cell.span.clone());
            Token::text("").at(Origin::new(row.cell_ref(0), span))
        }
    }
}

fn origin_of(row: &Row, column: usize, cell: &Cell) -> Origin {
    Origin::new(row.cell_ref(column), cell.span.clone())
}

// ---------------------------------------------------------------------------
// Token stream builder
// ---------------------------------------------------------------------------

/// Concatenate the tokens of every row, in row order.
pub fn tokenize_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Vec<Token> {
    let mut tokens = Vec::new();
    for row in rows {
        let row_tokens = tokenize_row(row);
        trace!(row = row.index, count = row_tokens.len(), "tokenized row");
        tokens.extend(row_tokens);
    }
    tokens
}
