use std::fmt;
use std::str::FromStr;

/// A zero-based cell address, displayed in A1 notation (`B3` is row 2, column 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl CellRef {
    pub fn new(row: usize, column: usize) -> Self {
        CellRef { row, column }
    }
}

/// Convert a zero-based column index to its letter name: 0 -> `A`, 25 -> `Z`, 26 -> `AA`.
pub fn column_name(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert a column letter name back to its zero-based index. Case-insensitive.
/// Returns `None` for an empty name, any non-letter, or an index that overflows.
pub fn column_index(name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    let mut index: usize = 0;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.column), self.row + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCellRef(pub String);

impl fmt::Display for InvalidCellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell reference: {}", self.0)
    }
}

impl std::error::Error for InvalidCellRef {}

impl FromStr for CellRef {
    type Err = InvalidCellRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| InvalidCellRef(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        let column = column_index(letters).ok_or_else(|| InvalidCellRef(s.to_string()))?;
        let row: usize = digits
            .parse()
            .map_err(|_| InvalidCellRef(s.to_string()))?;
        if row == 0 {
            return Err(InvalidCellRef(s.to_string()));
        }
        Ok(CellRef {
            row: row - 1,
            column,
        })
    }
}
