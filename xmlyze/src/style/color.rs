use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ErrorKind;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{6}$").expect("hex color pattern compiles"));

/// Expand 3-digit shorthand (`abc` -> `aabbcc`) and check for exactly six hex digits.
/// Case is preserved.
pub fn normalize_color(value: &str) -> Result<String, ErrorKind> {
    let value = value.trim();
    let expanded: String = if value.chars().count() == 3 {
        value.chars().flat_map(|c| [c, c]).collect()
    } else {
        value.to_string()
    };
    if HEX_COLOR.is_match(&expanded) {
        Ok(expanded)
    } else {
        Err(ErrorKind::InvalidColor(value.to_string()))
    }
}
