/// Derive a style identifier from a display name.
///
/// Splits on runs of anything other than ASCII letters and digits, title-cases
/// each word and joins them: `"Heading One"` -> `"HeadingOne"`,
/// `"my_style-2"` -> `"MyStyle2"`. Non-ASCII letters are separators, so
/// `"Café Title"` -> `"CafTitle"`. Paragraph `style` references are matched
/// through the same function.
pub fn to_identifier(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect()
}

fn title_case(word: &str) -> String {
    let mut word = word.to_ascii_lowercase();
    if let Some(first) = word.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    word
}
