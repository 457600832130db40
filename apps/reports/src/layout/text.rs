//! Text preparation before measurement.

/// Soft hyphen. Marks a preferred break point inside a word.
pub const SOFT_HYPHEN: char = '\u{AD}';

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

/// Strips zero-width and control characters, keeping `\n`. Tabs become spaces.
/// Soft hyphens survive so the hyphenator can use them.
pub fn prepare_text(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            '\r' => None,
            c if is_zero_width(c) => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// The text as it will be drawn: soft hyphens removed.
pub fn visible(text: &str) -> String {
    text.chars().filter(|c| *c != SOFT_HYPHEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_text_strips_invisible_chars() {
        assert_eq!(prepare_text("a\u{200B}b\u{FEFF}c"), "abc");
        assert_eq!(prepare_text("a\tb\r\nc\u{7}"), "a b\nc");
    }

    #[test]
    fn test_prepare_text_keeps_soft_hyphens() {
        assert_eq!(prepare_text("при\u{AD}мер"), "при\u{AD}мер");
        assert_eq!(visible("при\u{AD}мер"), "пример");
    }
}
