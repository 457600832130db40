//! Greedy line wrapping and block-height precomputation.

use crate::layout::hyphenation::hyphenate;
use crate::layout::text::visible;
use crate::layout::TextMeasure;

/// Packs whitespace-delimited tokens greedily into lines no wider than
/// `max_width`. Each `\n` starts a new line; an empty segment yields an empty
/// line. Tokens wider than the line are hyphenated.
pub fn split_lines<M: TextMeasure + ?Sized>(text: &str, max_width: f32, measure: &M) -> Vec<String> {
    let mut lines = Vec::new();

    for segment in text.split('\n') {
        let mut current = String::new();
        let start = lines.len();

        for token in segment.split_whitespace() {
            let candidate = if current.is_empty() {
                visible(token)
            } else {
                format!("{current} {}", visible(token))
            };
            if measure.width(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if measure.width(&visible(token)) <= max_width {
                current = visible(token);
            } else {
                let mut fragments = hyphenate(token, max_width, measure);
                current = fragments.pop().unwrap_or_default();
                lines.extend(fragments);
            }
        }

        if !current.is_empty() || lines.len() == start {
            lines.push(current);
        }
    }
    lines
}

/// Height of `text` wrapped at `width`: line count × `line_height` plus
/// `trailing` spacing. Blank text takes no space.
pub fn block_height<M: TextMeasure + ?Sized>(
    text: &str,
    measure: &M,
    width: f32,
    line_height: f32,
    trailing: f32,
) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }
    let count = split_lines(text, width, measure).len();
    count as f32 * line_height + trailing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(text: &str) -> f32 {
        text.chars().count() as f32
    }

    #[test]
    fn test_greedy_packing() {
        let lines = split_lines("one two three four", 9.0, &unit);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_newlines_force_breaks() {
        let lines = split_lines("one\n\ntwo", 20.0, &unit);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn test_lines_never_exceed_width() {
        let text = "Сосредоточенность и последовательность помогают удерживать вектор развития";
        for width in [6.0, 10.0, 18.0, 40.0] {
            let lines = split_lines(text, width, &unit);
            assert!(lines.iter().all(|line| unit(line) <= width), "{width}: {lines:?}");
        }
    }

    #[test]
    fn test_overlong_token_is_hyphenated_in_place() {
        let lines = split_lines("go сосредоточенность now", 8.0, &unit);
        assert_eq!(lines.first().map(String::as_str), Some("go"));
        assert_eq!(lines.last().map(String::as_str), Some("now"));
        let rejoined: String = lines[1..lines.len() - 1]
            .iter()
            .map(|line| line.trim_end_matches('-'))
            .collect();
        assert_eq!(rejoined, "сосредоточенность");
    }

    #[test]
    fn test_block_height_counts_lines() {
        assert_eq!(block_height("", &unit, 10.0, 12.0, 4.0), 0.0);
        assert_eq!(block_height("   ", &unit, 10.0, 12.0, 4.0), 0.0);
        assert_eq!(block_height("one two three four", &unit, 9.0, 12.0, 4.0), 40.0);
    }

    #[test]
    fn test_soft_hyphens_are_invisible_in_output() {
        let lines = split_lines("при\u{AD}мер", 20.0, &unit);
        assert_eq!(lines, vec!["пример"]);
    }
}
