//! Breaks a single token that is wider than the line.
//!
//! Break points are tried in priority order: soft hyphens and existing hyphens,
//! then a syllable heuristic, then a plain character split. Every fragment but
//! the last ends with `-`, and the hyphen is measured as part of the fragment.

use crate::layout::text::{visible, SOFT_HYPHEN};
use crate::layout::TextMeasure;

/// Minimum characters left on the final fragment of tokens longer than this.
const MIN_TAIL_CHARS: usize = 3;

const VOWELS: &str = "аеёиоуыэюяaeiouy";
const NO_BREAK_BEFORE: &str = "ьъй";

fn is_vowel(c: char) -> bool {
    c.to_lowercase().any(|lower| VOWELS.contains(lower))
}

fn is_consonant(c: char) -> bool {
    c.is_alphabetic() && !is_vowel(c) && !NO_BREAK_BEFORE.contains(c.to_lowercase().next().unwrap_or(c))
}

/// Splits `token` into fragments that each fit `max_width`.
///
/// A single character that is wider than `max_width` on its own is emitted
/// alone without a hyphen.
///
/// Fitting the width wins over the tail rule. The minimum tail is enforced
/// per split against the characters still left, so at widths too narrow for
/// both, a long token can end on a fragment shorter than three characters.
pub fn hyphenate<M: TextMeasure + ?Sized>(token: &str, max_width: f32, measure: &M) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut rest: Vec<char> = token.chars().collect();

    loop {
        let rest_text: String = rest.iter().collect();
        if rest.is_empty() {
            break;
        }
        if measure.width(&visible(&rest_text)) <= max_width {
            fragments.push(visible(&rest_text));
            break;
        }

        let visible_len = rest.iter().filter(|c| **c != SOFT_HYPHEN).count();
        match find_break(&rest, visible_len, max_width, measure) {
            Some(split) => {
                fragments.push(fragment_head(&rest[..split]));
                rest.drain(..split);
            }
            None => {
                // Nothing fits with a hyphen: emit one character alone.
                let first = rest.iter().position(|c| *c != SOFT_HYPHEN).unwrap_or(0);
                fragments.push(rest[first].to_string());
                rest.drain(..=first);
            }
        }
        while rest.first() == Some(&SOFT_HYPHEN) {
            rest.remove(0);
        }
    }
    fragments
}

/// The drawn head of a split: soft hyphens removed, one trailing `-`.
fn fragment_head(head: &[char]) -> String {
    let mut text: String = visible(&head.iter().collect::<String>());
    if !text.ends_with('-') {
        text.push('-');
    }
    text
}

fn find_break<M: TextMeasure + ?Sized>(
    chars: &[char],
    visible_len: usize,
    max_width: f32,
    measure: &M,
) -> Option<usize> {
    let fits = |split: usize| {
        let head = &chars[..split];
        head.iter().any(|c| *c != SOFT_HYPHEN)
            && measure.width(&fragment_head(head)) <= max_width
    };
    let tail_ok = |split: usize| {
        let tail = chars[split..].iter().filter(|c| **c != SOFT_HYPHEN).count();
        visible_len <= MIN_TAIL_CHARS || tail >= MIN_TAIL_CHARS
    };

    let explicit = (1..chars.len())
        .filter(|&i| chars[i - 1] == SOFT_HYPHEN || chars[i - 1] == '-')
        .filter(|&i| tail_ok(i))
        .filter(|&i| fits(i))
        .max();
    if explicit.is_some() {
        return explicit;
    }

    let syllable = (1..chars.len())
        .filter(|&i| is_syllable_break(chars, i))
        .filter(|&i| tail_ok(i))
        .filter(|&i| fits(i))
        .max();
    if syllable.is_some() {
        return syllable;
    }

    (1..chars.len()).filter(|&i| tail_ok(i)).filter(|&i| fits(i)).max()
}

/// Break between `chars[i - 1]` and `chars[i]`.
fn is_syllable_break(chars: &[char], i: usize) -> bool {
    let (prev, next) = (chars[i - 1], chars[i]);

    if (prev.is_alphabetic() && next.is_ascii_digit()) || (prev.is_ascii_digit() && next.is_alphabetic()) {
        return true;
    }
    if !prev.is_alphabetic() || !next.is_alphabetic() {
        return false;
    }
    if NO_BREAK_BEFORE.contains(next.to_lowercase().next().unwrap_or(next)) {
        return false;
    }
    let head_has_vowel = chars[..i].iter().any(|c| is_vowel(*c));
    let tail_has_vowel = chars[i..].iter().any(|c| is_vowel(*c));
    if !head_has_vowel || !tail_has_vowel {
        return false;
    }

    let prev_is_soft = NO_BREAK_BEFORE.contains(prev.to_lowercase().next().unwrap_or(prev));
    let consonant_pair = (is_consonant(prev) || prev_is_soft) && is_consonant(next);
    let open_syllable = is_vowel(prev)
        && is_consonant(next)
        && chars.get(i + 1).is_some_and(|c| is_vowel(*c));
    consonant_pair || open_syllable
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is one unit wide.
    fn unit(text: &str) -> f32 {
        text.chars().count() as f32
    }

    #[test]
    fn test_token_that_fits_is_untouched() {
        assert_eq!(hyphenate("short", 10.0, &unit), vec!["short"]);
    }

    #[test]
    fn test_narrow_width_keeps_every_fragment_within_bounds() {
        let parts = hyphenate("abcdefgh", 2.0, &unit);
        assert!(parts.len() > 1);
        assert!(parts.iter().all(|part| unit(part) <= 2.0));
        assert_eq!(parts.concat().replace('-', ""), "abcdefgh");
    }

    #[test]
    fn test_soft_hyphen_preferred() {
        let token = "пере\u{AD}распределение";
        let parts = hyphenate(token, 8.0, &unit);
        assert_eq!(parts[0], "пере-");
        assert!(parts.iter().all(|part| unit(part) <= 8.0));
        assert_eq!(parts.concat().replace('-', ""), "перераспределение");
    }

    #[test]
    fn test_cyrillic_breaks_between_consonants() {
        let parts = hyphenate("экспертность", 6.0, &unit);
        assert!(parts.iter().all(|part| unit(part) <= 6.0), "{parts:?}");
        assert_eq!(parts.concat().replace('-', ""), "экспертность");
        for part in &parts[..parts.len() - 1] {
            assert!(part.ends_with('-'));
            let letters: Vec<char> = part.trim_end_matches('-').chars().collect();
            let last = letters[letters.len() - 1];
            let next_part_first = parts[parts.iter().position(|p| p == part).unwrap() + 1]
                .chars()
                .next()
                .unwrap();
            assert!(!(is_vowel(last) && is_vowel(next_part_first)), "V|V break in {parts:?}");
            assert!(!NO_BREAK_BEFORE.contains(next_part_first));
        }
    }

    #[test]
    fn test_tail_keeps_three_characters() {
        let parts = hyphenate("abcdefghij", 9.0, &unit);
        assert_eq!(parts.last().map(|p| p.chars().count() >= 3), Some(true));
        assert!(parts.iter().all(|part| unit(part) <= 9.0));
    }

    #[test]
    fn test_every_non_final_fragment_has_hyphen_inside_width() {
        let parts = hyphenate("1234567890123456", 5.0, &unit);
        assert!(parts.len() > 1);
        for part in &parts[..parts.len() - 1] {
            assert!(part.ends_with('-'));
            assert!(unit(part) <= 5.0);
        }
    }

    #[test]
    fn test_overwide_single_character_is_emitted_alone() {
        let wide = |text: &str| text.chars().map(|c| if c == 'W' { 10.0 } else { 1.0 }).sum::<f32>();
        let parts = hyphenate("Wab", 3.0, &wide);
        assert_eq!(parts, vec!["W", "ab"]);
    }

    #[test]
    fn test_letter_digit_boundary_is_a_break() {
        let parts = hyphenate("abc12345", 5.0, &unit);
        assert_eq!(parts[0], "abc-");
    }
}
