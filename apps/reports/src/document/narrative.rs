//! Narrative detection: decides whether a short line reads like prose (contains a
//! verb) or like a heading.
//!
//! This is inherently locale-bound, so it sits behind a trait. The default
//! implementation dispatches per word on script: Cyrillic words are matched
//! against Russian verb endings, Latin words against English auxiliaries,
//! modals and `-ed` forms.
//! Short phrases in other languages are never flagged as narrative.

/// Pluggable predicate consulted by title detection.
pub trait NarrativeDetector: Send + Sync {
    /// True when the word looks like a finite or infinitive verb form.
    fn is_verb_like(&self, word: &str) -> bool;

    fn contains_verb(&self, line: &str) -> bool {
        line.split_whitespace().any(|word| self.is_verb_like(word))
    }
}

/// Russian verb endings (infinitive, present, past). Deliberately short:
/// noun endings like `-ал` (канал, финал), `-ит` (кредит) and `-ость` are left out.
const RU_VERB_SUFFIXES: &[&str] = &[
    "ться", "тся", "ать", "ять", "еть", "ить", "уть", "ыть", "ешь", "ишь", "ает", "яет", "ует",
    "еет", "ают", "яют", "уют", "ила", "или", "ала", "али", "ело",
];

const EN_VERBS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "am", "will", "would", "can", "could",
    "should", "shall", "must", "may", "might", "do", "does", "did", "has", "have", "had",
    "don't", "doesn't", "isn't", "aren't", "won't", "can't",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct MorphologyDetector;

impl NarrativeDetector for MorphologyDetector {
    fn is_verb_like(&self, word: &str) -> bool {
        let word: String = word
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
            .to_lowercase();
        if word.is_empty() {
            return false;
        }

        if word.chars().any(is_cyrillic) {
            let len = word.chars().count();
            return RU_VERB_SUFFIXES.iter().any(|suffix| {
                word.ends_with(suffix) && len >= suffix.chars().count() + 2
            });
        }

        if word.chars().all(|c| c.is_ascii_alphabetic() || c == '\'') {
            return EN_VERBS.contains(&word.as_str()) || is_past_form(&word);
        }

        false
    }
}

/// `focused`, `started`; skips `need`, `seed`.
fn is_past_form(word: &str) -> bool {
    word.len() >= 5 && word.ends_with("ed") && !word.ends_with("eed")
}

pub(crate) fn is_cyrillic(c: char) -> bool {
    matches!(c as u32, 0x0400..=0x04FF)
}
