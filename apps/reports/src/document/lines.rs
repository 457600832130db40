//! Line classification and soft-wrap normalization.
//!
//! Generated narratives wrap prose at arbitrary points and mix it with headings,
//! bullets, separators and timeline plans. `normalize_lines` re-joins wrapped prose
//! without ever swallowing a structural line; `classify` tags each logical line.

use crate::document::canonical::{collapse_spaces, strip_inline_markup, strip_pictographs};
use crate::document::narrative::NarrativeDetector;

/// Reserved line prefix that marks a heading. Doubled and followed by
/// `label: body`, it marks a structured subsection.
pub const HEADING_MARKER: char = '#';

const BULLET_MARKERS: &[&str] = &["- ", "• ", "* ", "– ", "— ", "· "];
const SENTENCE_TERMINALS: &[char] = &['.', '!', '?', ';', '…'];
const MERGE_STOPPERS: &[char] = &['.', '!', '?', ':', ';', '…'];

const TITLE_MIN_WORDS: usize = 2;
const TITLE_MAX_WORDS: usize = 6;
const TITLE_MAX_CHARS: usize = 72;

const WEEK_WORDS: &[&str] = &["week", "неделя", "month", "месяц", "day", "день"];
const RANGE_UNIT_WORDS: &[&str] = &[
    "months", "month", "weeks", "week", "mo", "месяцы", "месяца", "месяцев", "месяц", "недели",
    "недель",
];
const PERIOD_WORDS: &[&str] = &[
    "month", "months", "year", "years", "week", "weeks", "месяц", "месяца", "месяцев", "год",
    "года", "лет", "неделя", "недели", "недель",
];

/// Labels accepted by the opt-in subsection heuristic when the contract marker is absent.
const SUBSECTION_LABELS: &[&str] = &[
    "risk",
    "resource",
    "step",
    "why this matters",
    "focus",
    "риск",
    "ресурс",
    "шаг",
    "почему это важно",
    "фокус",
];

/// The structural role of one logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Separator,
    /// `explicit` is set for `#`-marked or colon-terminated headings.
    Heading { text: String, explicit: bool },
    Subsection { label: String, body: String },
    Timeline { marker: String, body: String },
    Bullet(String),
    Text(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Primitive recognizers
// ────────────────────────────────────────────────────────────────────────────

/// Three or more repeated `-`, `=` or `_` with nothing else on the line.
pub fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if matches!(first, '-' | '=' | '_') => {
            trimmed.chars().count() >= 3 && chars.all(|c| c == first)
        }
        _ => false,
    }
}

pub fn has_heading_marker(line: &str) -> bool {
    line.trim_start().starts_with(HEADING_MARKER)
}

/// Text after the leading `#` run, with emphasis and pictographs removed.
pub fn heading_text(line: &str) -> String {
    let rest = line.trim_start().trim_start_matches(HEADING_MARKER);
    clean_display_text(rest)
}

pub fn clean_display_text(text: &str) -> String {
    collapse_spaces(&strip_pictographs(&strip_inline_markup(text)))
}

/// Returns the bullet content for `- x`, `• x`, `* x`, `1) x`, `12. x`.
pub fn extract_bullet(line: &str) -> Option<String> {
    let stripped = line.trim();
    for marker in BULLET_MARKERS {
        if let Some(rest) = stripped.strip_prefix(marker) {
            let rest = rest.trim();
            return (!rest.is_empty()).then(|| rest.to_string());
        }
    }

    let digits = stripped.chars().take_while(|c| c.is_ascii_digit()).count();
    if (1..=2).contains(&digits) {
        let rest = &stripped[digits..];
        for delimiter in [") ", ". "] {
            if let Some(body) = rest.strip_prefix(delimiter) {
                let body = body.trim();
                return (!body.is_empty()).then(|| body.to_string());
            }
        }
    }
    None
}

/// Recognizes timeline steps and period headers:
/// `Week 1: …`, `Неделя 2: …`, `1–3: …`, `4-6 months: …`, `1 month (weekly):`.
pub fn parse_timeline(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    let colon = trimmed.find(':')?;
    let head = trimmed[..colon].trim();
    let body = trimmed[colon + 1..].trim();
    if head.is_empty() || head.chars().count() > 40 {
        return None;
    }

    let is_timeline = is_week_marker(head) || is_range_marker(head) || is_period_header(head);
    is_timeline.then(|| (head.to_string(), body.to_string()))
}

/// `Week 3`, `неделя 1-2`, `Month 4`.
fn is_week_marker(head: &str) -> bool {
    let lower = head.to_lowercase();
    let mut words = lower.split_whitespace();
    let (Some(word), Some(number), None) = (words.next(), words.next(), words.next()) else {
        return false;
    };
    WEEK_WORDS.contains(&word) && is_number_or_range(number)
}

/// `1–3`, `10-12 months`, `4—6 месяцы`.
fn is_range_marker(head: &str) -> bool {
    let lower = head.to_lowercase();
    let mut words = lower.split_whitespace();
    let Some(range) = words.next() else {
        return false;
    };
    if !is_range(range) {
        return false;
    }
    match (words.next(), words.next()) {
        (None, _) => true,
        (Some(unit), None) => RANGE_UNIT_WORDS.contains(&unit),
        _ => false,
    }
}

/// `1 month (weekly)`, `1 год (по месяцам)`, `3 months`.
fn is_period_header(head: &str) -> bool {
    let lower = head.to_lowercase();
    let (core, qualifier) = match lower.find('(') {
        Some(open) => (lower[..open].trim(), Some(lower[open..].trim())),
        None => (lower.trim(), None),
    };
    if let Some(qualifier) = qualifier {
        if !qualifier.ends_with(')') {
            return false;
        }
    }
    let mut words = core.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(number), Some(unit), None) => {
            number.chars().all(|c| c.is_ascii_digit()) && PERIOD_WORDS.contains(&unit)
        }
        _ => false,
    }
}

fn is_number_or_range(token: &str) -> bool {
    (!token.is_empty() && token.chars().all(|c| c.is_ascii_digit())) || is_range(token)
}

fn is_range(token: &str) -> bool {
    let Some(split) = token.find(['-', '–', '—']) else {
        return false;
    };
    let dash_len = token[split..].chars().next().map_or(1, char::len_utf8);
    let (left, right) = (&token[..split], &token[split + dash_len..]);
    !left.is_empty()
        && !right.is_empty()
        && left.chars().all(|c| c.is_ascii_digit())
        && right.chars().all(|c| c.is_ascii_digit())
}

/// Splits `label: body` at the first colon. Both halves must be non-empty.
pub fn split_label(line: &str) -> Option<(String, String)> {
    let colon = line.find(':')?;
    let label = line[..colon].trim();
    let body = line[colon + 1..].trim();
    (!label.is_empty() && !body.is_empty()).then(|| (label.to_string(), body.to_string()))
}

pub fn ends_with_sentence_terminal(line: &str) -> bool {
    line.trim_end().ends_with(SENTENCE_TERMINALS)
}

fn starts_upper_or_digit(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
}

/// Shape test for an unmarked heading: 2–6 words, ≤72 chars, at most one
/// punctuation mark, no sentence terminal, capitalized, and no verb-like word.
pub fn is_title_shaped(line: &str, detector: &dyn NarrativeDetector) -> bool {
    let line = line.trim();
    let words = line.split_whitespace().count();
    if !(TITLE_MIN_WORDS..=TITLE_MAX_WORDS).contains(&words) {
        return false;
    }
    if line.chars().count() > TITLE_MAX_CHARS || ends_with_sentence_terminal(line) {
        return false;
    }
    let punctuation = line
        .chars()
        .filter(|c| c.is_ascii_punctuation() || matches!(c, '…' | '—' | '–' | '«' | '»'))
        .count();
    if punctuation > 1 || !starts_upper_or_digit(line) {
        return false;
    }
    !detector.contains_verb(line)
}

/// A line that must never be merged with its neighbours.
pub fn is_structural(line: &str) -> bool {
    let trimmed = line.trim();
    has_heading_marker(trimmed)
        || is_separator(trimmed)
        || extract_bullet(trimmed).is_some()
        || parse_timeline(trimmed).is_some()
        || trimmed.ends_with(':')
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

/// Re-joins soft-wrapped prose. Blank lines are kept as `""` group boundaries.
///
/// The first non-empty line is always kept standalone (it is the document title
/// candidate). A short title-shaped line followed by a capitalized sentence is
/// kept standalone too.
pub fn normalize_lines(text: &str, detector: &dyn NarrativeDetector) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut seen_first = false;

    let flush = |current: &mut String, out: &mut Vec<String>| {
        if !current.is_empty() {
            out.push(std::mem::take(current));
        }
    };

    for raw in text.lines() {
        let line = raw.trim();

        if line.is_empty() {
            flush(&mut current, &mut out);
            out.push(String::new());
            continue;
        }

        if !seen_first {
            seen_first = true;
            out.push(line.to_string());
            continue;
        }

        if is_structural(line) {
            flush(&mut current, &mut out);
            out.push(line.to_string());
            continue;
        }

        if current.is_empty() {
            current.push_str(line);
            continue;
        }

        let current_closed = current.trim_end().ends_with(MERGE_STOPPERS);
        let title_candidate = is_title_shaped(&current, detector)
            && ends_with_sentence_terminal(line)
            && starts_upper_or_digit(line);

        if current_closed || title_candidate {
            flush(&mut current, &mut out);
            current.push_str(line);
        } else {
            current.push(' ');
            current.push_str(line);
        }
    }
    flush(&mut current, &mut out);
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Classification
// ────────────────────────────────────────────────────────────────────────────

/// Tags one logical line. `subsection_heuristic` enables the label whitelist
/// for unmarked `label: body` lines.
pub fn classify(line: &str, subsection_heuristic: bool) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if is_separator(trimmed) {
        return LineKind::Separator;
    }

    if has_heading_marker(trimmed) {
        let text = heading_text(trimmed);
        if let Some((marker, body)) = parse_timeline(&text) {
            return LineKind::Timeline { marker, body };
        }
        if let Some((label, body)) = split_label(&text) {
            return LineKind::Subsection { label, body };
        }
        return LineKind::Heading {
            text: text.trim_end_matches(':').trim().to_string(),
            explicit: true,
        };
    }

    if let Some(bullet) = extract_bullet(trimmed) {
        let bullet = clean_display_text(&bullet);
        if let Some((marker, body)) = parse_timeline(&bullet) {
            return LineKind::Timeline { marker, body };
        }
        return LineKind::Bullet(bullet);
    }

    let text = clean_display_text(trimmed);
    if text.is_empty() {
        return LineKind::Blank;
    }

    if let Some((marker, body)) = parse_timeline(&text) {
        return LineKind::Timeline { marker, body };
    }

    if subsection_heuristic {
        if let Some((label, body)) = split_label(&text) {
            if SUBSECTION_LABELS.contains(&label.to_lowercase().as_str()) {
                return LineKind::Subsection { label, body };
            }
        }
    }

    if text.ends_with(':') {
        return LineKind::Heading {
            text: text.trim_end_matches(':').trim().to_string(),
            explicit: true,
        };
    }

    LineKind::Text(text)
}
