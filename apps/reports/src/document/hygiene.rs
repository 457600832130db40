//! Content hygiene: removes internal diagnostics and promotional phrasing that
//! the generator occasionally leaks into a customer report.

/// Phrases that mark internal data-validation chatter. Any section titled with one
/// of these is dropped whole; any bullet or paragraph containing one is dropped.
const DIAGNOSTIC_PHRASES: &[&str] = &[
    "data check",
    "data validation",
    "not recognized",
    "was not recognized",
    "parse error",
    "parsing error",
    "failed to parse",
    "field is incomplete",
    "incomplete field",
    "проверка данных",
    "не распознано",
    "не распознан",
    "не полностью заполнено",
    "ошибка парсинга",
    "ошибка разбора",
];

/// Marketing copy that belongs to the chat flow, not to the delivered document.
const PROMOTIONAL_PHRASES: &[&str] = &[
    "free preview report",
    "available once a month",
    "this is a preview",
    "бесплатный превью-отчёт",
    "бесплатный превью-отчет",
    "доступен раз в месяц",
    "это превью",
];

/// Lowercases per character so that indices line up with the source characters.
pub(crate) fn lower_chars(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Case-insensitive search. Returns the character index of the first match.
pub(crate) fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let hay = lower_chars(haystack);
    let needle = lower_chars(needle);
    find_chars(&hay, &needle, 0)
}

fn find_chars(hay: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    (from..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()] == *needle)
}

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle).is_some()
}

/// True when the text reads as internal diagnostic output.
pub fn is_diagnostic(text: &str) -> bool {
    DIAGNOSTIC_PHRASES
        .iter()
        .any(|phrase| contains_ci(text, phrase))
}

/// Removes promotional phrases. Returns `None` when a removal left nothing
/// meaningful behind (no word with at least three letters).
pub fn strip_promotions(text: &str) -> Option<String> {
    let mut chars: Vec<char> = text.chars().collect();
    let mut touched = false;

    for phrase in PROMOTIONAL_PHRASES {
        let needle = lower_chars(phrase);
        let mut from = 0;
        loop {
            let lower: Vec<char> = chars
                .iter()
                .map(|c| c.to_lowercase().next().unwrap_or(*c))
                .collect();
            match find_chars(&lower, &needle, from) {
                Some(start) => {
                    chars.drain(start..start + needle.len());
                    from = start;
                    touched = true;
                }
                None => break,
            }
        }
    }

    if !touched {
        return Some(text.to_string());
    }

    let joined: String = chars.into_iter().collect();
    let cleaned = tidy_after_removal(&joined);
    has_meaningful_word(&cleaned).then_some(cleaned)
}

/// Applies both hygiene rules to a single bullet or paragraph.
pub fn clean_item(text: &str) -> Option<String> {
    if is_diagnostic(text) {
        return None;
    }
    strip_promotions(text)
}

fn tidy_after_removal(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    let chars: Vec<char> = collapsed.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        let next_is_punct = chars
            .get(i + 1)
            .is_some_and(|n| matches!(n, '.' | ',' | ';' | ':' | '!' | '?'));
        if *c == ' ' && next_is_punct {
            continue;
        }
        out.push(*c);
    }
    out.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '-' | '–' | '—'))
        .trim()
        .to_string()
}

fn has_meaningful_word(text: &str) -> bool {
    text.split_whitespace()
        .any(|word| word.chars().filter(|c| c.is_alphabetic()).count() >= 3)
}
