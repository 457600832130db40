//! Canonical report text. Strips HTML and markdown noise left by the generator.
//!
//! Generated reports sometimes arrive HTML-escaped (possibly more than once), with
//! `<br>` line breaks and dangling inline tags such as `</i>`. The builder and the
//! legacy renderer both work on the canonical form produced here.

use tracing::warn;

const MAX_UNESCAPE_PASSES: usize = 3;

/// Returns the canonical plain text for a raw generated report.
pub fn canonicalize(raw_text: &str, tariff_code: &str) -> String {
    if raw_text.is_empty() {
        return String::new();
    }

    let mut decoded = raw_text.to_string();
    for _ in 0..MAX_UNESCAPE_PASSES {
        let next = unescape_entities(&decoded);
        if next == decoded {
            break;
        }
        decoded = next;
    }

    let with_breaks = replace_br_tags(&decoded);
    let without_tags = strip_tags(&with_breaks);
    let cleaned: String = without_tags
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect();

    if cleaned != raw_text {
        warn!(
            tariff = tariff_code,
            original_length = raw_text.len(),
            cleaned_length = cleaned.len(),
            "report_text_postprocess_quality_incident"
        );
    }

    cleaned
}

/// Removes inline markdown emphasis (`**bold**`, `__bold__`, backticks).
pub fn strip_inline_markup(line: &str) -> String {
    line.replace("**", "").replace("__", "").replace('`', "")
}

/// Removes pictographic symbols (emoji, dingbats, variation selectors).
pub fn strip_pictographs(line: &str) -> String {
    let stripped: String = line.chars().filter(|c| !is_pictograph(*c)).collect();
    collapse_spaces(&stripped)
}

pub fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_pictograph(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xFE0F | 0x200D | 0x20E3
    )
}

/// One decoding pass. Non-breaking spaces become plain spaces.
fn unescape_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).replace('\u{a0}', " ")
}

/// `<br>`, `<br/>`, `<BR />` → newline.
fn replace_br_tags(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '<' {
            if let Some(len) = br_tag_len(&chars[i..]) {
                out.push('\n');
                i += len;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn br_tag_len(chars: &[char]) -> Option<usize> {
    if chars.len() < 4 || !chars[1].eq_ignore_ascii_case(&'b') || !chars[2].eq_ignore_ascii_case(&'r') {
        return None;
    }
    let mut i = 3;
    while i < chars.len() && chars[i] == ' ' {
        i += 1;
    }
    if i < chars.len() && chars[i] == '/' {
        i += 1;
    }
    (i < chars.len() && chars[i] == '>').then_some(i + 1)
}

/// Removes well-formed tags (`<i>`, `</span class="x">`) and dangling tag openers
/// (`</i` at end of line) while leaving ordinary `<` comparisons for the final pass.
fn strip_tags(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '<' {
            let mut j = i + 1;
            if j < chars.len() && chars[j] == '/' {
                j += 1;
            }
            if j < chars.len() && chars[j].is_ascii_alphabetic() {
                match chars[j..].iter().position(|c| *c == '>' || *c == '\n' || *c == '<') {
                    Some(offset) if chars[j + offset] == '>' => {
                        i = j + offset + 1;
                        continue;
                    }
                    _ => {
                        // Dangling opener: drop the tag name only.
                        while j < chars.len()
                            && (chars[j].is_ascii_alphanumeric() || matches!(chars[j], ':' | '_' | '-'))
                        {
                            j += 1;
                        }
                        i = j;
                        continue;
                    }
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
