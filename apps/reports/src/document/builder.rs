//! Builds a [`ReportDocument`] from raw generated text.
//!
//! The builder is pure: it holds only configuration and may be shared across
//! threads. Any panic inside the heuristics is contained and reported as `None`,
//! which sends the caller down the legacy render path.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::document::canonical::{canonicalize, collapse_spaces};
use crate::document::hygiene::{clean_item, find_ci, is_diagnostic, lower_chars};
use crate::document::lines::{
    classify, ends_with_sentence_terminal, is_title_shaped, normalize_lines, LineKind,
};
use crate::document::narrative::{MorphologyDetector, NarrativeDetector};
use crate::document::{
    ContentBlock, ReportAccentBlock, ReportDocument, ReportMeta, ReportSection, Tariff,
};

pub const DEFAULT_TITLE: &str = "Personal analytical report";

pub const DEFAULT_DISCLAIMER: &str = "This service is not a consultation, forecast or \
recommendation to act. All conclusions are analytical and descriptive. Responsibility for \
decisions remains with the user. The service does not guarantee financial or any other \
results. No refunds.";

const MAX_TITLE_CHARS: usize = 140;
const MIN_TITLE_CHARS: usize = 7;
const MAX_KEY_FINDINGS: usize = 6;
const DERIVED_FINDINGS_PER_SECTION: usize = 2;
const MAX_DERIVED_FINDINGS: usize = 5;
const MAX_DISCLAIMER_CHARS: usize = 500;

const DISCLAIMER_ANCHORS: &[&str] = &["this service is not", "сервис не является"];
const DISCLAIMER_HEADINGS: &[&str] = &["disclaimer", "дисклеймер"];
const SUMMARY_ALIASES: &[&str] = &[
    "key findings",
    "summary",
    "ключевые выводы",
    "резюме",
    "главное",
];

const PRACTICAL_SECTION_TITLE: &str = "Practical next step";
const PRACTICAL_ACCENT_TITLE: &str = "Hypothesis test focus";
const PRACTICAL_POINTS: &[&str] = &[
    "Pick one scenario and a clear success criterion.",
    "Run a short 2–4 week test and write down the conclusions.",
];

/// Builder configuration.
#[derive(Clone)]
pub struct BuilderOptions {
    /// Accept unmarked `label: body` lines whose label is whitelisted.
    pub subsection_fallback_heuristic: bool,
    pub detector: Arc<dyn NarrativeDetector>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            subsection_fallback_heuristic: false,
            detector: Arc::new(MorphologyDetector),
        }
    }
}

impl fmt::Debug for BuilderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderOptions")
            .field(
                "subsection_fallback_heuristic",
                &self.subsection_fallback_heuristic,
            )
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportDocumentBuilder {
    options: BuilderOptions,
}

struct SectionDraft {
    section: ReportSection,
    /// Diagnostic section: its content is swallowed and the section discarded.
    dropped: bool,
}

impl SectionDraft {
    fn new(title: String) -> Self {
        let dropped = is_diagnostic(&title);
        Self {
            section: ReportSection::titled(title),
            dropped,
        }
    }
}

#[derive(Default)]
struct BuildState {
    sections: Vec<SectionDraft>,
    current: Option<SectionDraft>,
    key_findings: Vec<String>,
    /// Open until the first paragraph or section heading.
    findings_open: bool,
    /// Set by a summary-alias heading; bullets go to key findings.
    summary_slot: bool,
    /// A heading was seen and nothing has been added under it yet.
    after_title: bool,
}

impl BuildState {
    fn open_section(&mut self, title: String) {
        if let Some(done) = self.current.take() {
            self.sections.push(done);
        }
        self.current = Some(SectionDraft::new(title));
        self.findings_open = false;
        self.summary_slot = false;
        self.after_title = true;
    }

    fn current_section(&mut self) -> &mut SectionDraft {
        self.current
            .get_or_insert_with(|| SectionDraft::new(String::new()))
    }

    fn push_block(&mut self, block: ContentBlock) {
        self.findings_open = false;
        self.summary_slot = false;
        self.after_title = false;
        let draft = self.current_section();
        if draft.dropped {
            return;
        }
        let block = match block {
            ContentBlock::Paragraph(text) => match clean_item(&text) {
                Some(text) => ContentBlock::Paragraph(text),
                None => return,
            },
            other if is_diagnostic(&other.text()) => return,
            other => other,
        };
        draft.section.paragraphs.push(block);
    }

    fn push_bullet(&mut self, bullet: &str) {
        self.after_title = false;
        let collecting = self.summary_slot || self.findings_open;
        if collecting && self.key_findings.len() < MAX_KEY_FINDINGS {
            if let Some(point) = clean_item(bullet) {
                self.key_findings.push(point);
            }
            return;
        }
        self.findings_open = false;
        self.summary_slot = false;
        let draft = self.current_section();
        if draft.dropped {
            return;
        }
        if let Some(point) = clean_item(bullet) {
            draft.section.bullets.push(point);
        }
    }

    fn finish(mut self) -> (Vec<ReportSection>, Vec<String>) {
        if let Some(done) = self.current.take() {
            self.sections.push(done);
        }
        let sections = self
            .sections
            .into_iter()
            .filter(|draft| !draft.dropped && draft.section.has_content())
            .map(|draft| draft.section)
            .collect();
        (sections, self.key_findings)
    }
}

impl ReportDocumentBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Returns `None` for blank input or when the heuristics panic.
    pub fn build(
        &self,
        raw_text: &str,
        tariff: Option<Tariff>,
        meta: &ReportMeta,
    ) -> Option<ReportDocument> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.build_inner(raw_text, tariff)));
        match outcome {
            Ok(document) => document,
            Err(_) => {
                warn!(
                    report_id = meta.id.as_deref().unwrap_or(""),
                    "report_document_build_panicked"
                );
                None
            }
        }
    }

    fn build_inner(&self, raw_text: &str, tariff: Option<Tariff>) -> Option<ReportDocument> {
        let tariff = tariff.unwrap_or(Tariff::T1);
        let canonical = canonicalize(raw_text, tariff.code());
        if canonical.trim().is_empty() {
            return None;
        }

        let detector = self.options.detector.as_ref();
        let logical = normalize_lines(&canonical, detector);
        let subtitle = tariff.display_title().to_string();

        let mut lines = logical.iter().map(String::as_str).filter(|l| !l.trim().is_empty());
        let first = lines.next()?;
        let (title, first_is_content) = self.resolve_title(first);

        let remaining: Vec<&str> = if first_is_content {
            std::iter::once(first).chain(lines).collect()
        } else {
            lines.collect()
        };
        let kinds = self.content_kinds(&remaining, &title, &subtitle);

        let mut state = BuildState {
            findings_open: true,
            ..BuildState::default()
        };

        for (index, kind) in kinds.iter().enumerate() {
            match kind {
                LineKind::Heading { text, explicit } => {
                    if is_summary_alias(text) && state.key_findings.is_empty() {
                        state.summary_slot = true;
                        state.findings_open = false;
                        continue;
                    }
                    if state.after_title && !explicit {
                        state.push_block(ContentBlock::paragraph(text.clone()));
                    } else {
                        state.open_section(text.clone());
                    }
                }
                LineKind::Text(text) => {
                    let implied_title = is_title_shaped(text, detector)
                        && is_sentence_line(kinds.get(index + 1));
                    if implied_title && !state.after_title {
                        state.open_section(text.clone());
                    } else {
                        state.push_block(ContentBlock::paragraph(text.clone()));
                    }
                }
                LineKind::Bullet(bullet) => state.push_bullet(bullet),
                LineKind::Subsection { label, body } => state.push_block(ContentBlock::Subsection {
                    label: label.clone(),
                    body: body.clone(),
                }),
                LineKind::Timeline { marker, body } => state.push_block(ContentBlock::Timeline {
                    marker: marker.clone(),
                    body: body.clone(),
                }),
                LineKind::Blank | LineKind::Separator => {}
            }
        }

        let (mut sections, mut key_findings) = state.finish();

        if key_findings.is_empty() {
            key_findings = sections
                .iter()
                .flat_map(|section| section.bullets.iter().take(DERIVED_FINDINGS_PER_SECTION))
                .take(MAX_DERIVED_FINDINGS)
                .cloned()
                .collect();
        }

        if sections.is_empty() {
            debug!(tariff = tariff.code(), "report_document_generic_section");
            let mut generic = ReportSection::titled("");
            generic
                .paragraphs
                .push(ContentBlock::paragraph(collapse_spaces(&canonical)));
            sections.push(generic);
        }

        if tariff.has_practical_steps() {
            sections.push(practical_steps_section());
        }

        Some(ReportDocument {
            title,
            subtitle,
            key_findings,
            sections,
            disclaimer: extract_disclaimer(&canonical),
            tariff,
            decoration_depth: tariff.decoration_depth(),
        })
    }

    /// Returns the document title and whether the first line must still be
    /// parsed as content. Only structural first lines are reparsed; a first
    /// line too short to be a title is dropped in favour of the default.
    fn resolve_title(&self, first: &str) -> (String, bool) {
        let kind = classify(first, self.options.subsection_fallback_heuristic);
        let text = match kind {
            LineKind::Heading { text, .. } => text,
            LineKind::Text(text) => text,
            _ => return (DEFAULT_TITLE.to_string(), true),
        };
        if text.chars().count() < MIN_TITLE_CHARS {
            return (DEFAULT_TITLE.to_string(), false);
        }
        (text.chars().take(MAX_TITLE_CHARS).collect(), false)
    }

    /// Classifies content lines, dropping separators, disclaimer headings,
    /// title/subtitle duplicates and everything from the disclaimer anchor on.
    fn content_kinds(&self, lines: &[&str], title: &str, subtitle: &str) -> Vec<LineKind> {
        let heuristic = self.options.subsection_fallback_heuristic;
        let mut kinds = Vec::with_capacity(lines.len());

        for line in lines {
            let (line, reached_disclaimer) = match disclaimer_anchor(line) {
                Some(byte) => (&line[..byte], true),
                None => (*line, false),
            };

            let kind = classify(line, heuristic);
            let keep = match &kind {
                LineKind::Blank | LineKind::Separator => false,
                LineKind::Heading { text, .. } | LineKind::Text(text) => {
                    !is_disclaimer_heading(text) && !is_duplicate(text, title, subtitle)
                }
                _ => true,
            };
            if keep {
                kinds.push(kind);
            }
            if reached_disclaimer {
                break;
            }
        }
        kinds
    }
}

fn is_summary_alias(text: &str) -> bool {
    let lower = text.trim().trim_end_matches(':').to_lowercase();
    SUMMARY_ALIASES.contains(&lower.as_str())
}

fn is_sentence_line(kind: Option<&LineKind>) -> bool {
    match kind {
        Some(LineKind::Text(text)) => {
            ends_with_sentence_terminal(text)
                && text
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
        }
        _ => false,
    }
}

fn is_disclaimer_heading(text: &str) -> bool {
    let lower: String = lower_chars(text).into_iter().collect();
    DISCLAIMER_HEADINGS
        .iter()
        .any(|heading| lower.trim_start().starts_with(heading))
}

fn is_duplicate(text: &str, title: &str, subtitle: &str) -> bool {
    let text = text.trim().trim_end_matches(':').trim().to_lowercase();
    text == title.to_lowercase() || text == subtitle.to_lowercase()
}

/// Byte offset of the earliest disclaimer anchor in `text`.
fn disclaimer_anchor(text: &str) -> Option<usize> {
    DISCLAIMER_ANCHORS
        .iter()
        .filter_map(|anchor| find_ci(text, anchor))
        .min()
        .map(|char_index| char_to_byte(text, char_index))
}

fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// The boilerplate run from the anchor onward, or the built-in default.
pub fn extract_disclaimer(text: &str) -> String {
    match disclaimer_anchor(text) {
        Some(byte) => {
            let joined = text[byte..]
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            joined.chars().take(MAX_DISCLAIMER_CHARS).collect()
        }
        None => DEFAULT_DISCLAIMER.to_string(),
    }
}

fn practical_steps_section() -> ReportSection {
    let mut section = ReportSection::titled(PRACTICAL_SECTION_TITLE);
    section.accent_blocks.push(ReportAccentBlock {
        title: PRACTICAL_ACCENT_TITLE.to_string(),
        points: PRACTICAL_POINTS.iter().map(|point| point.to_string()).collect(),
    });
    section
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: &str, tariff: Tariff) -> ReportDocument {
        ReportDocumentBuilder::default()
            .build(source, Some(tariff), &ReportMeta::with_id("test"))
            .expect("document")
    }

    fn all_paragraphs(doc: &ReportDocument) -> Vec<String> {
        doc.sections
            .iter()
            .flat_map(ReportSection::paragraph_texts)
            .collect()
    }

    fn section<'a>(doc: &'a ReportDocument, title: &str) -> &'a ReportSection {
        doc.sections
            .iter()
            .find(|section| section.title == title)
            .unwrap_or_else(|| panic!("section {title:?} missing"))
    }

    #[test]
    fn test_blank_input_returns_none() {
        let builder = ReportDocumentBuilder::default();
        assert!(builder.build("\n\n", Some(Tariff::T1), &ReportMeta::default()).is_none());
        assert!(builder.build("   \n\t ", None, &ReportMeta::default()).is_none());
        assert!(builder.build("", Some(Tariff::T3), &ReportMeta::default()).is_none());
    }

    #[test]
    fn test_structured_document_for_t3() {
        let doc = build(
            "Персональный аналитический отчёт\n\nРезюме:\n• Первый вывод\n• Второй вывод\n\nСильные стороны:\n- Аналитичность\n- Системность\n\nСервис не является консультацией...",
            Tariff::T3,
        );
        assert_eq!(doc.tariff, Tariff::T3);
        assert_eq!(doc.decoration_depth, 3);
        assert_eq!(doc.key_findings, vec!["Первый вывод", "Второй вывод"]);
        assert_eq!(
            section(&doc, "Сильные стороны").bullets,
            vec!["Аналитичность", "Системность"]
        );
        assert_eq!(doc.disclaimer, "Сервис не является консультацией...");
        assert_eq!(doc.sections.last().map(|s| s.title.as_str()), Some(PRACTICAL_SECTION_TITLE));
    }

    #[test]
    fn test_subtitle_is_tariff_display_label() {
        let doc = build("Personal analytical report\n\n- First finding\n", Tariff::T2);
        assert_eq!(doc.subtitle, "Where is your money?");
        assert!(!doc.subtitle.contains("test"));
        assert_eq!(doc.key_findings, vec!["First finding"]);
    }

    #[test]
    fn test_unknown_tariff_uses_t1_semantics() {
        let doc = ReportDocumentBuilder::default()
            .build("Report title here\n\nFocus:\nKeep one goal.", None, &ReportMeta::default())
            .expect("document");
        assert_eq!(doc.tariff, Tariff::T1);
        assert_eq!(doc.decoration_depth, 1);
        assert!(doc.sections.iter().all(|s| s.accent_blocks.is_empty()));
    }

    #[test]
    fn test_explicit_section_with_one_line_paragraph() {
        let doc = build("Title line\n\nResource and focus:\nOne-line paragraph.", Tariff::T1);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Resource and focus");
        assert_eq!(doc.sections[0].paragraph_texts(), vec!["One-line paragraph."]);
        assert!(doc.sections[0].bullets.is_empty());
    }

    #[test]
    fn test_short_first_line_is_replaced_not_reparsed() {
        let doc = build("Title\n\nResource and focus:\nOne-line paragraph.", Tariff::T1);
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Resource and focus");
        assert_eq!(doc.sections[0].paragraph_texts(), vec!["One-line paragraph."]);
    }

    #[test]
    fn test_structural_first_line_stays_content() {
        let doc = build("- Keep one priority per week\nFocus:\nStay on course.", Tariff::T1);
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.key_findings, vec!["Keep one priority per week"]);
    }

    #[test]
    fn test_entities_decoded_in_paragraphs() {
        let doc = build(
            "Report title here\n\nFocus:\nKeep going&hellip; step by step&rsquo;s pace.",
            Tariff::T1,
        );
        let paragraphs = all_paragraphs(&doc);
        assert!(paragraphs.iter().all(|p| !p.contains("&hellip;") && !p.contains("&rsquo;")));
        assert!(paragraphs.iter().any(|p| p.contains("Keep going… step by step’s pace.")));
    }

    #[test]
    fn test_markdown_noise_stripped_from_title_and_findings() {
        let doc = build(
            "## 🔍 Проверка данных\n\nКлючевые выводы:\n* **Как включить:** сначала уточни цель\n* __Второй пункт__\n",
            Tariff::T1,
        );
        assert_eq!(doc.title, "Проверка данных");
        assert_eq!(doc.key_findings[0], "Как включить: сначала уточни цель");
        assert_eq!(doc.key_findings[1], "Второй пункт");
    }

    #[test]
    fn test_malformed_html_fragments_removed_from_paragraphs() {
        let doc = build(
            "Минимум на тяжёлый день:\n</i> Сделай одну маленькую вещь, которая принесёт тебе радость.\n<i> Запиши три вещи, за которые ты благодарен.\n</i> Удали из головы одну ненужную заботу.\n",
            Tariff::T1,
        );
        assert_eq!(
            doc.sections[0].paragraph_texts(),
            vec![
                "Сделай одну маленькую вещь, которая принесёт тебе радость.",
                "Запиши три вещи, за которые ты благодарен.",
                "Удали из головы одну ненужную заботу.",
            ]
        );
    }

    #[test]
    fn test_bullets_stay_inside_named_section_after_paragraphs() {
        let doc = build(
            "Персональный аналитический отчёт\n\nРитм и восстановление:\nТвой внутренний ритм может требовать паузы.\n\nМинимум на тяжёлый день:\n- 15 минут полного молчания, чтобы услышать себя.\n- Короткая прогулка на свежем воздухе, чтобы обновить мысли.\n",
            Tariff::T1,
        );
        assert_eq!(
            section(&doc, "Минимум на тяжёлый день").bullets,
            vec![
                "15 минут полного молчания, чтобы услышать себя.",
                "Короткая прогулка на свежем воздухе, чтобы обновить мысли.",
            ]
        );
        // Derived from section bullets when no findings were collected.
        assert_eq!(doc.key_findings.len(), 2);
    }

    #[test]
    fn test_content_before_headings_uses_untitled_section() {
        let doc = build(
            "Персональный аналитический отчёт\n\nЭто первый абзац без именованных разделов.\n- И буллет в том же блоке.\n",
            Tariff::T1,
        );
        assert_eq!(doc.sections[0].title, "");
        assert_eq!(doc.sections[0].bullets, vec!["И буллет в том же блоке."]);
    }

    #[test]
    fn test_diagnostic_sections_and_bullets_are_filtered() {
        let doc = build(
            "Персональный аналитический отчёт\n\n- Главный акцент: держать фокус на сильных сторонах.\n- Не распознано поле даты рождения.\n\nПроверка данных:\n- Не полностью заполнено поле времени рождения.\n- Ошибка парсинга входного JSON.\n\nСильные стороны:\n- Ты быстро адаптируешься к изменениям и сохраняешь устойчивость.\n",
            Tariff::T1,
        );
        assert!(doc.sections.iter().all(|s| s.title != "Проверка данных"));
        assert!(doc
            .key_findings
            .iter()
            .all(|point| !point.to_lowercase().contains("не распознано")));
        assert!(doc
            .sections
            .iter()
            .flat_map(|s| s.bullets.iter())
            .all(|bullet| !bullet.to_lowercase().contains("ошибка парсинга")));
        assert_eq!(section(&doc, "Сильные стороны").bullets.len(), 1);
    }

    #[test]
    fn test_standalone_diagnostic_line_dropped_from_findings() {
        let doc = build(
            "Твой путь к себе!\n\n- Проверка данных\n- Главный вывод для пользователя.\n",
            Tariff::T3,
        );
        assert_eq!(doc.key_findings, vec!["Главный вывод для пользователя."]);
    }

    #[test]
    fn test_promotional_phrases_are_removed() {
        let doc = build(
            "Персональный аналитический отчёт\n\n- Бесплатный превью-отчёт доступен раз в месяц.\n- Это превью твоих сильных сторон.\n\nПодробности:\nЭто превью и бесплатный превью-отчёт о текущем состоянии.\n- Доступен раз в месяц.\n- Конкретный рабочий вывод без промо-фраз.\n",
            Tariff::T1,
        );
        let banned = ["бесплатный превью-отчёт", "доступен раз в месяц", "это превью"];
        for phrase in banned {
            assert!(doc.key_findings.iter().all(|p| !p.to_lowercase().contains(phrase)));
            assert!(all_paragraphs(&doc).iter().all(|p| !p.to_lowercase().contains(phrase)));
            assert!(doc
                .sections
                .iter()
                .flat_map(|s| s.bullets.iter())
                .all(|b| !b.to_lowercase().contains(phrase)));
        }
        assert_eq!(
            section(&doc, "Подробности").bullets,
            vec!["Конкретный рабочий вывод без промо-фраз."]
        );
        assert!(doc.sections.iter().all(ReportSection::has_content));
    }

    #[test]
    fn test_short_standalone_lines_become_section_titles() {
        let doc = build(
            "Персональный аналитический отчёт\n\nВектор роста\nСузь фокус до одной цели и отслеживай прогресс ежедневно.\n\nТочка опоры\nВерни стабильный ритм сна и отдыха.\n",
            Tariff::T1,
        );
        assert_eq!(
            section(&doc, "Вектор роста").paragraph_texts(),
            vec!["Сузь фокус до одной цели и отслеживай прогресс ежедневно."]
        );
        assert_eq!(
            section(&doc, "Точка опоры").paragraph_texts(),
            vec!["Верни стабильный ритм сна и отдыха."]
        );
        let paragraphs = all_paragraphs(&doc);
        assert!(!paragraphs.contains(&"Вектор роста".to_string()));
    }

    #[test]
    fn test_question_and_exclamation_lines_stay_paragraphs() {
        let doc = build(
            "Персональный аналитический отчёт\n\nГде твой ресурс?\nОпирайся на рутину сна и короткие прогулки.\n\nС чего начать!\nВыбери один шаг и повторяй его неделю.\n",
            Tariff::T1,
        );
        assert!(doc.sections.iter().all(|s| s.title != "Где твой ресурс?"));
        let paragraphs = all_paragraphs(&doc);
        assert!(paragraphs.contains(&"Где твой ресурс?".to_string()));
        assert!(paragraphs.contains(&"С чего начать!".to_string()));
    }

    #[test]
    fn test_long_connector_line_is_not_a_title() {
        let line = "Почему это важно и как это помогает, когда фокус теряется";
        let doc = build(
            &format!("Персональный аналитический отчёт\n\n{line}\nВыбери одно действие и повторяй его ежедневно.\n"),
            Tariff::T1,
        );
        assert!(doc.sections.iter().all(|s| s.title != line));
        assert!(all_paragraphs(&doc).iter().any(|p| p.starts_with(line)));
    }

    #[test]
    fn test_wrapped_lines_merge_into_one_paragraph() {
        let doc = build(
            "Персональный аналитический отчёт\n\nИногда ритм сбивается,\nи это нормально\nкогда нагрузка растёт.\n",
            Tariff::T1,
        );
        assert_eq!(doc.sections[0].title, "");
        assert!(doc.sections[0].bullets.is_empty());
        assert_eq!(
            doc.sections[0].paragraph_texts(),
            vec!["Иногда ритм сбивается, и это нормально когда нагрузка растёт."]
        );
    }

    #[test]
    fn test_separator_does_not_split_section() {
        let doc = build(
            "Персональный аналитический отчёт\n\nФокус:\nПервая строка абзаца\nвторая строка абзаца\n---\n- Отдельный пункт\n",
            Tariff::T1,
        );
        let focus = section(&doc, "Фокус");
        assert_eq!(focus.paragraph_texts(), vec!["Первая строка абзаца вторая строка абзаца"]);
        assert!(focus.bullets.contains(&"Отдельный пункт".to_string()));
    }

    #[test]
    fn test_warning_sentences_are_not_titles() {
        let doc = build(
            "Персональный аналитический отчёт\n\nВнимание!\nЭто предложение слишком длинное, чтобы считаться заголовком даже с восклицанием!\nКороткая фраза, но с запятой.\n",
            Tariff::T1,
        );
        assert_eq!(doc.sections[0].title, "");
        let paragraphs = doc.sections[0].paragraph_texts();
        assert!(paragraphs.contains(&"Внимание!".to_string()));
        assert!(paragraphs.contains(&"Короткая фраза, но с запятой.".to_string()));
    }

    #[test]
    fn test_subsection_contract_marker_yields_subsection_block() {
        let doc = build(
            "Report title\n\nFocus:\n## Why this matters: keeps your vector\n",
            Tariff::T1,
        );
        assert_eq!(
            section(&doc, "Focus").paragraphs,
            vec![ContentBlock::Subsection {
                label: "Why this matters".to_string(),
                body: "keeps your vector".to_string(),
            }]
        );
    }

    #[test]
    fn test_fallback_heuristic_is_configurable() {
        let source = "Report title\n\nFocus:\nRisk: scattering attention\n";
        let default_doc = build(source, Tariff::T1);
        assert_eq!(
            section(&default_doc, "Focus").paragraphs,
            vec![ContentBlock::paragraph("Risk: scattering attention")]
        );

        let builder = ReportDocumentBuilder::new(BuilderOptions {
            subsection_fallback_heuristic: true,
            ..BuilderOptions::default()
        });
        let doc = builder
            .build(source, Some(Tariff::T1), &ReportMeta::default())
            .expect("document");
        assert!(matches!(
            &section(&doc, "Focus").paragraphs[0],
            ContentBlock::Subsection { label, .. } if label == "Risk"
        ));
    }

    #[test]
    fn test_multi_period_plan_stays_in_one_section() {
        let doc = build(
            "Report title\n\nAction plan:\n1 month (weekly):\nWeek 1: pick one habit\nWeek 2: repeat it daily\n\n1 year (monthly):\n1–3: build the base\n4–6 months: widen the scope\n",
            Tariff::T1,
        );
        assert_eq!(doc.sections.len(), 1);
        let plan = section(&doc, "Action plan");
        assert_eq!(plan.paragraphs.len(), 6);
        assert!(plan
            .paragraphs
            .iter()
            .all(|block| matches!(block, ContentBlock::Timeline { .. })));
        assert_eq!(
            plan.paragraphs[0],
            ContentBlock::Timeline {
                marker: "1 month (weekly)".to_string(),
                body: String::new(),
            }
        );
    }

    #[test]
    fn test_disclaimer_lines_are_excluded_from_content() {
        let doc = build(
            "Report title\n\nFocus:\nKeep one goal.\n\nDisclaimer:\nThis service is not a consultation.\nNo refunds.",
            Tariff::T1,
        );
        assert_eq!(doc.disclaimer, "This service is not a consultation. No refunds.");
        let paragraphs = all_paragraphs(&doc);
        assert_eq!(paragraphs, vec!["Keep one goal."]);
        assert!(doc.sections.iter().all(|s| !s.title.to_lowercase().starts_with("disclaimer")));
    }

    #[test]
    fn test_default_disclaimer_and_title() {
        let doc = build("- Only a bullet here\n", Tariff::T0);
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.disclaimer, DEFAULT_DISCLAIMER);
        assert_eq!(doc.key_findings, vec!["Only a bullet here"]);
        // Zero sections fall back to one untitled section.
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "");
    }

    #[test]
    fn test_title_duplicates_are_dropped() {
        let doc = build(
            "Report title here\n\nFocus:\nReport title here\nWhere is your strength?\nKeep one goal.",
            Tariff::T1,
        );
        assert_eq!(section(&doc, "Focus").paragraph_texts(), vec!["Keep one goal."]);
    }

    #[test]
    fn test_practical_steps_only_for_upper_tiers() {
        for tariff in Tariff::ALL {
            let doc = build("Report title\n\nFocus:\nKeep one goal.", tariff);
            let has_practical = doc.sections.iter().any(|s| s.title == PRACTICAL_SECTION_TITLE);
            assert_eq!(has_practical, tariff.has_practical_steps(), "{tariff}");
        }
    }

    #[test]
    fn test_build_is_pure() {
        let source = "Report title\n\nFocus:\nKeep one goal.\n- Walk daily\n";
        let builder = ReportDocumentBuilder::default();
        let meta = ReportMeta::with_id("7");
        let first = builder.build(source, Some(Tariff::T2), &meta);
        let second = builder.build(source, Some(Tariff::T2), &meta);
        assert_eq!(first, second);
    }
}
