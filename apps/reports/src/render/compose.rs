//! Lays a [`ReportDocument`] out into page plans.
//!
//! Every content unit is wrapped first and its height known before anything is
//! drawn. Units that must stay together (a heading with its first line, an
//! accent header with its first point) are checked against the cursor and moved
//! to a fresh page as a whole.

use std::mem;
use std::path::PathBuf;
use std::sync::Arc;

use crate::document::{ContentBlock, ReportAccentBlock, ReportDocument, ReportSection};
use crate::layout::{atomic_height, block_height, prepare_text, split_lines, PageCursor};
use crate::render::decor::decorate;
use crate::render::fonts::{FontFamily, FontRole};
use crate::render::images::{AssetLoader, DecodedImage};
use crate::render::plan::{Op, PagePlan, Paint, Shape, TextOp, TextRole};
use crate::render::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::theme::{AssetBundle, AssetKind, Rgb, TypographyTheme};

pub const KEY_FINDINGS_TITLE: &str = "Key findings";

const BULLET_MARKER: &str = "•";
const POINT_MARKER: &str = "-";
const MARKER_GAP: f32 = 5.0;
const TIMELINE_INDENT: f32 = 12.0;

const HEADER_GAP: f32 = 12.0;
const PANEL_PADDING: f32 = 18.0;
const PANEL_RADIUS: f32 = 14.0;
const PANEL_ALPHA: f32 = 0.55;
const ACCENT_PADDING: f32 = 9.0;
const ACCENT_RADIUS: f32 = 9.0;
const ACCENT_ALPHA: f32 = 0.5;
const DISCLAIMER_GAP: f32 = 14.0;

const COVER_ICON_SIZE: f32 = 110.0;
const COVER_TITLE_SCALE: f32 = 1.4;

const LEGACY_MARGIN: f32 = 40.0;
const LEGACY_FONT_SIZE: f32 = 11.0;
const LEGACY_LINE_HEIGHT: f32 = 16.5;

/// Pages of one render and where the disclaimer landed.
#[derive(Debug, Default)]
pub struct Composition {
    pub pages: Vec<PagePlan>,
    pub disclaimer_page: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font: FontRole,
    size: f32,
    color: Rgb,
    role: TextRole,
}

pub struct Composer<'a> {
    document: &'a ReportDocument,
    theme: &'a TypographyTheme,
    fonts: &'a FontFamily,
    bundle: AssetBundle,
    loader: AssetLoader,
    seed: u64,
    pages: Vec<PagePlan>,
    page: PagePlan,
    cursor: PageCursor,
    left: f32,
    width: f32,
}

impl<'a> Composer<'a> {
    pub fn new(
        document: &'a ReportDocument,
        theme: &'a TypographyTheme,
        fonts: &'a FontFamily,
        bundle: AssetBundle,
        seed: u64,
    ) -> Self {
        let margin = theme.margin;
        let header = theme.sizes.subtitle * 1.6 + HEADER_GAP;
        let panel_top = PAGE_HEIGHT - margin - header;
        let left = margin + PANEL_PADDING;
        Self {
            document,
            theme,
            fonts,
            bundle,
            loader: AssetLoader::new(),
            seed,
            pages: Vec::new(),
            page: PagePlan::default(),
            cursor: PageCursor::new(panel_top - PANEL_PADDING, margin + PANEL_PADDING),
            left,
            width: PAGE_WIDTH - 2.0 * left,
        }
    }

    pub fn compose(mut self) -> Composition {
        let document = self.document;
        self.cover();
        self.new_page();

        if !document.key_findings.is_empty() {
            let block = ReportAccentBlock {
                title: KEY_FINDINGS_TITLE.to_string(),
                points: document.key_findings.clone(),
            };
            self.accent_block(&block, FontRole::Bold, BULLET_MARKER);
        }
        for section in &document.sections {
            self.section(section);
        }
        let disclaimer_page = self.disclaimer();

        self.pages.push(mem::take(&mut self.page));
        Composition {
            pages: self.pages,
            disclaimer_page,
        }
    }

    // ── page chrome ────────────────────────────────────────────────────────

    fn asset(&mut self, kind: AssetKind) -> Option<(PathBuf, Arc<DecodedImage>)> {
        self.loader.load(kind, self.bundle.get(kind))
    }

    fn full_page_image(&mut self, kind: AssetKind, alpha: f32) {
        if let Some((path, image)) = self.asset(kind) {
            self.page.push(Op::Image {
                kind,
                path,
                image,
                x: 0.0,
                y: 0.0,
                width: PAGE_WIDTH,
                height: PAGE_HEIGHT,
                alpha,
            });
        }
    }

    fn background(&mut self) {
        self.page.push(Op::Shape {
            shape: Shape::Rect {
                x: 0.0,
                y: 0.0,
                width: PAGE_WIDTH,
                height: PAGE_HEIGHT,
            },
            paint: Paint::Fill(self.theme.palette.background),
            alpha: 1.0,
        });
        self.full_page_image(AssetKind::Background, 1.0);
    }

    fn decorate(&mut self) {
        let index = self.pages.len();
        decorate(
            &mut self.page,
            self.theme,
            self.document.decoration_depth,
            self.seed,
            index,
            (PAGE_WIDTH, PAGE_HEIGHT),
        );
    }

    fn cover(&mut self) {
        let document = self.document;
        self.background();
        self.decorate();

        let icon_top = PAGE_HEIGHT * 0.72;
        let mut y = icon_top;
        if let Some((path, image)) = self.asset(AssetKind::Icon) {
            let height = COVER_ICON_SIZE / image.aspect().max(0.1);
            self.page.push(Op::Image {
                kind: AssetKind::Icon,
                path,
                image,
                x: (PAGE_WIDTH - COVER_ICON_SIZE) / 2.0,
                y: icon_top - height,
                width: COVER_ICON_SIZE,
                height,
                alpha: 1.0,
            });
            y -= height + 28.0;
        }

        let title = TextStyle {
            font: FontRole::Accent,
            size: self.theme.sizes.title * COVER_TITLE_SCALE,
            color: self.theme.section_title_color(),
            role: TextRole::Title,
        };
        let subtitle = TextStyle {
            font: FontRole::Regular,
            size: self.theme.sizes.subtitle,
            color: self.theme.subsection_title_color(),
            role: TextRole::Subtitle,
        };
        let max_width = PAGE_WIDTH - 2.0 * (self.theme.margin + 20.0);
        for (style, text) in [(title, &document.title), (subtitle, &document.subtitle)] {
            for line in self.wrap(style, text, max_width) {
                let line_width = self.fonts.measure(style.font, &line, style.size);
                y -= style.size;
                self.text(style, line, (PAGE_WIDTH - line_width) / 2.0, y);
                y -= self.theme.line_height(style.size) - style.size;
            }
            y -= self.theme.spacing.subsection * 2.0;
        }
    }

    fn new_page(&mut self) {
        self.pages.push(mem::take(&mut self.page));
        self.cursor.reset();

        self.background();
        let overlay_alpha = self.theme.overlay_alpha;
        self.full_page_image(AssetKind::Overlay, overlay_alpha);
        self.decorate();

        let margin = self.theme.margin;
        let header = TextStyle {
            font: FontRole::Regular,
            size: self.theme.sizes.subtitle,
            color: self.theme.subsection_title_color(),
            role: TextRole::Header,
        };
        let header_baseline = PAGE_HEIGHT - margin - header.size;
        self.text(header, self.document.subtitle.clone(), margin, header_baseline);
        self.page.push(Op::Shape {
            shape: Shape::Line {
                x1: margin,
                y1: header_baseline - 6.0,
                x2: PAGE_WIDTH - margin,
                y2: header_baseline - 6.0,
            },
            paint: Paint::Stroke {
                color: self.theme.palette.ink,
                width: 0.6,
            },
            alpha: 0.4,
        });

        let panel_top = self.cursor.top + PANEL_PADDING;
        self.page.push(Op::Shape {
            shape: Shape::RoundedRect {
                x: margin,
                y: margin,
                width: PAGE_WIDTH - 2.0 * margin,
                height: panel_top - margin,
                radius: PANEL_RADIUS,
            },
            paint: Paint::Fill(self.theme.panel_color()),
            alpha: PANEL_ALPHA,
        });
    }

    // ── text primitives ────────────────────────────────────────────────────

    fn wrap(&self, style: TextStyle, text: &str, width: f32) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let face = self.fonts.face(style.font);
        split_lines(&prepare_text(text), width, &face.at(style.size))
    }

    fn text(&mut self, style: TextStyle, text: String, x: f32, y: f32) {
        if text.is_empty() {
            return;
        }
        self.page.push(Op::Text(TextOp {
            text,
            x,
            y,
            size: style.size,
            font: style.font,
            color: style.color,
            alpha: 1.0,
            role: style.role,
        }));
    }

    fn line_height(&self, style: TextStyle) -> f32 {
        self.theme.line_height(style.size)
    }

    /// Starts a new page when a unit of `min_height` no longer fits.
    fn keep_together(&mut self, min_height: f32) {
        if self.cursor.needs_break(min_height) {
            self.new_page();
        }
    }

    fn gap(&mut self, height: f32) {
        if !self.cursor.at_top() {
            let step = height.min(self.cursor.remaining());
            self.cursor.advance(step);
        }
    }

    fn emit_line(&mut self, style: TextStyle, line: String, x: f32) {
        let line_height = self.line_height(style);
        if !self.cursor.fits(line_height) && !self.cursor.at_top() {
            self.new_page();
        }
        let baseline = self.cursor.y - style.size;
        self.text(style, line, x, baseline);
        self.cursor.advance(line_height);
    }

    fn emit_lines(&mut self, style: TextStyle, lines: Vec<String>, x: f32) {
        for line in lines {
            self.emit_line(style, line, x);
        }
    }

    /// A marker followed by a hanging-indented text block.
    fn emit_marked(&mut self, marker: &str, text: &str, style: TextStyle, x: f32, width: f32) {
        let marker_width = self.fonts.measure(style.font, marker, style.size);
        let indent = marker_width + MARKER_GAP;
        let lines = self.wrap(style, text, width - indent);
        let mut first = true;
        for line in lines {
            let line_height = self.line_height(style);
            if !self.cursor.fits(line_height) && !self.cursor.at_top() {
                self.new_page();
            }
            let baseline = self.cursor.y - style.size;
            if first {
                self.text(style, marker.to_string(), x, baseline);
                first = false;
            }
            self.text(style, line, x + indent, baseline);
            self.cursor.advance(line_height);
        }
    }

    // ── styles ─────────────────────────────────────────────────────────────

    fn body_style(&self) -> TextStyle {
        TextStyle {
            font: FontRole::Regular,
            size: self.theme.sizes.body,
            color: self.theme.body_color(),
            role: TextRole::Body,
        }
    }

    fn section_title_style(&self) -> TextStyle {
        TextStyle {
            font: FontRole::Bold,
            size: self.theme.sizes.section_title,
            color: self.theme.section_title_color(),
            role: TextRole::SectionTitle,
        }
    }

    fn subsection_title_style(&self) -> TextStyle {
        TextStyle {
            font: FontRole::Bold,
            size: self.theme.sizes.subsection_title,
            color: self.theme.subsection_title_color(),
            role: TextRole::SubsectionTitle,
        }
    }

    fn timeline_marker_style(&self) -> TextStyle {
        TextStyle {
            font: FontRole::Bold,
            size: self.theme.sizes.timeline_marker,
            color: self.theme.subsection_title_color(),
            role: TextRole::TimelineMarker,
        }
    }

    // ── content units ──────────────────────────────────────────────────────

    fn section(&mut self, section: &ReportSection) {
        let body = self.body_style();
        let title_style = self.section_title_style();
        let title_lines = self.wrap(title_style, &section.title, self.width);
        if !title_lines.is_empty() {
            let title_height = title_lines.len() as f32 * self.line_height(title_style);
            let first_line = self.line_height(body) + self.theme.spacing.subsection;
            self.keep_together(atomic_height(title_height, first_line));
            self.emit_lines(title_style, title_lines, self.left);
            self.gap(self.theme.spacing.subsection);
        }

        for block in section.paragraphs.iter().filter(|block| !block.is_empty()) {
            self.block(block);
        }
        for bullet in section.bullets.iter().filter(|b| !b.trim().is_empty()) {
            self.keep_together(self.line_height(body));
            let body_style = TextStyle {
                role: TextRole::Bullet,
                ..body
            };
            self.emit_marked(BULLET_MARKER, bullet, body_style, self.left, self.width);
            self.gap(self.theme.spacing.paragraph * 0.5);
        }
        for accent in &section.accent_blocks {
            self.accent_block(accent, FontRole::Accent, POINT_MARKER);
        }
        self.gap(self.theme.spacing.section);
    }

    fn block(&mut self, block: &ContentBlock) {
        let body = self.body_style();
        match block {
            ContentBlock::Paragraph(text) => {
                let lines = self.wrap(body, text, self.width);
                self.emit_lines(body, lines, self.left);
                self.gap(self.theme.spacing.paragraph);
            }
            ContentBlock::Subsection { label, body: text } => {
                let label_style = self.subsection_title_style();
                let label_lines = self.wrap(label_style, label, self.width);
                let label_height = label_lines.len() as f32 * self.line_height(label_style);
                self.keep_together(atomic_height(label_height, self.line_height(body)));
                self.emit_lines(label_style, label_lines, self.left);
                self.gap(self.theme.spacing.subsection * 0.5);
                let lines = self.wrap(body, text, self.width);
                self.emit_lines(body, lines, self.left);
                self.gap(self.theme.spacing.paragraph);
            }
            ContentBlock::Timeline { marker, body: text } => {
                let marker_style = self.timeline_marker_style();
                let marker_lines = self.wrap(marker_style, marker, self.width);
                let marker_height = marker_lines.len() as f32 * self.line_height(marker_style);
                let first_step = if text.trim().is_empty() {
                    0.0
                } else {
                    self.line_height(body)
                };
                self.keep_together(atomic_height(marker_height, first_step));
                self.emit_lines(marker_style, marker_lines, self.left);
                let lines = self.wrap(body, text, self.width - TIMELINE_INDENT);
                self.emit_lines(body, lines, self.left + TIMELINE_INDENT);
                self.gap(self.theme.spacing.paragraph * 0.6);
            }
        }
    }

    fn accent_block(&mut self, block: &ReportAccentBlock, title_font: FontRole, marker: &str) {
        let points: Vec<&String> = block.points.iter().filter(|p| !p.trim().is_empty()).collect();
        if block.title.trim().is_empty() && points.is_empty() {
            return;
        }
        let title_style = TextStyle {
            font: title_font,
            size: self.theme.sizes.subsection_title,
            color: self.theme.subsection_title_color(),
            role: TextRole::AccentTitle,
        };
        let point_style = TextStyle {
            role: TextRole::Bullet,
            ..self.body_style()
        };
        let inner_left = self.left + ACCENT_PADDING;
        let inner_width = self.width - 2.0 * ACCENT_PADDING;
        let marker_indent = self.fonts.measure(point_style.font, marker, point_style.size) + MARKER_GAP;

        let title_lines = self.wrap(title_style, &block.title, inner_width);
        let title_height = title_lines.len() as f32 * self.line_height(title_style);
        let point_face = self.fonts.face(point_style.font);
        let point_measure = point_face.at(point_style.size);
        let point_heights: Vec<f32> = points
            .iter()
            .map(|point| {
                block_height(
                    &prepare_text(point),
                    &point_measure,
                    inner_width - marker_indent,
                    self.line_height(point_style),
                    0.0,
                )
            })
            .collect();
        let first_point = point_heights.first().copied().unwrap_or(0.0);
        let total = title_height + point_heights.iter().sum::<f32>() + 2.0 * ACCENT_PADDING;

        self.keep_together(atomic_height(ACCENT_PADDING + title_height, first_point));
        if self.cursor.fits(total) {
            self.page.push(Op::Shape {
                shape: Shape::RoundedRect {
                    x: self.left,
                    y: self.cursor.y - total,
                    width: self.width,
                    height: total,
                    radius: ACCENT_RADIUS,
                },
                paint: Paint::Fill(self.theme.panel_color().mix(self.theme.palette.ink, 0.15)),
                alpha: ACCENT_ALPHA,
            });
        }
        self.gap(ACCENT_PADDING);
        self.emit_lines(title_style, title_lines, inner_left);
        for point in points {
            self.emit_marked(marker, point, point_style, inner_left, inner_width);
        }
        self.gap(ACCENT_PADDING + self.theme.spacing.paragraph);
    }

    /// Places the disclaimer at the bottom of the last page and returns that
    /// page's index.
    fn disclaimer(&mut self) -> Option<usize> {
        let style = TextStyle {
            font: FontRole::Regular,
            size: self.theme.sizes.disclaimer,
            color: self.theme.disclaimer_color(),
            role: TextRole::Disclaimer,
        };
        let lines = self.wrap(style, &self.document.disclaimer, self.width);
        if lines.is_empty() {
            return None;
        }
        let height = lines.len() as f32 * self.line_height(style);
        if !self.cursor.fits(height + DISCLAIMER_GAP) {
            self.new_page();
        }

        let top = self.cursor.bottom + height;
        self.page.push(Op::Shape {
            shape: Shape::Line {
                x1: self.left,
                y1: top + DISCLAIMER_GAP / 2.0,
                x2: self.left + self.width * 0.3,
                y2: top + DISCLAIMER_GAP / 2.0,
            },
            paint: Paint::Stroke {
                color: style.color,
                width: 0.5,
            },
            alpha: 0.6,
        });
        self.cursor.y = top;
        self.emit_lines(style, lines, self.left);
        Some(self.pages.len())
    }
}

/// Plain pages for the last-resort path: raw text as wrapped paragraphs in the
/// regular face, no assets, no decoration.
pub fn compose_legacy(raw_text: &str, fonts: &FontFamily) -> Vec<PagePlan> {
    let face = fonts.face(FontRole::Regular);
    let measure = face.at(LEGACY_FONT_SIZE);
    let width = PAGE_WIDTH - 2.0 * LEGACY_MARGIN;
    let mut cursor = PageCursor::new(PAGE_HEIGHT - LEGACY_MARGIN, LEGACY_MARGIN);
    let mut pages = Vec::new();
    let mut page = PagePlan::default();

    for line in split_lines(&prepare_text(raw_text), width, &measure) {
        if !cursor.fits(LEGACY_LINE_HEIGHT) && !cursor.at_top() {
            pages.push(mem::take(&mut page));
            cursor.reset();
        }
        if !line.is_empty() {
            page.push(Op::Text(TextOp {
                text: line,
                x: LEGACY_MARGIN,
                y: cursor.y - LEGACY_FONT_SIZE,
                size: LEGACY_FONT_SIZE,
                font: FontRole::Regular,
                color: Rgb(0, 0, 0),
                alpha: 1.0,
                role: TextRole::Body,
            }));
        }
        cursor.advance(LEGACY_LINE_HEIGHT);
    }
    pages.push(page);
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Tariff;
    use crate::render::images::tests::write_png;
    use crate::theme::{resolve_asset_bundle, resolve_theme};
    use std::path::Path;

    fn document(sections: Vec<ReportSection>) -> ReportDocument {
        ReportDocument {
            title: "Where your strength lives".into(),
            subtitle: Tariff::T1.display_title().into(),
            key_findings: vec!["Steady focus beats bursts.".into(), "Rest is part of the work.".into()],
            sections,
            disclaimer: "This service is not a consultation. No refunds.".into(),
            tariff: Tariff::T1,
            decoration_depth: 1,
        }
    }

    fn paragraph_section(title: &str, paragraphs: usize) -> ReportSection {
        ReportSection {
            paragraphs: (0..paragraphs)
                .map(|i| {
                    ContentBlock::paragraph(format!(
                        "Paragraph {i} describes how attention moves between planning and doing, \
                         and why a calm rhythm keeps the work going for longer than a sprint."
                    ))
                })
                .collect(),
            ..ReportSection::titled(title)
        }
    }

    fn compose(doc: &ReportDocument, assets_root: &Path) -> Composition {
        let theme = resolve_theme(Some(doc.tariff));
        let fonts = FontFamily::builtin();
        let bundle = resolve_asset_bundle(Some(doc.tariff)).under(assets_root);
        Composer::new(doc, theme, &fonts, bundle, 42).compose()
    }

    fn content_texts(page: &PagePlan) -> Vec<&TextOp> {
        page.texts()
            .filter(|t| !matches!(t.role, TextRole::Ornament | TextRole::Header))
            .collect()
    }

    #[test]
    fn test_cover_page_stands_alone() {
        let dir = tempfile::tempdir().unwrap();
        let doc = document(vec![paragraph_section("Strengths", 1)]);
        let composition = compose(&doc, dir.path());
        assert!(composition.pages.len() >= 2);
        let cover = content_texts(&composition.pages[0]);
        assert!(cover.iter().any(|t| t.role == TextRole::Title));
        assert!(cover.iter().all(|t| matches!(t.role, TextRole::Title | TextRole::Subtitle)));
    }

    #[test]
    fn test_key_findings_come_first() {
        let dir = tempfile::tempdir().unwrap();
        let doc = document(vec![paragraph_section("Strengths", 1)]);
        let composition = compose(&doc, dir.path());
        let first = content_texts(&composition.pages[1]);
        assert_eq!(first[0].text, KEY_FINDINGS_TITLE);
        let findings_at = first.iter().position(|t| t.text == "Steady focus beats bursts.");
        let section_at = first.iter().position(|t| t.role == TextRole::SectionTitle);
        assert!(findings_at.unwrap() < section_at.unwrap());
    }

    #[test]
    fn test_section_titles_never_end_a_page() {
        let dir = tempfile::tempdir().unwrap();
        let sections = (0..12)
            .map(|i| paragraph_section(&format!("Section {i}"), 3))
            .collect();
        let composition = compose(&document(sections), dir.path());
        assert!(composition.pages.len() > 3);
        for page in &composition.pages[1..] {
            let texts = content_texts(page);
            if let Some(last) = texts.last() {
                assert_ne!(last.role, TextRole::SectionTitle, "dangling title {:?}", last.text);
            }
        }
    }

    #[test]
    fn test_subsection_label_is_drawn_apart_from_body() {
        let dir = tempfile::tempdir().unwrap();
        let section = ReportSection {
            paragraphs: vec![ContentBlock::Subsection {
                label: "Focus".into(),
                body: "keep one priority per week.".into(),
            }],
            ..ReportSection::titled("Strengths")
        };
        let doc = document(vec![section]);
        let composition = compose(&doc, dir.path());
        let theme = resolve_theme(Some(Tariff::T1));
        let texts = content_texts(&composition.pages[1]);
        let label = texts.iter().find(|t| t.text == "Focus").expect("label");
        let body = texts
            .iter()
            .find(|t| t.text.starts_with("keep one priority"))
            .expect("body");
        let title = texts.iter().find(|t| t.text == "Strengths").expect("title");

        assert_eq!(label.font, FontRole::Bold);
        assert_eq!(label.color, theme.subsection_title_color());
        assert_eq!(body.font, FontRole::Regular);
        assert_eq!(body.size, theme.sizes.body);
        assert_eq!(body.color, theme.body_color());
        assert_ne!(title.color, label.color);
        assert!(label.y > body.y);
    }

    #[test]
    fn test_timeline_body_is_indented_under_marker() {
        let dir = tempfile::tempdir().unwrap();
        let section = ReportSection {
            paragraphs: vec![ContentBlock::Timeline {
                marker: "Week 1".into(),
                body: "choose the test scenario.".into(),
            }],
            ..ReportSection::titled("Plan")
        };
        let composition = compose(&document(vec![section]), dir.path());
        let texts = content_texts(&composition.pages[1]);
        let marker = texts.iter().find(|t| t.text == "Week 1").unwrap();
        let step = texts.iter().find(|t| t.text.starts_with("choose")).unwrap();
        assert_eq!(marker.role, TextRole::TimelineMarker);
        assert!(step.x > marker.x);
    }

    #[test]
    fn test_disclaimer_sits_below_all_content_on_last_page() {
        let dir = tempfile::tempdir().unwrap();
        let doc = document(vec![paragraph_section("Strengths", 4)]);
        let composition = compose(&doc, dir.path());
        let index = composition.disclaimer_page.expect("disclaimer placed");
        assert_eq!(index, composition.pages.len() - 1);
        let texts = content_texts(&composition.pages[index]);
        let lowest_content = texts
            .iter()
            .filter(|t| t.role != TextRole::Disclaimer)
            .map(|t| t.y)
            .fold(f32::MAX, f32::min);
        let disclaimer = texts.iter().find(|t| t.role == TextRole::Disclaimer).unwrap();
        assert!(disclaimer.y < lowest_content);
    }

    #[test]
    fn test_assets_are_layered_when_present() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "backgrounds/shared_bg_fallback.webp", 255);
        write_png(dir.path(), "overlays/t1_overlay_main.png", 200);
        write_png(dir.path(), "icons/shared_icon_fallback.png", 255);
        let doc = document(vec![paragraph_section("Strengths", 1)]);
        let composition = compose(&doc, dir.path());

        let cover = &composition.pages[0];
        assert!(cover.has_image(AssetKind::Icon));
        assert!(!cover.has_image(AssetKind::Overlay));
        let content = &composition.pages[1];
        let overlay_alpha = content.ops.iter().find_map(|op| match op {
            Op::Image {
                kind: AssetKind::Overlay,
                alpha,
                ..
            } => Some(*alpha),
            _ => None,
        });
        assert_eq!(overlay_alpha, Some(resolve_theme(Some(Tariff::T1)).overlay_alpha));
        assert!(content.has_image(AssetKind::Background));
        assert!(cover.has_image(AssetKind::Background));
    }

    #[test]
    fn test_legacy_paginates_plain_text() {
        let fonts = FontFamily::builtin();
        let raw = "A line of plain report text that keeps going.\n".repeat(120);
        let pages = compose_legacy(&raw, &fonts);
        assert!(pages.len() >= 2);
        for page in &pages {
            for text in page.texts() {
                assert_eq!(text.size, LEGACY_FONT_SIZE);
                assert_eq!(text.font, FontRole::Regular);
                assert!(text.y >= LEGACY_MARGIN - LEGACY_FONT_SIZE);
            }
        }
    }

    #[test]
    fn test_legacy_of_empty_text_is_one_blank_page() {
        let pages = compose_legacy("", &FontFamily::builtin());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].texts().count(), 0);
    }
}
