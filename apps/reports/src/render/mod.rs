// Theme renderer: ReportDocument → page plans → PDF bytes.
// All of this is synchronous and CPU-bound; the HTTP layer runs it inside
// tokio::task::spawn_blocking.

pub mod compose;
pub mod decor;
pub mod fonts;
pub mod images;
pub mod pdf;
pub mod plan;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::document::{ReportDocument, ReportDocumentBuilder, ReportMeta, Tariff};
use crate::errors::RenderError;
use crate::theme::{resolve_asset_bundle, resolve_theme};

pub use compose::{compose_legacy, Composer, Composition};
pub use fonts::{resolve_font_family, FontFamily, FontPaths, FontRole};

/// A4 in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

const LEGACY_TITLE: &str = "Report";

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Zero-based page holding the disclaimer, when one was drawn.
    pub disclaimer_page: Option<usize>,
    pub used_legacy_path: bool,
}

/// Renders documents with the per-tariff theme, assets and fonts.
#[derive(Debug, Clone)]
pub struct ThemeRenderer {
    fonts: Arc<FontFamily>,
    assets_root: PathBuf,
    builder: ReportDocumentBuilder,
}

impl ThemeRenderer {
    pub fn new(fonts: Arc<FontFamily>, assets_root: impl Into<PathBuf>, builder: ReportDocumentBuilder) -> Self {
        Self {
            fonts,
            assets_root: assets_root.into(),
            builder,
        }
    }

    pub fn fonts(&self) -> &FontFamily {
        &self.fonts
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    pub fn builder(&self) -> &ReportDocumentBuilder {
        &self.builder
    }

    /// Structured render. Uses `document` when given, otherwise builds one
    /// from `raw_text`. A precomputed document is styled by its own tariff.
    /// Fails with [`RenderError::ParseProducedEmpty`] when the text yields no
    /// document; the caller is expected to fall back to
    /// [`ThemeRenderer::render_legacy`].
    pub fn render(
        &self,
        raw_text: &str,
        tariff: Option<Tariff>,
        meta: &ReportMeta,
        document: Option<&ReportDocument>,
    ) -> Result<RenderedReport, RenderError> {
        let styling = styling_tariff(tariff, document);
        let built;
        let document = match document {
            Some(document) => document,
            None => {
                built = self
                    .builder
                    .build(raw_text, tariff, meta)
                    .ok_or(RenderError::ParseProducedEmpty)?;
                &built
            }
        };

        let theme = resolve_theme(styling);
        let bundle = resolve_asset_bundle(styling).under(&self.assets_root);
        let seed = decor::decoration_seed(meta, &document.title);
        debug!(
            report_id = meta.id.as_deref().unwrap_or(""),
            theme = theme.name,
            seed,
            "pdf_render_started"
        );

        let composition = Composer::new(document, theme, &self.fonts, bundle, seed).compose();
        let page_count = composition.pages.len();
        let bytes = pdf::write_pdf(
            &composition.pages,
            &self.fonts,
            (PAGE_WIDTH, PAGE_HEIGHT),
            &document.title,
        );
        info!(
            report_id = meta.id.as_deref().unwrap_or(""),
            theme = theme.name,
            pages = page_count,
            bytes = bytes.len(),
            "pdf_render_completed"
        );

        Ok(RenderedReport {
            bytes,
            page_count,
            disclaimer_page: composition.disclaimer_page,
            used_legacy_path: false,
        })
    }

    /// Plain render of the raw text: body style, no assets, no structure.
    pub fn render_legacy(&self, raw_text: &str) -> RenderedReport {
        render_legacy_with(&self.fonts, raw_text)
    }
}

/// Unknown requested tariffs stay `None` so they get the safe theme.
fn styling_tariff(requested: Option<Tariff>, document: Option<&ReportDocument>) -> Option<Tariff> {
    document.map_or(requested, |document| Some(document.tariff))
}

/// Legacy render with an explicit font family. With
/// [`FontFamily::builtin`] it cannot fail.
pub fn render_legacy_with(fonts: &FontFamily, raw_text: &str) -> RenderedReport {
    let pages = compose_legacy(raw_text, fonts);
    let page_count = pages.len();
    let bytes = pdf::write_pdf(&pages, fonts, (PAGE_WIDTH, PAGE_HEIGHT), LEGACY_TITLE);
    RenderedReport {
        bytes,
        page_count,
        disclaimer_page: None,
        used_legacy_path: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BuilderOptions;

    fn renderer(dir: &Path) -> ThemeRenderer {
        ThemeRenderer::new(
            Arc::new(FontFamily::builtin()),
            dir,
            ReportDocumentBuilder::new(BuilderOptions::default()),
        )
    }

    const RAW: &str = "Where your strength lives\n\
        Key findings\n\
        - You recover fastest through structured routines.\n\
        Strengths\n\
        You organise chaos into plans and keep commitments visible.\n\
        ## Focus: one priority per week keeps momentum.\n\
        Growth zones\n\
        - Delegation still feels risky.\n";

    #[test]
    fn test_structured_render_produces_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let rendered = renderer(dir.path())
            .render(RAW, Some(Tariff::T2), &ReportMeta::with_id("17"), None)
            .unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert!(!rendered.used_legacy_path);
        assert!(rendered.page_count >= 2);
        assert_eq!(rendered.disclaimer_page, Some(rendered.page_count - 1));
    }

    #[test]
    fn test_blank_text_reports_empty_parse() {
        let dir = tempfile::tempdir().unwrap();
        let result = renderer(dir.path()).render("  \n ", Some(Tariff::T1), &ReportMeta::default(), None);
        assert!(matches!(result, Err(RenderError::ParseProducedEmpty)));
    }

    #[test]
    fn test_precomputed_document_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path());
        let meta = ReportMeta::with_id("9");
        let document = r.builder().build(RAW, Some(Tariff::T0), &meta).unwrap();
        let rendered = r.render("", Some(Tariff::T0), &meta, Some(&document)).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_precomputed_document_keeps_its_tariff_styling() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path());
        let meta = ReportMeta::with_id("31");
        let document = r.builder().build(RAW, Some(Tariff::T3), &meta).unwrap();

        let styling = styling_tariff(None, Some(&document));
        assert_eq!(styling, Some(Tariff::T3));
        assert_eq!(resolve_theme(styling).name, "arcana-t3");
        assert_eq!(styling_tariff(Tariff::parse("T9"), None), None);
        assert_eq!(resolve_theme(styling_tariff(None, None)).name, "arcana-safe");

        let rendered = r.render("", None, &meta, Some(&document)).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_unknown_tariff_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let rendered = renderer(dir.path())
            .render(RAW, Tariff::parse("T9"), &ReportMeta::default(), None)
            .unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_legacy_render_always_emits_pdf() {
        let rendered = render_legacy_with(&FontFamily::builtin(), "Кириллица and ASCII\n\nsecond paragraph");
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert!(rendered.used_legacy_path);
        assert_eq!(rendered.page_count, 1);
    }
}
