//! PDF facade: render with degradation, persist with a secondary fallback,
//! name files for delivery.

use std::panic::{self, AssertUnwindSafe};

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::document::{BuilderOptions, ReportDocument, ReportDocumentBuilder, ReportMeta, Tariff};
use crate::errors::StorageError;
use crate::render::{render_legacy_with, resolve_font_family, FontFamily, RenderedReport, ThemeRenderer};
use crate::storage::{build_storage, LocalStorage, ReportStorage, StorageMode};

pub struct PdfService {
    renderer: ThemeRenderer,
    storage: Box<dyn ReportStorage>,
    secondary: Option<LocalStorage>,
    tz_offset_hours: i32,
}

impl PdfService {
    pub fn new(
        renderer: ThemeRenderer,
        storage: Box<dyn ReportStorage>,
        secondary: Option<LocalStorage>,
        tz_offset_hours: i32,
    ) -> Self {
        Self {
            renderer,
            storage,
            secondary,
            tz_offset_hours,
        }
    }

    pub async fn from_config(config: &Config) -> Self {
        let fonts = resolve_font_family(&config.font_paths());
        let builder = ReportDocumentBuilder::new(BuilderOptions {
            subsection_fallback_heuristic: config.subsection_fallback_heuristic,
            ..BuilderOptions::default()
        });
        let renderer = ThemeRenderer::new(fonts, config.assets_root.clone(), builder);
        let storage = build_storage(config).await;
        let secondary = config.secondary_storage_dir.clone().map(LocalStorage::new);
        Self::new(renderer, storage, secondary, config.report_tz_offset_hours)
    }

    pub fn renderer(&self) -> &ThemeRenderer {
        &self.renderer
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage.mode()
    }

    /// Always returns a PDF. A failed or panicking structured render falls
    /// back to the legacy layout; a failing legacy layout retries with the
    /// built-in face.
    pub fn generate_pdf(
        &self,
        raw_text: &str,
        tariff: Option<Tariff>,
        meta: &ReportMeta,
        document: Option<&ReportDocument>,
    ) -> RenderedReport {
        let report_id = meta.id.as_deref().unwrap_or("");
        let structured = panic::catch_unwind(AssertUnwindSafe(|| {
            self.renderer.render(raw_text, tariff, meta, document)
        }));
        match structured {
            Ok(Ok(report)) => return report,
            Ok(Err(e)) => warn!(report_id, error = %e, "pdf_render_fallback_legacy"),
            Err(_) => warn!(report_id, "pdf_render_panicked"),
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.renderer.render_legacy(raw_text))) {
            Ok(report) => report,
            Err(_) => {
                warn!(report_id, "pdf_legacy_builtin_retry");
                render_legacy_with(&FontFamily::builtin(), raw_text)
            }
        }
    }

    /// Stores under `{report_id}.pdf`. A failing primary backend is retried
    /// against the secondary directory. `None` means nothing was stored.
    pub async fn store_pdf(&self, report_id: &str, bytes: &[u8]) -> Option<String> {
        let key = format!("{report_id}.pdf");
        let primary_error = match self.storage.save(&key, bytes).await {
            Ok(stored) => return Some(stored),
            Err(e) => e,
        };
        warn!(report_id, error = %primary_error, "pdf_store_failed");

        let secondary = self.secondary.as_ref()?;
        match secondary.save(&key, bytes).await {
            Ok(stored) => {
                info!(report_id, root = %secondary.root().display(), "pdf_stored_secondary");
                Some(stored)
            }
            Err(e) => {
                warn!(report_id, error = %e, "pdf_secondary_store_failed");
                None
            }
        }
    }

    /// Loads from the primary backend, then from the secondary directory.
    pub async fn fetch_pdf(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let primary_error = match self.storage.load(key).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };
        if matches!(primary_error, StorageError::InvalidKey(_)) {
            return Err(primary_error);
        }
        match &self.secondary {
            Some(secondary) => secondary.load(key).await.map_err(|_| primary_error),
            None => Err(primary_error),
        }
    }

    pub async fn load_pdf(&self, key: &str) -> Option<Vec<u8>> {
        match self.fetch_pdf(key).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(storage_key = key, error = %e, "pdf_load_failed");
                None
            }
        }
    }

    /// Deletes from every backend holding the key. Fails with `NotFound` only
    /// when no backend had it.
    pub async fn delete_pdf(&self, key: &str) -> Result<(), StorageError> {
        let primary = self.storage.delete(key).await;
        let secondary = match &self.secondary {
            Some(secondary) => Some(secondary.delete(key).await),
            None => None,
        };
        match (primary, secondary) {
            (Ok(()), _) | (Err(StorageError::NotFound(_)), Some(Ok(()))) => Ok(()),
            (Err(e), _) => Err(e),
        }
    }

    pub fn pdf_filename(
        &self,
        meta: &ReportMeta,
        tariff: Option<Tariff>,
        username: Option<&str>,
        user_id: Option<i64>,
    ) -> String {
        pdf_filename(meta, tariff, username, user_id, self.tz_offset_hours)
    }
}

/// `@{username|user_<id>}_{tariff}_{YYYYMMDD-HHMMSS}_{id}.pdf`, with the
/// timestamp shifted to the report timezone.
pub fn pdf_filename(
    meta: &ReportMeta,
    tariff: Option<Tariff>,
    username: Option<&str>,
    user_id: Option<i64>,
    tz_offset_hours: i32,
) -> String {
    let handle = username
        .map(sanitize_component)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| match user_id {
            Some(id) => format!("user_{id}"),
            None => "user".to_string(),
        });
    let tariff = tariff.map_or("T1", Tariff::code);
    let stamp = meta
        .created_at
        .unwrap_or_else(Utc::now)
        .checked_add_signed(Duration::hours(i64::from(tz_offset_hours)))
        .map(|ts| ts.format("%Y%m%d-%H%M%S").to_string())
        .unwrap_or_default();
    let id = meta
        .id
        .as_deref()
        .map(sanitize_component)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| "report".to_string());
    format!("@{handle}_{tariff}_{stamp}_{id}.pdf")
}

fn sanitize_component(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('@')
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn meta() -> ReportMeta {
        ReportMeta {
            id: Some("282".into()),
            created_at: Utc.with_ymd_and_hms(2026, 1, 20, 18, 12, 27).single(),
        }
    }

    /// A backend whose writes always fail.
    struct BrokenStorage;

    #[async_trait]
    impl ReportStorage for BrokenStorage {
        async fn save(&self, _key: &str, _bytes: &[u8]) -> Result<String, StorageError> {
            Err(StorageError::S3("bucket unreachable".into()))
        }

        async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
            Err(StorageError::NotFound(key.to_string()))
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            Err(StorageError::NotFound(key.to_string()))
        }

        fn mode(&self) -> StorageMode {
            StorageMode::Bucket
        }
    }

    fn service(storage: Box<dyn ReportStorage>, secondary: Option<LocalStorage>) -> PdfService {
        let dir = std::env::temp_dir().join("arcana-reports-missing-assets");
        let renderer = ThemeRenderer::new(
            Arc::new(FontFamily::builtin()),
            dir,
            ReportDocumentBuilder::default(),
        );
        PdfService::new(renderer, storage, secondary, 3)
    }

    #[test]
    fn test_filename_with_username() {
        let name = pdf_filename(&meta(), Some(Tariff::T3), Some("real_user"), Some(123), 3);
        assert_eq!(name, "@real_user_T3_20260120-211227_282.pdf");
    }

    #[test]
    fn test_filename_falls_back_to_user_id() {
        let name = pdf_filename(&meta(), Some(Tariff::T3), None, Some(555000), 3);
        assert_eq!(name, "@user_555000_T3_20260120-211227_282.pdf");
        let blank = pdf_filename(&meta(), Some(Tariff::T3), Some(" @ "), Some(555000), 3);
        assert_eq!(blank, name);
    }

    #[test]
    fn test_filename_strips_handle_prefix_and_path_chars() {
        let name = pdf_filename(&meta(), Some(Tariff::T0), Some("@we/ird"), None, 0);
        assert_eq!(name, "@weird_T0_20260120-181227_282.pdf");
    }

    #[test]
    fn test_generate_falls_back_to_legacy_for_blank_text() {
        let svc = service(Box::new(BrokenStorage), None);
        let report = svc.generate_pdf("   ", Some(Tariff::T1), &meta(), None);
        assert!(report.used_legacy_path);
        assert!(report.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_generate_structured_for_unknown_tariff() {
        let svc = service(Box::new(BrokenStorage), None);
        let report = svc.generate_pdf(
            "Report title\nStrengths\nYou keep promises and plans visible.",
            Tariff::parse("T42"),
            &meta(),
            None,
        );
        assert!(!report.used_legacy_path);
        assert!(report.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_store_and_load_local() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(Box::new(LocalStorage::new(dir.path())), None);
        let key = svc.store_pdf("282", b"%PDF-1.7").await.unwrap();
        assert_eq!(key, "282.pdf");
        assert_eq!(svc.load_pdf(&key).await.unwrap(), b"%PDF-1.7");
        assert_eq!(svc.storage_mode(), StorageMode::Local);
    }

    #[tokio::test]
    async fn test_failing_primary_uses_secondary_directory() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(Box::new(BrokenStorage), Some(LocalStorage::new(dir.path())));
        let key = svc.store_pdf("77", b"%PDF-1.7").await.unwrap();
        assert!(dir.path().join("77.pdf").exists());
        assert_eq!(svc.load_pdf(&key).await.unwrap(), b"%PDF-1.7");
        svc.delete_pdf(&key).await.unwrap();
        assert!(svc.load_pdf(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_failing_primary_without_secondary_stores_nothing() {
        let svc = service(Box::new(BrokenStorage), None);
        assert!(svc.store_pdf("1", b"x").await.is_none());
        assert!(svc.load_pdf("1.pdf").await.is_none());
        assert!(matches!(
            svc.delete_pdf("1.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
