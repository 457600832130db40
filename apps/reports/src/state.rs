use std::sync::Arc;

use crate::config::Config;
use crate::service::PdfService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Renderer and storage facade. Renders are CPU-bound and run on the
    /// blocking pool.
    pub service: Arc<PdfService>,
}
