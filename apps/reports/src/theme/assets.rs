//! Per-tariff raster assets with shared fallbacks.
//!
//! Paths are relative to the assets root (`PDF_ASSETS_ROOT`). Resolution does no
//! I/O; the renderer decides at draw time whether a file exists and decodes.

use std::path::{Path, PathBuf};

use crate::document::Tariff;

const BACKGROUND_FALLBACK: &str = "backgrounds/shared_bg_fallback.webp";
const OVERLAY_FALLBACK: &str = "overlays/shared_overlay_fallback.png";
const ICON_FALLBACK: &str = "icons/shared_icon_fallback.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Background,
    Overlay,
    Icon,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Background => "background",
            AssetKind::Overlay => "overlay",
            AssetKind::Icon => "icon",
        }
    }
}

/// A main path and the fallback tried when the main one is missing or undecodable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    pub main: PathBuf,
    pub fallback: PathBuf,
}

impl AssetPair {
    fn shared(fallback: &str) -> Self {
        Self {
            main: PathBuf::from(fallback),
            fallback: PathBuf::from(fallback),
        }
    }

    /// Candidates in the order they should be tried, deduplicated.
    pub fn candidates(&self) -> Vec<&Path> {
        if self.main == self.fallback {
            vec![self.main.as_path()]
        } else {
            vec![self.main.as_path(), self.fallback.as_path()]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBundle {
    pub background: AssetPair,
    pub overlay: AssetPair,
    pub icon: AssetPair,
}

impl AssetBundle {
    pub fn get(&self, kind: AssetKind) -> &AssetPair {
        match kind {
            AssetKind::Background => &self.background,
            AssetKind::Overlay => &self.overlay,
            AssetKind::Icon => &self.icon,
        }
    }

    /// Rebases every path onto `root`.
    pub fn under(&self, root: &Path) -> AssetBundle {
        let rebase = |pair: &AssetPair| AssetPair {
            main: root.join(&pair.main),
            fallback: root.join(&pair.fallback),
        };
        AssetBundle {
            background: rebase(&self.background),
            overlay: rebase(&self.overlay),
            icon: rebase(&self.icon),
        }
    }

    fn fallback_only() -> Self {
        Self {
            background: AssetPair::shared(BACKGROUND_FALLBACK),
            overlay: AssetPair::shared(OVERLAY_FALLBACK),
            icon: AssetPair::shared(ICON_FALLBACK),
        }
    }
}

/// Asset bundle for a tariff; `None` yields the all-fallback bundle.
pub fn resolve_asset_bundle(tariff: Option<Tariff>) -> AssetBundle {
    let Some(tariff) = tariff else {
        return AssetBundle::fallback_only();
    };
    let prefix = tariff.code().to_ascii_lowercase();
    AssetBundle {
        background: AssetPair {
            main: PathBuf::from(format!("backgrounds/{prefix}_bg_main.webp")),
            fallback: PathBuf::from(BACKGROUND_FALLBACK),
        },
        overlay: AssetPair {
            main: PathBuf::from(format!("overlays/{prefix}_overlay_main.png")),
            fallback: PathBuf::from(OVERLAY_FALLBACK),
        },
        icon: AssetPair {
            main: PathBuf::from(format!("icons/{prefix}_icon_main.png")),
            fallback: PathBuf::from(ICON_FALLBACK),
        },
    }
}
