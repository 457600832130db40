//! Theme asset loading with main → fallback degradation.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::errors::RenderError;
use crate::theme::{AssetKind, AssetPair};

/// An 8-bit RGB raster with an optional alpha plane.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub alpha: Option<Vec<u8>>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_alpha", &self.alpha.is_some())
            .finish()
    }
}

impl DecodedImage {
    pub fn decode(path: &Path, bytes: &[u8]) -> Result<Self, RenderError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| {
            warn!(path = %path.display(), error = %e, "pdf_asset_decode_failed");
            RenderError::AssetMissing {
                path: path.to_path_buf(),
            }
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
        let rgb = rgba
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
        Ok(Self {
            width,
            height,
            rgb,
            alpha,
        })
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Per-render asset cache. Each path is read and decoded at most once, so an
/// asset drawn on every page is embedded once.
#[derive(Debug, Default)]
pub struct AssetLoader {
    cache: HashMap<PathBuf, Option<Arc<DecodedImage>>>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// First decodable candidate of `pair`, or `None` when the layer must be skipped.
    pub fn load(&mut self, kind: AssetKind, pair: &AssetPair) -> Option<(PathBuf, Arc<DecodedImage>)> {
        for path in pair.candidates() {
            if let Some(image) = self.load_path(kind, path) {
                return Some((path.to_path_buf(), image));
            }
        }
        None
    }

    fn load_path(&mut self, kind: AssetKind, path: &Path) -> Option<Arc<DecodedImage>> {
        if let Some(cached) = self.cache.get(path) {
            return cached.clone();
        }
        let loaded = match read_image(path) {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                warn!(asset = kind.as_str(), path = %path.display(), error = %e, "pdf_theme_asset_missing");
                None
            }
        };
        self.cache.insert(path.to_path_buf(), loaded.clone());
        loaded
    }
}

fn read_image(path: &Path) -> Result<DecodedImage, RenderError> {
    let bytes = std::fs::read(path).map_err(|_| RenderError::AssetMissing {
        path: path.to_path_buf(),
    })?;
    DecodedImage::decode(path, &bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes a small RGBA PNG and returns its path.
    pub(crate) fn write_png(dir: &Path, name: &str, alpha: u8) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([200, 100, 50, alpha]));
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn test_missing_main_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = write_png(dir.path(), "shared.png", 255);
        let pair = AssetPair {
            main: dir.path().join("missing.png"),
            fallback: fallback.clone(),
        };
        let mut loader = AssetLoader::new();
        let (path, image) = loader.load(AssetKind::Overlay, &pair).expect("fallback");
        assert_eq!(path, fallback);
        assert_eq!((image.width, image.height), (4, 2));
        assert!(image.alpha.is_none());
        assert_eq!(image.rgb.len(), 4 * 2 * 3);
    }

    #[test]
    fn test_both_missing_skips_layer() {
        let dir = tempfile::tempdir().unwrap();
        let pair = AssetPair {
            main: dir.path().join("a.png"),
            fallback: dir.path().join("b.png"),
        };
        assert!(AssetLoader::new().load(AssetKind::Icon, &pair).is_none());
    }

    #[test]
    fn test_undecodable_file_is_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("bg.webp");
        std::fs::write(&main, b"garbage").unwrap();
        let pair = AssetPair {
            main,
            fallback: dir.path().join("nothing.webp"),
        };
        assert!(AssetLoader::new().load(AssetKind::Background, &pair).is_none());
    }

    #[test]
    fn test_translucent_png_keeps_alpha_plane() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "overlay.png", 128);
        let pair = AssetPair {
            main: path.clone(),
            fallback: path,
        };
        let (_, image) = AssetLoader::new().load(AssetKind::Overlay, &pair).unwrap();
        assert_eq!(image.alpha.as_deref(), Some(&[128u8; 8][..]));
    }

    #[test]
    fn test_loader_caches_decoded_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "icon.png", 255);
        let pair = AssetPair {
            main: path.clone(),
            fallback: path,
        };
        let mut loader = AssetLoader::new();
        let (_, first) = loader.load(AssetKind::Icon, &pair).unwrap();
        let (_, second) = loader.load(AssetKind::Icon, &pair).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
