//! Font resolution with per-role degradation and a process-wide cache.
//!
//! Each role tries its configured TrueType file, then the bundled file under
//! `assets/fonts`, then a built-in base face. A failed role never fails the
//! render. Resolved families are cached by their configured paths; two threads
//! resolving the same paths at once may both load the files, and the last
//! insert wins.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use tracing::{debug, warn};
use ttf_parser::{Face, GlyphId};

use crate::errors::RenderError;
use crate::layout::{get_metrics, BuiltinFont, TextMeasure};

const BUNDLED_REGULAR: &str = "DejaVuSans.ttf";
const BUNDLED_BOLD: &str = "DejaVuSans-Bold.ttf";
const BUNDLED_ACCENT: &str = "DejaVuSerif.ttf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    Regular,
    Bold,
    Accent,
}

impl FontRole {
    pub const ALL: [FontRole; 3] = [FontRole::Regular, FontRole::Bold, FontRole::Accent];

    pub fn as_str(self) -> &'static str {
        match self {
            FontRole::Regular => "regular",
            FontRole::Bold => "bold",
            FontRole::Accent => "accent",
        }
    }

    fn bundled_file(self) -> &'static str {
        match self {
            FontRole::Regular => BUNDLED_REGULAR,
            FontRole::Bold => BUNDLED_BOLD,
            FontRole::Accent => BUNDLED_ACCENT,
        }
    }

    fn builtin(self) -> BuiltinFont {
        match self {
            FontRole::Regular => BuiltinFont::Helvetica,
            FontRole::Bold | FontRole::Accent => BuiltinFont::HelveticaBold,
        }
    }
}

/// Configured font files. Also the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FontPaths {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
    pub accent: Option<PathBuf>,
    pub bundled_dir: PathBuf,
}

impl FontPaths {
    fn configured(&self, role: FontRole) -> Option<&Path> {
        match role {
            FontRole::Regular => self.regular.as_deref(),
            FontRole::Bold => self.bold.as_deref(),
            FontRole::Accent => self.accent.as_deref(),
        }
    }

    /// Paths tried for `role`, in order.
    pub fn candidates(&self, role: FontRole) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(2);
        if let Some(path) = self.configured(role) {
            paths.push(path.to_path_buf());
        }
        let bundled = self.bundled_dir.join(role.bundled_file());
        if !paths.contains(&bundled) {
            paths.push(bundled);
        }
        paths
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TrueType faces
// ────────────────────────────────────────────────────────────────────────────

/// A parsed-on-demand TrueType font file.
pub struct TrueTypeFont {
    /// Sanitized PostScript-style name used as `BaseFont`.
    pub name: String,
    pub path: PathBuf,
    data: Vec<u8>,
    pub units_per_em: f32,
    /// Scaled to a 1000-unit em, the way PDF font descriptors expect.
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub bbox: [f32; 4],
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl TrueTypeFont {
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path).map_err(|e| RenderError::FontLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(path, data)
    }

    pub fn from_bytes(path: &Path, data: Vec<u8>) -> Result<Self, RenderError> {
        let face = Face::parse(&data, 0).map_err(|e| RenderError::FontLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let units_per_em = f32::from(face.units_per_em());
        let scale = 1000.0 / units_per_em;
        let bbox = face.global_bounding_box();
        let ascent = f32::from(face.ascender()) * scale;
        let descent = f32::from(face.descender()) * scale;
        let cap_height = face
            .capital_height()
            .map_or(ascent * 0.7, |height| f32::from(height) * scale);
        let bbox = [
            f32::from(bbox.x_min) * scale,
            f32::from(bbox.y_min) * scale,
            f32::from(bbox.x_max) * scale,
            f32::from(bbox.y_max) * scale,
        ];

        Ok(Self {
            name: base_font_name(path),
            path: path.to_path_buf(),
            data,
            units_per_em,
            ascent,
            descent,
            cap_height,
            bbox,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    /// Glyph id and advance (in 1000-unit em) for each character; characters
    /// without a glyph map to `.notdef`.
    pub fn glyphs(&self, text: &str) -> Vec<(char, u16, f32)> {
        let Some(face) = self.face() else {
            return Vec::new();
        };
        let scale = 1000.0 / self.units_per_em;
        text.chars()
            .map(|c| {
                let gid = face.glyph_index(c).unwrap_or(GlyphId(0));
                let advance = face.glyph_hor_advance(gid).map_or(0.0, f32::from);
                (c, gid.0, advance * scale)
            })
            .collect()
    }

    fn width_em(&self, text: &str) -> f32 {
        self.glyphs(text).iter().map(|(_, _, w)| w).sum::<f32>() / 1000.0
    }
}

fn base_font_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        name
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Faces and families
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum FontFace {
    TrueType(Arc<TrueTypeFont>),
    Builtin(BuiltinFont),
}

impl FontFace {
    /// Width of `text` in points at `size`.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        match self {
            FontFace::TrueType(font) => font.width_em(text) * size,
            FontFace::Builtin(font) => get_metrics(*font).measure_str(text) * size,
        }
    }

    /// Measurement closure at a fixed size for the layout engine.
    pub fn at(&self, size: f32) -> impl TextMeasure + '_ {
        move |text: &str| self.measure(text, size)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, FontFace::Builtin(_))
    }
}

/// One resolved face per role.
#[derive(Debug, Clone)]
pub struct FontFamily {
    pub regular: FontFace,
    pub bold: FontFace,
    pub accent: FontFace,
}

impl FontFamily {
    /// The universal last-resort family.
    pub fn builtin() -> Self {
        Self {
            regular: FontFace::Builtin(FontRole::Regular.builtin()),
            bold: FontFace::Builtin(FontRole::Bold.builtin()),
            accent: FontFace::Builtin(FontRole::Accent.builtin()),
        }
    }

    pub fn face(&self, role: FontRole) -> &FontFace {
        match role {
            FontRole::Regular => &self.regular,
            FontRole::Bold => &self.bold,
            FontRole::Accent => &self.accent,
        }
    }

    pub fn measure(&self, role: FontRole, text: &str, size: f32) -> f32 {
        self.face(role).measure(text, size)
    }
}

fn load_role(paths: &FontPaths, role: FontRole) -> FontFace {
    for path in paths.candidates(role) {
        if !path.exists() {
            debug!(role = role.as_str(), font_path = %path.display(), "pdf_font_candidate_absent");
            continue;
        }
        match TrueTypeFont::load(&path) {
            Ok(font) => return FontFace::TrueType(Arc::new(font)),
            Err(e) => {
                warn!(
                    role = role.as_str(),
                    font_path = %path.display(),
                    error = %e,
                    "pdf_font_register_failed"
                );
            }
        }
    }
    warn!(role = role.as_str(), "pdf_font_builtin_fallback");
    FontFace::Builtin(role.builtin())
}

fn load_family(paths: &FontPaths) -> FontFamily {
    FontFamily {
        regular: load_role(paths, FontRole::Regular),
        bold: load_role(paths, FontRole::Bold),
        accent: load_role(paths, FontRole::Accent),
    }
}

type FamilyCache = RwLock<HashMap<FontPaths, Arc<FontFamily>>>;

fn family_cache() -> &'static FamilyCache {
    static CACHE: OnceLock<FamilyCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Resolves (and caches) the font family for the configured paths.
pub fn resolve_font_family(paths: &FontPaths) -> Arc<FontFamily> {
    if let Ok(cache) = family_cache().read() {
        if let Some(family) = cache.get(paths) {
            return Arc::clone(family);
        }
    }

    let family = Arc::new(load_family(paths));
    if let Ok(mut cache) = family_cache().write() {
        cache.insert(paths.clone(), Arc::clone(&family));
    }
    family
}
