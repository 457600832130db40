//! Typography themes: one immutable table of visual parameters per tariff.

pub mod assets;

use crate::document::Tariff;

pub use assets::{resolve_asset_bundle, AssetBundle, AssetKind, AssetPair};

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `0x120A2C` → `#120A2C`.
    pub const fn from_hex(hex: u32) -> Self {
        Self((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Components in `0.0..=1.0`, the form PDF color operators take.
    pub fn unit(self) -> [f32; 3] {
        [self.0, self.1, self.2].map(|c| f32::from(c) / 255.0)
    }

    /// Linear blend toward `other` by `t`.
    pub fn mix(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let blend = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Rgb(
            blend(self.0, other.0),
            blend(self.1, other.1),
            blend(self.2, other.2),
        )
    }
}

/// Deep background, accent, ink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Rgb,
    pub accent: Rgb,
    pub ink: Rgb,
}

/// Font size per typographic role, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleSizes {
    pub title: f32,
    pub subtitle: f32,
    pub section_title: f32,
    pub subsection_title: f32,
    pub body: f32,
    pub disclaimer: f32,
    pub timeline_marker: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub paragraph: f32,
    pub section: f32,
    pub subsection: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypographyTheme {
    pub name: &'static str,
    pub palette: Palette,
    pub sizes: RoleSizes,
    pub line_height_ratio: f32,
    pub spacing: Spacing,
    pub margin: f32,
    pub overlay_alpha: f32,
    pub stars_count: u32,
    pub number_symbols_count: u32,
    pub splash_count: u32,
    pub texture_step: f32,
}

/// Warm highlight mixed into secondary headings.
const GILT: Rgb = Rgb::from_hex(0xE8C47A);

impl TypographyTheme {
    /// Baseline-to-baseline distance for text set at `size`.
    pub fn line_height(&self, size: f32) -> f32 {
        size * self.line_height_ratio
    }

    pub fn section_title_color(&self) -> Rgb {
        self.palette.ink
    }

    pub fn subsection_title_color(&self) -> Rgb {
        self.palette.ink.mix(GILT, 0.45)
    }

    pub fn body_color(&self) -> Rgb {
        self.palette.ink.mix(self.palette.background, 0.12)
    }

    pub fn disclaimer_color(&self) -> Rgb {
        self.palette.ink.mix(self.palette.background, 0.35)
    }

    pub fn panel_color(&self) -> Rgb {
        self.palette.accent
    }
}

const SAFE_THEME: TypographyTheme = TypographyTheme {
    name: "arcana-safe",
    palette: Palette {
        background: Rgb::from_hex(0x120A2C),
        accent: Rgb::from_hex(0x31135E),
        ink: Rgb::from_hex(0xF3D8FF),
    },
    sizes: RoleSizes {
        title: 17.0,
        subtitle: 12.0,
        section_title: 13.0,
        subsection_title: 11.5,
        body: 11.0,
        disclaimer: 9.0,
        timeline_marker: 11.0,
    },
    line_height_ratio: 1.45,
    spacing: Spacing {
        paragraph: 6.6,
        section: 17.6,
        subsection: 4.4,
    },
    margin: 46.0,
    overlay_alpha: 0.08,
    stars_count: 8,
    number_symbols_count: 6,
    splash_count: 5,
    texture_step: 36.0,
};

const T0_THEME: TypographyTheme = TypographyTheme {
    name: "arcana-t0",
    palette: Palette {
        background: Rgb::from_hex(0x140D2E),
        accent: Rgb::from_hex(0x25114A),
        ink: Rgb::from_hex(0xEEE2FF),
    },
    sizes: RoleSizes {
        title: 16.0,
        subtitle: 11.0,
        section_title: 12.0,
        subsection_title: 10.5,
        body: 10.0,
        disclaimer: 8.0,
        timeline_marker: 10.0,
    },
    line_height_ratio: 1.4,
    spacing: Spacing {
        paragraph: 6.0,
        section: 16.0,
        subsection: 4.0,
    },
    margin: 42.0,
    overlay_alpha: 0.05,
    stars_count: 5,
    number_symbols_count: 4,
    splash_count: 3,
    texture_step: 44.0,
};

const T1_THEME: TypographyTheme = TypographyTheme {
    name: "arcana-t1",
    palette: Palette {
        background: Rgb::from_hex(0x120A2C),
        accent: Rgb::from_hex(0x351467),
        ink: Rgb::from_hex(0xF6E7FF),
    },
    sizes: RoleSizes {
        title: 18.0,
        subtitle: 12.0,
        section_title: 13.0,
        subsection_title: 11.5,
        body: 11.0,
        disclaimer: 9.0,
        timeline_marker: 11.0,
    },
    line_height_ratio: 1.45,
    spacing: Spacing {
        paragraph: 6.6,
        section: 17.6,
        subsection: 4.4,
    },
    margin: 44.0,
    overlay_alpha: 0.07,
    stars_count: 9,
    number_symbols_count: 8,
    splash_count: 5,
    texture_step: 40.0,
};

const T2_THEME: TypographyTheme = TypographyTheme {
    name: "arcana-t2",
    palette: Palette {
        background: Rgb::from_hex(0x0E0823),
        accent: Rgb::from_hex(0x3A1271),
        ink: Rgb::from_hex(0xFFEDFB),
    },
    sizes: RoleSizes {
        title: 19.0,
        subtitle: 13.0,
        section_title: 14.0,
        subsection_title: 11.5,
        body: 11.0,
        disclaimer: 9.0,
        timeline_marker: 11.0,
    },
    line_height_ratio: 1.5,
    spacing: Spacing {
        paragraph: 6.6,
        section: 17.6,
        subsection: 4.4,
    },
    margin: 46.0,
    overlay_alpha: 0.1,
    stars_count: 14,
    number_symbols_count: 12,
    splash_count: 7,
    texture_step: 34.0,
};

const T3_THEME: TypographyTheme = TypographyTheme {
    name: "arcana-t3",
    palette: Palette {
        background: Rgb::from_hex(0x09051D),
        accent: Rgb::from_hex(0x4A1082),
        ink: Rgb::from_hex(0xFFF1DB),
    },
    sizes: RoleSizes {
        title: 20.0,
        subtitle: 14.0,
        section_title: 15.0,
        subsection_title: 12.5,
        body: 12.0,
        disclaimer: 10.0,
        timeline_marker: 12.0,
    },
    line_height_ratio: 1.55,
    spacing: Spacing {
        paragraph: 7.2,
        section: 19.2,
        subsection: 4.8,
    },
    margin: 50.0,
    overlay_alpha: 0.14,
    stars_count: 20,
    number_symbols_count: 16,
    splash_count: 10,
    texture_step: 30.0,
};

/// Theme for a tariff; `None` resolves to the safe default.
pub fn resolve_theme(tariff: Option<Tariff>) -> &'static TypographyTheme {
    match tariff {
        Some(Tariff::T0) => &T0_THEME,
        Some(Tariff::T1) => &T1_THEME,
        Some(Tariff::T2) => &T2_THEME,
        Some(Tariff::T3) => &T3_THEME,
        None => &SAFE_THEME,
    }
}
