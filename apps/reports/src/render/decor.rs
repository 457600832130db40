//! Seeded decoration: texture lines, splashes, stars and number glyphs.
//!
//! Nothing here touches global randomness. The seed is derived from the report
//! identity and each page gets its own generator, so the same report always
//! decorates the same way and pages differ from one another.

use chrono::SecondsFormat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::document::ReportMeta;
use crate::render::fonts::FontRole;
use crate::render::plan::{Op, PagePlan, Paint, Shape, TextOp, TextRole};
use crate::theme::TypographyTheme;

const TEXTURE_ALPHA: f32 = 0.035;
const TEXTURE_LINE_WIDTH: f32 = 0.4;

/// `sha256(id | created_at | title)` folded to a `u64`.
pub fn decoration_seed(meta: &ReportMeta, title: &str) -> u64 {
    let created_at = meta
        .created_at
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(meta.id.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(created_at.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

pub fn page_rng(seed: u64, page_index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ page_index as u64)
}

/// Theme count scaled by decoration depth: 40% at depth 0 up to 100% at depth 3.
pub fn scaled_count(count: u32, depth: u8) -> u32 {
    if count == 0 {
        return 0;
    }
    let depth = u32::from(depth.min(3));
    (count * (depth + 2) / 5).max(1)
}

/// Draws the decoration layer of one page into `page`.
pub fn decorate(
    page: &mut PagePlan,
    theme: &TypographyTheme,
    depth: u8,
    seed: u64,
    page_index: usize,
    (width, height): (f32, f32),
) {
    let mut rng = page_rng(seed, page_index);
    texture(page, theme, width, height);
    splashes(page, theme, depth, &mut rng, width, height);
    stars(page, theme, depth, &mut rng, width, height);
    number_symbols(page, theme, depth, &mut rng, width, height);
}

fn texture(page: &mut PagePlan, theme: &TypographyTheme, width: f32, height: f32) {
    let step = theme.texture_step.max(8.0);
    let mut offset = -height;
    while offset < width {
        page.push(Op::Shape {
            shape: Shape::Line {
                x1: offset,
                y1: 0.0,
                x2: offset + height,
                y2: height,
            },
            paint: Paint::Stroke {
                color: theme.palette.ink,
                width: TEXTURE_LINE_WIDTH,
            },
            alpha: TEXTURE_ALPHA,
        });
        offset += step;
    }
}

fn splashes(
    page: &mut PagePlan,
    theme: &TypographyTheme,
    depth: u8,
    rng: &mut StdRng,
    width: f32,
    height: f32,
) {
    let color = theme.palette.accent.mix(theme.palette.ink, 0.2);
    for _ in 0..scaled_count(theme.splash_count, depth) {
        page.push(Op::Shape {
            shape: Shape::Circle {
                cx: rng.gen_range(0.0..width),
                cy: rng.gen_range(0.0..height),
                radius: rng.gen_range(20.0..80.0),
            },
            paint: Paint::Fill(color),
            alpha: rng.gen_range(0.05..0.12),
        });
    }
}

fn stars(
    page: &mut PagePlan,
    theme: &TypographyTheme,
    depth: u8,
    rng: &mut StdRng,
    width: f32,
    height: f32,
) {
    for _ in 0..scaled_count(theme.stars_count, depth) {
        let outer = rng.gen_range(2.0..5.5);
        page.push(Op::Shape {
            shape: Shape::Star {
                cx: rng.gen_range(0.0..width),
                cy: rng.gen_range(0.0..height),
                outer,
                inner: outer * 0.42,
            },
            paint: Paint::Fill(theme.palette.ink),
            alpha: rng.gen_range(0.3..0.8),
        });
    }
}

fn number_symbols(
    page: &mut PagePlan,
    theme: &TypographyTheme,
    depth: u8,
    rng: &mut StdRng,
    width: f32,
    height: f32,
) {
    for _ in 0..scaled_count(theme.number_symbols_count, depth) {
        let digit: u8 = rng.gen_range(1..=9);
        page.push(Op::Text(TextOp {
            text: digit.to_string(),
            x: rng.gen_range(0.0..width),
            y: rng.gen_range(0.0..height),
            size: rng.gen_range(10.0..24.0),
            font: FontRole::Accent,
            color: theme.palette.ink,
            alpha: rng.gen_range(0.06..0.16),
            role: TextRole::Ornament,
        }));
    }
}
