//! Page plans: the positioned drawing operations of each page, independent of
//! the PDF encoding. The composer produces them, the writer serializes them.

use std::path::PathBuf;
use std::sync::Arc;

use crate::render::fonts::FontRole;
use crate::render::images::DecodedImage;
use crate::theme::{AssetKind, Rgb};

/// What a run of text is, typographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextRole {
    Title,
    Subtitle,
    Header,
    SectionTitle,
    SubsectionTitle,
    Body,
    Bullet,
    AccentTitle,
    TimelineMarker,
    Disclaimer,
    Ornament,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect { x: f32, y: f32, width: f32, height: f32 },
    RoundedRect { x: f32, y: f32, width: f32, height: f32, radius: f32 },
    Circle { cx: f32, cy: f32, radius: f32 },
    Star { cx: f32, cy: f32, outer: f32, inner: f32 },
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Fill(Rgb),
    Stroke { color: Rgb, width: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub text: String,
    /// Left edge of the baseline.
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: FontRole,
    pub color: Rgb,
    pub alpha: f32,
    pub role: TextRole,
}

#[derive(Debug, Clone)]
pub enum Op {
    Image {
        kind: AssetKind,
        path: PathBuf,
        image: Arc<DecodedImage>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        alpha: f32,
    },
    Shape {
        shape: Shape,
        paint: Paint,
        alpha: f32,
    },
    Text(TextOp),
}

#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    pub ops: Vec<Op>,
}

impl PagePlan {
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            Op::Text(text) => Some(text),
            _ => None,
        })
    }

    pub fn has_image(&self, kind: AssetKind) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, Op::Image { kind: k, .. } if *k == kind))
    }
}
