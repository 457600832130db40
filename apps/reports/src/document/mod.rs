//! Report document model: the structured form of a generated narrative.
//!
//! A `ReportDocument` is built fresh for every render request from raw text and
//! discarded once the render returns. Only the rendered bytes are ever persisted.

pub mod builder;
pub mod canonical;
pub mod hygiene;
pub mod lines;
pub mod narrative;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use builder::{BuilderOptions, ReportDocumentBuilder};
pub use narrative::{MorphologyDetector, NarrativeDetector};

// ────────────────────────────────────────────────────────────────────────────
// Tariff
// ────────────────────────────────────────────────────────────────────────────

/// A named report tier. Controls theme, decoration depth and augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tariff {
    T0,
    T1,
    T2,
    T3,
}

impl Tariff {
    pub const ALL: [Tariff; 4] = [Tariff::T0, Tariff::T1, Tariff::T2, Tariff::T3];

    /// Parses a tariff code (`"t2"`, `" T3 "`). Unknown codes return `None`.
    pub fn parse(code: &str) -> Option<Tariff> {
        match code.trim().to_ascii_uppercase().as_str() {
            "T0" => Some(Tariff::T0),
            "T1" => Some(Tariff::T1),
            "T2" => Some(Tariff::T2),
            "T3" => Some(Tariff::T3),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Tariff::T0 => "T0",
            Tariff::T1 => "T1",
            Tariff::T2 => "T2",
            Tariff::T3 => "T3",
        }
    }

    /// Number of ornamentation layers applied when rendering this tier.
    pub fn decoration_depth(self) -> u8 {
        match self {
            Tariff::T0 => 0,
            Tariff::T1 => 1,
            Tariff::T2 => 2,
            Tariff::T3 => 3,
        }
    }

    /// Customer-facing tier name, used as the document subtitle.
    pub fn display_title(self) -> &'static str {
        match self {
            Tariff::T0 => "Your new beginning (free)",
            Tariff::T1 => "Where is your strength?",
            Tariff::T2 => "Where is your money?",
            Tariff::T3 => "Your path to yourself!",
        }
    }

    /// Tiers that receive the extra "practical next step" accent section.
    pub fn has_practical_steps(self) -> bool {
        matches!(self, Tariff::T2 | Tariff::T3)
    }
}

impl fmt::Display for Tariff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Request metadata. Used only as a render seed and for file naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ReportMeta {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            created_at: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document structure
// ────────────────────────────────────────────────────────────────────────────

/// One unit of section prose, tagged once by the builder so the renderer can
/// dispatch without sniffing string prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ContentBlock {
    Paragraph(String),
    /// `label: body` emitted under the subsection contract marker.
    Subsection { label: String, body: String },
    /// A period marker (`Week 1`, `1–3`, `1 month (weekly)`) with its step text.
    /// Period headers carry an empty body.
    Timeline { marker: String, body: String },
}

impl ContentBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Paragraph(text.into())
    }

    /// Plain text of the block, as a reader would see it.
    pub fn text(&self) -> String {
        match self {
            ContentBlock::Paragraph(text) => text.clone(),
            ContentBlock::Subsection { label, body } => format!("{label}: {body}"),
            ContentBlock::Timeline { marker, body } if body.is_empty() => marker.clone(),
            ContentBlock::Timeline { marker, body } => format!("{marker}: {body}"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ContentBlock::Paragraph(text) => text.trim().is_empty(),
            ContentBlock::Subsection { label, body } => {
                label.trim().is_empty() && body.trim().is_empty()
            }
            ContentBlock::Timeline { marker, body } => {
                marker.trim().is_empty() && body.trim().is_empty()
            }
        }
    }
}

/// A visually emphasized callout: a title and short directive points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportAccentBlock {
    pub title: String,
    pub points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub paragraphs: Vec<ContentBlock>,
    pub bullets: Vec<String>,
    pub accent_blocks: Vec<ReportAccentBlock>,
}

impl ReportSection {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// True when the section carries any renderable content besides its title.
    pub fn has_content(&self) -> bool {
        self.paragraphs.iter().any(|block| !block.is_empty())
            || self.bullets.iter().any(|bullet| !bullet.trim().is_empty())
            || !self.accent_blocks.is_empty()
    }

    /// Plain paragraph texts in order, regardless of block kind.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs.iter().map(ContentBlock::text).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: String,
    pub key_findings: Vec<String>,
    pub sections: Vec<ReportSection>,
    pub disclaimer: String,
    pub tariff: Tariff,
    /// 0..=3, see [`Tariff::decoration_depth`].
    pub decoration_depth: u8,
}
