// Page layout and text shaping: width measurement, wrapping, hyphenation and
// page-break bookkeeping. Everything here is pure and CPU-bound; callers on the
// async side must run renders inside tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod hyphenation;
pub mod pagination;
pub mod text;
pub mod wrap;

pub use font_metrics::{get_metrics, BuiltinFont, FontMetricTable};
pub use hyphenation::hyphenate;
pub use pagination::{atomic_height, PageCursor};
pub use text::prepare_text;
pub use wrap::{block_height, split_lines};

/// Width of a run of text in points at the caller's font and size.
pub trait TextMeasure {
    fn width(&self, text: &str) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f32,
{
    fn width(&self, text: &str) -> f32 {
        self(text)
    }
}
