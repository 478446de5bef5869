use crate::binding::TargetWrite;

pub use kurbo::Rect;

/// Stroke style of a layer as resolved by the host's style engine, sampled
/// once when a stroke-reveal binding is created.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedStroke {
    /// Color text in whatever form the host reports (`#RRGGBB`, `rgb(...)`).
    pub color: String,
    /// Stroke width in pixels.
    pub width_px: f64,
}

/// Read side of the host boundary.
///
/// Everything the engine learns about the document comes through here:
/// the scroll offset, viewport height, anchor geometry, resolved stroke
/// styles and media durations. All reads in a tick happen before any write
/// reaches the sink, so hosts never see interleaved read/write traffic.
pub trait Stage {
    /// Current document scroll offset in pixels.
    fn scroll_offset(&self) -> f64;

    /// Current viewport height in pixels.
    fn viewport_height(&self) -> f64;

    /// Bounding box of an anchor in document coordinates, or `None` when the
    /// anchor cannot be measured.
    fn anchor_rect(&self, anchor: &str) -> Option<Rect>;

    /// Whether a render target exists for the given layer id.
    fn target_exists(&self, layer: &str) -> bool;

    /// Resolved stroke style for a layer, or `None` when the layer is
    /// missing or carries no stroke.
    fn resolved_stroke(&self, layer: &str) -> Option<ResolvedStroke>;

    /// Reported media duration for a layer in seconds, or `None` while the
    /// media has not loaded far enough to know.
    fn media_duration_secs(&self, layer: &str) -> Option<f64>;
}

/// Write side of the host boundary: receives each tick's computed property
/// values as a single batch. Called exactly once per tick, possibly with an
/// empty batch.
pub trait PropertySink {
    fn flush(&mut self, batch: &[TargetWrite]);
}

/// Sink that records every flushed batch. Used by tests and headless
/// drivers.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<Vec<TargetWrite>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes from the most recent tick.
    pub fn last_batch(&self) -> &[TargetWrite] {
        self.batches.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl PropertySink for MemorySink {
    fn flush(&mut self, batch: &[TargetWrite]) {
        self.batches.push(batch.to_vec());
    }
}
