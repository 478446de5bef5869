/// Scroll offset pair sampled at tick boundaries.
///
/// Owned by the engine and advanced exactly once per tick, before any region
/// computes progress, so every region in a tick sees the same instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct ScrollState {
    pub current: f64,
    pub previous: f64,
}

impl ScrollState {
    /// State as of engine start: no delta yet.
    pub fn init(offset: f64) -> Self {
        Self {
            current: offset,
            previous: offset,
        }
    }

    /// Roll the pair forward to the latest observed offset.
    pub fn advance(&mut self, offset: f64) {
        self.previous = self.current;
        self.current = offset;
    }

    /// Raw pixel delta between the last two ticks (signed).
    pub fn raw_delta(self) -> f64 {
        self.current - self.previous
    }
}

/// One region's normalized progress at a tick instant. Ephemeral: produced
/// once per tick per region and consumed by every binding on that region.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ProgressSample {
    /// Normalized position in [0,1] of the scroll offset within the region.
    pub progress: f64,
    /// Signed scroll delta since the previous tick, in pixels.
    pub raw_delta_px: f64,
}

/// Normalized progress of `offset` within `[start, end)` boundaries.
///
/// Collapsed (`start == end`) and inverted regions pin to 0 rather than
/// dividing by zero; anchors of zero height are legitimate.
pub fn compute_progress(start: f64, end: f64, offset: f64) -> f64 {
    if !(end > start) {
        return 0.0;
    }
    ((offset - start) / (end - start)).clamp(0.0, 1.0)
}
