use crate::error::{StrataError, StrataResult};
use crate::progress::{ProgressSample, ScrollState, compute_progress};

pub use kurbo::Rect;

/// Anchor edge referenced by a boundary spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AnchorEdge {
    Top,
    Center,
    Bottom,
}

/// Symbolic trigger boundary: "(anchor edge) reaches (viewport fraction)".
///
/// `{ edge: Top, viewport_fraction: 0.8 }` fires when the anchor's top edge
/// reaches 80% of the viewport height; fraction 1.0 is the viewport bottom,
/// fraction 0.0 the viewport top.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundarySpec {
    pub edge: AnchorEdge,
    pub viewport_fraction: f64,
}

impl BoundarySpec {
    pub const fn new(edge: AnchorEdge, viewport_fraction: f64) -> Self {
        Self {
            edge,
            viewport_fraction,
        }
    }

    pub fn validate(self) -> StrataResult<()> {
        if !self.viewport_fraction.is_finite() {
            return Err(StrataError::validation(
                "boundary viewport_fraction must be finite",
            ));
        }
        Ok(())
    }

    /// Absolute document scroll offset at which this boundary fires, given
    /// the anchor's current bounding box and viewport height.
    pub fn threshold(self, anchor: Rect, viewport_height: f64) -> f64 {
        let edge_y = match self.edge {
            AnchorEdge::Top => anchor.y0,
            AnchorEdge::Center => (anchor.y0 + anchor.y1) / 2.0,
            AnchorEdge::Bottom => anchor.y1,
        };
        edge_y - viewport_height * self.viewport_fraction
    }
}

/// The scroll-offset interval over which a set of bound layers animates.
///
/// Boundaries are pixel thresholds derived from the anchor's live geometry;
/// they start degenerate (progress 0) until the first recomputation and must
/// be recomputed on every layout-affecting event. Recomputation is idempotent
/// and cheap, so it is always simply redone rather than cached or retried.
#[derive(Clone, Debug)]
pub struct TriggerRegion {
    pub id: String,
    pub anchor: String,
    pub start_spec: BoundarySpec,
    pub end_spec: BoundarySpec,
    start_px: f64,
    end_px: f64,
    last_progress: f64,
}

impl TriggerRegion {
    pub fn new(
        id: impl Into<String>,
        anchor: impl Into<String>,
        start_spec: BoundarySpec,
        end_spec: BoundarySpec,
    ) -> Self {
        Self {
            id: id.into(),
            anchor: anchor.into(),
            start_spec,
            end_spec,
            start_px: 0.0,
            end_px: 0.0,
            last_progress: 0.0,
        }
    }

    pub fn validate(&self) -> StrataResult<()> {
        if self.id.trim().is_empty() {
            return Err(StrataError::validation("region id must be non-empty"));
        }
        if self.anchor.trim().is_empty() {
            return Err(StrataError::validation(format!(
                "region \"{}\" anchor must be non-empty",
                self.id
            )));
        }
        self.start_spec.validate()?;
        self.end_spec.validate()
    }

    /// Re-derive both pixel boundaries from the anchor's current bounding box.
    pub fn recompute(&mut self, anchor: Rect, viewport_height: f64) {
        self.start_px = self.start_spec.threshold(anchor, viewport_height);
        self.end_px = self.end_spec.threshold(anchor, viewport_height);
    }

    /// Collapse to a degenerate span (progress pins to 0). Used when the
    /// anchor can no longer be measured.
    pub fn collapse(&mut self) {
        self.start_px = 0.0;
        self.end_px = 0.0;
    }

    /// Current pixel boundaries `(start, end)`.
    pub fn span(&self) -> (f64, f64) {
        (self.start_px, self.end_px)
    }

    /// Progress computed at the most recent sample.
    pub fn last_progress(&self) -> f64 {
        self.last_progress
    }

    /// Compute this tick's progress sample from the shared scroll state.
    pub fn sample(&mut self, scroll: &ScrollState) -> ProgressSample {
        let progress = compute_progress(self.start_px, self.end_px, scroll.current);
        self.last_progress = progress;
        ProgressSample {
            progress,
            raw_delta_px: scroll.raw_delta(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_region(start: BoundarySpec, end: BoundarySpec) -> TriggerRegion {
        TriggerRegion::new("r", "a", start, end)
    }

    #[test]
    fn thresholds_follow_anchor_edges_and_viewport_fractions() {
        // Anchor spans document offsets 2000..3000, viewport is 800 tall.
        let anchor = Rect::new(0.0, 2000.0, 0.0, 3000.0);

        // "top reaches viewport bottom" -> anchor top minus one viewport.
        let start = BoundarySpec::new(AnchorEdge::Top, 1.0);
        assert_eq!(start.threshold(anchor, 800.0), 1200.0);

        // "bottom reaches viewport top" -> anchor bottom exactly.
        let end = BoundarySpec::new(AnchorEdge::Bottom, 0.0);
        assert_eq!(end.threshold(anchor, 800.0), 3000.0);

        // "top reaches 80% of viewport height".
        let start80 = BoundarySpec::new(AnchorEdge::Top, 0.8);
        assert_eq!(start80.threshold(anchor, 800.0), 2000.0 - 640.0);

        let center = BoundarySpec::new(AnchorEdge::Center, 0.5);
        assert_eq!(center.threshold(anchor, 800.0), 2500.0 - 400.0);
    }

    #[test]
    fn region_is_degenerate_until_first_recompute() {
        let mut region = span_region(
            BoundarySpec::new(AnchorEdge::Top, 1.0),
            BoundarySpec::new(AnchorEdge::Bottom, 0.0),
        );
        let scroll = ScrollState::init(500.0);
        assert_eq!(region.sample(&scroll).progress, 0.0);

        region.recompute(Rect::new(0.0, 0.0, 0.0, 1000.0), 500.0);
        let (start, end) = region.span();
        assert_eq!(start, -500.0);
        assert_eq!(end, 1000.0);
        assert!(region.sample(&scroll).progress > 0.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut region = span_region(
            BoundarySpec::new(AnchorEdge::Top, 0.5),
            BoundarySpec::new(AnchorEdge::Bottom, 0.5),
        );
        let anchor = Rect::new(0.0, 100.0, 0.0, 900.0);
        region.recompute(anchor, 600.0);
        let first = region.span();
        region.recompute(anchor, 600.0);
        assert_eq!(region.span(), first);
    }

    #[test]
    fn zero_height_anchor_with_equal_specs_collapses_cleanly() {
        let mut region = span_region(
            BoundarySpec::new(AnchorEdge::Top, 0.5),
            BoundarySpec::new(AnchorEdge::Bottom, 0.5),
        );
        region.recompute(Rect::new(0.0, 400.0, 0.0, 400.0), 800.0);
        let scroll = ScrollState::init(123.0);
        assert_eq!(region.sample(&scroll).progress, 0.0);
    }

    #[test]
    fn sample_records_last_progress_and_delta() {
        let mut region = span_region(
            BoundarySpec::new(AnchorEdge::Top, 0.0),
            BoundarySpec::new(AnchorEdge::Bottom, 0.0),
        );
        region.recompute(Rect::new(0.0, 1000.0, 0.0, 2000.0), 700.0);

        let mut scroll = ScrollState::init(1000.0);
        scroll.advance(1500.0);
        let s = region.sample(&scroll);
        assert_eq!(s.progress, 0.5);
        assert_eq!(s.raw_delta_px, 500.0);
        assert_eq!(region.last_progress(), 0.5);
    }
}
