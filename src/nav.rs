use crate::ease::{Ease, lerp};
use crate::stage::Stage;

/// One-shot animated scroll toward a target offset.
///
/// This is a navigation consumer, not part of the continuous engine: a link
/// activation creates a tween, the host samples [`ScrollTween::position`]
/// from its frame callback and applies the offset itself, and the tween is
/// dropped once finished. It never touches engine state.
#[derive(Clone, Copy, Debug)]
pub struct ScrollTween {
    from: f64,
    to: f64,
    duration_secs: f64,
    ease: Ease,
    start_secs: f64,
}

impl ScrollTween {
    pub const DEFAULT_DURATION_SECS: f64 = 1.5;
    /// Gap left above the target so it does not sit flush with the viewport
    /// top.
    pub const DEFAULT_OFFSET_PX: f64 = 50.0;

    pub fn new(from: f64, to: f64, duration_secs: f64, ease: Ease, now_secs: f64) -> Self {
        Self {
            from,
            to,
            duration_secs: duration_secs.max(0.0),
            ease,
            start_secs: now_secs,
        }
    }

    /// Tween from the current scroll position to an anchor's top, with the
    /// default duration, offset and ease. `None` when the anchor cannot be
    /// measured.
    pub fn to_anchor(stage: &dyn Stage, anchor: &str, now_secs: f64) -> Option<Self> {
        let rect = stage.anchor_rect(anchor)?;
        Some(Self::new(
            stage.scroll_offset(),
            rect.y0 - Self::DEFAULT_OFFSET_PX,
            Self::DEFAULT_DURATION_SECS,
            Ease::InOutCubic,
            now_secs,
        ))
    }

    /// Scroll offset at `now_secs`; clamps to the endpoints outside the
    /// tween's duration.
    pub fn position(&self, now_secs: f64) -> f64 {
        if self.duration_secs <= 0.0 {
            return self.to;
        }
        let t = ((now_secs - self.start_secs) / self.duration_secs).clamp(0.0, 1.0);
        lerp(self.from, self.to, self.ease.apply(t))
    }

    pub fn finished(&self, now_secs: f64) -> bool {
        now_secs - self.start_secs >= self.duration_secs
    }
}
