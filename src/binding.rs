use crate::color::{GlowFilter, Rgb, glow_for_progress};
use crate::ease::{Ease, lerp};
use crate::error::{StrataError, StrataResult};
use crate::media::video_frame;
use crate::policy::{AmbientRule, NumericProp, PropertyRule, StrokeRevealPolicy, VideoScrubPolicy};
use crate::progress::ProgressSample;
use crate::stage::ResolvedStroke;

/// One write in a tick's batch: everything the engine ever sets on a render
/// target. The host decides what "setting" means; nothing here assumes more
/// than "settable per render target".
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum PropWrite {
    OffsetXPercent(f64),
    OffsetYPercent(f64),
    OffsetXPx(f64),
    OffsetYPx(f64),
    Scale(f64),
    RotationDeg(f64),
    Opacity(f64),
    StrokeDashoffset(f64),
    StrokeWidthPx(f64),
    Glow(GlowFilter),
    SeekSecs(f64),
    ProgressLabel(String),
    TimeLabel(String),
    FillWidthPercent(f64),
}

impl PropWrite {
    pub(crate) fn numeric(prop: NumericProp, value: f64) -> Self {
        match prop {
            NumericProp::OffsetXPercent => Self::OffsetXPercent(value),
            NumericProp::OffsetYPercent => Self::OffsetYPercent(value),
            NumericProp::OffsetXPx => Self::OffsetXPx(value),
            NumericProp::OffsetYPx => Self::OffsetYPx(value),
            NumericProp::Scale => Self::Scale(value),
            NumericProp::RotationDeg => Self::RotationDeg(value),
            NumericProp::Opacity => Self::Opacity(value),
            NumericProp::StrokeDashoffset => Self::StrokeDashoffset(value),
            NumericProp::StrokeWidthPx => Self::StrokeWidthPx(value),
        }
    }
}

/// A write addressed to one render target.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TargetWrite {
    pub layer: String,
    pub write: PropWrite,
}

/// Resolved per-binding animation state.
///
/// `StrokeReveal` carries the base color and width captured from the layer's
/// resolved style exactly once, at creation; live style is never re-read.
#[derive(Clone, Debug)]
pub(crate) enum BindingKind {
    Scroll {
        region: String,
        speed: f64,
        ease: Ease,
        rules: Vec<PropertyRule>,
    },
    StrokeReveal {
        region: String,
        ease: Ease,
        dash_from: f64,
        dash_to: f64,
        width_from: f64,
        width_to: f64,
        base_color: Rgb,
    },
    VideoScrub {
        region: String,
    },
    Ambient {
        rules: Vec<AmbientRule>,
    },
}

/// Associates one render target with one property-mapping policy and (for
/// scroll-linked kinds) one trigger region. Multiple bindings may share a
/// region; ambient bindings have none.
#[derive(Clone, Debug)]
pub struct LayerBinding {
    pub layer: String,
    pub(crate) kind: BindingKind,
}

/// Resolved stroke width falls back to this when the host reports a
/// non-positive or non-finite width.
const FALLBACK_STROKE_WIDTH_PX: f64 = 2.0;

impl LayerBinding {
    pub fn scroll(
        layer: impl Into<String>,
        region: impl Into<String>,
        speed: f64,
        ease: Ease,
        rules: Vec<PropertyRule>,
    ) -> Self {
        Self {
            layer: layer.into(),
            kind: BindingKind::Scroll {
                region: region.into(),
                speed,
                ease,
                rules,
            },
        }
    }

    /// Build a stroke-reveal binding, performing the one-time resolve-and-
    /// cache step on the layer's sampled stroke style. An unparsable color
    /// falls back to neutral white rather than failing the binding.
    pub fn stroke_reveal(
        layer: impl Into<String>,
        policy: &StrokeRevealPolicy,
        resolved: &ResolvedStroke,
    ) -> Self {
        let layer = layer.into();
        let base_color = match Rgb::parse_css(&resolved.color) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(layer = %layer, %err, "unparsable stroke color; using white");
                Rgb::WHITE
            }
        };
        let base_width = if resolved.width_px.is_finite() && resolved.width_px > 0.0 {
            resolved.width_px
        } else {
            FALLBACK_STROKE_WIDTH_PX
        };
        Self {
            layer,
            kind: BindingKind::StrokeReveal {
                region: policy.region.clone(),
                ease: policy.ease,
                dash_from: policy.dash_from,
                dash_to: policy.dash_to,
                width_from: policy.width_from_px,
                width_to: base_width * policy.width_scale,
                base_color,
            },
        }
    }

    pub fn video_scrub(layer: impl Into<String>, policy: &VideoScrubPolicy) -> Self {
        Self {
            layer: layer.into(),
            kind: BindingKind::VideoScrub {
                region: policy.region.clone(),
            },
        }
    }

    pub fn ambient(layer: impl Into<String>, rules: Vec<AmbientRule>) -> Self {
        Self {
            layer: layer.into(),
            kind: BindingKind::Ambient { rules },
        }
    }

    /// Region this binding reads progress from; `None` for ambient bindings.
    pub fn region(&self) -> Option<&str> {
        match &self.kind {
            BindingKind::Scroll { region, .. }
            | BindingKind::StrokeReveal { region, .. }
            | BindingKind::VideoScrub { region } => Some(region),
            BindingKind::Ambient { .. } => None,
        }
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self.kind, BindingKind::Ambient { .. })
    }

    pub(crate) fn needs_media(&self) -> bool {
        matches!(self.kind, BindingKind::VideoScrub { .. })
    }

    pub fn validate(&self) -> StrataResult<()> {
        if self.layer.trim().is_empty() {
            return Err(StrataError::validation("binding layer must be non-empty"));
        }
        match &self.kind {
            BindingKind::Scroll { speed, rules, .. } => {
                if !speed.is_finite() {
                    return Err(StrataError::validation(format!(
                        "binding \"{}\" speed must be finite",
                        self.layer
                    )));
                }
                for r in rules {
                    r.rule.validate()?;
                }
                Ok(())
            }
            BindingKind::StrokeReveal {
                dash_from,
                dash_to,
                width_from,
                width_to,
                ..
            } => {
                for v in [dash_from, dash_to, width_from, width_to] {
                    if !v.is_finite() {
                        return Err(StrataError::validation(format!(
                            "binding \"{}\" stroke constants must be finite",
                            self.layer
                        )));
                    }
                }
                Ok(())
            }
            BindingKind::VideoScrub { .. } => Ok(()),
            BindingKind::Ambient { rules } => {
                for r in rules {
                    r.validate()?;
                }
                Ok(())
            }
        }
    }

    /// Compute this binding's property values from a progress sample.
    ///
    /// `media_duration_secs` is only consulted by video-scrub bindings; when
    /// it is unavailable the media writes are skipped for this tick only.
    pub fn apply_progress(
        &self,
        sample: ProgressSample,
        media_duration_secs: Option<f64>,
        out: &mut Vec<TargetWrite>,
    ) {
        let p = sample.progress;
        match &self.kind {
            BindingKind::Scroll {
                speed,
                ease,
                rules,
                ..
            } => {
                let t = ease.apply(p);
                for r in rules {
                    out.push(TargetWrite {
                        layer: self.layer.clone(),
                        write: PropWrite::numeric(r.prop, r.rule.value(*speed, t)),
                    });
                }
            }
            BindingKind::StrokeReveal {
                ease,
                dash_from,
                dash_to,
                width_from,
                width_to,
                base_color,
                ..
            } => {
                let t = ease.apply(p);
                self.push(out, PropWrite::StrokeDashoffset(lerp(*dash_from, *dash_to, t)));
                self.push(out, PropWrite::StrokeWidthPx(lerp(*width_from, *width_to, t)));
                // Glow tracks raw progress, not the eased reveal.
                self.push(out, PropWrite::Glow(glow_for_progress(*base_color, p)));
            }
            BindingKind::VideoScrub { .. } => {
                let Some(duration) = media_duration_secs.filter(|d| *d > 0.0) else {
                    tracing::trace!(layer = %self.layer, "media duration unknown; skipping tick");
                    return;
                };
                let frame = video_frame(duration, p);
                self.push(out, PropWrite::SeekSecs(frame.seek_secs));
                self.push(out, PropWrite::ProgressLabel(format!("{}%", frame.percent)));
                self.push(out, PropWrite::TimeLabel(frame.time_label.clone()));
                self.push(out, PropWrite::FillWidthPercent(f64::from(frame.percent)));
            }
            BindingKind::Ambient { .. } => {}
        }
    }

    /// Compute an ambient binding's property values from elapsed time.
    pub fn apply_elapsed(&self, elapsed_secs: f64, out: &mut Vec<TargetWrite>) {
        let BindingKind::Ambient { rules } = &self.kind else {
            return;
        };
        for r in rules {
            out.push(TargetWrite {
                layer: self.layer.clone(),
                write: PropWrite::numeric(r.prop, r.value_at(elapsed_secs)),
            });
        }
    }

    fn push(&self, out: &mut Vec<TargetWrite>, write: PropWrite) {
        out.push(TargetWrite {
            layer: self.layer.clone(),
            write,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Rule;

    fn sample(progress: f64) -> ProgressSample {
        ProgressSample {
            progress,
            raw_delta_px: 0.0,
        }
    }

    #[test]
    fn scroll_binding_scales_by_speed_and_progress() {
        let b = LayerBinding::scroll(
            "bg",
            "span",
            2.0,
            Ease::Linear,
            vec![PropertyRule {
                prop: NumericProp::OffsetYPercent,
                rule: Rule::Scaled { base: -30.0 },
            }],
        );

        let mut out = Vec::new();
        b.apply_progress(sample(0.5), None, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].layer, "bg");
        assert_eq!(out[0].write, PropWrite::OffsetYPercent(-30.0));

        out.clear();
        b.apply_progress(sample(1.0), None, &mut out);
        assert_eq!(out[0].write, PropWrite::OffsetYPercent(-60.0));
    }

    #[test]
    fn stroke_reveal_caches_resolved_color_once() {
        let policy = StrokeRevealPolicy {
            region: "span".to_owned(),
            ease: Ease::Linear,
            dash_from: 2000.0,
            dash_to: 0.0,
            width_from_px: 0.5,
            width_scale: 2.0,
        };
        let resolved = ResolvedStroke {
            color: "rgb(255, 0, 0)".to_owned(),
            width_px: 3.0,
        };
        let b = LayerBinding::stroke_reveal("path", &policy, &resolved);

        let mut out = Vec::new();
        b.apply_progress(sample(1.0), None, &mut out);
        assert_eq!(out[0].write, PropWrite::StrokeDashoffset(0.0));
        assert_eq!(out[1].write, PropWrite::StrokeWidthPx(6.0));
        let PropWrite::Glow(glow) = &out[2].write else {
            panic!("expected glow write, got {:?}", out[2].write);
        };
        // Same triple a "#ff0000" stroke would have produced.
        assert_eq!(glow.color, Rgb::new(255, 100, 100));
        assert_eq!(glow.radius_px, 30.0);
    }

    #[test]
    fn stroke_reveal_falls_back_to_white_on_unparsable_color() {
        let policy = StrokeRevealPolicy {
            region: "span".to_owned(),
            ease: Ease::Linear,
            dash_from: 100.0,
            dash_to: 0.0,
            width_from_px: 0.5,
            width_scale: 2.0,
        };
        let resolved = ResolvedStroke {
            color: "url(#gradient)".to_owned(),
            width_px: f64::NAN,
        };
        let b = LayerBinding::stroke_reveal("path", &policy, &resolved);

        let mut out = Vec::new();
        b.apply_progress(sample(0.0), None, &mut out);
        let PropWrite::Glow(glow) = &out[2].write else {
            panic!("expected glow write");
        };
        assert_eq!(glow.color, Rgb::WHITE);
        // NaN width fell back, so the sweep targets 2.0 * width_scale.
        b.apply_progress(sample(1.0), None, &mut out);
        assert_eq!(out[4].write, PropWrite::StrokeWidthPx(4.0));
    }

    #[test]
    fn video_scrub_skips_tick_without_duration() {
        let b = LayerBinding::video_scrub(
            "video",
            &VideoScrubPolicy {
                region: "span".to_owned(),
            },
        );

        let mut out = Vec::new();
        b.apply_progress(sample(0.5), None, &mut out);
        assert!(out.is_empty());

        b.apply_progress(sample(0.5), Some(0.0), &mut out);
        assert!(out.is_empty());

        // Self-healing: the moment a duration appears, writes resume.
        b.apply_progress(sample(0.5), Some(30.0), &mut out);
        assert_eq!(out[0].write, PropWrite::SeekSecs(15.0));
        assert_eq!(out[1].write, PropWrite::ProgressLabel("50%".to_owned()));
        assert_eq!(
            out[2].write,
            PropWrite::TimeLabel("00:15 / 00:30".to_owned())
        );
        assert_eq!(out[3].write, PropWrite::FillWidthPercent(50.0));
    }

    #[test]
    fn ambient_binding_ignores_progress_path() {
        let b = LayerBinding::ambient(
            "float",
            vec![AmbientRule {
                prop: NumericProp::RotationDeg,
                from: 0.0,
                to: 360.0,
                duration_secs: 4.0,
                ease: Ease::Linear,
            }],
        );
        assert!(b.region().is_none());

        let mut out = Vec::new();
        b.apply_progress(sample(0.7), None, &mut out);
        assert!(out.is_empty());

        b.apply_elapsed(2.0, &mut out);
        assert_eq!(out[0].write, PropWrite::RotationDeg(180.0));
    }
}
