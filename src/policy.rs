use crate::ease::{Ease, lerp};
use crate::error::{StrataError, StrataResult};

/// Numeric property a rule animates. One entry per animatable number in the
/// write vocabulary; compound writes (glow, labels, seeks) are produced by
/// dedicated policy kinds instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NumericProp {
    OffsetXPercent,
    OffsetYPercent,
    OffsetXPx,
    OffsetYPx,
    Scale,
    RotationDeg,
    Opacity,
    StrokeDashoffset,
    StrokeWidthPx,
}

/// Scroll-driven interpolation rule for a single property.
///
/// Two deliberate kinds, kept distinct: `Scaled` multiplies a base magnitude
/// by the layer's speed factor (the parallax effect itself), while `Fixed`
/// sweeps an absolute range and ignores speed entirely. Which one a layer
/// uses is explicit per-binding configuration, not a derived rule.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Rule {
    /// `value = base * speed * eased(progress)` — sweeps 0 -> base*speed.
    Scaled { base: f64 },
    /// `value = lerp(from, to, eased(progress))` — speed plays no part.
    Fixed { from: f64, to: f64 },
}

impl Rule {
    pub fn validate(self) -> StrataResult<()> {
        let ok = match self {
            Self::Scaled { base } => base.is_finite(),
            Self::Fixed { from, to } => from.is_finite() && to.is_finite(),
        };
        if !ok {
            return Err(StrataError::validation("rule constants must be finite"));
        }
        Ok(())
    }

    /// Resolve the rule at eased progress `t` for a layer with `speed`.
    pub fn value(self, speed: f64, t: f64) -> f64 {
        match self {
            Self::Scaled { base } => base * speed * t,
            Self::Fixed { from, to } => lerp(from, to, t),
        }
    }
}

/// A named (property, rule) pair inside a scroll policy.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropertyRule {
    pub prop: NumericProp,
    pub rule: Rule,
}

/// Time-driven ping-pong oscillation for ambient decorations.
///
/// `duration_secs` is the length of one leg; the value bounces
/// `from -> to -> from` forever, each leg shaped by `ease`. There is no
/// termination condition and no scroll involvement.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AmbientRule {
    pub prop: NumericProp,
    pub from: f64,
    pub to: f64,
    pub duration_secs: f64,
    #[serde(default)]
    pub ease: Ease,
}

impl AmbientRule {
    pub fn validate(self) -> StrataResult<()> {
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(StrataError::validation(
                "ambient duration_secs must be finite and > 0",
            ));
        }
        if !(self.from.is_finite() && self.to.is_finite()) {
            return Err(StrataError::validation("ambient range must be finite"));
        }
        Ok(())
    }

    /// Value at `elapsed_secs` since engine start.
    pub fn value_at(self, elapsed_secs: f64) -> f64 {
        let leg = self.duration_secs;
        let cycle = 2.0 * leg;
        let pos = elapsed_secs.rem_euclid(cycle);
        let tri = if pos < leg { pos / leg } else { (cycle - pos) / leg };
        lerp(self.from, self.to, self.ease.apply(tri))
    }
}

/// Scroll-linked policy: a region, a speed multiplier, an easing curve and
/// the per-property rules it drives.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollPolicy {
    pub region: String,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub ease: Ease,
    pub rules: Vec<PropertyRule>,
}

fn default_speed() -> f64 {
    1.0
}

/// Stroke-reveal policy: dash offset and stroke width sweep over the region,
/// plus a glow derived from the layer's resolved stroke color (sampled once
/// at binding creation, never re-read).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeRevealPolicy {
    pub region: String,
    #[serde(default)]
    pub ease: Ease,
    pub dash_from: f64,
    pub dash_to: f64,
    /// Starting stroke width in pixels.
    pub width_from_px: f64,
    /// Final width as a multiple of the layer's resolved base width.
    pub width_scale: f64,
}

/// Video-scrub policy: seek position and progress labels follow region
/// progress. Carries no constants; the media duration is read live each tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoScrubPolicy {
    pub region: String,
}

/// Ambient policy: free-running oscillations, no region.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AmbientPolicy {
    pub rules: Vec<AmbientRule>,
}

/// Declarative per-layer policy, one of the four binding kinds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PolicyDef {
    Scroll(ScrollPolicy),
    StrokeReveal(StrokeRevealPolicy),
    VideoScrub(VideoScrubPolicy),
    Ambient(AmbientPolicy),
}

impl PolicyDef {
    /// Region this policy animates over, if scroll-linked.
    pub fn region(&self) -> Option<&str> {
        match self {
            Self::Scroll(p) => Some(&p.region),
            Self::StrokeReveal(p) => Some(&p.region),
            Self::VideoScrub(p) => Some(&p.region),
            Self::Ambient(_) => None,
        }
    }

    pub fn validate(&self) -> StrataResult<()> {
        match self {
            Self::Scroll(p) => {
                if !p.speed.is_finite() {
                    return Err(StrataError::validation("scroll policy speed must be finite"));
                }
                if p.rules.is_empty() {
                    return Err(StrataError::validation(
                        "scroll policy must declare at least one rule",
                    ));
                }
                for r in &p.rules {
                    r.rule.validate()?;
                }
                Ok(())
            }
            Self::StrokeReveal(p) => {
                for v in [p.dash_from, p.dash_to, p.width_from_px, p.width_scale] {
                    if !v.is_finite() {
                        return Err(StrataError::validation(
                            "stroke reveal constants must be finite",
                        ));
                    }
                }
                Ok(())
            }
            Self::VideoScrub(_) => Ok(()),
            Self::Ambient(p) => {
                if p.rules.is_empty() {
                    return Err(StrataError::validation(
                        "ambient policy must declare at least one rule",
                    ));
                }
                for r in &p.rules {
                    r.validate()?;
                }
                Ok(())
            }
        }
    }
}
