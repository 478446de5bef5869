use crate::error::{StrataError, StrataResult};

/// 8-bit RGB triple.
///
/// Resolved stroke colors arrive as text in whatever form the host's style
/// engine reports (`#RRGGBB` or `rgb(r, g, b)`); both normalize into the same
/// numeric triple before any interpolation happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Neutral fallback used when a sampled color cannot be parsed.
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalize a resolved CSS color string into a numeric triple.
    ///
    /// Accepts `#RRGGBB` and functional `rgb(...)` / `rgba(...)` forms; the
    /// functional form takes the first three integer components and ignores
    /// the rest.
    pub fn parse_css(s: &str) -> StrataResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if s.starts_with("rgb") {
            return parse_functional(s);
        }
        Err(StrataError::validation(format!(
            "unsupported color form \"{s}\" (expected #RRGGBB or rgb(r, g, b))"
        )))
    }

    /// Shift every channel up by `amount`, saturating at 255.
    pub fn brighten(self, amount: f64) -> Self {
        fn shift(c: u8, amount: f64) -> u8 {
            (f64::from(c) + amount).round().clamp(0.0, 255.0) as u8
        }

        Self {
            r: shift(self.r, amount),
            g: shift(self.g, amount),
            b: shift(self.b, amount),
        }
    }
}

fn parse_hex(hex: &str) -> StrataResult<Rgb> {
    fn hex_byte(pair: &str) -> StrataResult<u8> {
        u8::from_str_radix(pair, 16)
            .map_err(|_| StrataError::validation(format!("invalid hex byte \"{pair}\"")))
    }

    if hex.len() != 6 {
        return Err(StrataError::validation(
            "hex color must be #RRGGBB (case-insensitive)",
        ));
    }
    Ok(Rgb {
        r: hex_byte(&hex[0..2])?,
        g: hex_byte(&hex[2..4])?,
        b: hex_byte(&hex[4..6])?,
    })
}

fn parse_functional(s: &str) -> StrataResult<Rgb> {
    // Take the first three integer runs, matching how style engines print
    // "rgb(255, 102, 0)" / "rgba(255, 102, 0, 0.5)".
    let mut components = [0u8; 3];
    let mut found = 0usize;
    let mut run: Option<u32> = None;

    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            run = Some(run.unwrap_or(0).saturating_mul(10).saturating_add(d));
            continue;
        }
        if c == '.' && found == 3 {
            break;
        }
        if let Some(v) = run.take() {
            if found < 3 {
                components[found] = v.min(255) as u8;
                found += 1;
            }
        }
    }
    if let Some(v) = run
        && found < 3
    {
        components[found] = v.min(255) as u8;
        found += 1;
    }

    if found < 3 {
        return Err(StrataError::validation(format!(
            "functional color \"{s}\" must carry three integer components"
        )));
    }
    Ok(Rgb::new(components[0], components[1], components[2]))
}

/// Glow (drop-shadow) descriptor written alongside stroke reveals.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GlowFilter {
    /// Shadow blur radius in pixels.
    pub radius_px: f64,
    /// Brightness-shifted variant of the layer's base stroke color.
    pub color: Rgb,
    /// Shadow opacity in [0,1].
    pub alpha: f64,
}

/// Glow for a stroke-reveal layer at the given raw (un-eased) progress.
///
/// The radius opens from 10px to 30px, the color is the cached base color
/// pushed up to 100 brightness steps, and the opacity rises to 0.8.
pub fn glow_for_progress(base: Rgb, progress: f64) -> GlowFilter {
    let p = progress.clamp(0.0, 1.0);
    GlowFilter {
        radius_px: 10.0 + p * 20.0,
        color: base.brighten(p * 100.0),
        alpha: p * 0.8,
    }
}
