//! Colour descriptors accepted by gradient stops.

use std::fmt;

/// An opaque 8-bit sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised colour '{input}'")]
pub struct ColorParseError {
    input: String,
}

impl ColorParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", Rgb::new(0, 0, 0)),
    ("silver", Rgb::new(192, 192, 192)),
    ("gray", Rgb::new(128, 128, 128)),
    ("grey", Rgb::new(128, 128, 128)),
    ("white", Rgb::new(255, 255, 255)),
    ("maroon", Rgb::new(128, 0, 0)),
    ("red", Rgb::new(255, 0, 0)),
    ("purple", Rgb::new(128, 0, 128)),
    ("fuchsia", Rgb::new(255, 0, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("green", Rgb::new(0, 128, 0)),
    ("lime", Rgb::new(0, 255, 0)),
    ("olive", Rgb::new(128, 128, 0)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("navy", Rgb::new(0, 0, 128)),
    ("blue", Rgb::new(0, 0, 255)),
    ("teal", Rgb::new(0, 128, 128)),
    ("aqua", Rgb::new(0, 255, 255)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("orange", Rgb::new(255, 165, 0)),
];

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts HSL to RGB. `saturation` and `lightness` are in `[0, 1]`.
    pub fn from_hsl(hue_degrees: f32, saturation: f32, lightness: f32) -> Self {
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);
        if s == 0.0 {
            let v = to_byte(l);
            return Self::new(v, v, v);
        }

        let h = hue_degrees.rem_euclid(360.0) / 360.0;
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::new(
            to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
            to_byte(hue_to_channel(p, q, h)),
            to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
        )
    }

    /// Parses a CSS-style colour: a basic named colour, `#rgb`, `#rrggbb`,
    /// `rgb(r, g, b)` or `hsl(h, s%, l%)`.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError::new(input));
        }
        if let Some(args) = function_args(&lower, "rgb") {
            return parse_rgb_args(args).ok_or_else(|| ColorParseError::new(input));
        }
        if let Some(args) = function_args(&lower, "hsl") {
            return parse_hsl_args(args).ok_or_else(|| ColorParseError::new(input));
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| *color)
            .ok_or_else(|| ColorParseError::new(input))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn function_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    value
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    let digit = |index: usize| u8::from_str_radix(hex.get(index..index + 1)?, 16).ok();
    match hex.len() {
        3 => Some(Rgb::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
        6 => {
            let byte = |index: usize| u8::from_str_radix(hex.get(index..index + 2)?, 16).ok();
            Some(Rgb::new(byte(0)?, byte(2)?, byte(4)?))
        }
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Rgb> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return None;
    };
    let channel = |value: &str| {
        value
            .parse::<f32>()
            .ok()
            .map(|v| v.clamp(0.0, 255.0).round() as u8)
    };
    Some(Rgb::new(channel(*r)?, channel(*g)?, channel(*b)?))
}

fn parse_hsl_args(args: &str) -> Option<Rgb> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let [h, s, l] = parts.as_slice() else {
        return None;
    };
    let hue = h.strip_suffix("deg").unwrap_or(*h).trim().parse::<f32>().ok()?;
    let percent = |value: &str| {
        value
            .strip_suffix('%')?
            .trim()
            .parse::<f32>()
            .ok()
            .map(|v| v / 100.0)
    };
    Some(Rgb::from_hsl(hue, percent(*s)?, percent(*l)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_colours_case_insensitively() {
        assert_eq!(Rgb::parse("red").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::parse(" Orange ").unwrap(), Rgb::new(255, 165, 0));
        assert_eq!(Rgb::parse("WHITE").unwrap(), Rgb::new(255, 255, 255));
    }

    #[test]
    fn parses_hex_and_functional_forms() {
        assert_eq!(Rgb::parse("#f80").unwrap(), Rgb::new(255, 136, 0));
        assert_eq!(Rgb::parse("#10a0ff").unwrap(), Rgb::new(16, 160, 255));
        assert_eq!(Rgb::parse("rgb(1, 2, 3)").unwrap(), Rgb::new(1, 2, 3));
        assert_eq!(Rgb::parse("hsl(0deg, 0%, 50%)").unwrap(), Rgb::new(128, 128, 128));
        assert_eq!(Rgb::parse("hsl(120, 100%, 50%)").unwrap(), Rgb::new(0, 255, 0));
    }

    #[test]
    fn rejects_unknown_colours() {
        let err = Rgb::parse("sparkly").unwrap_err();
        assert!(err.to_string().contains("sparkly"));
        assert!(Rgb::parse("#12").is_err());
        assert!(Rgb::parse("rgb(1, 2)").is_err());
    }

    #[test]
    fn zero_saturation_is_pure_luminance() {
        for step in 0..=10 {
            let lightness = step as f32 / 10.0;
            let color = Rgb::from_hsl(0.0, 0.0, lightness);
            assert_eq!(color.r, color.g);
            assert_eq!(color.g, color.b);
            assert_eq!(color.r, (lightness * 255.0).round() as u8);
        }
    }

    #[test]
    fn displays_as_hex() {
        assert_eq!(Rgb::new(255, 165, 0).to_string(), "#ffa500");
    }
}
