//! Color values and query-parameter color parsing

use serde::{Serialize, Serializer};
use std::fmt;

/// An opaque 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS-style color: `#rgb`, `#rrggbb`, `rgb(r, g, b)` or `rgba(r, g, b, a)`
    ///
    /// A bare `rrggbb` is not accepted here; see [`parse_color_or_sentinel`].
    /// Alpha channels are parsed for validity and then dropped.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex_digits(hex);
        }
        if let Some(args) = s.strip_prefix("rgba(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() != 4 {
                return None;
            }
            let alpha: f64 = parts[3].parse().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            return Self::parse_channels(&parts[..3]);
        }
        if let Some(args) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return None;
            }
            return Self::parse_channels(&parts);
        }
        None
    }

    fn parse_hex_digits(hex: &str) -> Option<Self> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
                Some(Self::new(digit(0)?, digit(1)?, digit(2)?))
            }
            6 => {
                let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Self::new(pair(0)?, pair(2)?, pair(4)?))
            }
            _ => None,
        }
    }

    fn parse_channels(parts: &[&str]) -> Option<Self> {
        let channel = |s: &str| s.parse::<u8>().ok();
        Some(Self::new(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
        ))
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Perceived brightness on the YIQ scale, 0..=255
    pub fn yiq(self) -> f64 {
        (f64::from(self.r) * 299.0 + f64::from(self.g) * 587.0 + f64::from(self.b) * 114.0)
            / 1000.0
    }

    pub fn is_dark(self) -> bool {
        self.yiq() < 128.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of interpreting a color query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedColor {
    Color(Rgb),
    /// An allow-listed keyword passed through verbatim, e.g. `transparent`
    Sentinel(String),
    Invalid,
}

impl ParsedColor {
    /// The value to emit into a template, or `None` when the input was unusable
    pub fn into_value(self) -> Option<String> {
        match self {
            Self::Color(rgb) => Some(rgb.to_hex()),
            Self::Sentinel(s) => Some(s),
            Self::Invalid => None,
        }
    }
}

/// Interpret a color parameter
///
/// Tries the raw input, then the input with a `#` prepended (so `FF0000` works
/// in a URL without escaping), then the allow-list of keywords.
pub fn parse_color_or_sentinel(input: &str, allowlist: &[&str]) -> ParsedColor {
    if !input.is_empty() {
        if let Some(rgb) = Rgb::parse(input).or_else(|| Rgb::parse(&format!("#{}", input))) {
            return ParsedColor::Color(rgb);
        }
    }
    if allowlist.contains(&input) {
        return ParsedColor::Sentinel(input.to_string());
    }
    ParsedColor::Invalid
}
