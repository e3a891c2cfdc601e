//! Widget color theme resolution
//!
//! Each color comes from, in order: a valid query override, the thumbnail's
//! vibrant color (accent only), then the light/dark defaults. Button text is
//! derived from the resolved accent's brightness unless overridden.

use crate::color::{parse_color_or_sentinel, ParsedColor, Rgb};
use crate::types::ProjectData;
use serde::Serialize;

pub const DEFAULT_ACCENT: Rgb = Rgb::new(0x2c, 0x3e, 0x50);

/// Appended to the accent hex to get a 50% alpha `#rrggbbaa`
const HALF_ALPHA_SUFFIX: &str = "80";

const TRANSPARENT: &str = "transparent";

/// Color query parameters, unparsed
#[derive(Debug, Clone, Default)]
pub struct ColorOverrides {
    pub accent_color: Option<String>,
    pub override_button_text_color: Option<String>,
    pub normal_text_color: Option<String>,
    pub button_shadow_color: Option<String>,
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub accent: String,
    pub accent_half_alpha: String,
    pub button_text: String,
    pub normal_text: String,
    pub shadow: String,
    pub background: String,
}

struct Defaults {
    normal_text: &'static str,
    shadow: &'static str,
    background: &'static str,
}

const LIGHT: Defaults = Defaults {
    normal_text: "black",
    shadow: "#888888",
    background: TRANSPARENT,
};

const DARK: Defaults = Defaults {
    normal_text: "white",
    shadow: TRANSPARENT,
    background: "#1B1B1B",
};

fn parse_param(param: Option<&str>, allowlist: &[&str]) -> ParsedColor {
    param.map_or(ParsedColor::Invalid, |p| parse_color_or_sentinel(p, allowlist))
}

impl ColorOverrides {
    pub fn resolve(&self, image_accent: Option<Rgb>, dark_theme: bool) -> ThemeColors {
        let defaults = if dark_theme { &DARK } else { &LIGHT };

        let accent = match parse_param(self.accent_color.as_deref(), &[]) {
            ParsedColor::Color(rgb) => rgb,
            _ => image_accent.unwrap_or(DEFAULT_ACCENT),
        };
        let button_text = if accent.is_dark() { "white" } else { "black" };
        let accent_hex = accent.to_hex();

        let pick = |param: Option<&String>, allowlist: &[&str], fallback: &str| {
            parse_param(param.map(String::as_str), allowlist)
                .into_value()
                .unwrap_or_else(|| fallback.to_string())
        };

        ThemeColors {
            accent_half_alpha: format!("{}{}", accent_hex, HALF_ALPHA_SUFFIX),
            accent: accent_hex,
            button_text: pick(self.override_button_text_color.as_ref(), &[], button_text),
            normal_text: pick(self.normal_text_color.as_ref(), &[], defaults.normal_text),
            shadow: pick(
                self.button_shadow_color.as_ref(),
                &[TRANSPARENT],
                defaults.shadow,
            ),
            background: pick(
                self.background_color.as_ref(),
                &[TRANSPARENT],
                defaults.background,
            ),
        }
    }
}

/// Theme for one request against a cached project
pub fn resolve_theme(
    base: &ProjectData,
    overrides: &ColorOverrides,
    dark_theme: bool,
) -> ThemeColors {
    overrides.resolve(base.image_accent, dark_theme)
}
