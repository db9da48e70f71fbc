//! Theme resolver – maps a theme selector (light/dark/system) to one of the
//! two fixed palettes used by both the preview raster and the PDF export.
//!
//! The UI theme and the export ("PDF") theme are intentionally independent
//! selectors; both resolve through [`resolve`].

use serde::{Deserialize, Serialize};

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else {
            None
        }
    }

    /// White with the given alpha (the dark palette's secondary colours).
    const fn white_alpha(a: f32) -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
            a,
        }
    }

    /// 8-bit RGBA, alpha premultiplication left to the compositor.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            (self.a * 255.0).round() as u8,
        ]
    }
}

/// The persisted theme selector. Unknown serialized values land on `Unset`,
/// which resolves to the light palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSelector {
    Light,
    #[default]
    Dark,
    System,
    #[serde(other)]
    Unset,
}

/// The seven colours every rendering surface draws with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePalette {
    pub background: Color,
    pub card_background: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub border: Color,
    pub border_strong: Color,
}

impl ThemePalette {
    pub const DARK: Self = Self {
        background: Color::BLACK,
        card_background: Color {
            r: 26.0 / 255.0,
            g: 26.0 / 255.0,
            b: 26.0 / 255.0,
            a: 1.0,
        },
        text: Color::WHITE,
        text_secondary: Color::white_alpha(0.7),
        text_muted: Color::white_alpha(0.8),
        border: Color::white_alpha(0.1),
        border_strong: Color::white_alpha(0.2),
    };

    pub const LIGHT: Self = Self {
        background: Color::WHITE,
        card_background: Color::WHITE,
        text: Color::BLACK,
        text_secondary: Color::BLACK,
        text_muted: Color::BLACK,
        border: Color::BLACK,
        border_strong: Color::BLACK,
    };
}

/// Resolve a selector to one of the two fixed palettes.
///
/// `system_prefers_dark` is the externally supplied ambient preference used
/// only when the selector is `System`. Total: every input maps to exactly one
/// palette, `Unset` (and therefore any unknown persisted value) to light.
pub fn resolve(selector: ThemeSelector, system_prefers_dark: bool) -> &'static ThemePalette {
    let dark = match selector {
        ThemeSelector::Dark => true,
        ThemeSelector::System => system_prefers_dark,
        ThemeSelector::Light | ThemeSelector::Unset => false,
    };
    if dark {
        &ThemePalette::DARK
    } else {
        &ThemePalette::LIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_match_their_hex_sources() {
        assert_eq!(ThemePalette::DARK.background, Color::from_hex("#000000").unwrap());
        assert_eq!(
            ThemePalette::DARK.card_background,
            Color::from_hex("#1A1A1A").unwrap()
        );
        assert_eq!(ThemePalette::LIGHT.text, Color::from_hex("#000").unwrap());
    }

    #[test]
    fn system_follows_ambient_preference() {
        assert_eq!(resolve(ThemeSelector::System, true), &ThemePalette::DARK);
        assert_eq!(resolve(ThemeSelector::System, false), &ThemePalette::LIGHT);
    }

    #[test]
    fn resolution_is_total() {
        for selector in [
            ThemeSelector::Light,
            ThemeSelector::Dark,
            ThemeSelector::System,
            ThemeSelector::Unset,
        ] {
            for ambient in [false, true] {
                let palette = resolve(selector, ambient);
                assert!(palette == &ThemePalette::DARK || palette == &ThemePalette::LIGHT);
            }
        }
    }

    #[test]
    fn unknown_persisted_selector_falls_back_to_light() {
        let parsed: ThemeSelector = serde_json::from_str("\"sepia\"").unwrap();
        assert_eq!(parsed, ThemeSelector::Unset);
        assert_eq!(resolve(parsed, true), &ThemePalette::LIGHT);
    }

    #[test]
    fn alpha_colours_convert_to_rgba8() {
        let c = ThemePalette::DARK.text_secondary.to_rgba8();
        assert_eq!(c[..3], [255, 255, 255]);
        assert!((177..=179).contains(&c[3]), "alpha byte was {}", c[3]);
        assert!(!ThemePalette::DARK.border.is_transparent());
    }
}
