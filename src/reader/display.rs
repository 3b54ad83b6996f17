//! Display preferences for a reading session.

use crate::formats::RasterImage;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Font size preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    /// 16 sp.
    Small,
    /// 18 sp.
    #[default]
    Medium,
    /// 22 sp.
    Large,
}

impl FontSize {
    /// Size in scale-independent pixels.
    pub fn sp(&self) -> f32 {
        match self {
            FontSize::Small => 16.0,
            FontSize::Medium => 18.0,
            FontSize::Large => 22.0,
        }
    }
}

/// Line spacing preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSpacing {
    /// 1.2x.
    Compact,
    /// 1.4x.
    #[default]
    Normal,
    /// 1.6x.
    Relaxed,
}

impl LineSpacing {
    /// Multiplier applied to the font size.
    pub fn multiplier(&self) -> f32 {
        match self {
            LineSpacing::Compact => 1.2,
            LineSpacing::Normal => 1.4,
            LineSpacing::Relaxed => 1.6,
        }
    }
}

/// Reading theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark text on white.
    #[default]
    Light,
    /// White text on near-black.
    Dark,
    /// Brown text on cream.
    Sepia,
}

/// Colors derived from a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Page background.
    pub background: Rgba<u8>,
    /// Body text.
    pub text: Rgba<u8>,
    /// Translucent layer drawn over PDF pages, if any.
    pub page_overlay: Option<Rgba<u8>>,
}

impl Theme {
    /// Colors for this theme.
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: Rgba([0xFF, 0xFB, 0xFE, 0xFF]),
                text: Rgba([0x11, 0x11, 0x11, 0xFF]),
                page_overlay: None,
            },
            Theme::Dark => Palette {
                background: Rgba([0x12, 0x12, 0x12, 0xFF]),
                text: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
                // black at 25%
                page_overlay: Some(Rgba([0x00, 0x00, 0x00, 64])),
            },
            Theme::Sepia => Palette {
                background: Rgba([0xFB, 0xF0, 0xD9, 0xFF]),
                text: Rgba([0x4A, 0x3A, 0x2A, 0xFF]),
                // #8B6B45 at 20%
                page_overlay: Some(Rgba([0x8B, 0x6B, 0x45, 51])),
            },
        }
    }
}

/// Font size, line spacing and theme for one session.
///
/// Not persisted: a new session starts from the configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayPreferences {
    /// Font size preset.
    #[serde(default)]
    pub font_size: FontSize,
    /// Line spacing preset.
    #[serde(default)]
    pub line_spacing: LineSpacing,
    /// Theme.
    #[serde(default)]
    pub theme: Theme,
}

impl DisplayPreferences {
    /// Line height in sp.
    pub fn line_height(&self) -> f32 {
        self.font_size.sp() * self.line_spacing.multiplier()
    }

    /// Colors for the current theme.
    pub fn palette(&self) -> Palette {
        self.theme.palette()
    }

    /// Blend the theme overlay onto a rendered page.
    pub fn tint_page(&self, page: &RasterImage) -> RgbaImage {
        let mut tinted = page.image.clone();
        let Some(overlay) = self.palette().page_overlay else {
            return tinted;
        };

        let alpha = overlay[3] as u32;
        for pixel in tinted.pixels_mut() {
            for channel in 0..3 {
                let base = pixel[channel] as u32;
                let over = overlay[channel] as u32;
                pixel[channel] = ((over * alpha + base * (255 - alpha)) / 255) as u8;
            }
        }

        tinted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_height_scales_with_both_presets() {
        let prefs = DisplayPreferences {
            font_size: FontSize::Large,
            line_spacing: LineSpacing::Relaxed,
            theme: Theme::Sepia,
        };
        assert!((prefs.line_height() - 35.2).abs() < 1e-4);
        assert!((DisplayPreferences::default().line_height() - 25.2).abs() < 1e-4);
    }

    #[test]
    fn only_light_theme_leaves_pages_untouched() {
        assert!(Theme::Light.palette().page_overlay.is_none());
        assert!(Theme::Dark.palette().page_overlay.is_some());
        assert!(Theme::Sepia.palette().page_overlay.is_some());
    }

    #[test]
    fn dark_overlay_darkens_white_page() {
        let page = RasterImage {
            page_index: 0,
            source_width: 10.0,
            source_height: 10.0,
            image: RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])),
        };
        let prefs = DisplayPreferences {
            theme: Theme::Dark,
            ..Default::default()
        };

        let tinted = prefs.tint_page(&page);
        assert_eq!(tinted.get_pixel(0, 0), &Rgba([191, 191, 191, 255]));

        let light = DisplayPreferences::default().tint_page(&page);
        assert_eq!(light.get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn preferences_parse_from_toml() {
        let prefs: DisplayPreferences =
            toml::from_str("font_size = \"small\"\ntheme = \"dark\"").unwrap();
        assert_eq!(prefs.font_size, FontSize::Small);
        assert_eq!(prefs.line_spacing, LineSpacing::Normal);
        assert_eq!(prefs.theme, Theme::Dark);
    }
}
