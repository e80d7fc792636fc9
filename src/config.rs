//! Render configuration.
//!
//! A [`RenderConfig`] gathers every switch the pipeline reads: shadows,
//! colour extraction, monochrome generation and the legacy-icon wrapper.
//! It is immutable once handed to a composer and serializes to camelCase
//! JSON so a settings process can ship it across.
//!
//! # Example
//!
//! ```
//! use iconloader::RenderConfig;
//!
//! let config = RenderConfig::default().with_mono_icons(true);
//! let json = config.to_json().unwrap();
//! let restored = RenderConfig::from_json(&json).unwrap();
//! assert!(restored.mono_icons_enabled);
//! ```

use palette::Srgb;
use serde::{Deserialize, Serialize};

/// Opaque white, used whenever a translucent wrapper colour is configured.
pub const DEFAULT_WRAPPER_BACKGROUND: [u8; 4] = [255, 255, 255, 255];

// ============================================================================
// ShadowParams
// ============================================================================

/// Drop shadow parameters.
///
/// `blur_radius` and `key_shadow_offset` are fractions of the icon size so
/// shadows scale with density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ShadowParams {
    pub blur_radius: f32,
    pub key_shadow_offset: f32,
    pub ambient_alpha: u8,
    pub key_alpha: u8,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            blur_radius: 1.68 / 48.0,
            key_shadow_offset: 1.0 / 48.0,
            ambient_alpha: 25,
            key_alpha: 7,
        }
    }
}

impl ShadowParams {
    /// Blur radius in pixels for an icon of `size` pixels.
    pub fn blur_px(&self, size: u32) -> f32 {
        self.blur_radius * size as f32
    }

    /// Downward key shadow offset in pixels for an icon of `size` pixels.
    pub fn key_offset_px(&self, size: u32) -> f32 {
        self.key_shadow_offset * size as f32
    }
}

// ============================================================================
// RenderConfig
// ============================================================================

/// Every toggle the pipeline consults, passed by reference into each call.
///
/// # JSON Format
///
/// ```json
/// {
///   "shrinkNonAdaptiveIcons": true,
///   "disableColorExtraction": false,
///   "monoIconsEnabled": false,
///   "shadowsEnabled": true,
///   "wrapperBackgroundColor": [255, 255, 255, 255],
///   "shadow": { "blurRadius": 0.035, "keyShadowOffset": 0.0208, "ambientAlpha": 25, "keyAlpha": 7 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Wrap legacy flat icons into an adaptive container.
    #[serde(default = "default_true")]
    pub shrink_non_adaptive_icons: bool,

    /// Skip the hue histogram and report black as the dominant colour.
    #[serde(default)]
    pub disable_color_extraction: bool,

    /// Generate monochrome layers for themed icons.
    #[serde(default)]
    pub mono_icons_enabled: bool,

    /// Single switch for all shadow synthesis.
    #[serde(default = "default_true")]
    pub shadows_enabled: bool,

    /// RGBA background of the legacy-icon wrapper.
    #[serde(default = "default_wrapper")]
    pub wrapper_background_color: [u8; 4],

    #[serde(default)]
    pub shadow: ShadowParams,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shrink_non_adaptive_icons: true,
            disable_color_extraction: false,
            mono_icons_enabled: false,
            shadows_enabled: true,
            wrapper_background_color: DEFAULT_WRAPPER_BACKGROUND,
            shadow: ShadowParams::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_wrapper() -> [u8; 4] {
    DEFAULT_WRAPPER_BACKGROUND
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shrink_non_adaptive_icons(mut self, enabled: bool) -> Self {
        self.shrink_non_adaptive_icons = enabled;
        self
    }

    pub fn with_color_extraction_disabled(mut self, disabled: bool) -> Self {
        self.disable_color_extraction = disabled;
        self
    }

    pub fn with_mono_icons(mut self, enabled: bool) -> Self {
        self.mono_icons_enabled = enabled;
        self
    }

    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadows_enabled = enabled;
        self
    }

    /// Sets the wrapper colour. Translucent colours fall back to opaque white.
    pub fn with_wrapper_background(mut self, rgba: [u8; 4]) -> Self {
        self.wrapper_background_color = if rgba[3] < 255 {
            DEFAULT_WRAPPER_BACKGROUND
        } else {
            rgba
        };
        self
    }

    /// Resolved wrapper colour, applying the opacity rule to values that
    /// arrived through deserialization.
    pub fn wrapper_background(&self) -> Srgb<u8> {
        let [r, g, b, a] = self.wrapper_background_color;
        if a < 255 {
            let [r, g, b, _] = DEFAULT_WRAPPER_BACKGROUND;
            Srgb::new(r, g, b)
        } else {
            Srgb::new(r, g, b)
        }
    }

    /// Effective shadow alphas `(ambient, key)`; both zero when shadows are off.
    pub fn shadow_alphas(&self) -> (u8, u8) {
        if self.shadows_enabled {
            (self.shadow.ambient_alpha, self.shadow.key_alpha)
        } else {
            (0, 0)
        }
    }

    /// Serializes the config to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================
