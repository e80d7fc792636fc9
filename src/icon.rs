//! Icon description types.
//!
//! This module provides the geometry helpers and the source descriptions
//! callers hand to the composer: flat images, two-layer adaptive icons and
//! references to themed replacements living in another package.

use image::RgbaImage;
use palette::Srgb;

use crate::extender::ClockFace;
use crate::shape::ClipShape;

/// A rectangle defined in pixel coordinates.
///
/// Used for the visible content bounds found while scanning a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    /// X offset from the left edge of the image
    pub x: u32,
    /// Y offset from the top edge of the image
    pub y: u32,
    /// Width of the rectangle
    pub width: u32,
    /// Height of the rectangle
    pub height: u32,
}

impl RectPx {
    /// Creates a new rectangle with the given position and dimensions.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle starting at origin (0, 0) with the given dimensions.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Returns the bottom edge coordinate (y + height).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Insets expressed as fractions of a square's side.
///
/// `left`/`top` are distances from the leading edges, `right`/`bottom`
/// distances from the trailing edges, so a full-bleed shape is all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Converts pixel bounds inside a `size`-sided square into inset fractions.
    pub fn from_pixel_bounds(bounds: RectPx, size: u32) -> Self {
        if size == 0 {
            return Self::default();
        }
        let s = size as f32;
        Self {
            left: bounds.x as f32 / s,
            top: bounds.y as f32 / s,
            right: 1.0 - bounds.right() as f32 / s,
            bottom: 1.0 - bounds.bottom() as f32 / s,
        }
    }
}

/// One paint layer of an icon.
#[derive(Debug, Clone, PartialEq)]
pub enum IconLayer {
    /// Decoded raster artwork.
    Bitmap(RgbaImage),

    /// A solid fill covering the whole layer.
    Color(Srgb<u8>),

    /// SVG markup, rasterized at draw time.
    Svg(String),

    /// Another layer drawn aspect-fit at a fixed fraction of the layer
    /// bounds, centred. Used to inset legacy artwork inside a wrapper.
    Scaled { inner: Box<IconLayer>, scale: f32 },
}

impl IconLayer {
    pub fn color(r: u8, g: u8, b: u8) -> Self {
        Self::Color(Srgb::new(r, g, b))
    }

    pub fn svg(markup: impl Into<String>) -> Self {
        Self::Svg(markup.into())
    }

    /// Wraps this layer so it is drawn at `scale` of its bounds.
    pub fn scaled(self, scale: f32) -> Self {
        Self::Scaled {
            inner: Box::new(self),
            scale,
        }
    }
}

impl From<RgbaImage> for IconLayer {
    fn from(image: RgbaImage) -> Self {
        Self::Bitmap(image)
    }
}

/// A two-layer icon composited at render time and clipped to a shape.
///
/// Layers are laid out on a canvas 50% larger than the visible icon, so 25%
/// of every layer sits outside the clip on each side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdaptiveIcon {
    pub background: Option<IconLayer>,
    pub foreground: Option<IconLayer>,
    /// Optional single-colour layer used for themed icons.
    pub monochrome: Option<IconLayer>,
    /// Clip shape; `None` means the device shape configured on the composer.
    pub shape: Option<ClipShape>,
    /// Present for clock icons whose hands follow the time of day.
    pub clock: Option<ClockFace>,
}

impl AdaptiveIcon {
    pub fn new(background: IconLayer, foreground: IconLayer) -> Self {
        Self {
            background: Some(background),
            foreground: Some(foreground),
            ..Self::default()
        }
    }

    pub fn with_monochrome(mut self, layer: IconLayer) -> Self {
        self.monochrome = Some(layer);
        self
    }

    pub fn with_shape(mut self, shape: ClipShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_clock(mut self, clock: ClockFace) -> Self {
        self.clock = Some(clock);
        self
    }
}

/// Where to pull a themed replacement drawable from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeOverlay {
    /// Package that owns the themed resource.
    pub package_name: String,
    /// Fully qualified resource name; this is what gets persisted.
    pub resource_name: String,
    /// Runtime resource id, when known. Ids are not stable across installs
    /// so they are never persisted.
    pub resource_id: Option<u32>,
}

impl ThemeOverlay {
    pub fn new(package_name: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            resource_name: resource_name.into(),
            resource_id: None,
        }
    }

    pub fn with_resource_id(mut self, id: u32) -> Self {
        self.resource_id = Some(id);
        self
    }
}

/// The input to the composer.
#[derive(Debug, Clone, PartialEq)]
pub enum IconSource {
    /// A single flat image (legacy icon).
    Flat(IconLayer),
    /// A background/foreground icon with a clip shape.
    Adaptive(AdaptiveIcon),
    /// A themed replacement resolved through a
    /// [`ResourceResolver`](crate::ResourceResolver).
    ThemeOverride(ThemeOverlay),
}

impl IconSource {
    pub fn is_adaptive(&self) -> bool {
        matches!(self, Self::Adaptive(_))
    }
}

impl From<RgbaImage> for IconSource {
    fn from(image: RgbaImage) -> Self {
        Self::Flat(IconLayer::Bitmap(image))
    }
}

impl From<AdaptiveIcon> for IconSource {
    fn from(icon: AdaptiveIcon) -> Self {
        Self::Adaptive(icon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_px_new() {
        let rect = RectPx::new(10, 20, 100, 200);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 220);
        assert_eq!(rect.area(), 20_000);
        assert!(!rect.is_empty());
        assert!(RectPx::from_size(0, 5).is_empty());
    }

    #[test]
    fn rect_f_from_pixel_bounds() {
        let insets = RectF::from_pixel_bounds(RectPx::new(10, 20, 80, 60), 100);
        assert!((insets.left - 0.1).abs() < 1e-6);
        assert!((insets.top - 0.2).abs() < 1e-6);
        assert!((insets.right - 0.1).abs() < 1e-6);
        assert!((insets.bottom - 0.2).abs() < 1e-6);
    }

    #[test]
    fn scaled_layer_wraps_inner() {
        let layer = IconLayer::color(1, 2, 3).scaled(0.5);
        match layer {
            IconLayer::Scaled { inner, scale } => {
                assert_eq!(*inner, IconLayer::color(1, 2, 3));
                assert_eq!(scale, 0.5);
            }
            other => panic!("unexpected layer {other:?}"),
        }
    }

    #[test]
    fn adaptive_builders() {
        let icon = AdaptiveIcon::new(IconLayer::color(255, 255, 255), IconLayer::color(0, 0, 0))
            .with_monochrome(IconLayer::color(0, 0, 0));
        assert!(icon.monochrome.is_some());
        assert!(icon.shape.is_none());
        assert!(IconSource::from(icon).is_adaptive());
    }
}
