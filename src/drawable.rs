//! On-screen image for a [`BitmapInfo`].
//!
//! The UI layer displays icons either as rendered or, when the user picked
//! themed icons, as the monochrome silhouette tinted over a coloured shape.
//! Badges are composited last.

use image::RgbaImage;
use log::warn;
use palette::Srgb;

use crate::bitmap_info::{BadgeAnchor, BitmapInfo};
use crate::icon::RectPx;
use crate::render::svg::{composite_over, tint};
use crate::shape::ClipShape;

/// Colours used for themed icons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeColors {
    /// Fill of the icon shape.
    pub background: Srgb<u8>,
    /// Tint of the monochrome silhouette.
    pub foreground: Srgb<u8>,
}

impl ThemeColors {
    pub fn light() -> Self {
        Self {
            background: Srgb::new(0xe8, 0xf0, 0xfe),
            foreground: Srgb::new(0x0b, 0x57, 0xd0),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Srgb::new(0x1f, 0x1f, 0x1f),
            foreground: Srgb::new(0xa8, 0xc7, 0xfa),
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self::light()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawableOptions {
    /// Draw the themed variant when the icon has a monochrome layer.
    pub themed: bool,
    pub theme_colors: ThemeColors,
    /// Shape used to find where attached badges sit.
    pub shape: ClipShape,
}

/// The final image shown for an icon.
#[derive(Debug, Clone, PartialEq)]
pub struct IconDrawable {
    image: RgbaImage,
    themed: bool,
}

impl IconDrawable {
    pub fn from_info(info: &BitmapInfo, options: &DrawableOptions) -> Self {
        let (mut image, themed) = match (&info.mono, options.themed) {
            (Some(mono), true) => (themed_image(info, mono, &options.theme_colors), true),
            _ => (info.icon.clone(), false),
        };

        if let Some(badge) = &info.badge {
            let bounds = RectPx::from_size(image.width(), image.height());
            let (x, y) = badge_position(info.badge_anchor, &options.shape, &bounds, &badge.icon);
            if let Err(err) = composite_over(&mut image, &badge.icon, x, y) {
                warn!("badge not drawn: {err}");
            }
        }

        Self { image, themed }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn is_themed(&self) -> bool {
        self.themed
    }
}

fn themed_image(info: &BitmapInfo, mono: &RgbaImage, colors: &ThemeColors) -> RgbaImage {
    let bg = colors.background;
    let fg = colors.foreground;
    let mut image = match &info.white_shadow_layer {
        // White body takes the background colour, black shadows stay black.
        Some(layer) => multiply(layer, [bg.red, bg.green, bg.blue]),
        None => RgbaImage::new(mono.width(), mono.height()),
    };
    if let Err(err) = composite_over(&mut image, &tint(mono, [fg.red, fg.green, fg.blue]), 0, 0) {
        warn!("themed glyph not drawn: {err}");
    }
    image
}

fn multiply(img: &RgbaImage, rgb: [u8; 3]) -> RgbaImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for (c, m) in pixel.0.iter_mut().zip(rgb) {
            *c = ((*c as u16 * m as u16 + 127) / 255) as u8;
        }
    }
    out
}

/// Top-left corner for a badge of the given size.
fn badge_position(anchor: BadgeAnchor, shape: &ClipShape, bounds: &RectPx, badge: &RgbaImage) -> (i32, i32) {
    let bx = bounds.x as i32;
    let by = bounds.y as i32;
    let bw = bounds.width as i32;
    let bh = bounds.height as i32;
    let ow = badge.width() as i32;
    let oh = badge.height() as i32;

    match anchor {
        BadgeAnchor::BottomRight => (bx + bw - ow, by + bh - oh),
        BadgeAnchor::ShapeAttachment => {
            let (px, py) = shape.attachment_points().right;
            let x = bx + (px * bw as f32).round() as i32 - ow / 2;
            let y = by + (py * bh as f32).round() as i32 - oh / 2;
            (x.clamp(bx, (bx + bw - ow).max(bx)), y.clamp(by, (by + bh - oh).max(by)))
        }
    }
}
