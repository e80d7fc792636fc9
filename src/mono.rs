//! Monochrome silhouette extraction for themed icons.
//!
//! The silhouette is a single alpha channel derived from the brightness of
//! the icon artwork composited over black, contrast-stretched so edges stay
//! soft while the body becomes solid.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use palette::{IntoColor, Srgb, Xyz};

/// Fraction of the side treated as the outer band by the spread estimator.
const EDGE_BAND_FRACTION: f32 = 0.125;

/// The extracted alpha mask and the signed luminance difference between
/// foreground and background.
///
/// A negative difference means the foreground is darker than its
/// background. Callers pick tint assignment from it.
#[derive(Debug, Clone, PartialEq)]
pub struct MonochromeResult {
    pub mask: GrayImage,
    pub luminance_diff: f64,
}

/// Relative luminance (CIE Y) of an sRGB colour.
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let xyz: Xyz = rgb.into_color();
    xyz.y as f64
}

/// Alpha-weighted mean luminance of the covered pixels.
///
/// Fully transparent images have zero luminance.
pub fn luminance(img: &RgbaImage) -> f64 {
    let mut weighted = 0.0;
    let mut total_alpha = 0.0;
    for Rgba([r, g, b, a]) in img.pixels().copied() {
        if a == 0 {
            continue;
        }
        let alpha = a as f64 / 255.0;
        weighted += relative_luminance(r, g, b) * alpha;
        total_alpha += alpha;
    }
    if total_alpha == 0.0 {
        0.0
    } else {
        weighted / total_alpha
    }
}

/// Extracts a silhouette from up to two layer rasters of equal size.
///
/// With both layers the foreground is the silhouette. With a single layer
/// the whole raster is used, and the stretched mask is inverted when its
/// outer band ends up brighter than its centre: light artwork on a dark
/// plate would otherwise yield an opaque frame around a hole where the
/// glyph is.
///
/// Returns `None` when neither layer is present.
pub fn extract(background: Option<&RgbaImage>, foreground: Option<&RgbaImage>) -> Option<MonochromeResult> {
    let (source, luminance_diff, single) = match (background, foreground) {
        (Some(bg), Some(fg)) => (fg, luminance(fg) - luminance(bg), false),
        (Some(only), None) | (None, Some(only)) => (only, spread_luminance(only), true),
        (None, None) => return None,
    };

    let mut mask = average_channels(source);
    stretch_contrast(&mut mask);
    if single && edge_brighter_than_centre(&mask) {
        invert(&mut mask);
    }

    Some(MonochromeResult {
        mask,
        luminance_diff,
    })
}

/// Mask for an icon that ships its own monochrome artwork: its alpha, as is.
pub fn mask_from_layer(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| Luma([img.get_pixel(x, y)[3]]))
}

/// White artwork carrying `mask` as alpha.
pub fn mask_to_image(mask: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
        Rgba([255, 255, 255, mask.get_pixel(x, y)[0]])
    })
}

/// `(R + G + B) / 3` of each pixel composited over black.
pub fn average_channels(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let sum = r as u32 + g as u32 + b as u32;
        Luma([((sum * a as u32) / (3 * 255)) as u8])
    })
}

/// Stretches the value range to `[0, 255]` and pushes values away from the
/// midpoint with a quadratic curve. A flat mask is left untouched.
pub fn stretch_contrast(mask: &mut GrayImage) {
    let pixels: &mut [u8] = mask;
    stretch_contrast_values(pixels);
}

pub fn stretch_contrast_values(pixels: &mut [u8]) {
    let (Some(&min), Some(&max)) = (pixels.iter().min(), pixels.iter().max()) else {
        return;
    };
    if min >= max {
        return;
    }
    let range = (max - min) as f32;
    for p in pixels.iter_mut() {
        let linear = (*p - min) as f32 * 255.0 / range;
        let offset = linear - 128.0;
        let d = (offset.abs() / 128.0).min(1.0);
        let curved = 128.0 + offset.signum() * 128.0 * d * (2.0 - d);
        *p = curved.round().clamp(0.0, 255.0) as u8;
    }
}

/// Centre brightness minus edge brightness, relative to the overall spread.
fn spread_luminance(img: &RgbaImage) -> f64 {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }
    let band_x = ((width as f32 * EDGE_BAND_FRACTION) as u32).max(1);
    let band_y = ((height as f32 * EDGE_BAND_FRACTION) as u32).max(1);

    let (mut lo, mut hi) = (f64::MAX, f64::MIN);
    let (mut centre, mut centre_n) = (0.0, 0u64);
    let (mut edge, mut edge_n) = (0.0, 0u64);
    for (x, y, px) in img.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let lum = relative_luminance(r, g, b) * a as f64 / 255.0;
        lo = lo.min(lum);
        hi = hi.max(lum);
        if x < band_x || y < band_y || x >= width - band_x || y >= height - band_y {
            edge += lum;
            edge_n += 1;
        } else if x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4 {
            centre += lum;
            centre_n += 1;
        }
    }

    let spread = hi - lo;
    if spread <= 0.0 || centre_n == 0 || edge_n == 0 {
        return 0.0;
    }
    ((centre / centre_n as f64 - edge / edge_n as f64) / spread).clamp(-1.0, 1.0)
}

fn edge_brighter_than_centre(mask: &GrayImage) -> bool {
    let (width, height) = mask.dimensions();
    if width < 4 || height < 4 {
        return false;
    }
    let band_x = ((width as f32 * EDGE_BAND_FRACTION) as u32).max(1);
    let band_y = ((height as f32 * EDGE_BAND_FRACTION) as u32).max(1);
    let (mut centre, mut centre_n, mut edge, mut edge_n) = (0u64, 0u64, 0u64, 0u64);
    for (x, y, px) in mask.enumerate_pixels() {
        if x < band_x || y < band_y || x >= width - band_x || y >= height - band_y {
            edge += px[0] as u64;
            edge_n += 1;
        } else if x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4 {
            centre += px[0] as u64;
            centre_n += 1;
        }
    }
    centre_n > 0 && edge_n > 0 && edge * centre_n > centre * edge_n
}

fn invert(mask: &mut GrayImage) {
    for p in mask.pixels_mut() {
        p[0] = 255 - p[0];
    }
}
