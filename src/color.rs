//! Dominant colour extraction.
//!
//! A sparse grid of opaque pixels votes into a hue histogram weighted by
//! saturation and value. Among the pixels of the winning hue, the one whose
//! saturation/value bucket scored highest is returned.

use std::collections::HashMap;

use image::RgbaImage;
use palette::{Hsv, IntoColor, Srgb};

/// Number of pixels sampled from an icon.
pub const SAMPLES: u32 = 20;

/// Pixels below this alpha do not vote.
const MIN_ALPHA: u8 = 0x80;

fn to_hsv(r: u8, g: u8, b: u8) -> (u32, f32, f32) {
    let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let hsv: Hsv = rgb.into_color();
    let hue = (hsv.hue.into_positive_degrees() as u32).min(359);
    (hue, hsv.saturation, hsv.value)
}

/// Finds the most prominent colour of `img`, sampling about `samples` pixels.
///
/// Returns opaque black when no pixel is opaque enough to vote.
pub fn find_dominant_color(img: &RgbaImage, samples: u32) -> Srgb<u8> {
    let (width, height) = img.dimensions();
    let samples = samples.max(1) as usize;
    let area = width as u64 * height as u64;
    let stride = ((area / samples as u64) as f64).sqrt().max(1.0) as usize;

    let mut histogram = [0f32; 360];
    let mut high_score = -1f32;
    let mut best_hue = None;
    let mut sampled: Vec<[u8; 3]> = Vec::with_capacity(samples);

    for y in (0..height).step_by(stride) {
        for x in (0..width).step_by(stride) {
            let [r, g, b, a] = img.get_pixel(x, y).0;
            if a < MIN_ALPHA {
                continue;
            }
            let (hue, s, v) = to_hsv(r, g, b);
            if sampled.len() < samples {
                sampled.push([r, g, b]);
            }
            let slot = &mut histogram[hue as usize];
            *slot += s * v;
            if *slot > high_score {
                high_score = *slot;
                best_hue = Some(hue);
            }
        }
    }

    let Some(best_hue) = best_hue else {
        return Srgb::new(0, 0, 0);
    };

    let mut buckets: HashMap<u32, f32> = HashMap::new();
    let mut best = [0, 0, 0];
    let mut high_score = -1f32;
    for &[r, g, b] in &sampled {
        let (hue, s, v) = to_hsv(r, g, b);
        if hue != best_hue {
            continue;
        }
        let bucket = (s * 100.0) as u32 + (v * 10_000.0) as u32;
        let total = buckets.entry(bucket).or_insert(0.0);
        *total += s * v;
        if *total > high_score {
            high_score = *total;
            best = [r, g, b];
        }
    }

    Srgb::new(best[0], best[1], best[2])
}

/// Dominant colour, or black when extraction is disabled.
pub fn dominant_color(img: &RgbaImage, disabled: bool) -> Srgb<u8> {
    if disabled {
        Srgb::new(0, 0, 0)
    } else {
        find_dominant_color(img, SAMPLES)
    }
}
