//! Drop shadow synthesis.
//!
//! Two shadows are drawn under every icon: a soft ambient one centred on
//! the silhouette and a fainter key shadow nudged downwards. Both come from
//! the same blurred alpha silhouette.

use image::{imageops, GrayImage};
use resvg::tiny_skia::{Pixmap, Rect};

use crate::config::{RenderConfig, ShadowParams};
use crate::error::{IconError, Result};
use crate::render::DrawSurface;
use crate::shape::ClipShape;

/// Converts a blur radius to the Gaussian standard deviation.
pub fn radius_to_sigma(radius: f32) -> f32 {
    radius * 0.57735 + 0.5
}

/// Draws shadows for one icon size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowGenerator {
    blur_px: f32,
    key_offset_px: f32,
    ambient_alpha: u8,
    key_alpha: u8,
}

impl ShadowGenerator {
    /// Captures the shadow settings for `size`; disabled shadows have zero alphas.
    pub fn new(size: u32, config: &RenderConfig) -> Self {
        let (ambient_alpha, key_alpha) = config.shadow_alphas();
        Self::from_params(size, &config.shadow, ambient_alpha, key_alpha)
    }

    fn from_params(size: u32, params: &ShadowParams, ambient_alpha: u8, key_alpha: u8) -> Self {
        Self {
            blur_px: params.blur_px(size),
            key_offset_px: params.key_offset_px(size),
            ambient_alpha,
            key_alpha,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ambient_alpha > 0 || self.key_alpha > 0
    }

    /// Blur radius in pixels; also the minimum inset that keeps shadows on
    /// the canvas.
    pub fn blur_px(&self) -> f32 {
        self.blur_px
    }

    /// Draws both shadows of `silhouette` under whatever is on `pixmap`.
    ///
    /// Nothing is touched when shadows are disabled. A silhouette whose size
    /// differs from the pixmap is rejected.
    pub fn add_shadow(&self, silhouette: &GrayImage, pixmap: &mut Pixmap) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if silhouette.dimensions() != (pixmap.width(), pixmap.height()) {
            return Err(IconError::DegenerateGeometry(format!(
                "{}x{} silhouette on {}x{} pixmap",
                silhouette.width(),
                silhouette.height(),
                pixmap.width(),
                pixmap.height()
            )));
        }
        let blurred = imageops::blur(silhouette, radius_to_sigma(self.blur_px));
        let key_offset = self.key_offset_px.round() as i64;
        draw_black_under(pixmap, &blurred, self.ambient_alpha, 0);
        draw_black_under(pixmap, &blurred, self.key_alpha, key_offset);
        Ok(())
    }

    /// Re-draws the surface contents on top of their own shadow.
    pub fn recreate_icon(&self, surface: &mut DrawSurface) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let icon = surface.snapshot();
        let silhouette = alpha_of(surface.pixmap());
        surface.clear();
        self.add_shadow(&silhouette, surface.pixmap_mut())?;
        surface.draw_image(&icon)
    }

    /// Draws the shadow of `shape` placed at `bounds`, before any content.
    pub fn add_path_shadow(&self, shape: &ClipShape, bounds: Rect, pixmap: &mut Pixmap) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mask = shape.mask_in(pixmap.width(), pixmap.height(), bounds)?;
        let silhouette = GrayImage::from_raw(pixmap.width(), pixmap.height(), mask.data().to_vec())
            .unwrap_or_else(|| GrayImage::new(pixmap.width(), pixmap.height()));
        self.add_shadow(&silhouette, pixmap)
    }
}

/// Alpha channel of a pixmap as a grey image.
pub fn alpha_of(pixmap: &Pixmap) -> GrayImage {
    let data = pixmap.pixels().iter().map(|p| p.alpha()).collect();
    GrayImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| GrayImage::new(pixmap.width(), pixmap.height()))
}

// Composites black, weighted by `coverage * alpha`, underneath the existing
// premultiplied pixels, shifted down by `dy`.
fn draw_black_under(pixmap: &mut Pixmap, coverage: &GrayImage, alpha: u8, dy: i64) {
    if alpha == 0 {
        return;
    }
    let width = pixmap.width() as usize;
    let height = pixmap.height() as i64;
    let data = pixmap.data_mut();

    for y in 0..height {
        let src_y = y - dy;
        if src_y < 0 || src_y >= height {
            continue;
        }
        for x in 0..width {
            let m = coverage.get_pixel(x as u32, src_y as u32)[0];
            if m == 0 {
                continue;
            }
            let shadow_a = m as u32 * alpha as u32 / 255;
            let i = (y as usize * width + x) * 4;
            let da = data[i + 3] as u32;
            // Shadow goes under: dst over shadow. Black adds no colour.
            data[i + 3] = (da + shadow_a * (255 - da) / 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::IconLayer;

    fn generator(enabled: bool) -> ShadowGenerator {
        ShadowGenerator::new(48, &RenderConfig::default().with_shadows(enabled))
    }

    #[test]
    fn sigma_from_radius() {
        assert!((radius_to_sigma(0.0) - 0.5).abs() < 1e-6);
        assert!((radius_to_sigma(3.0) - 2.232_05).abs() < 1e-4);
    }

    #[test]
    fn disabled_generator_leaves_surface_alone() {
        let mut surface = DrawSurface::new(48).unwrap();
        surface.draw_flat(&IconLayer::color(255, 0, 0), 0.5).unwrap();
        let before = surface.snapshot();
        generator(false).recreate_icon(&mut surface).unwrap();
        assert_eq!(surface.snapshot(), before);
        assert!(!generator(false).is_enabled());
    }

    #[test]
    fn shadow_appears_outside_silhouette() {
        let mut surface = DrawSurface::new(48).unwrap();
        surface.draw_flat(&IconLayer::color(255, 0, 0), 0.5).unwrap();
        let before = surface.snapshot();
        generator(true).recreate_icon(&mut surface).unwrap();
        let after = surface.snapshot();

        // The icon itself is unchanged.
        assert_eq!(after.get_pixel(24, 24), before.get_pixel(24, 24));
        // Just below the icon there is now a faint black shadow.
        let below = after.get_pixel(24, 36);
        assert_eq!(before.get_pixel(24, 36)[3], 0);
        assert!(below[3] > 0 && below[3] < 40, "alpha {}", below[3]);
        assert_eq!(&below.0[..3], &[0, 0, 0]);
    }

    #[test]
    fn mismatched_silhouette_is_rejected() {
        let mut pixmap = Pixmap::new(48, 48).unwrap();
        let short = GrayImage::from_pixel(48, 10, image::Luma([255]));
        assert!(matches!(
            generator(true).add_shadow(&short, &mut pixmap),
            Err(IconError::DegenerateGeometry(_))
        ));
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
        assert!(generator(false).add_shadow(&short, &mut pixmap).is_ok());
    }

    #[test]
    fn path_shadow_is_drawn_under_shape() {
        let mut pixmap = Pixmap::new(48, 48).unwrap();
        let bounds = Rect::from_xywh(8.0, 8.0, 32.0, 32.0).unwrap();
        generator(true)
            .add_path_shadow(&ClipShape::circle(), bounds, &mut pixmap)
            .unwrap();
        let alpha = alpha_of(&pixmap);
        assert!(alpha.get_pixel(24, 24)[0] > 0);
        assert_eq!(alpha.get_pixel(0, 0)[0], 0);
        assert!(alpha.get_pixel(24, 24)[0] <= 32);
    }
}
