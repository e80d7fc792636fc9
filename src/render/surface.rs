//! Layer drawing and the composer-owned canvas.
//!
//! All drawing happens on premultiplied tiny-skia pixmaps. Layers are
//! placed into a target rectangle; adaptive icons are drawn into a rect
//! 50% larger than their visible bounds and then multiplied by the shape
//! mask placed at those bounds.

use chrono::NaiveTime;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use resvg::tiny_skia::{
    Color, FilterQuality, Mask, Paint, Pixmap, PixmapPaint, Rect, Transform,
};
use resvg::usvg::Options;

use super::svg::{fit_transform, parse_svg, pixmap_to_rgba_image, rgba_image_to_pixmap};
use crate::error::{IconError, Result};
use crate::icon::{AdaptiveIcon, IconLayer};
use crate::shape::ClipShape;

/// Extra layer inset on each side of an adaptive icon, as a fraction of
/// the visible bounds.
pub const EXTRA_INSET_FRACTION: f32 = 0.25;

// ============================================================================
// Layer drawing
// ============================================================================

/// Natural width and height of a layer, if it has one.
///
/// Solid colours have no intrinsic size and fill whatever they are given.
pub fn intrinsic_size(layer: &IconLayer) -> Option<(f32, f32)> {
    match layer {
        IconLayer::Bitmap(img) if img.width() > 0 && img.height() > 0 => {
            Some((img.width() as f32, img.height() as f32))
        }
        IconLayer::Bitmap(_) | IconLayer::Color(_) => None,
        IconLayer::Svg(markup) => parse_svg(markup, &Options::default())
            .ok()
            .map(|tree| (tree.size().width(), tree.size().height())),
        IconLayer::Scaled { inner, .. } => intrinsic_size(inner),
    }
}

/// The rectangle adaptive layers are drawn into for the given visible bounds.
pub fn layer_bounds(bounds: Rect) -> Option<Rect> {
    let dx = bounds.width() * EXTRA_INSET_FRACTION;
    let dy = bounds.height() * EXTRA_INSET_FRACTION;
    Rect::from_xywh(
        bounds.x() - dx,
        bounds.y() - dy,
        bounds.width() + 2.0 * dx,
        bounds.height() + 2.0 * dy,
    )
}

/// `rect` shrunk by `scale` around its centre, then shrunk again along one
/// axis so content with the given intrinsic size keeps its aspect ratio.
fn fitted_rect(rect: Rect, scale: f32, intrinsic: Option<(f32, f32)>) -> Result<Rect> {
    let mut width = rect.width() * scale;
    let mut height = rect.height() * scale;
    if let Some((w, h)) = intrinsic {
        if h > w {
            width *= w / h;
        } else if w > h {
            height *= h / w;
        }
    }
    Rect::from_xywh(
        rect.x() + (rect.width() - width) / 2.0,
        rect.y() + (rect.height() - height) / 2.0,
        width,
        height,
    )
    .ok_or_else(|| IconError::DegenerateGeometry(format!("layer scaled by {scale}")))
}

/// Draws a layer into `rect` on `pixmap`, source-over.
pub fn draw_layer(pixmap: &mut Pixmap, layer: &IconLayer, rect: Rect) -> Result<()> {
    match layer {
        IconLayer::Color(color) => {
            let mut paint = Paint::default();
            paint.set_color_rgba8(color.red, color.green, color.blue, 255);
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
        IconLayer::Bitmap(img) => {
            if img.width() == 0 || img.height() == 0 {
                return Err(IconError::DegenerateGeometry("empty bitmap layer".into()));
            }
            let target_w = rect.width().round().max(1.0) as u32;
            let target_h = rect.height().round().max(1.0) as u32;

            // Bilinear sampling aliases on large reductions; pre-filter first.
            let resized;
            let source = if img.width() > target_w * 2 || img.height() > target_h * 2 {
                resized = imageops::resize(img, target_w, target_h, FilterType::Triangle);
                &resized
            } else {
                img
            };

            let src = rgba_image_to_pixmap(source)?;
            let transform = Transform::from_row(
                rect.width() / src.width() as f32,
                0.0,
                0.0,
                rect.height() / src.height() as f32,
                rect.x(),
                rect.y(),
            );
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
        }
        IconLayer::Svg(markup) => {
            let tree = parse_svg(markup, &Options::default())?;
            let transform = fit_transform(&tree, rect.x(), rect.y(), rect.width(), rect.height());
            resvg::render(&tree, transform, &mut pixmap.as_mut());
        }
        IconLayer::Scaled { inner, scale } => {
            let inner_rect = fitted_rect(rect, *scale, intrinsic_size(inner))?;
            draw_layer(pixmap, inner, inner_rect)?;
        }
    }
    Ok(())
}

/// Rasterizes a single layer into a `size x size` image.
pub fn render_layer(layer: &IconLayer, size: u32) -> Result<RgbaImage> {
    let mut pixmap = new_pixmap(size)?;
    let rect = full_rect(size)?;
    draw_layer(&mut pixmap, layer, rect)?;
    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Multiplies every premultiplied pixel by the mask coverage.
pub fn apply_mask(pixmap: &mut Pixmap, mask: &Mask) {
    for (px, &coverage) in pixmap.data_mut().chunks_exact_mut(4).zip(mask.data()) {
        if coverage == 255 {
            continue;
        }
        for c in px {
            *c = ((*c as u16 * coverage as u16 + 127) / 255) as u8;
        }
    }
}

/// Draws an adaptive icon with its visible area at `bounds`, clipped to `shape`.
///
/// Clock hands are drawn only when a `time` is given.
pub fn draw_adaptive(
    pixmap: &mut Pixmap,
    icon: &AdaptiveIcon,
    shape: &ClipShape,
    bounds: Rect,
    time: Option<NaiveTime>,
) -> Result<()> {
    let layer_rect = layer_bounds(bounds)
        .ok_or_else(|| IconError::DegenerateGeometry("adaptive layer bounds".into()))?;

    let mut layers = Pixmap::new(pixmap.width(), pixmap.height())
        .ok_or_else(|| IconError::DegenerateGeometry("adaptive layer pixmap".into()))?;
    for layer in [&icon.background, &icon.foreground].into_iter().flatten() {
        draw_layer(&mut layers, layer, layer_rect)?;
    }
    if let (Some(clock), Some(time)) = (&icon.clock, time) {
        clock.draw_hands(&mut layers, layer_rect, time)?;
    }

    let mask = shape.mask_in(pixmap.width(), pixmap.height(), bounds)?;
    apply_mask(&mut layers, &mask);
    pixmap.draw_pixmap(
        0,
        0,
        layers.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(())
}

fn new_pixmap(size: u32) -> Result<Pixmap> {
    Pixmap::new(size, size)
        .ok_or_else(|| IconError::DegenerateGeometry(format!("{size}x{size} surface")))
}

fn full_rect(size: u32) -> Result<Rect> {
    Rect::from_xywh(0.0, 0.0, size as f32, size as f32)
        .ok_or_else(|| IconError::DegenerateGeometry(format!("{size}x{size} bounds")))
}

// ============================================================================
// DrawSurface
// ============================================================================

/// A square canvas reused across renders.
///
/// Owned by one composer; every draw call clips to the surface bounds.
pub struct DrawSurface {
    pixmap: Pixmap,
}

impl std::fmt::Debug for DrawSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawSurface")
            .field("size", &self.pixmap.width())
            .finish()
    }
}

impl DrawSurface {
    pub fn new(size: u32) -> Result<Self> {
        Ok(Self {
            pixmap: new_pixmap(size)?,
        })
    }

    pub fn size(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn bounds(&self) -> Result<Rect> {
        full_rect(self.size())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Erases everything back to transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Copies the current contents out as a straight-alpha image.
    pub fn snapshot(&self) -> RgbaImage {
        pixmap_to_rgba_image(&self.pixmap)
    }

    /// Draws a layer aspect-fit into the whole surface at `scale`.
    pub fn draw_flat(&mut self, layer: &IconLayer, scale: f32) -> Result<()> {
        let rect = fitted_rect(self.bounds()?, scale, intrinsic_size(layer))?;
        draw_layer(&mut self.pixmap, layer, rect)
    }

    pub fn draw_adaptive(
        &mut self,
        icon: &AdaptiveIcon,
        shape: &ClipShape,
        bounds: Rect,
        time: Option<NaiveTime>,
    ) -> Result<()> {
        draw_adaptive(&mut self.pixmap, icon, shape, bounds, time)
    }

    /// Draws a same-sized image at the origin, source-over.
    pub fn draw_image(&mut self, img: &RgbaImage) -> Result<()> {
        let src = rgba_image_to_pixmap(img)?;
        self.pixmap.draw_pixmap(
            0,
            0,
            src.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn color_layer_fills_surface() {
        let img = render_layer(&IconLayer::color(10, 20, 30), 8).unwrap();
        assert!(img.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn scaled_layer_is_centred() {
        let img = render_layer(&IconLayer::color(255, 0, 0).scaled(0.5), 20).unwrap();
        assert_eq!(img.get_pixel(10, 10)[3], 255);
        assert_eq!(img.get_pixel(2, 2)[3], 0);
        assert_eq!(img.get_pixel(17, 17)[3], 0);
    }

    #[test]
    fn wide_bitmap_keeps_aspect_when_scaled() {
        let wide = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 255, 255]));
        let img = render_layer(&IconLayer::Bitmap(wide).scaled(1.0), 40).unwrap();
        assert_eq!(img.get_pixel(20, 4)[3], 0, "letterboxed top");
        assert_eq!(img.get_pixel(20, 20)[3], 255);
    }

    #[test]
    fn large_bitmap_is_downsampled() {
        let big = RgbaImage::from_pixel(512, 512, Rgba([255, 0, 0, 255]));
        let img = render_layer(&IconLayer::Bitmap(big), 32).unwrap();
        assert_eq!(img.dimensions(), (32, 32));
        assert_eq!(img.get_pixel(16, 16).0, [255, 0, 0, 255]);
    }

    #[test]
    fn empty_bitmap_is_degenerate() {
        let err = render_layer(&IconLayer::Bitmap(RgbaImage::new(0, 0)), 8).unwrap_err();
        assert!(matches!(err, IconError::DegenerateGeometry(_)));
    }

    #[test]
    fn layer_bounds_expand_by_half() {
        let rect = layer_bounds(Rect::from_xywh(10.0, 10.0, 40.0, 40.0).unwrap()).unwrap();
        assert_eq!((rect.x(), rect.y(), rect.width()), (0.0, 0.0, 60.0));
    }

    #[test]
    fn adaptive_icon_is_clipped() {
        let mut surface = DrawSurface::new(64).unwrap();
        let icon = AdaptiveIcon::new(IconLayer::color(0, 255, 0), IconLayer::color(0, 0, 255).scaled(0.2));
        let bounds = surface.bounds().unwrap();
        surface.draw_adaptive(&icon, &ClipShape::circle(), bounds, None).unwrap();
        let img = surface.snapshot();
        assert_eq!(img.get_pixel(0, 0)[3], 0, "corner outside circle");
        assert_eq!(img.get_pixel(32, 32).0, [0, 0, 255, 255], "foreground on top");
        assert_eq!(img.get_pixel(32, 4).0, [0, 255, 0, 255], "background near edge");
    }

    #[test]
    fn clear_and_snapshot() {
        let mut surface = DrawSurface::new(4).unwrap();
        surface.draw_flat(&IconLayer::color(1, 1, 1), 1.0).unwrap();
        assert_eq!(surface.snapshot().get_pixel(0, 0)[3], 255);
        surface.clear();
        assert!(surface.snapshot().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn zero_sized_surface_rejected() {
        assert!(DrawSurface::new(0).is_err());
    }
}
