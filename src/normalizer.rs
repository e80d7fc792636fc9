//! Visible-area normalization.
//!
//! Icons from different vendors fill their canvas very differently. The
//! normalizer measures the convex hull of the visible pixels and returns a
//! scale that brings every icon to the same visible area: roughly 380/576
//! of the canvas for round artwork and 375/576 for square artwork, with a
//! linear blend in between.

use std::f32::consts::PI;

use image::RgbaImage;
use log::{debug, warn};
use resvg::tiny_skia::Rect;

use crate::error::{IconError, Result};
use crate::icon::{IconLayer, IconSource, RectF, RectPx};
use crate::render::{draw_layer, intrinsic_size, DrawSurface};
use crate::shape::{ClipShape, ShapeKind};

/// Pixels at or below this alpha do not count as visible content.
pub const MIN_VISIBLE_ALPHA: u8 = 40;

/// Ratio of icon visible area to full icon size for a square shaped icon.
pub const MAX_SQUARE_AREA_FACTOR: f32 = 375.0 / 576.0;

/// Ratio of icon visible area to full icon size for a circular shaped icon.
pub const MAX_CIRCLE_AREA_FACTOR: f32 = 380.0 / 576.0;

const CIRCLE_AREA_BY_RECT: f32 = PI / 4.0;

/// Slope used to interpolate the required area between the square and
/// circle factors.
const LINEAR_SCALE_SLOPE: f32 =
    (MAX_CIRCLE_AREA_FACTOR - MAX_SQUARE_AREA_FACTOR) / (1.0 - CIRCLE_AREA_BY_RECT);

/// Allowed aspect deviation of content bounds before shape matching is skipped.
const BOUND_RATIO_MARGIN: f32 = 0.05;

/// Fraction of differing pixels under which content is said to match a mask.
const PIXEL_DIFF_PERCENTAGE_THRESHOLD: f32 = 0.005;

/// Outcome of measuring one icon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationResult {
    /// Factor in `(0, 1]` to apply when drawing the icon.
    pub scale: f32,
    /// Visible content insets as fractions of the canvas.
    pub visible_bounds: RectF,
    /// True when the visible content already has the mask's shape.
    pub shape_detected: bool,
}

impl NormalizationResult {
    /// The result for content that needs no scaling.
    pub fn unit() -> Self {
        Self {
            scale: 1.0,
            visible_bounds: RectF::default(),
            shape_detected: false,
        }
    }
}

/// Scale from hull, bounding-box and canvas areas.
pub fn area_scale(hull_area: f32, bounding_area: f32, full_area: f32) -> f32 {
    if hull_area <= 0.0 || bounding_area <= 0.0 || full_area <= 0.0 {
        return 1.0;
    }
    let hull_by_rect = hull_area / bounding_area;
    let required = if hull_by_rect < CIRCLE_AREA_BY_RECT {
        MAX_CIRCLE_AREA_FACTOR
    } else {
        MAX_SQUARE_AREA_FACTOR + LINEAR_SCALE_SLOPE * (1.0 - hull_by_rect)
    };
    let area = hull_area / full_area;
    if area > required {
        (required / area).sqrt()
    } else {
        1.0
    }
}

/// Measures icons and remembers results for device shapes.
#[derive(Debug)]
pub struct ShapeNormalizer {
    max_size: u32,
    surface: Option<DrawSurface>,
    shape_cache: Vec<(ShapeKind, NormalizationResult)>,
}

impl ShapeNormalizer {
    /// Measures on a working canvas twice the icon size.
    pub fn new(icon_size: u32) -> Self {
        Self {
            max_size: icon_size.max(1) * 2,
            surface: None,
            shape_cache: Vec::new(),
        }
    }

    /// Computes the scale for any source.
    ///
    /// Flat content is compared against `mask` for shape detection; adaptive
    /// icons are measured by their own clip shape, falling back to `mask`.
    /// Theme references carry no pixels and need no scaling.
    pub fn compute_scale(&mut self, source: &IconSource, mask: Option<&ClipShape>) -> NormalizationResult {
        match source {
            IconSource::Flat(layer) => match self.scale_for_layer(layer, mask) {
                Ok(result) => result,
                Err(err) => {
                    warn!("normalization skipped: {err}");
                    NormalizationResult::unit()
                }
            },
            IconSource::Adaptive(icon) => {
                let default_shape = ClipShape::default();
                let shape = icon.shape.as_ref().or(mask).unwrap_or(&default_shape);
                self.scale_for_shape(shape)
            }
            IconSource::ThemeOverride(_) => NormalizationResult::unit(),
        }
    }

    /// Scale of an adaptive icon clipped to `shape`; cached per shape.
    pub fn scale_for_shape(&mut self, shape: &ClipShape) -> NormalizationResult {
        if let Some((_, cached)) = self.shape_cache.iter().find(|(kind, _)| kind == shape.kind()) {
            return *cached;
        }

        let result = match shape.mask(self.max_size) {
            Ok(mask) => {
                let size = self.max_size;
                let mut area = 0u64;
                let mut bounds: Option<(u32, u32, u32, u32)> = None;
                for (i, &coverage) in mask.data().iter().enumerate() {
                    if coverage < 128 {
                        continue;
                    }
                    area += 1;
                    let (x, y) = (i as u32 % size, i as u32 / size);
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
                    });
                }
                let visible_bounds = bounds
                    .map(|(l, t, r, b)| {
                        RectF::from_pixel_bounds(RectPx::new(l, t, r + 1 - l, b + 1 - t), size)
                    })
                    .unwrap_or_default();
                NormalizationResult {
                    scale: area_scale(area as f32, area as f32, (size * size) as f32),
                    visible_bounds,
                    shape_detected: true,
                }
            }
            Err(err) => {
                warn!("shape mask unavailable: {err}");
                NormalizationResult {
                    shape_detected: true,
                    ..NormalizationResult::unit()
                }
            }
        };

        debug!("adaptive scale for {:?}: {:.4}", shape.kind(), result.scale);
        self.shape_cache.push((shape.kind().clone(), result));
        result
    }

    /// Scale of flat artwork, optionally checking it against `mask`.
    pub fn scale_for_layer(&mut self, layer: &IconLayer, mask: Option<&ClipShape>) -> Result<NormalizationResult> {
        let max = self.max_size;
        let (width, height) = match intrinsic_size(layer) {
            Some((w, h)) if w > 0.0 && h > 0.0 => {
                let longest = w.max(h);
                (
                    ((max as f32 * w / longest).round() as u32).max(1),
                    ((max as f32 * h / longest).round() as u32).max(1),
                )
            }
            _ => (max, max),
        };

        let surface = match &mut self.surface {
            Some(surface) => surface,
            slot => slot.insert(DrawSurface::new(max)?),
        };
        surface.clear();
        let rect = Rect::from_xywh(0.0, 0.0, width as f32, height as f32)
            .ok_or_else(|| IconError::DegenerateGeometry(format!("{width}x{height} layer")))?;
        draw_layer(surface.pixmap_mut(), layer, rect)?;
        let raster = surface.snapshot();

        Ok(measure(&raster, width, height, mask))
    }
}

/// Visible hull of the top-left `width x height` region of `raster`.
fn measure(raster: &RgbaImage, width: u32, height: u32, mask: Option<&ClipShape>) -> NormalizationResult {
    let rows = height as usize;
    let mut left = vec![-1.0f32; rows];
    let mut right = vec![-1.0f32; rows];
    let (mut top_y, mut bottom_y) = (None, 0usize);
    let (mut left_x, mut right_x) = (width, 0u32);

    for y in 0..height {
        let mut first = None;
        let mut last = 0;
        for x in 0..width {
            if raster.get_pixel(x, y)[3] > MIN_VISIBLE_ALPHA {
                first.get_or_insert(x);
                last = x;
            }
        }
        if let Some(first) = first {
            left[y as usize] = first as f32;
            right[y as usize] = last as f32;
            top_y.get_or_insert(y as usize);
            bottom_y = y as usize;
            left_x = left_x.min(first);
            right_x = right_x.max(last);
        }
    }

    let Some(top_y) = top_y else {
        debug!("no visible pixels, keeping scale 1");
        return NormalizationResult::unit();
    };

    convexify(&mut left, top_y, bottom_y, Side::Left);
    convexify(&mut right, top_y, bottom_y, Side::Right);

    let hull_area: f32 = (top_y..=bottom_y)
        .map(|y| (right[y] - left[y] + 1.0).max(0.0))
        .sum();
    let bounds = RectPx::new(left_x, top_y as u32, right_x + 1 - left_x, (bottom_y - top_y) as u32 + 1);
    let scale = area_scale(hull_area, bounds.area() as f32, width as f32 * height as f32);

    let visible_bounds = RectF::new(
        bounds.x as f32 / width as f32,
        bounds.y as f32 / height as f32,
        1.0 - bounds.right() as f32 / width as f32,
        1.0 - bounds.bottom() as f32 / height as f32,
    );
    let shape_detected = mask.is_some_and(|shape| matches_shape(raster, width, height, bounds, shape));

    debug!(
        "flat scale {scale:.4} (hull {hull_area}, bounds {}x{}, shape {shape_detected})",
        bounds.width, bounds.height
    );
    NormalizationResult {
        scale,
        visible_bounds,
        shape_detected,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Replaces a row border with its convex envelope between `top` and
/// `bottom`, interpolating rows that had no content.
fn convexify(border: &mut [f32], top: usize, bottom: usize, side: Side) {
    let mut hull: Vec<(f32, f32)> = Vec::new();
    for y in top..=bottom {
        if border[y] < 0.0 {
            continue;
        }
        let p = (y as f32, border[y]);
        while hull.len() >= 2 {
            let o = hull[hull.len() - 2];
            let a = hull[hull.len() - 1];
            let cross = (a.0 - o.0) * (p.1 - o.1) - (a.1 - o.1) * (p.0 - o.0);
            let concave = match side {
                Side::Left => cross <= 0.0,
                Side::Right => cross >= 0.0,
            };
            if !concave {
                break;
            }
            hull.pop();
        }
        hull.push(p);
    }

    for pair in hull.windows(2) {
        let ((y0, x0), (y1, x1)) = (pair[0], pair[1]);
        let slope = (x1 - x0) / (y1 - y0);
        for y in y0 as usize..=y1 as usize {
            border[y] = x0 + slope * (y as f32 - y0);
        }
    }
}

/// True when the visible content inside `bounds` has the shape of `shape`.
fn matches_shape(raster: &RgbaImage, width: u32, height: u32, bounds: RectPx, shape: &ClipShape) -> bool {
    if bounds.is_empty() {
        return false;
    }
    let ratio = bounds.width as f32 / bounds.height as f32;
    if (ratio - 1.0).abs() > BOUND_RATIO_MARGIN {
        return false;
    }
    let Some(rect) = Rect::from_xywh(
        bounds.x as f32,
        bounds.y as f32,
        bounds.width as f32,
        bounds.height as f32,
    ) else {
        return false;
    };
    let Ok(mask) = shape.mask_in(width, height, rect) else {
        return false;
    };

    let data = mask.data();
    let inside = |x: u32, y: u32| data[(y * width + x) as usize] >= 128;
    let mut diff = 0u64;
    for y in bounds.y..bounds.bottom() {
        for x in bounds.x..bounds.right() {
            let coverage = data[(y * width + x) as usize];
            if coverage != 0 && coverage != 255 {
                continue;
            }
            // Skip a one pixel band around the outline.
            let here = coverage == 255;
            let on_outline = [(x.wrapping_sub(1), y), (x + 1, y), (x, y.wrapping_sub(1)), (x, y + 1)]
                .into_iter()
                .filter(|&(nx, ny)| nx < width && ny < height)
                .any(|(nx, ny)| inside(nx, ny) != here);
            if on_outline {
                continue;
            }
            let visible = raster.get_pixel(x, y)[3] > MIN_VISIBLE_ALPHA;
            if visible != here {
                diff += 1;
            }
        }
    }
    (diff as f32 / bounds.area() as f32) < PIXEL_DIFF_PERCENTAGE_THRESHOLD
}
