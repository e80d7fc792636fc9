//! SVG rasterization and pixel format conversion.
//!
//! resvg/tiny-skia work in premultiplied RGBA while the public types use
//! straight-alpha [`RgbaImage`]; the conversions live here together with
//! the image-over-image compositing used when assembling badges.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{ColorU8, Pixmap, PixmapPaint, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{IconError, Result};

// ============================================================================
// SVG Rendering
// ============================================================================

/// Parses SVG markup with the given options.
pub fn parse_svg(svg_data: &str, opts: &Options) -> Result<Tree> {
    Ok(Tree::from_str(svg_data, opts)?)
}

/// Transform that fits `tree` inside the `x, y, width, height` box, preserving
/// aspect ratio and centring the leftover space.
pub fn fit_transform(tree: &Tree, x: f32, y: f32, width: f32, height: f32) -> Transform {
    let svg_size = tree.size();
    let scale = (width / svg_size.width()).min(height / svg_size.height());
    let dx = x + (width - svg_size.width() * scale) / 2.0;
    let dy = y + (height - svg_size.height() * scale) / 2.0;
    Transform::from_row(scale, 0.0, 0.0, scale, dx, dy)
}

/// Renders an SVG string into a `size x size` image.
///
/// The SVG is scaled to fit while preserving aspect ratio and centred;
/// uncovered pixels stay transparent.
pub fn render_svg(svg_data: &str, size: u32, opts: &Options) -> Result<RgbaImage> {
    let tree = parse_svg(svg_data, opts)?;
    let mut pixmap = Pixmap::new(size, size)
        .ok_or_else(|| IconError::DegenerateGeometry(format!("{size}x{size} svg target")))?;
    let transform = fit_transform(&tree, 0.0, 0.0, size as f32, size as f32);
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Escapes text for use inside SVG markup.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Formats an RGB triple as an SVG hex colour.
pub fn hex_color(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

// ============================================================================
// Pixel Conversion
// ============================================================================

/// Straight-alpha copy of a premultiplied pixmap.
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

/// Converts a straight-alpha image into a premultiplied pixmap.
pub fn rgba_image_to_pixmap(img: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height()).ok_or_else(|| {
        IconError::DegenerateGeometry(format!("{}x{} bitmap", img.width(), img.height()))
    })?;
    for (dst, Rgba([r, g, b, a])) in pixmap.pixels_mut().iter_mut().zip(img.pixels().copied()) {
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

// ============================================================================
// Compositing
// ============================================================================

/// Draws `src` over `dest` with its top-left corner at `x, y`.
///
/// Pixels falling outside `dest` are dropped.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) -> Result<()> {
    let mut canvas = rgba_image_to_pixmap(dest)?;
    let layer = rgba_image_to_pixmap(src)?;
    canvas.draw_pixmap(x, y, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
    *dest = pixmap_to_rgba_image(&canvas);
    Ok(())
}

/// Recolours every pixel to `rgb`, keeping its alpha.
pub fn tint(img: &RgbaImage, rgb: [u8; 3]) -> RgbaImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = [rgb[0], rgb[1], rgb[2], pixel[3]];
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
