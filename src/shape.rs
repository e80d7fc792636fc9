//! Device icon mask shapes.
//!
//! A [`ClipShape`] is a closed path on a `PATH_SIZE` square. It masks
//! adaptive icons, drives path shadows and normalization of adaptive
//! icons, and locates where badges attach to the outline.

use resvg::tiny_skia::{FillRule, Mask, Path, PathBuilder, Rect, Transform};
use resvg::usvg::{Group, Node, Options};

use crate::error::{IconError, Result};
use crate::render::svg::{escape_text, parse_svg};

/// Side of the square every shape path is defined on.
pub const PATH_SIZE: f32 = 100.0;

/// Resolution used when measuring shapes on a raster.
const MEASURE_SIZE: u32 = 256;

/// Cubic bezier constant for quarter circles.
const KAPPA: f32 = 0.552_284_8;

/// Identifies a shape; two shapes are equal when their kinds are.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Circle,
    Square,
    /// Corner radius as a fraction of the side (0.0-0.5).
    RoundedSquare { radius: f32 },
    Squircle,
    /// SVG path data on a 100x100 viewport.
    Custom(String),
}

/// Normalized points where the outline meets the top-left and top-right
/// corner wedges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentPoints {
    pub left: (f32, f32),
    pub right: (f32, f32),
}

/// A closed clip path defined on `[0, PATH_SIZE]`.
#[derive(Debug, Clone)]
pub struct ClipShape {
    kind: ShapeKind,
    path: Path,
}

impl PartialEq for ClipShape {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Default for ClipShape {
    fn default() -> Self {
        Self::circle()
    }
}

impl ClipShape {
    pub fn circle() -> Self {
        let path = PathBuilder::from_circle(PATH_SIZE / 2.0, PATH_SIZE / 2.0, PATH_SIZE / 2.0);
        Self::built_in(ShapeKind::Circle, path)
    }

    pub fn square() -> Self {
        let path = Rect::from_xywh(0.0, 0.0, PATH_SIZE, PATH_SIZE).map(PathBuilder::from_rect);
        Self::built_in(ShapeKind::Square, path)
    }

    /// A square with rounded corners; `radius` is clamped to 0.0-0.5.
    pub fn rounded_square(radius: f32) -> Self {
        let radius = radius.clamp(0.0, 0.5);
        let r = radius * PATH_SIZE;
        let k = r * KAPPA;
        let s = PATH_SIZE;

        let mut pb = PathBuilder::new();
        pb.move_to(r, 0.0);
        pb.line_to(s - r, 0.0);
        pb.cubic_to(s - r + k, 0.0, s, r - k, s, r);
        pb.line_to(s, s - r);
        pb.cubic_to(s, s - r + k, s - r + k, s, s - r, s);
        pb.line_to(r, s);
        pb.cubic_to(r - k, s, 0.0, s - r + k, 0.0, s - r);
        pb.line_to(0.0, r);
        pb.cubic_to(0.0, r - k, r - k, 0.0, r, 0.0);
        pb.close();
        Self::built_in(ShapeKind::RoundedSquare { radius }, pb.finish())
    }

    pub fn squircle() -> Self {
        let mut pb = PathBuilder::new();
        pb.move_to(50.0, 0.0);
        pb.cubic_to(10.0, 0.0, 0.0, 10.0, 0.0, 50.0);
        pb.cubic_to(0.0, 90.0, 10.0, 100.0, 50.0, 100.0);
        pb.cubic_to(90.0, 100.0, 100.0, 90.0, 100.0, 50.0);
        pb.cubic_to(100.0, 10.0, 90.0, 0.0, 50.0, 0.0);
        pb.close();
        Self::built_in(ShapeKind::Squircle, pb.finish())
    }

    /// Parses SVG path data drawn on a 100x100 viewport.
    pub fn from_svg_path(data: &str) -> Result<Self> {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><path d="{}"/></svg>"#,
            escape_text(data)
        );
        let tree = parse_svg(&svg, &Options::default())?;
        let path = first_path(tree.root())
            .ok_or_else(|| IconError::DegenerateGeometry(format!("no closed path in {data:?}")))?;
        Ok(Self {
            kind: ShapeKind::Custom(data.to_string()),
            path,
        })
    }

    // Built-in geometry is constant, so a failure here is a programming error.
    fn built_in(kind: ShapeKind, path: Option<Path>) -> Self {
        let path = path.expect("built-in shape geometry is valid");
        Self { kind, path }
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// The raw path on the `PATH_SIZE` square.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Transform mapping the path square onto `bounds`.
    fn transform_for(bounds: Rect) -> Transform {
        Transform::from_row(
            bounds.width() / PATH_SIZE,
            0.0,
            0.0,
            bounds.height() / PATH_SIZE,
            bounds.x(),
            bounds.y(),
        )
    }

    /// Anti-aliased coverage mask of the shape filling a `size` square.
    pub fn mask(&self, size: u32) -> Result<Mask> {
        let bounds = Rect::from_xywh(0.0, 0.0, size as f32, size as f32)
            .ok_or_else(|| IconError::DegenerateGeometry(format!("{size}px shape mask")))?;
        self.mask_in(size, size, bounds)
    }

    /// Coverage mask of a `width x height` canvas with the shape placed at `bounds`.
    pub fn mask_in(&self, width: u32, height: u32, bounds: Rect) -> Result<Mask> {
        let mut mask = Mask::new(width, height)
            .ok_or_else(|| IconError::DegenerateGeometry(format!("{width}x{height} mask")))?;
        mask.fill_path(&self.path, FillRule::Winding, true, Self::transform_for(bounds));
        Ok(mask)
    }

    /// Fraction of the square covered by the shape.
    pub fn area_fraction(&self) -> f32 {
        let Ok(mask) = self.mask(MEASURE_SIZE) else {
            return 0.0;
        };
        let covered: u64 = mask.data().iter().map(|&a| a as u64).sum();
        covered as f32 / 255.0 / (MEASURE_SIZE * MEASURE_SIZE) as f32
    }

    /// Returns true when the normalized point lies inside the shape.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return false;
        }
        let Ok(mask) = self.mask(MEASURE_SIZE) else {
            return false;
        };
        let px = ((x * MEASURE_SIZE as f32) as u32).min(MEASURE_SIZE - 1);
        let py = ((y * MEASURE_SIZE as f32) as u32).min(MEASURE_SIZE - 1);
        mask.data()[(py * MEASURE_SIZE + px) as usize] >= 128
    }

    /// Where the outline crosses thin wedges running from the centre to the
    /// top-left and top-right corners.
    pub fn attachment_points(&self) -> AttachmentPoints {
        AttachmentPoints {
            left: self.wedge_point(-1.0),
            right: self.wedge_point(1.0),
        }
    }

    fn wedge_point(&self, direction: f32) -> (f32, f32) {
        let res = MEASURE_SIZE;
        let scale = res as f32 / PATH_SIZE;
        let half = PATH_SIZE / 2.0;
        // Small delta so the triangle never collapses to a line.
        let delta = 1.0;
        let x = half + direction * half;

        let mut pb = PathBuilder::new();
        pb.move_to(half, half);
        pb.line_to(x + delta * direction, 0.0);
        pb.line_to(x, -delta);
        pb.close();

        let (Some(wedge), Some(mut wedge_mask), Ok(shape_mask)) =
            (pb.finish(), Mask::new(res, res), self.mask(res))
        else {
            return (0.5, 0.5);
        };
        wedge_mask.fill_path(&wedge, FillRule::Winding, false, Transform::from_scale(scale, scale));

        let center = res as f32 / 2.0;
        let mut best: Option<(f32, u32, u32)> = None;
        for (i, (&w, &s)) in wedge_mask.data().iter().zip(shape_mask.data()).enumerate() {
            if w == 0 || s < 128 {
                continue;
            }
            let px = i as u32 % res;
            let py = i as u32 / res;
            let dx = px as f32 + 0.5 - center;
            let dy = py as f32 + 0.5 - center;
            let dist = dx * dx + dy * dy;
            if best.is_none_or(|(d, _, _)| dist > d) {
                best = Some((dist, px, py));
            }
        }

        match best {
            Some((_, px, py)) => ((px as f32 + 0.5) / res as f32, (py as f32 + 0.5) / res as f32),
            None => (0.5, 0.5),
        }
    }
}

fn first_path(group: &Group) -> Option<Path> {
    for node in group.children() {
        match node {
            Node::Path(path) => return path.data().clone().transform(path.abs_transform()),
            Node::Group(group) => {
                if let Some(path) = first_path(group) {
                    return Some(path);
                }
            }
            _ => {}
        }
    }
    None
}
