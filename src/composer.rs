//! The icon rendering entry point.
//!
//! [`IconComposer`] turns an [`IconSource`] into a [`BitmapInfo`]:
//!
//! 1. theme references are resolved through the [`ResourceResolver`]
//! 2. the normalizer picks a scale, wrapping legacy flat icons into an
//!    adaptive container when they do not match the device shape
//! 3. the icon is drawn on the composer's surface with shadows
//! 4. the dominant colour is extracted
//! 5. a monochrome layer and white shadow layer are attached when themed
//!    icons are enabled
//!
//! Every public method returns `None` on failure after logging why; the
//! caller is expected to fall back to a default icon.

use std::borrow::Cow;

use chrono::NaiveTime;
use image::RgbaImage;
use log::{debug, warn};
use palette::Srgb;
use resvg::tiny_skia::Rect;
use resvg::usvg::Options;

use crate::badge::BadgeSpec;
use crate::bitmap_info::BitmapInfo;
use crate::color::dominant_color;
use crate::config::RenderConfig;
use crate::error::{IconError, Result};
use crate::extender::IconExtender;
use crate::icon::{AdaptiveIcon, IconLayer, IconSource, ThemeOverlay};
use crate::mono;
use crate::normalizer::ShapeNormalizer;
use crate::render::svg::{escape_text, hex_color, render_svg, tint};
use crate::render::{render_layer, DrawSurface, EXTRA_INSET_FRACTION};
use crate::resources::ResourceResolver;
use crate::shadow::ShadowGenerator;
use crate::shape::ClipShape;

/// Scale of legacy artwork inside the wrapper's foreground layer.
pub const LEGACY_ICON_SCALE: f32 = 0.7 / (1.0 + 2.0 * EXTRA_INSET_FRACTION);

/// Background of generated placeholder icons.
pub const PLACEHOLDER_BACKGROUND: Srgb<u8> = Srgb::new(245, 245, 245);

/// Placeholder text height relative to the visible icon.
const PLACEHOLDER_TEXT_FRACTION: f32 = 5.0 / 8.0;

/// Density assumed until [`IconComposer::with_density`] is called.
pub const DEFAULT_DENSITY: u32 = 160;

/// How a raster is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitmapMode {
    /// Artwork only.
    #[default]
    Default,
    /// Coverage only: white pixels carrying the artwork's alpha.
    Alpha,
    /// Artwork over its drop shadow.
    WithShadow,
}

/// A drawn silhouette and the luminance difference it was extracted with.
struct MonoLayer {
    image: RgbaImage,
    luminance_diff: Option<f64>,
}

/// Renders icons of one size with one configuration.
///
/// A composer owns its drawing surface and caches, so every render method
/// takes `&mut self`. Wrap it in a lock to share it between threads.
///
/// # Example
///
/// ```
/// use iconloader::{AdaptiveIcon, IconComposer, IconLayer, IconSource, RenderConfig};
///
/// let mut composer = IconComposer::new(48, RenderConfig::default()).unwrap();
/// let icon = AdaptiveIcon::new(IconLayer::color(255, 255, 255), IconLayer::color(0, 128, 0).scaled(0.5));
/// let info = composer.render_default(&IconSource::Adaptive(icon)).unwrap();
/// assert_eq!(info.icon.dimensions(), (48, 48));
/// ```
pub struct IconComposer {
    size: u32,
    config: RenderConfig,
    shape: ClipShape,
    density: u32,
    resolver: Option<Box<dyn ResourceResolver>>,
    surface: DrawSurface,
    normalizer: ShapeNormalizer,
    shadows: ShadowGenerator,
    svg_options: Options<'static>,
    fonts_loaded: bool,
    white_shadow_layer: Option<RgbaImage>,
}

impl IconComposer {
    /// Creates a composer producing `icon_bitmap_size` square icons.
    pub fn new(icon_bitmap_size: u32, config: RenderConfig) -> Result<Self> {
        let surface = DrawSurface::new(icon_bitmap_size)?;
        Ok(Self {
            size: icon_bitmap_size,
            shadows: ShadowGenerator::new(icon_bitmap_size, &config),
            normalizer: ShapeNormalizer::new(icon_bitmap_size),
            config,
            shape: ClipShape::default(),
            density: DEFAULT_DENSITY,
            resolver: None,
            surface,
            svg_options: Options::default(),
            fonts_loaded: false,
            white_shadow_layer: None,
        })
    }

    /// Sets the device icon shape.
    pub fn with_shape(mut self, shape: ClipShape) -> Self {
        self.shape = shape;
        self.white_shadow_layer = None;
        self
    }

    pub fn with_resolver(mut self, resolver: impl ResourceResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Screen density passed to the resolver.
    pub fn with_density(mut self, density: u32) -> Self {
        self.density = density;
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn shape(&self) -> &ClipShape {
        &self.shape
    }

    // ------------------------------------------------------------------------
    // Public entry points
    // ------------------------------------------------------------------------

    /// Renders a source with shadows, dominant colour and, when enabled,
    /// its monochrome layer.
    pub fn render_default(&mut self, source: &IconSource) -> Option<BitmapInfo> {
        self.create_info(source)
            .inspect_err(|err| warn!("icon dropped: {err}"))
            .ok()
    }

    /// Renders a source and attaches a badge.
    pub fn render_with_badge(&mut self, source: &IconSource, badge: &BadgeSpec) -> Option<BitmapInfo> {
        let info = self.render_default(source)?;
        let badge_info = self
            .create_badge(badge)
            .inspect_err(|err| warn!("badge {badge:?} dropped: {err}"))
            .ok()?;
        Some(info.with_flags(badge.flags()).with_badge(badge_info, badge.anchor()))
    }

    /// Renders a generated icon showing `text` on a light grey shape.
    pub fn render_placeholder(&mut self, text: &str, color: Srgb<u8>) -> Option<BitmapInfo> {
        let placeholder = self
            .placeholder_icon(text, color)
            .inspect_err(|err| warn!("placeholder for {text:?} failed: {err}"))
            .ok()?;
        self.render_default(&IconSource::Adaptive(placeholder))
    }

    /// Draws a source at its normalized scale without colour or mono work.
    pub fn create_scaled_bitmap(&mut self, source: &IconSource, mode: BitmapMode) -> Option<RgbaImage> {
        self.scaled_bitmap(source, mode, None)
            .inspect_err(|err| warn!("bitmap not drawn: {err}"))
            .ok()
    }

    /// Draws one frame of a time-varying icon. Other sources draw as usual.
    pub fn render_live_frame(&mut self, source: &IconSource, time: NaiveTime) -> Option<RgbaImage> {
        self.scaled_bitmap(source, BitmapMode::WithShadow, Some(time))
            .inspect_err(|err| warn!("live frame not drawn: {err}"))
            .ok()
    }

    /// The scale a source is drawn at, after wrapping legacy icons.
    pub fn compute_scale(&mut self, source: &IconSource) -> Option<f32> {
        let resolved = self.resolve_source(source).ok()?;
        let (_, scale) = self.normalize_and_wrap(&resolved);
        Some(scale)
    }

    /// Monochrome silhouette for a source, regardless of configuration.
    pub fn extract_monochrome(&mut self, source: &IconSource) -> Option<RgbaImage> {
        let resolved = self
            .resolve_source(source)
            .inspect_err(|err| warn!("no monochrome source: {err}"))
            .ok()?;
        let (normalized, scale) = self.normalize_and_wrap(&resolved);
        let prefer_foreground = IconExtender::for_source(source).themed_variant().is_some();
        self.create_mono(&normalized, scale, prefer_foreground)
            .inspect_err(|err| warn!("monochrome extraction failed: {err}"))
            .ok()
            .flatten()
            .map(|mono| mono.image)
    }

    /// White device shape with shadow, drawn under themed icons.
    pub fn white_shadow_layer(&mut self) -> Option<RgbaImage> {
        self.cached_white_shadow_layer()
            .inspect_err(|err| warn!("white shadow layer failed: {err}"))
            .ok()
    }

    /// Regenerates the monochrome layer of an icon read back from the cache.
    ///
    /// Icons without theme data are returned unchanged.
    pub fn restore_themed(&mut self, info: &BitmapInfo) -> Option<BitmapInfo> {
        let Some(theme) = &info.theme else {
            return Some(info.clone());
        };
        let restored = self
            .themed_mono(&theme.overlay, theme.scale)
            .and_then(|mono| self.attach_mono(info.clone(), mono));
        restored
            .inspect_err(|err| warn!("themed icon {} not restored: {err}", theme.overlay.resource_name))
            .ok()
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    fn create_info(&mut self, source: &IconSource) -> Result<BitmapInfo> {
        let extender = IconExtender::for_source(source);
        let resolved = match extender.themed_variant() {
            Some(overlay) => Cow::Owned(self.resolve_overlay(overlay)?),
            None => Cow::Borrowed(source),
        };
        ensure_drawable(&resolved)?;
        let (normalized, scale) = self.normalize_and_wrap(&resolved);
        let frame = IconExtender::for_source(&normalized).draw_stable();
        let icon = self.draw(&normalized, scale, BitmapMode::WithShadow, frame)?;
        let color = dominant_color(&icon, self.config.disable_color_extraction);
        let info = extender.compose_extended(BitmapInfo::of(icon, color), scale);

        // Themed resources always carry mono.
        let themed = extender.themed_variant().is_some();
        if !themed && !self.config.mono_icons_enabled {
            return Ok(info);
        }
        match self.create_mono(&normalized, scale, themed)? {
            Some(mono) => self.attach_mono(info, mono),
            None => Ok(info),
        }
    }

    fn attach_mono(&mut self, info: BitmapInfo, mono: MonoLayer) -> Result<BitmapInfo> {
        let layer = self.cached_white_shadow_layer()?;
        let info = info.with_mono(mono.image, Some(layer));
        Ok(match mono.luminance_diff {
            Some(diff) => info.with_luminance_diff(diff),
            None => info,
        })
    }

    fn themed_mono(&mut self, overlay: &ThemeOverlay, scale: f32) -> Result<MonoLayer> {
        let resolved = self.resolve_overlay(overlay)?;
        let (normalized, _) = self.normalize_and_wrap(&resolved);
        self.create_mono(&normalized, scale, true)?
            .ok_or_else(|| IconError::ResourceUnavailable(format!("{} has no layers", overlay.resource_name)))
    }

    fn scaled_bitmap(&mut self, source: &IconSource, mode: BitmapMode, live: Option<NaiveTime>) -> Result<RgbaImage> {
        let resolved = self.resolve_source(source)?;
        ensure_drawable(&resolved)?;
        let (normalized, scale) = self.normalize_and_wrap(&resolved);
        let extender = IconExtender::for_source(&normalized);
        let frame = match live {
            Some(time) => extender.draw_live(time),
            None => extender.draw_stable(),
        };
        self.draw(&normalized, scale, mode, frame)
    }

    /// Computes the draw scale, wrapping flat artwork that does not already
    /// have the device shape.
    fn normalize_and_wrap<'s>(&mut self, source: &'s IconSource) -> (Cow<'s, IconSource>, f32) {
        let result = self.normalizer.compute_scale(source, Some(&self.shape));
        let IconSource::Flat(layer) = source else {
            return (Cow::Borrowed(source), result.scale);
        };
        if !self.config.shrink_non_adaptive_icons || result.shape_detected {
            return (Cow::Borrowed(source), result.scale);
        }

        let wrapper = AdaptiveIcon {
            background: Some(IconLayer::Color(self.config.wrapper_background())),
            foreground: Some(layer.clone().scaled(result.scale * LEGACY_ICON_SCALE)),
            ..AdaptiveIcon::default()
        };
        let wrapped = IconSource::Adaptive(wrapper);
        let scale = self.normalizer.compute_scale(&wrapped, Some(&self.shape)).scale;
        debug!("wrapped legacy icon (flat scale {:.4}, wrapper scale {scale:.4})", result.scale);
        (Cow::Owned(wrapped), scale)
    }

    /// Draws a resolved source on the surface and returns a copy.
    fn draw(&mut self, source: &IconSource, scale: f32, mode: BitmapMode, time: Option<NaiveTime>) -> Result<RgbaImage> {
        self.surface.clear();
        match source {
            IconSource::Adaptive(icon) => {
                let bounds = self.adaptive_bounds(scale)?;
                let shape = icon.shape.as_ref().unwrap_or(&self.shape);
                if mode == BitmapMode::WithShadow {
                    self.shadows.add_path_shadow(shape, bounds, self.surface.pixmap_mut())?;
                }
                self.surface.draw_adaptive(icon, shape, bounds, time)?;
            }
            IconSource::Flat(layer) => {
                self.surface.draw_flat(layer, scale)?;
                if mode == BitmapMode::WithShadow {
                    self.shadows.recreate_icon(&mut self.surface)?;
                }
            }
            IconSource::ThemeOverride(overlay) => {
                return Err(IconError::ResourceUnavailable(format!(
                    "unresolved theme reference {}",
                    overlay.resource_name
                )));
            }
        }

        let image = self.surface.snapshot();
        Ok(match mode {
            BitmapMode::Alpha => tint(&image, [255, 255, 255]),
            _ => image,
        })
    }

    /// Visible bounds of an adaptive icon drawn at `scale`, inset at least
    /// far enough for the shadow blur.
    fn adaptive_bounds(&self, scale: f32) -> Result<Rect> {
        let size = self.size as f32;
        let offset = self
            .shadows
            .blur_px()
            .ceil()
            .max((size * (1.0 - scale) / 2.0).round())
            .min((size - 1.0) / 2.0);
        Rect::from_xywh(offset, offset, size - 2.0 * offset, size - 2.0 * offset)
            .ok_or_else(|| IconError::DegenerateGeometry(format!("{}px icon with {offset}px inset", self.size)))
    }

    /// Builds the monochrome raster of a normalized source.
    ///
    /// With `prefer_foreground` the background layer is ignored, as for
    /// themed resources whose foreground is the glyph.
    fn create_mono(&mut self, source: &IconSource, scale: f32, prefer_foreground: bool) -> Result<Option<MonoLayer>> {
        let size = self.size;
        let (mask, luminance_diff, shape) = match source {
            IconSource::Adaptive(icon) => {
                let (mask, diff) = if let Some(layer) = &icon.monochrome {
                    (mono::mask_from_layer(&render_layer(layer, size)?), None)
                } else {
                    let background = match (&icon.background, prefer_foreground) {
                        (Some(layer), false) => Some(render_layer(layer, size)?),
                        _ => None,
                    };
                    let foreground = icon.foreground.as_ref().map(|l| render_layer(l, size)).transpose()?;
                    let Some(result) = mono::extract(background.as_ref(), foreground.as_ref()) else {
                        return Ok(None);
                    };
                    debug!("monochrome luminance difference {:.3}", result.luminance_diff);
                    (result.mask, Some(result.luminance_diff))
                };
                (mask, diff, icon.shape.clone())
            }
            IconSource::Flat(layer) => {
                let raster = render_layer(&layer.clone().scaled(1.0), size)?;
                let Some(result) = mono::extract(None, Some(&raster)) else {
                    return Ok(None);
                };
                let flat = IconSource::Flat(IconLayer::Bitmap(mono::mask_to_image(&result.mask)));
                let image = self.draw(&flat, scale, BitmapMode::Alpha, None)?;
                return Ok(Some(MonoLayer {
                    image,
                    luminance_diff: Some(result.luminance_diff),
                }));
            }
            IconSource::ThemeOverride(_) => return Ok(None),
        };

        let silhouette = AdaptiveIcon {
            foreground: Some(IconLayer::Bitmap(mono::mask_to_image(&mask))),
            shape,
            ..AdaptiveIcon::default()
        };
        let image = self.draw(&IconSource::Adaptive(silhouette), scale, BitmapMode::Alpha, None)?;
        Ok(Some(MonoLayer { image, luminance_diff }))
    }

    fn cached_white_shadow_layer(&mut self) -> Result<RgbaImage> {
        if let Some(layer) = &self.white_shadow_layer {
            return Ok(layer.clone());
        }
        let white = IconSource::Adaptive(AdaptiveIcon {
            background: Some(IconLayer::color(255, 255, 255)),
            ..AdaptiveIcon::default()
        });
        let scale = self.normalizer.scale_for_shape(&self.shape).scale;
        let layer = self.draw(&white, scale, BitmapMode::WithShadow, None)?;
        self.white_shadow_layer = Some(layer.clone());
        Ok(layer)
    }

    fn create_badge(&mut self, badge: &BadgeSpec) -> Result<BitmapInfo> {
        let size = BadgeSpec::badge_size(self.size);
        if badge.needs_fonts() {
            self.load_fonts();
        }
        let image = render_svg(&badge.svg(), size, &self.svg_options)?;
        let color = dominant_color(&image, self.config.disable_color_extraction);
        Ok(BitmapInfo::of(image, color).with_flags(badge.flags()))
    }

    fn placeholder_icon(&mut self, text: &str, color: Srgb<u8>) -> Result<AdaptiveIcon> {
        self.load_fonts();
        // Layers span 150% of the visible icon.
        let font_size = 100.0 * PLACEHOLDER_TEXT_FRACTION / (1.0 + 2.0 * EXTRA_INSET_FRACTION);
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><text x="50" y="50" dy="0.35em" text-anchor="middle" font-family="sans-serif" font-size="{font_size:.2}" fill="{}">{}</text></svg>"#,
            hex_color(color.red, color.green, color.blue),
            escape_text(text)
        );
        let glyph = render_svg(&svg, self.size, &self.svg_options)?;
        Ok(AdaptiveIcon::new(IconLayer::Color(PLACEHOLDER_BACKGROUND), IconLayer::Bitmap(glyph)))
    }

    fn load_fonts(&mut self) {
        if self.fonts_loaded {
            return;
        }
        self.svg_options.fontdb_mut().load_system_fonts();
        self.fonts_loaded = true;
        debug!("loaded {} font faces", self.svg_options.fontdb.len());
    }

    // ------------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------------

    fn resolve_source<'s>(&self, source: &'s IconSource) -> Result<Cow<'s, IconSource>> {
        match source {
            IconSource::ThemeOverride(overlay) => Ok(Cow::Owned(self.resolve_overlay(overlay)?)),
            other => Ok(Cow::Borrowed(other)),
        }
    }

    fn resolve_overlay(&self, overlay: &ThemeOverlay) -> Result<IconSource> {
        let Some(resolver) = &self.resolver else {
            return Err(IconError::ResourceUnavailable(format!(
                "no resolver for {}",
                overlay.resource_name
            )));
        };
        let package = overlay.package_name.as_str();
        let resolved = overlay
            .resource_id
            .and_then(|id| resolver.resolve(package, id, self.density))
            .or_else(|| resolver.resolve_named(package, &overlay.resource_name, self.density));

        match resolved {
            Some(IconSource::ThemeOverride(_)) => Err(IconError::ResourceUnavailable(format!(
                "{} resolves to another theme reference",
                overlay.resource_name
            ))),
            Some(source) => Ok(source),
            None => Err(IconError::ResourceUnavailable(format!(
                "{} not found in {package}",
                overlay.resource_name
            ))),
        }
    }
}

/// Rejects sources with nothing to draw.
fn ensure_drawable(source: &IconSource) -> Result<()> {
    match source {
        IconSource::Adaptive(icon) if icon.background.is_none() && icon.foreground.is_none() => {
            Err(IconError::DegenerateGeometry("adaptive icon without layers".into()))
        }
        IconSource::Flat(IconLayer::Bitmap(img)) if img.width() == 0 || img.height() == 0 => {
            Err(IconError::DegenerateGeometry("empty bitmap".into()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap_info::{BadgeAnchor, BitmapFlags};
    use crate::extender::ClockFace;
    use crate::resources::StaticResolver;
    use image::Rgba;

    fn red_square() -> IconSource {
        IconSource::Flat(IconLayer::Bitmap(RgbaImage::from_pixel(128, 128, Rgba([255, 0, 0, 255]))))
    }

    fn adaptive() -> IconSource {
        IconSource::Adaptive(AdaptiveIcon::new(
            IconLayer::color(255, 255, 255),
            IconLayer::color(0, 0, 200).scaled(0.4),
        ))
    }

    fn composer(config: RenderConfig) -> IconComposer {
        IconComposer::new(64, config).unwrap()
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(IconComposer::new(0, RenderConfig::default()).is_err());
    }

    #[test]
    fn legacy_icon_is_wrapped() {
        let mut composer = composer(RenderConfig::default());
        let scale = composer.compute_scale(&red_square()).unwrap();
        let adaptive_scale = composer.normalizer.scale_for_shape(&ClipShape::circle()).scale;
        assert_eq!(scale, adaptive_scale);

        let info = composer.render_default(&red_square()).unwrap();
        // Wrapper background shows between the artwork and the circle edge.
        assert_eq!(info.icon.get_pixel(32, 12).0, [255, 255, 255, 255]);
        assert_eq!(info.icon.get_pixel(32, 32).0, [255, 0, 0, 255]);
        assert_eq!(info.color, Srgb::new(255, 0, 0));
    }

    #[test]
    fn legacy_icon_without_shrink_stays_flat() {
        let mut composer = composer(RenderConfig::default().with_shrink_non_adaptive_icons(false));
        let scale = composer.compute_scale(&red_square()).unwrap();
        assert!((scale - (375.0f32 / 576.0).sqrt()).abs() < 0.01, "scale {scale}");
        let info = composer.render_default(&red_square()).unwrap();
        assert_eq!(info.icon.get_pixel(10, 10).0, [255, 0, 0, 255], "square corners kept");
    }

    #[test]
    fn wrapper_colour_is_configurable() {
        let config = RenderConfig::default().with_wrapper_background([0, 0, 0, 255]);
        let info = composer(config).render_default(&red_square()).unwrap();
        assert_eq!(info.icon.get_pixel(32, 12).0, [0, 0, 0, 255]);
    }

    #[test]
    fn empty_sources_give_nothing() {
        let mut composer = composer(RenderConfig::default());
        assert!(composer.render_default(&IconSource::Adaptive(AdaptiveIcon::default())).is_none());
        assert!(composer.render_default(&IconSource::from(RgbaImage::new(0, 0))).is_none());
    }

    #[test]
    fn shadows_off_matches_plain_render() {
        let plain = composer(RenderConfig::default())
            .create_scaled_bitmap(&adaptive(), BitmapMode::Default)
            .unwrap();
        let unshadowed = composer(RenderConfig::default().with_shadows(false))
            .render_default(&adaptive())
            .unwrap();
        assert_eq!(unshadowed.icon, plain);

        let shadowed = composer(RenderConfig::default()).render_default(&adaptive()).unwrap();
        assert_ne!(shadowed.icon, plain);
    }

    #[test]
    fn alpha_mode_is_white() {
        let img = composer(RenderConfig::default())
            .create_scaled_bitmap(&adaptive(), BitmapMode::Alpha)
            .unwrap();
        assert_eq!(img.get_pixel(32, 32).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn mono_layer_attached_when_enabled() {
        let mut composer = composer(RenderConfig::default().with_mono_icons(true));
        let info = composer.render_default(&adaptive()).unwrap();
        let mono = info.mono.as_ref().unwrap();
        assert_eq!(mono.dimensions(), (64, 64));
        assert!(mono.get_pixel(32, 32)[3] > 200, "foreground glyph");
        assert!(mono.get_pixel(32, 10)[3] < 40, "background only");
        assert!(info.white_shadow_layer.is_some());

        assert!(
            self::composer(RenderConfig::default())
                .render_default(&adaptive())
                .unwrap()
                .mono
                .is_none()
        );
    }

    #[test]
    fn own_monochrome_layer_wins() {
        let icon = AdaptiveIcon::new(IconLayer::color(255, 255, 255), IconLayer::color(0, 0, 0))
            .with_monochrome(IconLayer::color(0, 0, 0).scaled(0.2));
        let mono = composer(RenderConfig::default())
            .extract_monochrome(&IconSource::Adaptive(icon))
            .unwrap();
        assert_eq!(mono.get_pixel(32, 32).0, [255, 255, 255, 255]);
        assert_eq!(mono.get_pixel(32, 16)[3], 0);
    }

    #[test]
    fn white_shadow_layer_is_cached() {
        let mut composer = composer(RenderConfig::default());
        let first = composer.white_shadow_layer().unwrap();
        assert_eq!(first.get_pixel(32, 32).0, [255, 255, 255, 255]);
        assert!(composer.white_shadow_layer.is_some());
        assert_eq!(composer.white_shadow_layer().unwrap(), first);
    }

    #[test]
    fn badge_is_attached() {
        let mut composer = composer(RenderConfig::default());
        let info = composer.render_with_badge(&adaptive(), &BadgeSpec::Work).unwrap();
        assert!(info.flags.contains(BitmapFlags::WORK));
        let badge = info.badge.unwrap();
        assert_eq!(badge.icon.dimensions(), (28, 28));
        assert_eq!(info.badge_anchor, BadgeAnchor::BottomRight);

        let dot = composer
            .render_with_badge(&adaptive(), &BadgeSpec::NotificationCount(0))
            .unwrap();
        assert_eq!(dot.badge_anchor, BadgeAnchor::ShapeAttachment);
        assert!(dot.flags.is_empty());
    }

    #[test]
    fn placeholder_has_grey_background() {
        let info = composer(RenderConfig::default())
            .render_placeholder("A", Srgb::new(0, 0, 0))
            .unwrap();
        assert_eq!(info.icon.dimensions(), (64, 64));
        assert_eq!(info.icon.get_pixel(32, 12).0, [245, 245, 245, 255]);
    }

    #[test]
    fn theme_override_uses_resolver() {
        let themed = AdaptiveIcon::new(IconLayer::color(30, 30, 30), IconLayer::color(255, 255, 255).scaled(0.3));
        let resolver = StaticResolver::new().with_name("com.example", "com.example:drawable/themed", themed.into());
        let mut composer = composer(RenderConfig::default()).with_resolver(resolver);
        let overlay = ThemeOverlay::new("com.example", "com.example:drawable/themed");

        let info = composer
            .render_default(&IconSource::ThemeOverride(overlay.clone()))
            .unwrap();
        let theme = info.theme.as_ref().unwrap();
        assert_eq!(theme.overlay, overlay);
        assert!(info.mono.is_some(), "themed resources always carry mono");

        let restored = BitmapInfo::from_bytes(&info.to_bytes().unwrap(), info.color).unwrap();
        assert!(restored.mono.is_none());
        let restored = composer.restore_themed(&restored).unwrap();
        assert_eq!(restored.mono, info.mono);
    }

    #[test]
    fn missing_theme_resource_gives_nothing() {
        let mut composer = composer(RenderConfig::default()).with_resolver(StaticResolver::new());
        let source = IconSource::ThemeOverride(ThemeOverlay::new("p", "p:drawable/gone"));
        assert!(composer.render_default(&source).is_none());

        let mut unresolved = self::composer(RenderConfig::default());
        assert!(unresolved.render_default(&source).is_none());
    }

    #[test]
    fn clock_frames_follow_time() {
        let hand = IconLayer::svg(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><rect x="47" y="20" width="6" height="30" fill="#000000"/></svg>"##,
        );
        let clock = ClockFace::new(hand.clone(), hand);
        let icon = AdaptiveIcon::new(IconLayer::color(255, 255, 255), IconLayer::color(255, 255, 255)).with_clock(clock);
        let source = IconSource::Adaptive(icon);
        let mut composer = composer(RenderConfig::default().with_shadows(false));

        let noon = composer
            .render_live_frame(&source, NaiveTime::from_hms_opt(0, 0, 0).unwrap())
            .unwrap();
        let quarter_past = composer
            .render_live_frame(&source, NaiveTime::from_hms_opt(3, 15, 0).unwrap())
            .unwrap();
        assert_ne!(noon, quarter_past);
        assert_eq!(noon.get_pixel(32, 22).0, [0, 0, 0, 255]);
        assert_eq!(quarter_past.get_pixel(32, 22).0, [255, 255, 255, 255]);

        let stable = composer.render_default(&source).unwrap();
        assert_eq!(stable.icon, composer.render_default(&source).unwrap().icon);
    }

    #[test]
    fn persisted_clock_shows_stable_time() {
        let hand = IconLayer::svg(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><rect x="47" y="15" width="6" height="35" fill="#000000"/></svg>"##,
        );
        let clock = ClockFace::new(hand.clone(), hand);
        let stable_time = clock.stable_time;
        let icon = AdaptiveIcon::new(IconLayer::color(255, 255, 255), IconLayer::color(255, 255, 255)).with_clock(clock);
        let source = IconSource::Adaptive(icon);
        let mut composer = composer(RenderConfig::default());

        let info = composer.render_default(&source).unwrap();
        let restored = BitmapInfo::from_bytes(&info.to_bytes().unwrap(), info.color).unwrap();

        let at_stable = composer.render_live_frame(&source, stable_time).unwrap();
        assert_eq!(restored.icon, at_stable);
        let later = composer
            .render_live_frame(&source, NaiveTime::from_hms_opt(6, 40, 0).unwrap())
            .unwrap();
        assert_ne!(restored.icon, later);

        let still = composer
            .create_scaled_bitmap(&source, BitmapMode::WithShadow)
            .unwrap();
        assert_eq!(still, at_stable, "non-live draws use the stable frame");
    }

    #[test]
    fn static_sources_ignore_live_time() {
        let mut composer = composer(RenderConfig::default());
        let live = composer
            .render_live_frame(&adaptive(), NaiveTime::from_hms_opt(6, 40, 0).unwrap())
            .unwrap();
        assert_eq!(live, composer.render_default(&adaptive()).unwrap().icon);
    }

    #[test]
    fn mono_keeps_luminance_difference() {
        // Greys with relative luminance 0.9 and 0.2.
        let icon = AdaptiveIcon::new(IconLayer::color(243, 243, 243), IconLayer::color(124, 124, 124).scaled(0.4));
        let mut composer = composer(RenderConfig::default().with_mono_icons(true));
        let info = composer.render_default(&IconSource::Adaptive(icon)).unwrap();
        let diff = info.mono_luminance_diff.unwrap();
        assert!((diff + 0.7).abs() < 0.02, "diff {diff}");

        let own = AdaptiveIcon::new(IconLayer::color(255, 255, 255), IconLayer::color(0, 0, 0))
            .with_monochrome(IconLayer::color(0, 0, 0).scaled(0.2));
        let info = composer.render_default(&IconSource::Adaptive(own)).unwrap();
        assert!(info.is_themable());
        assert_eq!(info.mono_luminance_diff, None);
    }
}
