//! End-to-end behaviour of the icon pipeline.

use iconloader::mono;
use iconloader::{
    AdaptiveIcon, BitmapInfo, BitmapMode, ClipShape, IconComposer, IconLayer, IconSource,
    RenderConfig, StaticResolver, ThemeOverlay,
};
use image::{Rgba, RgbaImage};
use palette::Srgb;
use proptest::prelude::*;

fn red_square() -> IconSource {
    IconSource::from(RgbaImage::from_pixel(512, 512, Rgba([255, 0, 0, 255])))
}

fn two_layer() -> IconSource {
    IconSource::Adaptive(AdaptiveIcon::new(
        IconLayer::color(250, 250, 250),
        IconLayer::color(20, 120, 20).scaled(0.45),
    ))
}

#[test]
fn red_square_at_192() {
    let mut composer = IconComposer::new(192, RenderConfig::default()).unwrap();
    let info = composer.render_default(&red_square()).unwrap();

    assert_eq!(info.icon.dimensions(), (192, 192));
    assert_eq!(info.color, Srgb::new(255, 0, 0));

    let scale = composer.compute_scale(&red_square()).unwrap();
    assert!(scale > 0.89 && scale < 0.93, "scale {scale}");
}

#[test]
fn other_shapes_change_the_outline() {
    let mut circle = IconComposer::new(96, RenderConfig::default()).unwrap();
    let mut square = IconComposer::new(96, RenderConfig::default())
        .unwrap()
        .with_shape(ClipShape::square());

    let round = circle.render_default(&two_layer()).unwrap();
    let boxy = square.render_default(&two_layer()).unwrap();
    // Near the corner of the visible bounds only the square is opaque.
    assert!(round.icon.get_pixel(12, 12)[3] < 64);
    assert_eq!(boxy.icon.get_pixel(12, 12)[3], 255);
}

#[test]
fn unknown_tag_is_rejected() {
    let mut composer = IconComposer::new(48, RenderConfig::default()).unwrap();
    let mut bytes = composer.render_default(&two_layer()).unwrap().to_bytes().unwrap();
    bytes[0] = 0x09;
    assert!(BitmapInfo::from_bytes(&bytes, Srgb::new(0, 0, 0)).is_none());
}

#[test]
fn round_trip_is_pixel_identical() {
    let mut composer = IconComposer::new(64, RenderConfig::default()).unwrap();
    for source in [red_square(), two_layer()] {
        let info = composer.render_default(&source).unwrap();
        let bytes = info.to_bytes().unwrap();
        let restored = BitmapInfo::from_bytes(&bytes, info.color).unwrap();
        assert_eq!(restored.icon, info.icon);
        assert_eq!(restored.color, info.color);
    }
}

#[test]
fn themed_round_trip_keeps_metadata() {
    let themed = AdaptiveIcon::new(IconLayer::color(0, 0, 0), IconLayer::color(255, 255, 255).scaled(0.3));
    let resolver = StaticResolver::new().with_name("org.example", "org.example:drawable/themed", themed.into());
    let mut composer = IconComposer::new(64, RenderConfig::default())
        .unwrap()
        .with_resolver(resolver);
    let overlay = ThemeOverlay::new("org.example", "org.example:drawable/themed");

    let info = composer
        .render_default(&IconSource::ThemeOverride(overlay.clone()))
        .unwrap();
    let restored = BitmapInfo::from_bytes(&info.to_bytes().unwrap(), info.color).unwrap();

    assert_eq!(restored.icon, info.icon);
    let theme = restored.theme.as_ref().unwrap();
    assert_eq!(theme.overlay, overlay);
    assert_eq!(Some(theme.scale), composer.compute_scale(&IconSource::ThemeOverride(overlay)));
}

#[test]
fn luminance_difference_of_two_layers() {
    // sRGB greys with relative luminance 0.9 and 0.2.
    let background = RgbaImage::from_pixel(48, 48, Rgba([243, 243, 243, 255]));
    let mut foreground = RgbaImage::new(48, 48);
    for y in 16..32 {
        for x in 16..32 {
            foreground.put_pixel(x, y, Rgba([124, 124, 124, 255]));
        }
    }

    let result = mono::extract(Some(&background), Some(&foreground)).unwrap();
    assert!((result.luminance_diff + 0.7).abs() < 0.02, "diff {}", result.luminance_diff);
    assert!(result.mask.get_pixel(4, 4)[0] < 16);
    assert!(result.mask.get_pixel(24, 24)[0] > 240);
}

#[test]
fn disabled_shadows_match_unshadowed_render() {
    for source in [red_square(), two_layer()] {
        let plain = IconComposer::new(80, RenderConfig::default())
            .unwrap()
            .create_scaled_bitmap(&source, BitmapMode::Default)
            .unwrap();
        let unshadowed = IconComposer::new(80, RenderConfig::default().with_shadows(false))
            .unwrap()
            .render_default(&source)
            .unwrap();
        assert_eq!(unshadowed.icon, plain);
    }
}

#[test]
fn one_pixel_render_is_persisted() {
    let mut composer = IconComposer::new(1, RenderConfig::default()).unwrap();
    let info = composer
        .render_default(&IconSource::from(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]))))
        .unwrap();
    assert_eq!(info.icon.dimensions(), (1, 1));
    assert!(!info.is_low_res());

    let restored = BitmapInfo::from_bytes(&info.to_bytes().unwrap(), info.color).unwrap();
    assert_eq!(restored.icon, info.icon);
}

#[test]
fn themed_render_exposes_luminance_difference() {
    let config = RenderConfig::default().with_mono_icons(true);
    let mut composer = IconComposer::new(64, config).unwrap();
    let icon = AdaptiveIcon::new(IconLayer::color(243, 243, 243), IconLayer::color(124, 124, 124).scaled(0.4));
    let info = composer.render_default(&IconSource::Adaptive(icon)).unwrap();
    let diff = info.mono_luminance_diff.unwrap();
    assert!((diff + 0.7).abs() < 0.02, "diff {diff}");
}

#[test]
fn disabled_color_extraction_reports_black() {
    let config = RenderConfig::default().with_color_extraction_disabled(true);
    let info = IconComposer::new(48, config).unwrap().render_default(&red_square()).unwrap();
    assert_eq!(info.color, Srgb::new(0, 0, 0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn output_is_always_square(size in 1u32..96) {
        let mut composer = IconComposer::new(size, RenderConfig::default()).unwrap();
        let flat = IconSource::from(RgbaImage::from_pixel(20, 10, Rgba([0, 0, 255, 255])));
        for source in [flat, two_layer()] {
            let info = composer.render_default(&source).unwrap();
            prop_assert_eq!(info.icon.dimensions(), (size, size));
            let bytes = info.to_bytes();
            prop_assert!(bytes.is_some());
        }
    }

    #[test]
    fn scale_stays_in_unit_interval(width in 1u32..64, height in 1u32..64, inset in 0u32..8) {
        let mut img = RgbaImage::new(width + 2 * inset, height + 2 * inset);
        for y in inset..inset + height {
            for x in inset..inset + width {
                img.put_pixel(x, y, Rgba([10, 200, 10, 255]));
            }
        }
        let mut composer = IconComposer::new(48, RenderConfig::default()).unwrap();
        let scale = composer.compute_scale(&IconSource::from(img)).unwrap();
        prop_assert!(scale > 0.0 && scale <= 1.0);
    }
}
