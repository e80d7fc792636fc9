//! The finished icon record.

use image::RgbaImage;
use palette::Srgb;

use crate::icon::ThemeOverlay;

/// Bit set describing where an icon came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitmapFlags(u8);

impl BitmapFlags {
    pub const NONE: Self = Self(0);
    /// Icon belongs to a work profile.
    pub const WORK: Self = Self(1);
    /// Icon belongs to an instant app.
    pub const INSTANT: Self = Self(1 << 1);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for BitmapFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Metadata kept for icons whose artwork came from a themed resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemedData {
    /// Normalization scale the themed artwork was drawn with.
    pub scale: f32,
    pub overlay: ThemeOverlay,
}

/// Where a badge is placed on the icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeAnchor {
    #[default]
    BottomRight,
    /// Centred on the shape's right attachment point.
    ShapeAttachment,
}

/// A rendered icon with everything needed to draw and persist it.
///
/// Values are not mutated after construction; the `with_*` methods return
/// modified copies.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapInfo {
    pub icon: RgbaImage,
    /// Dominant colour, black when extraction is disabled.
    pub color: Srgb<u8>,
    /// White silhouette carrying the monochrome alpha, clipped to the shape.
    pub mono: Option<RgbaImage>,
    /// White shape with shadow drawn under the mono layer when themed.
    pub white_shadow_layer: Option<RgbaImage>,
    pub flags: BitmapFlags,
    pub badge: Option<Box<BitmapInfo>>,
    pub badge_anchor: BadgeAnchor,
    pub theme: Option<ThemedData>,
    /// Signed foreground minus background luminance of the extracted
    /// silhouette. Negative when the glyph is darker than its backdrop.
    pub mono_luminance_diff: Option<f64>,
    low_res: bool,
}

impl BitmapInfo {
    pub fn of(icon: RgbaImage, color: Srgb<u8>) -> Self {
        Self {
            icon,
            color,
            mono: None,
            white_shadow_layer: None,
            flags: BitmapFlags::NONE,
            badge: None,
            badge_anchor: BadgeAnchor::default(),
            theme: None,
            mono_luminance_diff: None,
            low_res: false,
        }
    }

    /// The 1x1 placeholder stored while a real icon is being loaded.
    ///
    /// Only values made here count as low-res; a genuine 1px render does not.
    pub fn low_res() -> Self {
        Self {
            low_res: true,
            ..Self::of(RgbaImage::new(1, 1), Srgb::new(0, 0, 0))
        }
    }

    pub fn is_low_res(&self) -> bool {
        self.low_res
    }

    pub fn is_null(&self) -> bool {
        self.icon.width() == 0 || self.icon.height() == 0
    }

    pub fn is_null_or_low_res(&self) -> bool {
        self.is_null() || self.is_low_res()
    }

    pub fn size(&self) -> u32 {
        self.icon.width()
    }

    pub fn with_flags(&self, flags: BitmapFlags) -> Self {
        let mut info = self.clone();
        info.flags = info.flags | flags;
        info
    }

    pub fn with_badge(&self, badge: BitmapInfo, anchor: BadgeAnchor) -> Self {
        let mut info = self.clone();
        info.badge = Some(Box::new(badge));
        info.badge_anchor = anchor;
        info
    }

    pub fn with_mono(&self, mono: RgbaImage, white_shadow_layer: Option<RgbaImage>) -> Self {
        let mut info = self.clone();
        info.mono = Some(mono);
        info.white_shadow_layer = white_shadow_layer;
        info
    }

    pub fn with_luminance_diff(&self, diff: f64) -> Self {
        let mut info = self.clone();
        info.mono_luminance_diff = Some(diff);
        info
    }

    pub fn with_theme(&self, theme: ThemedData) -> Self {
        let mut info = self.clone();
        info.theme = Some(theme);
        info
    }

    /// True when a monochrome layer is available for themed drawing.
    pub fn is_themable(&self) -> bool {
        self.mono.is_some()
    }
}
