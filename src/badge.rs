//! Badge artwork.
//!
//! Badges are small icons of their own, rendered from SVG at a fixed
//! fraction of the icon size and attached to the main icon's
//! [`BitmapInfo`](crate::BitmapInfo).

use palette::Srgb;

use crate::bitmap_info::{BadgeAnchor, BitmapFlags};
use crate::render::svg::{escape_text, hex_color};

/// Badge side as a fraction of the icon side.
pub const BADGE_SIZE_FRACTION: f32 = 0.444;

const WORK_BLUE: (u8, u8, u8) = (0x19, 0x67, 0xd2);
const NOTIFICATION_RED: (u8, u8, u8) = (0xd9, 0x30, 0x25);

/// Which badge to attach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BadgeSpec {
    /// Briefcase marking work-profile apps.
    Work,
    /// Lightning bolt marking instant apps.
    Instant,
    /// Count bubble; zero draws a plain dot.
    NotificationCount(u32),
    /// Coloured ring identifying a secondary user.
    UserRing(Srgb<u8>),
}

impl BadgeSpec {
    /// Side of the badge bitmap for an icon of `icon_size` pixels.
    pub fn badge_size(icon_size: u32) -> u32 {
        ((icon_size as f32 * BADGE_SIZE_FRACTION).round() as u32).max(1)
    }

    /// Flags the badged icon carries.
    pub fn flags(&self) -> BitmapFlags {
        match self {
            Self::Work => BitmapFlags::WORK,
            Self::Instant => BitmapFlags::INSTANT,
            _ => BitmapFlags::NONE,
        }
    }

    pub fn anchor(&self) -> BadgeAnchor {
        match self {
            Self::NotificationCount(_) => BadgeAnchor::ShapeAttachment,
            _ => BadgeAnchor::BottomRight,
        }
    }

    /// True when the markup draws text and needs system fonts.
    pub fn needs_fonts(&self) -> bool {
        matches!(self, Self::NotificationCount(n) if *n > 0)
    }

    /// SVG markup on a 100x100 viewport.
    pub fn svg(&self) -> String {
        let body = match self {
            Self::Work => {
                let (r, g, b) = WORK_BLUE;
                format!(
                    r##"<circle cx="50" cy="50" r="50" fill="{}"/><path d="M40 30h20a4 4 0 0 1 4 4v4h10a4 4 0 0 1 4 4v24a4 4 0 0 1-4 4H26a4 4 0 0 1-4-4V42a4 4 0 0 1 4-4h10v-4a4 4 0 0 1 4-4zm2 8h16v-2H42z" fill="#ffffff"/>"##,
                    hex_color(r, g, b)
                )
            }
            Self::Instant => r##"<circle cx="50" cy="50" r="50" fill="#ffffff"/><circle cx="50" cy="50" r="46" fill="#f2f2f2"/><path d="M56 16L28 56h18l-4 28 28-40H52z" fill="#fbbc04"/>"##.to_string(),
            Self::NotificationCount(0) => {
                let (r, g, b) = NOTIFICATION_RED;
                format!(r##"<circle cx="50" cy="50" r="50" fill="{}"/>"##, hex_color(r, g, b))
            }
            Self::NotificationCount(count) => {
                let (r, g, b) = NOTIFICATION_RED;
                let label = if *count > 99 { "99+".to_string() } else { count.to_string() };
                let font_size = if label.len() > 2 { 40 } else { 56 };
                format!(
                    r##"<circle cx="50" cy="50" r="50" fill="{}"/><text x="50" y="50" dy="0.35em" text-anchor="middle" font-family="sans-serif" font-weight="bold" font-size="{font_size}" fill="#ffffff">{}</text>"##,
                    hex_color(r, g, b),
                    escape_text(&label)
                )
            }
            Self::UserRing(color) => format!(
                r##"<circle cx="50" cy="50" r="50" fill="#ffffff"/><circle cx="50" cy="50" r="38" fill="none" stroke="{}" stroke-width="16"/>"##,
                hex_color(color.red, color.green, color.blue)
            ),
        };
        format!(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">{body}</svg>"#)
    }
}
