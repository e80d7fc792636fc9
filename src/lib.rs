//! iconloader: launcher icon rendering
//!
//! This crate turns application artwork into the uniform square icons a
//! home screen shows. It normalizes every icon to the same visible area,
//! draws drop shadows, derives monochrome silhouettes for themed icons,
//! attaches badges and encodes results for a persistent cache.
//!
//! # Example
//!
//! ```
//! use iconloader::{IconComposer, IconSource, RenderConfig};
//! use image::{Rgba, RgbaImage};
//!
//! let mut composer = IconComposer::new(192, RenderConfig::default()).unwrap();
//!
//! // A legacy square icon gets wrapped into the device shape.
//! let artwork = RgbaImage::from_pixel(512, 512, Rgba([255, 0, 0, 255]));
//! let info = composer.render_default(&IconSource::from(artwork)).unwrap();
//! assert_eq!(info.icon.dimensions(), (192, 192));
//!
//! // Persist and restore.
//! let bytes = info.to_bytes().unwrap();
//! let restored = iconloader::BitmapInfo::from_bytes(&bytes, info.color).unwrap();
//! assert_eq!(restored.icon, info.icon);
//! ```
//!
//! # Themed icons
//!
//! With [`RenderConfig::mono_icons_enabled`] every rendered icon carries a
//! monochrome layer. [`IconDrawable`] turns it into the tinted image the UI
//! shows:
//!
//! ```
//! use iconloader::{
//!     AdaptiveIcon, DrawableOptions, IconComposer, IconDrawable, IconLayer, IconSource,
//!     RenderConfig,
//! };
//!
//! let config = RenderConfig::default().with_mono_icons(true);
//! let mut composer = IconComposer::new(48, config).unwrap();
//! let icon = AdaptiveIcon::new(IconLayer::color(255, 255, 255), IconLayer::color(0, 0, 0).scaled(0.4));
//! let info = composer.render_default(&IconSource::Adaptive(icon)).unwrap();
//!
//! let options = DrawableOptions { themed: true, ..DrawableOptions::default() };
//! let drawable = IconDrawable::from_info(&info, &options);
//! assert!(drawable.is_themed());
//! ```

pub mod badge;
pub mod bitmap_info;
pub mod codec;
pub mod color;
pub mod composer;
pub mod config;
pub mod drawable;
pub mod error;
pub mod extender;
pub mod icon;
pub mod mono;
pub mod normalizer;
pub mod render;
pub mod resources;
pub mod shadow;
pub mod shape;

pub use badge::BadgeSpec;
pub use bitmap_info::{BadgeAnchor, BitmapFlags, BitmapInfo, ThemedData};
pub use composer::{BitmapMode, IconComposer};
pub use config::{RenderConfig, ShadowParams};
pub use drawable::{DrawableOptions, IconDrawable, ThemeColors};
pub use error::{IconError, Result};
pub use extender::{ClockFace, IconExtender};
pub use icon::{AdaptiveIcon, IconLayer, IconSource, RectF, RectPx, ThemeOverlay};
pub use mono::MonochromeResult;
pub use normalizer::{NormalizationResult, ShapeNormalizer};
pub use resources::{ResourceResolver, StaticResolver};
pub use shadow::ShadowGenerator;
pub use shape::{AttachmentPoints, ClipShape, ShapeKind};
