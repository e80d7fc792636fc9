//! Byte encoding of [`BitmapInfo`] for the persistent icon cache.
//!
//! # Format
//!
//! The first byte is a type tag; it is the only versioning.
//!
//! ```text
//! default: [0x01][PNG]
//! themed:  [0x02][f32 BE scale][u16 BE len][package UTF-8][u16 BE len][resource name UTF-8][PNG]
//! ```
//!
//! Only the icon raster and theme reference are stored. Colour comes from
//! the cache row, and mono layers are regenerated from the theme reference.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use log::warn;
use palette::Srgb;

use crate::bitmap_info::{BitmapInfo, ThemedData};
use crate::error::{IconError, Result};
use crate::icon::ThemeOverlay;

pub const TYPE_DEFAULT: u8 = 1;
pub const TYPE_THEMED: u8 = 2;

/// Encodes an image as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Decodes PNG bytes into an RGBA image.
pub fn decode_png(data: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory_with_format(data, ImageFormat::Png)?.to_rgba8())
}

impl BitmapInfo {
    /// Serializes the icon, or `None` for null and low-res icons or when
    /// PNG encoding fails.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        if self.is_null_or_low_res() {
            return None;
        }
        match self.try_to_bytes() {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!("icon not persisted: {err}");
                None
            }
        }
    }

    fn try_to_bytes(&self) -> Result<Vec<u8>> {
        let png = encode_png(&self.icon)?;
        let Some(theme) = &self.theme else {
            let mut out = Vec::with_capacity(png.len() + 1);
            out.push(TYPE_DEFAULT);
            out.extend_from_slice(&png);
            return Ok(out);
        };

        let mut out = Vec::with_capacity(png.len() + 64);
        out.push(TYPE_THEMED);
        out.extend_from_slice(&theme.scale.to_be_bytes());
        write_string(&mut out, &theme.overlay.package_name)?;
        write_string(&mut out, &theme.overlay.resource_name)?;
        out.extend_from_slice(&png);
        Ok(out)
    }

    /// Restores an icon written by [`to_bytes`](Self::to_bytes).
    ///
    /// Unknown tags, truncated data, invalid UTF-8 and undecodable PNG all
    /// yield `None`.
    pub fn from_bytes(data: &[u8], color: Srgb<u8>) -> Option<Self> {
        match decode(data, color) {
            Ok(info) => Some(info),
            Err(err) => {
                warn!("unreadable cached icon: {err}");
                None
            }
        }
    }
}

fn decode(data: &[u8], color: Srgb<u8>) -> Result<BitmapInfo> {
    let mut reader = Reader { data, pos: 0 };
    match reader.u8()? {
        TYPE_DEFAULT => Ok(BitmapInfo::of(decode_png(reader.rest())?, color)),
        TYPE_THEMED => {
            let scale = f32::from_be_bytes(reader.array()?);
            let package_name = reader.string()?;
            let resource_name = reader.string()?;
            let icon = decode_png(reader.rest())?;
            Ok(BitmapInfo::of(icon, color).with_theme(ThemedData {
                scale,
                overlay: ThemeOverlay::new(package_name, resource_name),
            }))
        }
        tag => Err(IconError::MalformedPersistedData(format!("unknown tag {tag:#04x}"))),
    }
}

fn write_string(out: &mut Vec<u8>, value: &str) -> Result<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| IconError::MalformedPersistedData(format!("{} byte string", value.len())))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len());
        let Some(end) = end else {
            return Err(IconError::MalformedPersistedData(format!(
                "truncated at byte {} (wanted {n})",
                self.pos
            )));
        };
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn string(&mut self) -> Result<String> {
        let len = u16::from_be_bytes(self.array()?) as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|err| IconError::MalformedPersistedData(format!("bad UTF-8: {err}")))
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn icon() -> RgbaImage {
        RgbaImage::from_fn(16, 16, |x, y| Rgba([x as u8 * 16, y as u8 * 16, 7, (x + y) as u8 * 8]))
    }

    #[test]
    fn default_layout() {
        let bytes = BitmapInfo::of(icon(), Srgb::new(0, 0, 0)).to_bytes().unwrap();
        assert_eq!(bytes[0], TYPE_DEFAULT);
        assert_eq!(&bytes[1..5], b"\x89PNG");
    }

    #[test]
    fn default_round_trip_is_exact() {
        let info = BitmapInfo::of(icon(), Srgb::new(9, 8, 7));
        let restored = BitmapInfo::from_bytes(&info.to_bytes().unwrap(), Srgb::new(9, 8, 7)).unwrap();
        assert_eq!(restored.icon, info.icon);
        assert_eq!(restored.color, Srgb::new(9, 8, 7));
        assert!(restored.theme.is_none());
    }

    #[test]
    fn themed_layout_and_round_trip() {
        let theme = ThemedData {
            scale: 0.75,
            overlay: ThemeOverlay::new("com.example", "com.example:drawable/themed").with_resource_id(42),
        };
        let info = BitmapInfo::of(icon(), Srgb::new(0, 0, 0)).with_theme(theme);
        let bytes = info.to_bytes().unwrap();

        assert_eq!(bytes[0], TYPE_THEMED);
        assert_eq!(&bytes[1..5], &0.75f32.to_be_bytes());
        assert_eq!(&bytes[5..7], &11u16.to_be_bytes());
        assert_eq!(&bytes[7..18], b"com.example");

        let restored = BitmapInfo::from_bytes(&bytes, Srgb::new(0, 0, 0)).unwrap();
        assert_eq!(restored.icon, info.icon);
        let restored_theme = restored.theme.unwrap();
        assert_eq!(restored_theme.scale, 0.75);
        assert_eq!(restored_theme.overlay.package_name, "com.example");
        assert_eq!(restored_theme.overlay.resource_name, "com.example:drawable/themed");
        assert_eq!(restored_theme.overlay.resource_id, None);
    }

    #[test]
    fn null_and_low_res_are_not_persisted() {
        assert!(BitmapInfo::low_res().to_bytes().is_none());
        assert!(BitmapInfo::of(RgbaImage::new(0, 0), Srgb::new(0, 0, 0)).to_bytes().is_none());
    }

    #[test]
    fn one_pixel_icon_is_persisted() {
        let pixel = RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        let info = BitmapInfo::of(pixel, Srgb::new(255, 0, 0));
        let restored = BitmapInfo::from_bytes(&info.to_bytes().unwrap(), info.color).unwrap();
        assert_eq!(restored.icon, info.icon);
        assert!(!restored.is_low_res());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut bytes = BitmapInfo::of(icon(), Srgb::new(0, 0, 0)).to_bytes().unwrap();
        bytes[0] = 0x7f;
        assert!(BitmapInfo::from_bytes(&bytes, Srgb::new(0, 0, 0)).is_none());
        assert!(BitmapInfo::from_bytes(&[], Srgb::new(0, 0, 0)).is_none());
    }

    #[test]
    fn truncated_themed_header_is_rejected() {
        let bytes = [TYPE_THEMED, 0x3f, 0x40, 0x00, 0x00, 0x00, 0x20, b'a'];
        assert!(BitmapInfo::from_bytes(&bytes, Srgb::new(0, 0, 0)).is_none());
    }

    #[test]
    fn bad_utf8_is_rejected() {
        let mut bytes = vec![TYPE_THEMED];
        bytes.extend_from_slice(&1.0f32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x02, 0xff, 0xfe]);
        bytes.extend_from_slice(&[0x00, 0x00]);
        bytes.extend_from_slice(&encode_png(&icon()).unwrap());
        assert!(BitmapInfo::from_bytes(&bytes, Srgb::new(0, 0, 0)).is_none());
    }

    #[test]
    fn corrupt_png_is_rejected() {
        assert!(BitmapInfo::from_bytes(&[TYPE_DEFAULT, 1, 2, 3], Srgb::new(0, 0, 0)).is_none());
    }
}
