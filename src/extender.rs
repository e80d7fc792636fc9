//! Per-source rendering extensions.
//!
//! Most icons render the same way every time. Clock icons redraw their
//! hands for the time of day, and themed overrides pull their artwork and
//! silhouette from another package. [`IconExtender`] picks the variant for
//! a source; the composer dispatches on it.

use chrono::{NaiveTime, Timelike};
use resvg::tiny_skia::{Pixmap, PixmapPaint, Rect, Transform};

use crate::bitmap_info::{BitmapInfo, ThemedData};
use crate::error::{IconError, Result};
use crate::icon::{IconLayer, IconSource, ThemeOverlay};
use crate::render::draw_layer;

/// Hand layers of a clock icon, drawn over the foreground in layer space.
///
/// Each hand is drawn pointing at twelve o'clock and rotated about the
/// centre of the layer bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockFace {
    pub hour: IconLayer,
    pub minute: IconLayer,
    pub second: Option<IconLayer>,
    /// Time shown in frames that must not change, such as cached icons.
    pub stable_time: NaiveTime,
}

impl ClockFace {
    pub fn new(hour: IconLayer, minute: IconLayer) -> Self {
        Self {
            hour,
            minute,
            second: None,
            stable_time: NaiveTime::from_hms_opt(10, 10, 30).unwrap_or_default(),
        }
    }

    pub fn with_second(mut self, layer: IconLayer) -> Self {
        self.second = Some(layer);
        self
    }

    pub fn with_stable_time(mut self, time: NaiveTime) -> Self {
        self.stable_time = time;
        self
    }

    /// Hand angles in degrees clockwise from twelve: `(hour, minute, second)`.
    pub fn hand_angles(time: NaiveTime) -> (f32, f32, f32) {
        let seconds = time.second() as f32;
        let minutes = time.minute() as f32 + seconds / 60.0;
        let hours = (time.hour() % 12) as f32 + minutes / 60.0;
        (hours * 30.0, minutes * 6.0, seconds * 6.0)
    }

    /// Draws every hand for `time` into `rect`.
    pub fn draw_hands(&self, pixmap: &mut Pixmap, rect: Rect, time: NaiveTime) -> Result<()> {
        let (hour, minute, second) = Self::hand_angles(time);
        let hands = [(Some(&self.hour), hour), (Some(&self.minute), minute), (self.second.as_ref(), second)];
        let (cx, cy) = (rect.x() + rect.width() / 2.0, rect.y() + rect.height() / 2.0);

        for (layer, angle) in hands {
            let Some(layer) = layer else { continue };
            let mut hand = Pixmap::new(pixmap.width(), pixmap.height())
                .ok_or_else(|| IconError::DegenerateGeometry("clock hand pixmap".into()))?;
            draw_layer(&mut hand, layer, rect)?;
            pixmap.draw_pixmap(
                0,
                0,
                hand.as_ref(),
                &PixmapPaint::default(),
                Transform::from_rotate_at(angle, cx, cy),
                None,
            );
        }
        Ok(())
    }
}

/// How a source extends the default render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IconExtender<'a> {
    /// Rendered once, nothing extra.
    Plain,
    /// Animated clock: persisted with a stable frame, live frames on demand.
    TimeVarying(&'a ClockFace),
    /// Artwork and silhouette come from a themed resource.
    ThemedOverride(&'a ThemeOverlay),
}

impl<'a> IconExtender<'a> {
    pub fn for_source(source: &'a IconSource) -> Self {
        match source {
            IconSource::Adaptive(icon) => match &icon.clock {
                Some(clock) => Self::TimeVarying(clock),
                None => Self::Plain,
            },
            IconSource::ThemeOverride(overlay) => Self::ThemedOverride(overlay),
            IconSource::Flat(_) => Self::Plain,
        }
    }

    /// Clock time of the frame that gets persisted. `None` for sources
    /// that draw no hands.
    pub fn draw_stable(&self) -> Option<NaiveTime> {
        match self {
            Self::TimeVarying(clock) => Some(clock.stable_time),
            Self::Plain | Self::ThemedOverride(_) => None,
        }
    }

    /// Clock time of a live frame requested for `time`. Static sources
    /// ignore the request.
    pub fn draw_live(&self, time: NaiveTime) -> Option<NaiveTime> {
        match self {
            Self::TimeVarying(_) => Some(time),
            Self::Plain | Self::ThemedOverride(_) => None,
        }
    }

    /// The themed resource this source stands for, if any.
    pub fn themed_variant(&self) -> Option<&'a ThemeOverlay> {
        match *self {
            Self::ThemedOverride(overlay) => Some(overlay),
            Self::Plain | Self::TimeVarying(_) => None,
        }
    }

    /// Attaches what the extension needs to survive persistence.
    ///
    /// Themed overrides record their resource and draw scale so the mono
    /// layer can be rebuilt after decoding.
    pub fn compose_extended(&self, info: BitmapInfo, scale: f32) -> BitmapInfo {
        match *self {
            Self::ThemedOverride(overlay) => info.with_theme(ThemedData {
                scale,
                overlay: overlay.clone(),
            }),
            Self::Plain | Self::TimeVarying(_) => info,
        }
    }
}
