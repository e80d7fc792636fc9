//! Raster plumbing shared by every stage of the pipeline.
//!
//! [`svg`] holds the resvg glue and pixel conversions; [`surface`] holds
//! layer drawing and the reusable canvas a composer renders into.

pub mod surface;
pub mod svg;

pub use surface::{
    apply_mask, draw_adaptive, draw_layer, intrinsic_size, layer_bounds, render_layer, DrawSurface,
    EXTRA_INSET_FRACTION,
};
