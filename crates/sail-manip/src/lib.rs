//! Pixel format conversion and image scaling for SAIL images.
//!
//! This crate knows nothing about codecs or files: it operates purely on
//! in-memory [`sail_common::image::Image`] values, the same way the facade
//! crate's conversion entry points do.

pub mod cmyk;
pub mod convert;
pub mod manip_utils;
pub mod scale;
pub mod ycbcr;

pub use convert::{can_convert, closest_pixel_format, convert as convert_image, convert_to, update};
pub use scale::{scale_image, ScalingAlgorithm};
