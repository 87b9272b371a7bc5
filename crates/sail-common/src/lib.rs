//! Shared data model for SAIL: pixel formats, the image record, codec
//! metadata, I/O abstraction, and the error type every other `sail-*` crate
//! builds on.

pub mod chroma;
pub mod codec_info;
pub mod compression;
pub mod error;
pub mod iccp;
pub mod image;
pub mod io;
pub mod meta_data;
pub mod options;
pub mod orientation;
pub mod palette;
pub mod pixel_format;
pub mod resolution;
pub mod source_image;
pub mod tuning;

pub use error::{Error, Result};
pub use image::{Image, Pixels};
pub use pixel_format::PixelFormat;
