//! SAIL: a pluggable image decoding and encoding framework.
//!
//! This crate owns the parts that sit above [`sail_common`]'s data model and
//! [`sail_manip`]'s pixel math: the [`codec`] capability abstraction, the
//! process-wide [`registry`] of known formats, the [`pipeline`] state
//! machine that drives a codec session frame by frame, and four
//! [`facade`] layers over all of it, from a one-line `load`/`save` up to
//! fully manual control over transport and codec selection.

pub mod codec;
pub mod facade;
pub mod pipeline;
pub mod registry;

pub use facade::{load, load_from_file, load_from_memory, probe, probe_file, probe_memory, save, save_to_file, save_to_memory};
pub use registry::CodecRegistry;

pub use sail_common::codec_info::CodecInfo;
pub use sail_common::error::{Error, Result};
pub use sail_common::image::{Image, Pixels};
pub use sail_common::options::{LoadOptions, SaveOptions};
pub use sail_common::pixel_format::PixelFormat;

pub use sail_manip::{can_convert, closest_pixel_format, convert_image, convert_to, scale_image, update, ScalingAlgorithm};
