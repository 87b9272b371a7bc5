//! The table of codecs compiled directly into this binary.
//!
//! Individual format implementations (PNG, JPEG, BMP, and so on) are not
//! part of this crate: real deployments register them the same way the
//! reference C library does, either by linking a format crate that calls
//! [`crate::registry::CodecRegistry::register_dynamic`] at startup, or by
//! dropping a descriptor plus shared library into a codecs directory that
//! gets scanned once at process start. This table exists so a build that
//! *does* want to bundle a format statically has a single place to list it.

use std::sync::Arc;

use sail_common::codec_info::CodecInfo;

use crate::codec::Codec;

/// `(descriptor, constructor)` pairs for every codec linked into this binary.
///
/// Empty by default; a downstream crate that vendors a format in can extend
/// this by forking the table or, more commonly, by calling
/// [`crate::registry::CodecRegistry::register_dynamic`] itself during its
/// own initialization.
pub fn built_in_entries() -> Vec<(CodecInfo, fn() -> Arc<dyn Codec>)> {
    Vec::new()
}
