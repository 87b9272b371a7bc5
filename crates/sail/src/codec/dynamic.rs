//! Bridges a codec compiled as a separate shared library into the [`Codec`]
//! trait, via a small C-stable vtable resolved through `libloading`.
//!
//! Dynamic codecs are opt-in: nothing in this module runs unless the
//! `dynamic-codecs` feature is enabled and a descriptor points at a module
//! path.

#![cfg(feature = "dynamic-codecs")]

use std::ffi::c_void;
use std::sync::Arc;

use libloading::Library;

use sail_common::error::{Error, Result};
use sail_common::image::Image;
use sail_common::io::Io;
use sail_common::options::{LoadOptions, SaveOptions};
use sail_common::pixel_format::PixelFormat;

use super::{Codec, LoadSession, SaveSession};

/// Return codes a dynamic codec's entry points use in place of `Result`,
/// since the boundary is `extern "C"`.
const SAIL_PLUGIN_OK: i32 = 0;
const SAIL_PLUGIN_NO_MORE_FRAMES: i32 = 1;

/// Fixed-layout frame header a dynamic codec writes before pixel data exists.
#[repr(C)]
struct RawFrameHeader {
    width: u32,
    height: u32,
    bytes_per_line: u32,
    pixel_format: u32,
}

type PluginLoadInit = unsafe extern "C" fn(symbol_table_version: u32) -> *mut c_void;
type PluginLoadSeekNextFrame = unsafe extern "C" fn(state: *mut c_void, header_out: *mut RawFrameHeader) -> i32;
type PluginLoadFrame = unsafe extern "C" fn(state: *mut c_void, pixels_out: *mut u8, pixels_len: usize) -> i32;
type PluginLoadFinish = unsafe extern "C" fn(state: *mut c_void);

/// Symbols every dynamic codec module must export under these exact names.
struct RawVtable {
    load_init: PluginLoadInit,
    load_seek_next_frame: PluginLoadSeekNextFrame,
    load_frame: PluginLoadFrame,
    load_finish: PluginLoadFinish,
}

/// The ABI version this build of `sail` expects a plugin's `layout` key to match.
pub const SYMBOL_TABLE_VERSION: u32 = 1;

/// A codec loaded from a shared library on disk.
pub struct DynamicCodec {
    // Kept alive for as long as any session produced by this codec exists;
    // dropping the library while a session still calls into it is undefined
    // behavior, so sessions hold a clone of this `Arc`.
    _library: Arc<Library>,
    vtable: RawVtable,
}

impl DynamicCodec {
    /// Load `path`, resolving the four `sail_plugin_*` load symbols.
    ///
    /// # Safety
    /// The caller vouches that `path` names a library implementing the
    /// `sail` plugin ABI at [`SYMBOL_TABLE_VERSION`]; loading arbitrary code
    /// runs it in-process with no sandboxing.
    pub unsafe fn load(path: &std::path::Path) -> Result<Self> {
        let library = Library::new(path).map_err(|e| Error::CodecLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let resolve = |symbol: &'static [u8]| {
            Error::CodecSymbolResolveFailed {
                path: path.to_path_buf(),
                symbol: String::from_utf8_lossy(symbol).into_owned(),
            }
        };

        let load_init = *library
            .get::<PluginLoadInit>(b"sail_plugin_load_init")
            .map_err(|_| resolve(b"sail_plugin_load_init"))?;
        let load_seek_next_frame = *library
            .get::<PluginLoadSeekNextFrame>(b"sail_plugin_load_seek_next_frame")
            .map_err(|_| resolve(b"sail_plugin_load_seek_next_frame"))?;
        let load_frame = *library
            .get::<PluginLoadFrame>(b"sail_plugin_load_frame")
            .map_err(|_| resolve(b"sail_plugin_load_frame"))?;
        let load_finish = *library
            .get::<PluginLoadFinish>(b"sail_plugin_load_finish")
            .map_err(|_| resolve(b"sail_plugin_load_finish"))?;

        Ok(Self {
            _library: Arc::new(library),
            vtable: RawVtable {
                load_init,
                load_seek_next_frame,
                load_frame,
                load_finish,
            },
        })
    }
}

impl Codec for DynamicCodec {
    fn load_init(&self, _io: &mut dyn Io, _options: &LoadOptions) -> Result<Box<dyn LoadSession>> {
        let state = unsafe { (self.vtable.load_init)(SYMBOL_TABLE_VERSION) };
        if state.is_null() {
            return Err(Error::UnsupportedCodecLayout {
                expected: SYMBOL_TABLE_VERSION,
                found: 0,
            });
        }
        Ok(Box::new(DynamicLoadSession {
            library: self._library.clone(),
            load_seek_next_frame: self.vtable.load_seek_next_frame,
            load_frame: self.vtable.load_frame,
            load_finish: self.vtable.load_finish,
            state,
        }))
    }

    fn save_init(&self, _io: &mut dyn Io, _options: &SaveOptions) -> Result<Box<dyn SaveSession>> {
        Err(Error::UnderlyingCodecError(
            "this build of the plugin ABI does not expose save operations".to_string(),
        ))
    }
}

struct DynamicLoadSession {
    library: Arc<Library>,
    load_seek_next_frame: PluginLoadSeekNextFrame,
    load_frame: PluginLoadFrame,
    load_finish: PluginLoadFinish,
    state: *mut c_void,
}

// The plugin contract requires the exported functions to tolerate being
// called from a single owning thread at a time, matching `Io`'s own
// single-threaded contract.
unsafe impl Send for DynamicLoadSession {}

impl LoadSession for DynamicLoadSession {
    fn seek_next_frame(&mut self, _io: &mut dyn Io) -> Result<Image> {
        let mut header = RawFrameHeader {
            width: 0,
            height: 0,
            bytes_per_line: 0,
            pixel_format: 0,
        };

        let status = unsafe { (self.load_seek_next_frame)(self.state, &mut header) };
        if status == SAIL_PLUGIN_NO_MORE_FRAMES {
            return Err(Error::NoMoreFrames);
        }
        if status != SAIL_PLUGIN_OK {
            return Err(Error::UnderlyingCodecError(format!("load_seek_next_frame returned {status}")));
        }

        let pixel_format = decode_pixel_format(header.pixel_format)?;
        Image::new_owned(header.width, header.height, pixel_format)
    }

    fn seek_next_pass(&mut self, _io: &mut dyn Io, _image: &Image, pass: u32) -> Result<()> {
        if pass != 0 {
            return Err(Error::InterlacedUnsupported(
                "this plugin ABI does not support multi-pass decoding",
            ));
        }
        Ok(())
    }

    fn load_frame(&mut self, _io: &mut dyn Io, image: &mut Image) -> Result<()> {
        let buf = image
            .pixels
            .as_mut_slice()
            .ok_or(Error::BrokenImage("dynamic codec frame must be owned"))?;
        let status = unsafe { (self.load_frame)(self.state, buf.as_mut_ptr(), buf.len()) };
        if status != SAIL_PLUGIN_OK {
            return Err(Error::UnderlyingCodecError(format!("load_frame returned {status}")));
        }
        Ok(())
    }

    fn finish(&mut self, _io: &mut dyn Io) -> Result<()> {
        unsafe { (self.load_finish)(self.state) };
        self.state = std::ptr::null_mut();
        Ok(())
    }
}

impl Drop for DynamicLoadSession {
    fn drop(&mut self) {
        if !self.state.is_null() {
            unsafe { (self.load_finish)(self.state) };
        }
        drop(self.library.clone());
    }
}

/// Numeric codes the plugin ABI uses for pixel formats, since passing a
/// string across the FFI boundary per pixel would be wasteful. The table is
/// part of the ABI contract alongside [`SYMBOL_TABLE_VERSION`]: adding a
/// pixel format bumps the version, never reorders existing codes.
fn decode_pixel_format(code: u32) -> Result<PixelFormat> {
    PLUGIN_PIXEL_FORMAT_TABLE
        .get(code as usize)
        .copied()
        .ok_or(Error::UnsupportedPixelFormat("pixel format code not recognized by this ABI version"))
}

const PLUGIN_PIXEL_FORMAT_TABLE: &[PixelFormat] = &[
    PixelFormat::Bpp24Rgb,
    PixelFormat::Bpp24Bgr,
    PixelFormat::Bpp32Rgba,
    PixelFormat::Bpp32Bgra,
    PixelFormat::Bpp8Grayscale,
    PixelFormat::Bpp8Indexed,
];
