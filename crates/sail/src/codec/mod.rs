//! The codec capability abstraction every registered format implements.
//!
//! A [`Codec`] is the polymorphic replacement for a C-style function-pointer
//! vtable: one object per format, handed out by the registry, producing
//! load/save sessions that the [`crate::pipeline`] drives through the
//! begin/next-frame/next-pass/end protocol.

pub mod dynamic;
pub mod registry_static;

use sail_common::error::Result;
use sail_common::image::Image;
use sail_common::io::Io;
use sail_common::options::{LoadOptions, SaveOptions};

/// Per-format capability set. Implementations are either statically linked
/// into the binary or bridged from a shared library by [`dynamic::DynamicCodec`].
pub trait Codec: Send + Sync {
    /// Begin a load session over `io`, consuming `options`.
    fn load_init(&self, io: &mut dyn Io, options: &LoadOptions) -> Result<Box<dyn LoadSession>>;

    /// Begin a save session over `io`, consuming `options`.
    fn save_init(&self, io: &mut dyn Io, options: &SaveOptions) -> Result<Box<dyn SaveSession>>;
}

/// A load session's private state, advanced one frame and pass at a time.
///
/// Mirrors the five-operation load vtable: the pipeline calls
/// `seek_next_frame` once per frame, then `seek_next_pass` + `load_frame`
/// once per interlacing pass, and `finish` exactly once at the end.
pub trait LoadSession {
    /// Produce the next frame's header: dimensions, pixel format, source
    /// metadata, and (for indexed images) a palette, but **no pixel data**.
    /// Returns [`sail_common::error::Error::NoMoreFrames`] when the stream is exhausted.
    fn seek_next_frame(&mut self, io: &mut dyn Io) -> Result<Image>;

    /// Position the codec to decode pass `pass` of `image`'s current frame.
    fn seek_next_pass(&mut self, io: &mut dyn Io, image: &Image, pass: u32) -> Result<()>;

    /// Fill `image`'s pre-allocated pixel buffer for the pass positioned by
    /// the most recent `seek_next_pass` call.
    fn load_frame(&mut self, io: &mut dyn Io, image: &mut Image) -> Result<()>;

    /// Release any codec-private resources. Called exactly once, even on
    /// an error path, before the session is dropped.
    fn finish(&mut self, io: &mut dyn Io) -> Result<()>;
}

/// The save-side mirror of [`LoadSession`].
pub trait SaveSession {
    fn seek_next_frame(&mut self, io: &mut dyn Io, image: &Image) -> Result<()>;

    fn seek_next_pass(&mut self, io: &mut dyn Io, image: &Image, pass: u32) -> Result<()>;

    fn save_frame(&mut self, io: &mut dyn Io, image: &Image) -> Result<()>;

    fn finish(&mut self, io: &mut dyn Io) -> Result<()>;
}
