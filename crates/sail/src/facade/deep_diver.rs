//! Frame-at-a-time control over a load or save session, with caller-chosen
//! [`LoadOptions`]/[`SaveOptions`] instead of a codec's defaults. The codec
//! itself is still auto-detected from the stream, same as
//! [`crate::facade::advanced`].

use sail_common::error::Result;
use sail_common::image::Image;
use sail_common::io::Io;
use sail_common::options::{LoadOptions, SaveOptions};

use crate::pipeline::{LoadPipeline, SavePipeline};
use crate::registry::CodecRegistry;

/// A load session the caller drives one frame at a time.
pub struct DeepDiverLoad<'io> {
    io: &'io mut dyn Io,
    pipeline: LoadPipeline,
}

impl<'io> DeepDiverLoad<'io> {
    /// Detect the codec from `io`'s magic number and begin a load session
    /// with caller-supplied `options` rather than the codec's defaults.
    pub fn begin(io: &'io mut dyn Io, options: &LoadOptions) -> Result<Self> {
        let info = CodecRegistry::global().from_magic_number(io)?;
        let codec = CodecRegistry::global().codec_for(&info.name)?;
        let pipeline = LoadPipeline::begin(codec.as_ref(), io, options)?;
        Ok(DeepDiverLoad { io, pipeline })
    }

    /// Decode the next frame, `None` once the stream is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Image>> {
        self.pipeline.next_frame(self.io)
    }

    /// End the session early, e.g. after deciding not to decode every frame.
    pub fn stop(&mut self) -> Result<()> {
        self.pipeline.stop(self.io)
    }
}

/// A save session the caller drives one frame at a time.
pub struct DeepDiverSave<'io> {
    io: &'io mut dyn Io,
    pipeline: SavePipeline,
}

impl<'io> DeepDiverSave<'io> {
    /// Begin a save session for the named codec with caller-supplied
    /// `options`. Unlike the load side, there is no stream to sniff a codec
    /// from, so the caller names one directly.
    pub fn begin(io: &'io mut dyn Io, codec_name: &str, options: &SaveOptions) -> Result<Self> {
        let codec = CodecRegistry::global().codec_for(codec_name)?;
        let pipeline = SavePipeline::begin(codec.as_ref(), io, options)?;
        Ok(DeepDiverSave { io, pipeline })
    }

    pub fn write_frame(&mut self, image: &Image, passes: u32) -> Result<()> {
        self.pipeline.write_frame(self.io, image, passes)
    }

    pub fn finish(&mut self) -> Result<()> {
        self.pipeline.finish(self.io)
    }
}
