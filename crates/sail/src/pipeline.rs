//! The frame state machine that drives a [`Codec`] session through the
//! begin → next-frame → next-pass → load-frame → ... → end protocol.
//!
//! Every facade layer funnels through here; the four layers differ only in
//! how much of the protocol they expose to the caller.

use tracing::{instrument, trace};

use sail_common::error::{Error, Result};
use sail_common::image::Image;
use sail_common::io::Io;
use sail_common::options::{LoadOptions, SaveOptions};

use crate::codec::{Codec, LoadSession, SaveSession};

/// Drives a load session for a single, complete image: one frame, every
/// interlacing pass, assembled into a fully-populated [`Image`].
///
/// Multi-frame streams (animations, multi-page formats) call this
/// repeatedly; [`Error::NoMoreFrames`] from the first `seek_next_frame`
/// signals the stream is exhausted.
pub struct LoadPipeline {
    session: Box<dyn LoadSession>,
    finished: bool,
}

impl LoadPipeline {
    #[instrument(skip(codec, io, options))]
    pub fn begin(codec: &dyn Codec, io: &mut dyn Io, options: &LoadOptions) -> Result<Self> {
        let session = codec.load_init(io, options)?;
        Ok(LoadPipeline {
            session,
            finished: false,
        })
    }

    /// Decode the next frame, or `None` once the stream is exhausted.
    ///
    /// On [`Error::NoMoreFrames`] this calls `finish` on the underlying
    /// session and returns `Ok(None)`; any other error is surfaced as-is and
    /// leaves the session unfinished, matching the reference library's
    /// "the caller is responsible for stopping on error" contract.
    #[instrument(skip(self, io))]
    pub fn next_frame(&mut self, io: &mut dyn Io) -> Result<Option<Image>> {
        if self.finished {
            return Ok(None);
        }

        let header = match self.session.seek_next_frame(io) {
            Ok(header) => header,
            Err(e) if e.is_no_more_frames() => {
                self.finish(io)?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let passes = match &header.source_image {
            Some(source_image) if source_image.is_interlaced() => {
                if source_image.interlaced_passes < 1 {
                    return Err(Error::InterlacedUnsupported("codec reported zero interlaced passes"));
                }
                source_image.interlaced_passes
            }
            _ => 1,
        };

        let mut image = header;
        trace!(width = image.width, height = image.height, passes, "decoding frame");
        for pass in 0..passes {
            self.session.seek_next_pass(io, &image, pass)?;
            self.session.load_frame(io, &mut image)?;
        }
        Ok(Some(image))
    }

    fn finish(&mut self, io: &mut dyn Io) -> Result<()> {
        if !self.finished {
            self.session.finish(io)?;
            self.finished = true;
        }
        Ok(())
    }

    /// Explicitly end the session, e.g. after bailing out on an error
    /// without having drained every frame.
    pub fn stop(&mut self, io: &mut dyn Io) -> Result<()> {
        self.finish(io)
    }
}

/// The save-side mirror of [`LoadPipeline`].
pub struct SavePipeline {
    session: Box<dyn SaveSession>,
    finished: bool,
}

impl SavePipeline {
    #[instrument(skip(codec, io, options))]
    pub fn begin(codec: &dyn Codec, io: &mut dyn Io, options: &SaveOptions) -> Result<Self> {
        let session = codec.save_init(io, options)?;
        Ok(SavePipeline {
            session,
            finished: false,
        })
    }

    #[instrument(skip(self, io, image))]
    pub fn write_frame(&mut self, io: &mut dyn Io, image: &Image, passes: u32) -> Result<()> {
        if self.finished {
            return Err(Error::BrokenImage("cannot write a frame after the save session finished"));
        }
        self.session.seek_next_frame(io, image)?;
        for pass in 0..passes.max(1) {
            self.session.seek_next_pass(io, image, pass)?;
            self.session.save_frame(io, image)?;
        }
        Ok(())
    }

    pub fn finish(&mut self, io: &mut dyn Io) -> Result<()> {
        if !self.finished {
            self.session.finish(io)?;
            self.finished = true;
        }
        Ok(())
    }
}

impl Drop for SavePipeline {
    fn drop(&mut self) {
        // Best-effort: a caller that drops the pipeline without calling
        // `finish` still gets a closed stream, just without error reporting.
        if !self.finished {
            let mut sink = sail_common::io::MemoryIo::new_writer();
            let _ = self.session.finish(&mut sink);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! A tiny in-memory codec used only to exercise the pipeline and facade
    //! layers. Not a real image format: it stores an uncompressed header
    //! plus raw pixel bytes, enough to round-trip through load/save.

    use std::convert::TryInto;

    use sail_common::error::{Error, Result};
    use sail_common::image::Image;
    use sail_common::io::Io;
    use sail_common::options::{LoadOptions, SaveOptions};
    use sail_common::pixel_format::PixelFormat;

    use crate::codec::{Codec, LoadSession, SaveSession};

    pub struct StubCodec;

    impl Codec for StubCodec {
        fn load_init(&self, _io: &mut dyn Io, _options: &LoadOptions) -> Result<Box<dyn LoadSession>> {
            Ok(Box::new(StubLoadSession { frames_left: 1 }))
        }

        fn save_init(&self, _io: &mut dyn Io, _options: &SaveOptions) -> Result<Box<dyn SaveSession>> {
            Ok(Box::new(StubSaveSession))
        }
    }

    struct StubLoadSession {
        frames_left: u32,
    }

    impl LoadSession for StubLoadSession {
        fn seek_next_frame(&mut self, io: &mut dyn Io) -> Result<Image> {
            if self.frames_left == 0 {
                return Err(Error::NoMoreFrames);
            }
            self.frames_left -= 1;

            let mut header = [0u8; 13];
            io.strict_read(&mut header)?;
            if &header[0..4] != b"STUB" {
                return Err(Error::UnsupportedCodecLayout { expected: 1, found: 0 });
            }
            let width = u32::from_le_bytes(header[4..8].try_into().unwrap());
            let height = u32::from_le_bytes(header[8..12].try_into().unwrap());
            let format_code = header[12];
            let pixel_format = match format_code {
                0 => PixelFormat::Bpp24Rgb,
                1 => PixelFormat::Bpp32Rgba,
                _ => return Err(Error::UnsupportedPixelFormat("stub codec only knows two formats")),
            };
            Image::new_owned(width, height, pixel_format)
        }

        fn seek_next_pass(&mut self, _io: &mut dyn Io, _image: &Image, pass: u32) -> Result<()> {
            if pass != 0 {
                return Err(Error::InterlacedUnsupported("stub codec has a single pass"));
            }
            Ok(())
        }

        fn load_frame(&mut self, io: &mut dyn Io, image: &mut Image) -> Result<()> {
            let buf = image.pixels.as_mut_slice().expect("freshly allocated image is owned");
            io.strict_read(buf)
        }

        fn finish(&mut self, _io: &mut dyn Io) -> Result<()> {
            Ok(())
        }
    }

    struct StubSaveSession;

    impl SaveSession for StubSaveSession {
        fn seek_next_frame(&mut self, io: &mut dyn Io, image: &Image) -> Result<()> {
            let format_code: u8 = match image.pixel_format {
                PixelFormat::Bpp24Rgb => 0,
                PixelFormat::Bpp32Rgba => 1,
                _ => return Err(Error::UnsupportedPixelFormat("stub codec only knows two formats")),
            };
            io.write(b"STUB")?;
            io.write(&image.width.to_le_bytes())?;
            io.write(&image.height.to_le_bytes())?;
            io.write(&[format_code])?;
            Ok(())
        }

        fn seek_next_pass(&mut self, _io: &mut dyn Io, _image: &Image, pass: u32) -> Result<()> {
            if pass != 0 {
                return Err(Error::InterlacedUnsupported("stub codec has a single pass"));
            }
            Ok(())
        }

        fn save_frame(&mut self, io: &mut dyn Io, image: &Image) -> Result<()> {
            io.write(image.pixels.as_slice())?;
            Ok(())
        }

        fn finish(&mut self, _io: &mut dyn Io) -> Result<()> {
            Ok(())
        }
    }

    /// A load-only stub whose header declares an interlaced pass count and
    /// whose frame body is that many back-to-back pixel buffers, one per
    /// pass, the way Adam7-style codecs refine the same frame over several
    /// passes. Used only to exercise [`super::LoadPipeline`]'s pass loop.
    pub struct InterlacedStubCodec;

    impl Codec for InterlacedStubCodec {
        fn load_init(&self, _io: &mut dyn Io, _options: &LoadOptions) -> Result<Box<dyn LoadSession>> {
            Ok(Box::new(InterlacedStubLoadSession { frames_left: 1 }))
        }

        fn save_init(&self, _io: &mut dyn Io, _options: &SaveOptions) -> Result<Box<dyn SaveSession>> {
            unimplemented!("InterlacedStubCodec is load-only test support")
        }
    }

    struct InterlacedStubLoadSession {
        frames_left: u32,
    }

    impl LoadSession for InterlacedStubLoadSession {
        fn seek_next_frame(&mut self, io: &mut dyn Io) -> Result<Image> {
            if self.frames_left == 0 {
                return Err(Error::NoMoreFrames);
            }
            self.frames_left -= 1;

            let mut header = [0u8; 14];
            io.strict_read(&mut header)?;
            if &header[0..4] != b"STUB" {
                return Err(Error::UnsupportedCodecLayout { expected: 1, found: 0 });
            }
            let width = u32::from_le_bytes(header[4..8].try_into().unwrap());
            let height = u32::from_le_bytes(header[8..12].try_into().unwrap());
            let format_code = header[12];
            let passes = header[13] as u32;
            let pixel_format = match format_code {
                0 => PixelFormat::Bpp24Rgb,
                1 => PixelFormat::Bpp32Rgba,
                _ => return Err(Error::UnsupportedPixelFormat("stub codec only knows two formats")),
            };

            let mut image = Image::new_owned(width, height, pixel_format)?;
            image.source_image = Some(sail_common::source_image::SourceImage {
                pixel_format,
                interlaced_passes: passes,
                properties: sail_common::source_image::SourceProperties::INTERLACED,
                ..Default::default()
            });
            Ok(image)
        }

        fn seek_next_pass(&mut self, _io: &mut dyn Io, _image: &Image, _pass: u32) -> Result<()> {
            Ok(())
        }

        fn load_frame(&mut self, io: &mut dyn Io, image: &mut Image) -> Result<()> {
            // Each pass overwrites the buffer wholesale, so the last pass
            // read wins, matching a refinement codec's final result.
            let buf = image.pixels.as_mut_slice().expect("freshly allocated image is owned");
            io.strict_read(buf)
        }

        fn finish(&mut self, _io: &mut dyn Io) -> Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{InterlacedStubCodec, StubCodec};
    use super::*;
    use sail_common::image::Pixels;
    use sail_common::io::{MemoryIo, Whence};
    use sail_common::pixel_format::PixelFormat;

    #[test]
    fn round_trips_a_single_frame_through_save_then_load() {
        let codec = StubCodec;
        let mut image = Image::new_owned(2, 1, PixelFormat::Bpp24Rgb).unwrap();
        if let Pixels::Owned(ref mut v) = image.pixels {
            v.copy_from_slice(&[10, 20, 30, 40, 50, 60]);
        }

        let mut io = MemoryIo::new_writer();
        let mut save = SavePipeline::begin(&codec, &mut io, &SaveOptions::default_for_test()).unwrap();
        save.write_frame(&mut io, &image, 1).unwrap();
        save.finish(&mut io).unwrap();

        let bytes = io.into_inner();
        let mut read_io = MemoryIo::new_reader(bytes);
        let mut load = LoadPipeline::begin(&codec, &mut read_io, &LoadOptions::default()).unwrap();
        let decoded = load.next_frame(&mut read_io).unwrap().unwrap();
        assert_eq!(decoded.pixels.as_slice(), &[10, 20, 30, 40, 50, 60]);
        assert!(load.next_frame(&mut read_io).unwrap().is_none());
    }

    #[test]
    fn next_frame_after_stream_exhausted_returns_none_without_erroring() {
        let codec = StubCodec;
        let mut io = MemoryIo::new_reader(Vec::new());
        io.seek(0, Whence::Set).unwrap();
        // An empty stream: the stub's strict_read will fail, which is a
        // genuine error distinct from a clean NoMoreFrames signal.
        let mut load = LoadPipeline::begin(&codec, &mut io, &LoadOptions::default()).unwrap();
        assert!(load.next_frame(&mut io).is_err());
    }

    #[test]
    fn next_frame_runs_every_interlaced_pass_reported_by_the_header() {
        let codec = InterlacedStubCodec;
        let width = 2u32;
        let height = 1u32;
        let passes = 3u8;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"STUB");
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.push(0); // format_code: Bpp24Rgb
        bytes.push(passes);
        // Three passes of 6 bytes each (2x1 RGB24); only the last should survive.
        bytes.extend_from_slice(&[1, 1, 1, 1, 1, 1]);
        bytes.extend_from_slice(&[2, 2, 2, 2, 2, 2]);
        bytes.extend_from_slice(&[9, 8, 7, 6, 5, 4]);

        let mut io = MemoryIo::new_reader(bytes);
        let mut load = LoadPipeline::begin(&codec, &mut io, &LoadOptions::default()).unwrap();
        let decoded = load.next_frame(&mut io).unwrap().unwrap();
        assert_eq!(decoded.pixels.as_slice(), &[9, 8, 7, 6, 5, 4]);
        assert!(load.next_frame(&mut io).unwrap().is_none());
    }

    trait SaveOptionsTestExt {
        fn default_for_test() -> Self;
    }

    impl SaveOptionsTestExt for SaveOptions {
        fn default_for_test() -> Self {
            SaveOptions {
                io_options: Default::default(),
                compression: sail_common::compression::Compression::None,
                compression_level: 0,
                tuning: Default::default(),
            }
        }
    }
}
