//! Full manual control: the caller supplies both the transport ([`Io`]) and
//! the codec, bypassing [`crate::registry::CodecRegistry`] entirely. This is
//! the layer an embedder reaches for when the registry's auto-detection
//! doesn't fit — a custom transport, a codec instance configured outside
//! the descriptor system, or a format this build never registered at all.

use sail_common::error::Result;
use sail_common::image::Image;
use sail_common::io::Io;
use sail_common::options::{LoadOptions, SaveOptions};

use crate::codec::Codec;
use crate::pipeline::{LoadPipeline, SavePipeline};

/// Decode every frame `codec` produces from `io`, with no auto-detection
/// and no registry lookup at all.
pub fn load_with_codec(codec: &dyn Codec, io: &mut dyn Io, options: &LoadOptions) -> Result<Vec<Image>> {
    let mut pipeline = LoadPipeline::begin(codec, io, options)?;
    let mut frames = Vec::new();
    while let Some(frame) = pipeline.next_frame(io)? {
        frames.push(frame);
    }
    Ok(frames)
}

/// Encode every image in `images` through `codec` into `io`.
pub fn save_with_codec(codec: &dyn Codec, io: &mut dyn Io, options: &SaveOptions, images: &[Image]) -> Result<()> {
    let mut pipeline = SavePipeline::begin(codec, io, options)?;
    for image in images {
        pipeline.write_frame(io, image, 1)?;
    }
    pipeline.finish(io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::StubCodec;
    use sail_common::image::Pixels;
    use sail_common::io::MemoryIo;
    use sail_common::pixel_format::PixelFormat;

    #[test]
    fn round_trips_without_touching_the_registry() {
        let codec = StubCodec;
        let mut image = Image::new_owned(1, 2, PixelFormat::Bpp24Rgb).unwrap();
        if let Pixels::Owned(ref mut v) = image.pixels {
            v.copy_from_slice(&[9, 8, 7, 6, 5, 4]);
        }

        let mut io = MemoryIo::new_writer();
        save_with_codec(
            &codec,
            &mut io,
            &SaveOptions {
                io_options: Default::default(),
                compression: sail_common::compression::Compression::None,
                compression_level: 0,
                tuning: Default::default(),
            },
            &[image],
        )
        .unwrap();

        let mut read_io = MemoryIo::new_reader(io.into_inner());
        let frames = load_with_codec(&codec, &mut read_io, &LoadOptions::default()).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].pixels.as_slice(), &[9, 8, 7, 6, 5, 4]);
    }
}
