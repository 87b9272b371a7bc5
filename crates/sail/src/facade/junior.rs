//! The simplest possible API: load a file into an [`Image`], or save one
//! back out. No codec selection, no options, no multi-frame handling — the
//! first frame is the whole picture.

use std::path::Path;

use sail_common::codec_info::CodecInfo;
use sail_common::error::{Error, Result};
use sail_common::image::Image;

use super::advanced;

/// Identify `path`'s codec and decode its first frame, without committing
/// to decoding the whole stream.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<(Image, CodecInfo)> {
    advanced::probe_file(path)
}

/// Load the first frame of the image at `path`, auto-detecting its codec.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Image> {
    let mut frames = advanced::load_from_file(path)?;
    if frames.is_empty() {
        return Err(Error::BrokenImage("decoded stream produced no frames"));
    }
    Ok(frames.remove(0))
}

/// Save `image` to `path`, picking the codec from `path`'s extension and
/// that codec's default save options.
pub fn save<P: AsRef<Path>>(path: P, image: &Image) -> Result<()> {
    advanced::save_to_file(path, std::slice::from_ref(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::test_support::ensure_stub_registered;
    use sail_common::image::Pixels;
    use sail_common::pixel_format::PixelFormat;

    #[test]
    fn round_trips_through_a_temp_file() {
        ensure_stub_registered();
        let mut image = Image::new_owned(2, 1, PixelFormat::Bpp24Rgb).unwrap();
        if let Pixels::Owned(ref mut v) = image.pixels {
            v.copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        }
        let path = std::env::temp_dir().join("sail-junior-roundtrip-test.stubjr");
        save(&path, &image).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.pixels.as_slice(), &[1, 2, 3, 4, 5, 6]);
        let _ = std::fs::remove_file(&path);
    }
}
