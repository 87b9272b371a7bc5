//! The native representation of an image as its codec found it, before any conversion.

use bitflags::bitflags;

use crate::chroma::ChromaSubsampling;
use crate::compression::Compression;
use crate::orientation::Orientation;
use crate::pixel_format::PixelFormat;

bitflags! {
    /// Properties a codec reports about the stream it decoded, orthogonal to
    /// pixel format itself.
    pub struct SourceProperties: u32 {
        /// Rows are stored bottom-to-top in the original stream (e.g. BMP).
        const FLIPPED_VERTICALLY = 0b0000_0001;
        /// The stream interleaves rows in a non-sequential order (e.g. PNG Adam7).
        const INTERLACED = 0b0000_0010;
    }
}

/// Describes the file's native representation before any conversion:
/// populated on load, ignored on save.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixel_format: PixelFormat,
    pub chroma_subsampling: ChromaSubsampling,
    pub orientation: Orientation,
    pub compression: Compression,
    pub interlaced_passes: u32,
    pub properties: SourceProperties,
}

impl SourceImage {
    pub fn is_interlaced(&self) -> bool {
        self.properties.contains(SourceProperties::INTERLACED)
    }
}

impl Default for SourceImage {
    fn default() -> Self {
        SourceImage {
            pixel_format: PixelFormat::Unknown,
            chroma_subsampling: ChromaSubsampling::Unknown,
            orientation: Orientation::Normal,
            compression: Compression::None,
            interlaced_passes: 1,
            properties: SourceProperties::empty(),
        }
    }
}
