//! Compression kinds reported by source images and accepted by save options.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    None,
    Rle,
    Deflate,
    Lzw,
    Jpeg,
    Png,
    Lzma,
    Zstd,
}

impl Compression {
    pub fn as_str(self) -> &'static str {
        use Compression::*;
        match self {
            None => "NONE",
            Rle => "RLE",
            Deflate => "DEFLATE",
            Lzw => "LZW",
            Jpeg => "JPEG",
            Png => "PNG",
            Lzma => "LZMA",
            Zstd => "ZSTD",
        }
    }

    pub fn from_str_strict(s: &str) -> Result<Self> {
        use Compression::*;
        Ok(match s {
            "NONE" => None,
            "RLE" => Rle,
            "DEFLATE" => Deflate,
            "LZW" => Lzw,
            "JPEG" => Jpeg,
            "PNG" => Png,
            "LZMA" => Lzma,
            "ZSTD" => Zstd,
            _ => return Err(Error::UnsupportedCompression("unrecognized compression string")),
        })
    }

    /// Whether this compression is guaranteed to be lossless.
    ///
    /// `Jpeg` is deliberately excluded: a codec may advertise it as a save
    /// option even though the format is lossy.
    pub fn is_lossless(self) -> bool {
        !matches!(self, Compression::Jpeg)
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for c in [
            Compression::None,
            Compression::Rle,
            Compression::Deflate,
            Compression::Lzw,
            Compression::Jpeg,
            Compression::Png,
            Compression::Lzma,
            Compression::Zstd,
        ] {
            assert_eq!(Compression::from_str_strict(c.as_str()).unwrap(), c);
        }
    }

    #[test]
    fn jpeg_is_the_only_lossy_kind() {
        assert!(!Compression::Jpeg.is_lossless());
        assert!(Compression::Png.is_lossless());
    }
}
