//! Pixel formats: the closed set of pixel arrangements the library understands.
//!
//! Every [`PixelFormat`] has a constant, computable bits-per-pixel and a
//! canonical string used in codec descriptor files and by callers doing
//! string-driven format selection (`BPP32-RGBA`, `BPP8-INDEXED`, ...).

use std::fmt;

use crate::error::{Error, Result};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Placeholder meaning "not yet determined".
    Unknown,
    /// Means "use the format the source image is already in", valid only as
    /// a conversion or save target selector, never as a concrete image's format.
    Source,

    /// 1 bit per pixel, black and white, MSB-first.
    Bpp1Mono,

    /// 1 bit per pixel grayscale: {0 -> 0, 1 -> 255}, MSB-first.
    Bpp1Grayscale,
    /// 2 bits per pixel grayscale, values scaled by 85, MSB-first.
    Bpp2Grayscale,
    /// 4 bits per pixel grayscale, values scaled by 17, MSB-first.
    Bpp4Grayscale,
    /// 8 bits per pixel grayscale.
    Bpp8Grayscale,
    /// 16 bits per pixel grayscale, native endian.
    Bpp16Grayscale,
    /// 16 bits per pixel grayscale with alpha (8+8).
    Bpp16GrayscaleAlpha,
    /// 32 bits per pixel grayscale with alpha (16+16).
    Bpp32GrayscaleAlpha,

    /// 1 bit per pixel indexed, MSB-first, through a palette.
    Bpp1Indexed,
    /// 2 bits per pixel indexed, MSB-first, through a palette.
    Bpp2Indexed,
    /// 4 bits per pixel indexed, MSB-first, through a palette.
    Bpp4Indexed,
    /// 8 bits per pixel indexed, through a palette.
    Bpp8Indexed,
    /// 16 bits per pixel indexed, through a palette.
    Bpp16Indexed,

    /// 16 bits per pixel packed, 5:5:5 with 1 unused bit, R-G-B order.
    Bpp16Rgb555,
    /// 16 bits per pixel packed, 5:5:5 with 1 unused bit, B-G-R order.
    Bpp16Bgr555,
    /// 16 bits per pixel packed, 5:6:5, R-G-B order.
    Bpp16Rgb565,
    /// 16 bits per pixel packed, 5:6:5, B-G-R order.
    Bpp16Bgr565,

    /// 24 bits per pixel, 8:8:8, R-G-B order.
    Bpp24Rgb,
    /// 24 bits per pixel, 8:8:8, B-G-R order.
    Bpp24Bgr,

    /// 48 bits per pixel, 16:16:16, R-G-B order, native endian.
    Bpp48Rgb,
    /// 48 bits per pixel, 16:16:16, B-G-R order, native endian.
    Bpp48Bgr,

    /// 32 bits per pixel, 8:8:8:8, R-G-B with an unused byte.
    Bpp32Rgbx,
    /// 32 bits per pixel, 8:8:8:8, B-G-R with an unused byte.
    Bpp32Bgrx,
    /// 32 bits per pixel, 8:8:8:8, unused byte then R-G-B.
    Bpp32Xrgb,
    /// 32 bits per pixel, 8:8:8:8, unused byte then B-G-R.
    Bpp32Xbgr,
    /// 32 bits per pixel, 8:8:8:8, R-G-B-A order.
    Bpp32Rgba,
    /// 32 bits per pixel, 8:8:8:8, B-G-R-A order.
    Bpp32Bgra,
    /// 32 bits per pixel, 8:8:8:8, A-R-G-B order.
    Bpp32Argb,
    /// 32 bits per pixel, 8:8:8:8, A-B-G-R order.
    Bpp32Abgr,

    /// 64 bits per pixel, 16:16:16:16, R-G-B with an unused channel, native endian.
    Bpp64Rgbx,
    /// 64 bits per pixel, 16:16:16:16, B-G-R with an unused channel, native endian.
    Bpp64Bgrx,
    /// 64 bits per pixel, 16:16:16:16, unused channel then R-G-B, native endian.
    Bpp64Xrgb,
    /// 64 bits per pixel, 16:16:16:16, unused channel then B-G-R, native endian.
    Bpp64Xbgr,
    /// 64 bits per pixel, 16:16:16:16, R-G-B-A order, native endian.
    Bpp64Rgba,
    /// 64 bits per pixel, 16:16:16:16, B-G-R-A order, native endian.
    Bpp64Bgra,
    /// 64 bits per pixel, 16:16:16:16, A-R-G-B order, native endian.
    Bpp64Argb,
    /// 64 bits per pixel, 16:16:16:16, A-B-G-R order, native endian.
    Bpp64Abgr,

    /// 32 bits per pixel CMYK, 8:8:8:8.
    Bpp32Cmyk,
    /// 64 bits per pixel CMYK, 16:16:16:16, native endian.
    Bpp64Cmyk,

    /// 24 bits per pixel YCbCr 4:4:4, 8:8:8.
    Bpp24Ycbcr,

    /// 32 bits per pixel YCCK, 8:8:8:8.
    Bpp32Ycck,

    /// planar YUV 4:2:0, the scaling back-end's working format for chroma-subsampled sources.
    Bpp12Yuv420,
    /// planar YUV 4:2:2, the scaling back-end's working format for chroma-subsampled sources.
    Bpp16Yuv422,
    /// planar YUV 4:4:4, the scaling back-end's working format for chroma-subsampled sources.
    Bpp24Yuv444,
    /// planar YUVA 4:4:4:4, the scaling back-end's working format for chroma-subsampled sources with alpha.
    Bpp32Yuva,
}

impl PixelFormat {
    /// Constant bits-per-pixel for this format.
    pub fn bits_per_pixel(self) -> u32 {
        use PixelFormat::*;
        match self {
            Unknown | Source => 0,
            Bpp1Mono | Bpp1Grayscale | Bpp1Indexed => 1,
            Bpp2Grayscale | Bpp2Indexed => 2,
            Bpp4Grayscale | Bpp4Indexed => 4,
            Bpp8Grayscale | Bpp8Indexed => 8,
            Bpp16Grayscale | Bpp16GrayscaleAlpha | Bpp16Indexed | Bpp16Rgb555 | Bpp16Bgr555
            | Bpp16Rgb565 | Bpp16Bgr565 | Bpp16Yuv422 => 16,
            Bpp24Rgb | Bpp24Bgr | Bpp24Ycbcr | Bpp24Yuv444 => 24,
            Bpp32GrayscaleAlpha | Bpp32Rgbx | Bpp32Bgrx | Bpp32Xrgb | Bpp32Xbgr | Bpp32Rgba
            | Bpp32Bgra | Bpp32Argb | Bpp32Abgr | Bpp32Cmyk | Bpp32Ycck | Bpp32Yuva => 32,
            Bpp48Rgb | Bpp48Bgr => 48,
            Bpp64Rgbx | Bpp64Bgrx | Bpp64Xrgb | Bpp64Xbgr | Bpp64Rgba | Bpp64Bgra | Bpp64Argb
            | Bpp64Abgr | Bpp64Cmyk => 64,
            Bpp12Yuv420 => 12,
        }
    }

    /// Minimum `bytes_per_line` for an image `width` pixels wide at this format.
    pub fn min_bytes_per_line(self, width: u32) -> u32 {
        let bits = width as u64 * self.bits_per_pixel() as u64;
        ((bits + 7) / 8) as u32
    }

    /// Whether pixels of this format are resolved through a [`crate::palette::Palette`].
    pub fn is_indexed(self) -> bool {
        use PixelFormat::*;
        matches!(
            self,
            Bpp1Indexed | Bpp2Indexed | Bpp4Indexed | Bpp8Indexed | Bpp16Indexed
        )
    }

    /// Whether this format packs more than one pixel per byte.
    pub fn is_sub_byte(self) -> bool {
        self.bits_per_pixel() < 8
    }

    /// Whether every channel occupies whole bytes, i.e. `bits_per_pixel % 8 == 0`.
    ///
    /// The scaling engine only operates directly on byte-aligned formats.
    pub fn is_byte_aligned(self) -> bool {
        self.bits_per_pixel() % 8 == 0
    }

    /// Whether this format carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        use PixelFormat::*;
        matches!(
            self,
            Bpp16GrayscaleAlpha
                | Bpp32GrayscaleAlpha
                | Bpp32Rgba
                | Bpp32Bgra
                | Bpp32Argb
                | Bpp32Abgr
                | Bpp64Rgba
                | Bpp64Bgra
                | Bpp64Argb
                | Bpp64Abgr
                | Bpp32Yuva
        )
    }

    /// Whether each channel sample is wider than 8 bits.
    pub fn is_wide(self) -> bool {
        use PixelFormat::*;
        matches!(
            self,
            Bpp16Grayscale
                | Bpp16GrayscaleAlpha
                | Bpp32GrayscaleAlpha
                | Bpp48Rgb
                | Bpp48Bgr
                | Bpp64Rgbx
                | Bpp64Bgrx
                | Bpp64Xrgb
                | Bpp64Xbgr
                | Bpp64Rgba
                | Bpp64Bgra
                | Bpp64Argb
                | Bpp64Abgr
                | Bpp64Cmyk
        )
    }

    /// The canonical descriptor-file / string-API name for this format.
    pub fn as_str(self) -> &'static str {
        use PixelFormat::*;
        match self {
            Unknown => "UNKNOWN",
            Source => "SOURCE",
            Bpp1Mono => "BPP1-MONO",
            Bpp1Grayscale => "BPP1-GRAYSCALE",
            Bpp2Grayscale => "BPP2-GRAYSCALE",
            Bpp4Grayscale => "BPP4-GRAYSCALE",
            Bpp8Grayscale => "BPP8-GRAYSCALE",
            Bpp16Grayscale => "BPP16-GRAYSCALE",
            Bpp16GrayscaleAlpha => "BPP16-GRAYSCALE-ALPHA",
            Bpp32GrayscaleAlpha => "BPP32-GRAYSCALE-ALPHA",
            Bpp1Indexed => "BPP1-INDEXED",
            Bpp2Indexed => "BPP2-INDEXED",
            Bpp4Indexed => "BPP4-INDEXED",
            Bpp8Indexed => "BPP8-INDEXED",
            Bpp16Indexed => "BPP16-INDEXED",
            Bpp16Rgb555 => "BPP16-RGB555",
            Bpp16Bgr555 => "BPP16-BGR555",
            Bpp16Rgb565 => "BPP16-RGB565",
            Bpp16Bgr565 => "BPP16-BGR565",
            Bpp24Rgb => "BPP24-RGB",
            Bpp24Bgr => "BPP24-BGR",
            Bpp48Rgb => "BPP48-RGB",
            Bpp48Bgr => "BPP48-BGR",
            Bpp32Rgbx => "BPP32-RGBX",
            Bpp32Bgrx => "BPP32-BGRX",
            Bpp32Xrgb => "BPP32-XRGB",
            Bpp32Xbgr => "BPP32-XBGR",
            Bpp32Rgba => "BPP32-RGBA",
            Bpp32Bgra => "BPP32-BGRA",
            Bpp32Argb => "BPP32-ARGB",
            Bpp32Abgr => "BPP32-ABGR",
            Bpp64Rgbx => "BPP64-RGBX",
            Bpp64Bgrx => "BPP64-BGRX",
            Bpp64Xrgb => "BPP64-XRGB",
            Bpp64Xbgr => "BPP64-XBGR",
            Bpp64Rgba => "BPP64-RGBA",
            Bpp64Bgra => "BPP64-BGRA",
            Bpp64Argb => "BPP64-ARGB",
            Bpp64Abgr => "BPP64-ABGR",
            Bpp32Cmyk => "BPP32-CMYK",
            Bpp64Cmyk => "BPP64-CMYK",
            Bpp24Ycbcr => "BPP24-YCBCR",
            Bpp32Ycck => "BPP32-YCCK",
            Bpp12Yuv420 => "BPP12-YUV420",
            Bpp16Yuv422 => "BPP16-YUV422",
            Bpp24Yuv444 => "BPP24-YUV444",
            Bpp32Yuva => "BPP32-YUVA",
        }
    }

    /// Parse a canonical string, as found in codec descriptor files.
    pub fn from_str_strict(s: &str) -> Result<Self> {
        use PixelFormat::*;
        Ok(match s {
            "UNKNOWN" => Unknown,
            "SOURCE" => Source,
            "BPP1-MONO" => Bpp1Mono,
            "BPP1-GRAYSCALE" => Bpp1Grayscale,
            "BPP2-GRAYSCALE" => Bpp2Grayscale,
            "BPP4-GRAYSCALE" => Bpp4Grayscale,
            "BPP8-GRAYSCALE" => Bpp8Grayscale,
            "BPP16-GRAYSCALE" => Bpp16Grayscale,
            "BPP16-GRAYSCALE-ALPHA" => Bpp16GrayscaleAlpha,
            "BPP32-GRAYSCALE-ALPHA" => Bpp32GrayscaleAlpha,
            "BPP1-INDEXED" => Bpp1Indexed,
            "BPP2-INDEXED" => Bpp2Indexed,
            "BPP4-INDEXED" => Bpp4Indexed,
            "BPP8-INDEXED" => Bpp8Indexed,
            "BPP16-INDEXED" => Bpp16Indexed,
            "BPP16-RGB555" => Bpp16Rgb555,
            "BPP16-BGR555" => Bpp16Bgr555,
            "BPP16-RGB565" => Bpp16Rgb565,
            "BPP16-BGR565" => Bpp16Bgr565,
            "BPP24-RGB" => Bpp24Rgb,
            "BPP24-BGR" => Bpp24Bgr,
            "BPP48-RGB" => Bpp48Rgb,
            "BPP48-BGR" => Bpp48Bgr,
            "BPP32-RGBX" => Bpp32Rgbx,
            "BPP32-BGRX" => Bpp32Bgrx,
            "BPP32-XRGB" => Bpp32Xrgb,
            "BPP32-XBGR" => Bpp32Xbgr,
            "BPP32-RGBA" => Bpp32Rgba,
            "BPP32-BGRA" => Bpp32Bgra,
            "BPP32-ARGB" => Bpp32Argb,
            "BPP32-ABGR" => Bpp32Abgr,
            "BPP64-RGBX" => Bpp64Rgbx,
            "BPP64-BGRX" => Bpp64Bgrx,
            "BPP64-XRGB" => Bpp64Xrgb,
            "BPP64-XBGR" => Bpp64Xbgr,
            "BPP64-RGBA" => Bpp64Rgba,
            "BPP64-BGRA" => Bpp64Bgra,
            "BPP64-ARGB" => Bpp64Argb,
            "BPP64-ABGR" => Bpp64Abgr,
            "BPP32-CMYK" => Bpp32Cmyk,
            "BPP64-CMYK" => Bpp64Cmyk,
            "BPP24-YCBCR" => Bpp24Ycbcr,
            "BPP32-YCCK" => Bpp32Ycck,
            "BPP12-YUV420" => Bpp12Yuv420,
            "BPP16-YUV422" => Bpp16Yuv422,
            "BPP24-YUV444" => Bpp24Yuv444,
            "BPP32-YUVA" => Bpp32Yuva,
            other => {
                tracing::debug!(value = other, "pixel format string not recognized");
                return Err(Error::UnsupportedPixelFormat("unrecognized pixel format string"));
            }
        })
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trips_for_every_format() {
        let all = [
            PixelFormat::Unknown,
            PixelFormat::Source,
            PixelFormat::Bpp1Mono,
            PixelFormat::Bpp1Grayscale,
            PixelFormat::Bpp8Grayscale,
            PixelFormat::Bpp16Grayscale,
            PixelFormat::Bpp16GrayscaleAlpha,
            PixelFormat::Bpp32GrayscaleAlpha,
            PixelFormat::Bpp8Indexed,
            PixelFormat::Bpp16Rgb565,
            PixelFormat::Bpp24Rgb,
            PixelFormat::Bpp48Bgr,
            PixelFormat::Bpp32Rgba,
            PixelFormat::Bpp64Abgr,
            PixelFormat::Bpp32Cmyk,
            PixelFormat::Bpp24Ycbcr,
            PixelFormat::Bpp32Ycck,
        ];
        for fmt in all {
            let s = fmt.as_str();
            assert_eq!(PixelFormat::from_str_strict(s).unwrap(), fmt);
        }
    }

    #[test]
    fn bits_per_pixel_matches_min_bytes_per_line() {
        assert_eq!(PixelFormat::Bpp24Rgb.min_bytes_per_line(10), 30);
        assert_eq!(PixelFormat::Bpp1Mono.min_bytes_per_line(10), 2);
        assert_eq!(PixelFormat::Bpp1Mono.min_bytes_per_line(8), 1);
        assert_eq!(PixelFormat::Bpp4Indexed.min_bytes_per_line(5), 3);
    }

    #[test]
    fn byte_alignment_and_indexed_classification() {
        assert!(!PixelFormat::Bpp1Grayscale.is_byte_aligned());
        assert!(PixelFormat::Bpp24Rgb.is_byte_aligned());
        assert!(PixelFormat::Bpp8Indexed.is_indexed());
        assert!(!PixelFormat::Bpp24Rgb.is_indexed());
        assert!(PixelFormat::Bpp32Rgba.has_alpha());
        assert!(!PixelFormat::Bpp24Rgb.has_alpha());
    }

    #[test]
    fn unrecognized_string_is_an_error() {
        assert!(PixelFormat::from_str_strict("NOT-A-FORMAT").is_err());
    }
}
