//! Resizing an image via nearest-neighbor, bilinear, bicubic, or Lanczos
//! resampling.
//!
//! Scaling always stages through an RGBA intermediate, exactly like
//! [`crate::convert`]: the source is converted to RGBA32 (or RGBA64 for
//! formats wider than 32 bits per pixel), resampled there, then converted
//! back to the original pixel format.

use tracing::{instrument, trace};

use sail_common::error::{Error, Result};
use sail_common::image::{Image, Pixels};
use sail_common::options::ConversionOptions;
use sail_common::pixel_format::PixelFormat;

use crate::convert;

const RGBA32: PixelFormat = PixelFormat::Bpp32Rgba;
const RGBA64: PixelFormat = PixelFormat::Bpp64Rgba;

/// Resampling kernel used by [`scale_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingAlgorithm {
    Nearest,
    Bilinear,
    /// Catmull-Rom / Keys cubic convolution with `a = -0.5`.
    Bicubic,
    /// Windowed sinc with support radius `a = 3`.
    Lanczos3,
}

fn clamp_i32(value: i32, max: i32) -> i32 {
    value.clamp(0, max)
}

fn cubic_kernel(x: f64) -> f64 {
    let x = x.abs();
    if x <= 1.0 {
        1.5 * x * x * x - 2.5 * x * x + 1.0
    } else if x <= 2.0 {
        -0.5 * x * x * x + 2.5 * x * x - 4.0 * x + 2.0
    } else {
        0.0
    }
}

fn lanczos_kernel(x: f64, a: i32) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    if x.abs() >= a as f64 {
        return 0.0;
    }
    let pi_x = std::f64::consts::PI * x;
    a as f64 * (pi_x).sin() * (pi_x / a as f64).sin() / (pi_x * pi_x)
}

/// Resize `image`, staging through an RGBA intermediate and converting back.
///
/// `new_width`/`new_height` must both be non-zero, and `image`'s pixel
/// format must be byte-aligned (no 1/2/4-bit packed formats).
#[instrument(skip(image), fields(from_w = image.width, from_h = image.height, to_w = new_width, to_h = new_height, ?algorithm))]
pub fn scale_image(image: &Image, new_width: u32, new_height: u32, algorithm: ScalingAlgorithm) -> Result<Image> {
    if new_width == 0 || new_height == 0 {
        return Err(Error::InvalidArgument("output dimensions must be greater than zero"));
    }
    if image.pixel_format.bits_per_pixel() % 8 != 0 {
        return Err(Error::UnsupportedPixelFormat(
            "only byte-aligned pixel formats are supported for scaling",
        ));
    }

    if image.width == new_width && image.height == new_height {
        trace!("requested dimensions match source, short-circuiting to a deep copy");
        return deep_copy(image);
    }

    let use_64bit = image.pixel_format.bits_per_pixel() > 32;
    let rgba_format = if use_64bit { RGBA64 } else { RGBA32 };
    let options = ConversionOptions::default();

    trace!(rgba_format = ?rgba_format, "staging through RGBA intermediate for resampling");
    let rgba = convert::convert(image, rgba_format, &options)?;
    let mut scaled = if use_64bit {
        scale_rgba64(&rgba, new_width, new_height, algorithm)?
    } else {
        scale_rgba32(&rgba, new_width, new_height, algorithm)?
    };

    scaled.delay = image.delay;
    scaled.gamma = image.gamma;
    scaled.meta_data = image.meta_data.clone();
    scaled.iccp = image.iccp.clone();
    scaled.resolution = image.resolution;
    scaled.source_image = image.source_image.clone();
    scaled.orientation = image.orientation;

    if scaled.pixel_format == image.pixel_format {
        Ok(scaled)
    } else {
        convert::convert(&scaled, image.pixel_format, &options)
    }
}

fn deep_copy(image: &Image) -> Result<Image> {
    let mut out = image.skeleton_copy()?;
    if let Pixels::Owned(ref mut dst) = out.pixels {
        dst.copy_from_slice(image.pixels.as_slice());
    }
    Ok(out)
}

fn read_u16_ne(bytes: &[u8]) -> u16 {
    u16::from_ne_bytes([bytes[0], bytes[1]])
}

fn write_u16_ne(out: &mut [u8], value: u16) {
    out.copy_from_slice(&value.to_ne_bytes());
}

fn sample_rgba32(buf: &[u8], width: u32, height: u32, bytes_per_line: u32, x: i32, y: i32) -> [f64; 4] {
    let x = clamp_i32(x, width as i32 - 1) as usize;
    let y = clamp_i32(y, height as i32 - 1) as usize;
    let offset = y * bytes_per_line as usize + x * 4;
    [
        buf[offset] as f64,
        buf[offset + 1] as f64,
        buf[offset + 2] as f64,
        buf[offset + 3] as f64,
    ]
}

fn sample_rgba64(buf: &[u8], width: u32, height: u32, bytes_per_line: u32, x: i32, y: i32) -> [f64; 4] {
    let x = clamp_i32(x, width as i32 - 1) as usize;
    let y = clamp_i32(y, height as i32 - 1) as usize;
    let offset = y * bytes_per_line as usize + x * 8;
    [
        read_u16_ne(&buf[offset..offset + 2]) as f64,
        read_u16_ne(&buf[offset + 2..offset + 4]) as f64,
        read_u16_ne(&buf[offset + 4..offset + 6]) as f64,
        read_u16_ne(&buf[offset + 6..offset + 8]) as f64,
    ]
}

/// Resample an RGBA32 image to `new_width`x`new_height`.
fn scale_rgba32(src: &Image, new_width: u32, new_height: u32, algorithm: ScalingAlgorithm) -> Result<Image> {
    let mut out = Image::new_owned(new_width, new_height, RGBA32)?;
    let src_buf = src.pixels.as_slice();
    let out_bpl = out.bytes_per_line as usize;
    let out_buf = match &mut out.pixels {
        Pixels::Owned(v) => v,
        Pixels::Borrowed(..) => unreachable!("freshly allocated image is always owned"),
    };

    let x_ratio = src.width as f64 / new_width as f64;
    let y_ratio = src.height as f64 / new_height as f64;

    for oy in 0..new_height {
        let row = &mut out_buf[oy as usize * out_bpl..(oy as usize + 1) * out_bpl];
        for ox in 0..new_width {
            let channels = resample(
                |x, y| sample_rgba32(src_buf, src.width, src.height, src.bytes_per_line, x, y),
                ox,
                oy,
                x_ratio,
                y_ratio,
                algorithm,
            );
            let p = &mut row[ox as usize * 4..ox as usize * 4 + 4];
            for (i, v) in channels.iter().enumerate() {
                p[i] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    Ok(out)
}

/// 16-bit-per-channel equivalent of [`scale_rgba32`].
fn scale_rgba64(src: &Image, new_width: u32, new_height: u32, algorithm: ScalingAlgorithm) -> Result<Image> {
    let mut out = Image::new_owned(new_width, new_height, RGBA64)?;
    let src_buf = src.pixels.as_slice();
    let out_bpl = out.bytes_per_line as usize;
    let out_buf = match &mut out.pixels {
        Pixels::Owned(v) => v,
        Pixels::Borrowed(..) => unreachable!("freshly allocated image is always owned"),
    };

    let x_ratio = src.width as f64 / new_width as f64;
    let y_ratio = src.height as f64 / new_height as f64;

    for oy in 0..new_height {
        let row = &mut out_buf[oy as usize * out_bpl..(oy as usize + 1) * out_bpl];
        for ox in 0..new_width {
            let channels = resample(
                |x, y| sample_rgba64(src_buf, src.width, src.height, src.bytes_per_line, x, y),
                ox,
                oy,
                x_ratio,
                y_ratio,
                algorithm,
            );
            for (i, v) in channels.iter().enumerate() {
                write_u16_ne(&mut row[ox as usize * 8 + i * 2..ox as usize * 8 + i * 2 + 2], v.round().clamp(0.0, 65535.0) as u16);
            }
        }
    }

    Ok(out)
}

/// Resample one output pixel at `(ox, oy)` using `algorithm`, calling `sample`
/// for every source pixel the kernel touches.
fn resample(
    sample: impl Fn(i32, i32) -> [f64; 4],
    ox: u32,
    oy: u32,
    x_ratio: f64,
    y_ratio: f64,
    algorithm: ScalingAlgorithm,
) -> [f64; 4] {
    let src_x = (ox as f64 + 0.5) * x_ratio - 0.5;
    let src_y = (oy as f64 + 0.5) * y_ratio - 0.5;

    match algorithm {
        ScalingAlgorithm::Nearest => sample(src_x.round() as i32, src_y.round() as i32),
        ScalingAlgorithm::Bilinear => {
            let x0 = src_x.floor();
            let y0 = src_y.floor();
            let fx = src_x - x0;
            let fy = src_y - y0;
            let (x0, y0) = (x0 as i32, y0 as i32);

            let p00 = sample(x0, y0);
            let p10 = sample(x0 + 1, y0);
            let p01 = sample(x0, y0 + 1);
            let p11 = sample(x0 + 1, y0 + 1);

            let mut out = [0.0; 4];
            for i in 0..4 {
                let top = p00[i] * (1.0 - fx) + p10[i] * fx;
                let bottom = p01[i] * (1.0 - fx) + p11[i] * fx;
                out[i] = top * (1.0 - fy) + bottom * fy;
            }
            out
        }
        ScalingAlgorithm::Bicubic => {
            let x0 = src_x.floor() as i32;
            let y0 = src_y.floor() as i32;
            let mut out = [0.0; 4];
            let mut weight_sum = 0.0;

            for ky in -1..=2 {
                let wy = cubic_kernel(src_y - (y0 + ky) as f64);
                for kx in -1..=2 {
                    let wx = cubic_kernel(src_x - (x0 + kx) as f64);
                    let w = wx * wy;
                    let p = sample(x0 + kx, y0 + ky);
                    for i in 0..4 {
                        out[i] += p[i] * w;
                    }
                    weight_sum += w;
                }
            }
            if weight_sum != 0.0 {
                for v in out.iter_mut() {
                    *v /= weight_sum;
                }
            }
            out
        }
        ScalingAlgorithm::Lanczos3 => {
            const A: i32 = 3;
            let x0 = src_x.floor() as i32;
            let y0 = src_y.floor() as i32;
            let mut out = [0.0; 4];
            let mut weight_sum = 0.0;

            for ky in -(A - 1)..=A {
                let wy = lanczos_kernel(src_y - (y0 + ky) as f64, A);
                for kx in -(A - 1)..=A {
                    let wx = lanczos_kernel(src_x - (x0 + kx) as f64, A);
                    let w = wx * wy;
                    let p = sample(x0 + kx, y0 + ky);
                    for i in 0..4 {
                        out[i] += p[i] * w;
                    }
                    weight_sum += w;
                }
            }
            if weight_sum != 0.0 {
                for v in out.iter_mut() {
                    *v /= weight_sum;
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_rgba32(w: u32, h: u32, r: u8, g: u8, b: u8, a: u8) -> Image {
        let mut img = Image::new_owned(w, h, RGBA32).unwrap();
        if let Pixels::Owned(ref mut v) = img.pixels {
            for px in v.chunks_mut(4) {
                px.copy_from_slice(&[r, g, b, a]);
            }
        }
        img
    }

    #[test]
    fn rejects_zero_dimensions() {
        let img = solid_rgba32(2, 2, 1, 2, 3, 255);
        assert!(scale_image(&img, 0, 4, ScalingAlgorithm::Nearest).is_err());
    }

    #[test]
    fn same_dimensions_is_a_deep_copy() {
        let img = solid_rgba32(2, 2, 10, 20, 30, 255);
        let out = scale_image(&img, 2, 2, ScalingAlgorithm::Bilinear).unwrap();
        assert_eq!(out.row(0).unwrap(), img.row(0).unwrap());
    }

    #[test]
    fn solid_color_scales_to_the_same_solid_color() {
        let img = solid_rgba32(4, 4, 64, 128, 192, 255);
        for algorithm in [
            ScalingAlgorithm::Nearest,
            ScalingAlgorithm::Bilinear,
            ScalingAlgorithm::Bicubic,
            ScalingAlgorithm::Lanczos3,
        ] {
            let out = scale_image(&img, 2, 2, algorithm).unwrap();
            assert_eq!(out.width, 2);
            assert_eq!(out.height, 2);
            for px in out.pixels.as_slice().chunks(4) {
                assert_eq!(px, &[64, 128, 192, 255]);
            }
        }
    }

    #[test]
    fn upscaling_preserves_a_solid_color() {
        let img = solid_rgba32(2, 2, 5, 6, 7, 255);
        let out = scale_image(&img, 8, 8, ScalingAlgorithm::Lanczos3).unwrap();
        for px in out.pixels.as_slice().chunks(4) {
            assert_eq!(px, &[5, 6, 7, 255]);
        }
    }

    #[test]
    fn rejects_sub_byte_pixel_formats() {
        let img = Image::new_owned(2, 2, PixelFormat::Bpp1Grayscale).unwrap();
        assert!(scale_image(&img, 4, 4, ScalingAlgorithm::Nearest).is_err());
    }
}
