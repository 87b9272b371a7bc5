//! Pixel-format conversion via an RGBA32 or RGBA64 intermediate.
//!
//! Every supported pair of formats is reached by unpacking the source into
//! one of the two RGBA intermediates and packing that into the target
//! format; direct same-family conversions are not special-cased.

use sail_common::error::{Error, Result};
use sail_common::image::{Image, Pixels};
use sail_common::options::{ConversionOptions, SaveFeatures};
use sail_common::palette::Palette;
use sail_common::pixel_format::PixelFormat;

use tracing::{instrument, trace};

use crate::cmyk::{cmyk_to_rgb_u16, cmyk_to_rgb_u8};
use crate::manip_utils::{fill_rgba32_pixel_from_u16, fill_rgba32_pixel_from_u8, fill_rgba64_pixel_from_u16};
use crate::ycbcr::ycbcr_to_rgb;

const RGBA32: PixelFormat = PixelFormat::Bpp32Rgba;
const RGBA64: PixelFormat = PixelFormat::Bpp64Rgba;

fn offsets_32(fmt: PixelFormat) -> Option<(usize, usize, usize, Option<usize>)> {
    use PixelFormat::*;
    Some(match fmt {
        Bpp32Rgbx => (0, 1, 2, None),
        Bpp32Bgrx => (2, 1, 0, None),
        Bpp32Xrgb => (1, 2, 3, None),
        Bpp32Xbgr => (3, 2, 1, None),
        Bpp32Rgba => (0, 1, 2, Some(3)),
        Bpp32Bgra => (2, 1, 0, Some(3)),
        Bpp32Argb => (1, 2, 3, Some(0)),
        Bpp32Abgr => (3, 2, 1, Some(0)),
        _ => return None,
    })
}

fn offsets_64(fmt: PixelFormat) -> Option<(usize, usize, usize, Option<usize>)> {
    use PixelFormat::*;
    Some(match fmt {
        Bpp64Rgbx => (0, 1, 2, None),
        Bpp64Bgrx => (2, 1, 0, None),
        Bpp64Xrgb => (1, 2, 3, None),
        Bpp64Xbgr => (3, 2, 1, None),
        Bpp64Rgba => (0, 1, 2, Some(3)),
        Bpp64Bgra => (2, 1, 0, Some(3)),
        Bpp64Argb => (1, 2, 3, Some(0)),
        Bpp64Abgr => (3, 2, 1, Some(0)),
        _ => return None,
    })
}

fn read_u16_ne(bytes: &[u8]) -> u16 {
    u16::from_ne_bytes([bytes[0], bytes[1]])
}

fn write_u16_ne(out: &mut [u8], value: u16) {
    out.copy_from_slice(&value.to_ne_bytes());
}

/// Extract the `width` MSB-first sub-byte indices from one packed row.
fn unpack_bits(row: &[u8], width: u32, bits: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(width as usize);
    let per_byte = 8 / bits;
    let mut col = 0u32;
    for &byte in row {
        for slot in 0..per_byte {
            if col >= width {
                break;
            }
            let shift = 8 - bits - slot * bits;
            let mask = ((1u16 << bits) - 1) as u8;
            out.push((byte >> shift) & mask);
            col += 1;
        }
        if col >= width {
            break;
        }
    }
    out
}

fn gray_scale_to_u8(index: u8, bits: u32) -> u8 {
    match bits {
        1 => {
            if index == 0 {
                0
            } else {
                255
            }
        }
        2 => index * 85,
        4 => index * 17,
        8 => index,
        _ => unreachable!("unsupported sub-byte bit depth"),
    }
}

fn palette_lookup(palette: &Palette, index: u8) -> Result<(u8, u8, u8, Option<u8>)> {
    let entry = palette.entry(index as u32)?;
    match palette.pixel_format() {
        PixelFormat::Bpp24Rgb => Ok((entry[0], entry[1], entry[2], None)),
        PixelFormat::Bpp32Rgba => Ok((entry[0], entry[1], entry[2], Some(entry[3]))),
        _ => Err(Error::UnsupportedPixelFormat(
            "palette pixel format must be RGB24 or RGBA32",
        )),
    }
}

/// Convert `src` into a freshly-allocated RGBA32 or RGBA64 image.
///
/// Alpha is never dropped or blended here: a source with no alpha channel
/// gets full opacity in the intermediate. The drop/blend policy applies only
/// when packing back down to a target format that itself lacks alpha.
fn unpack_to_rgba(src: &Image, wide: bool) -> Result<Image> {
    let target = if wide { RGBA64 } else { RGBA32 };
    let mut out = Image::new_owned(src.width, src.height, target)?;
    let bytes_per_line_out = out.bytes_per_line as usize;
    let out_buf = match &mut out.pixels {
        Pixels::Owned(v) => v,
        Pixels::Borrowed(..) => unreachable!("freshly allocated image is always owned"),
    };

    for y in 0..src.height {
        let in_row = src.row(y)?;
        let out_row = &mut out_buf[y as usize * bytes_per_line_out..(y as usize + 1) * bytes_per_line_out];

        match src.pixel_format {
            PixelFormat::Bpp1Indexed
            | PixelFormat::Bpp2Indexed
            | PixelFormat::Bpp4Indexed
            | PixelFormat::Bpp8Indexed => {
                let bits = src.pixel_format.bits_per_pixel();
                let palette = src.palette.as_ref().ok_or(Error::IncompleteCodecInfo(
                    "indexed image requires a palette",
                ))?;
                let indices = unpack_bits(in_row, src.width, bits);
                for (x, index) in indices.into_iter().enumerate() {
                    let (r, g, b, a) = palette_lookup(palette, index)?;
                    write_unpacked_pixel(out_row, x, wide, r, g, b, a);
                }
            }
            PixelFormat::Bpp1Grayscale | PixelFormat::Bpp2Grayscale | PixelFormat::Bpp4Grayscale => {
                let bits = src.pixel_format.bits_per_pixel();
                let indices = unpack_bits(in_row, src.width, bits);
                for (x, index) in indices.into_iter().enumerate() {
                    let v = gray_scale_to_u8(index, bits);
                    write_unpacked_pixel(out_row, x, wide, v, v, v, None);
                }
            }
            PixelFormat::Bpp8Grayscale => {
                for x in 0..src.width as usize {
                    let v = in_row[x];
                    write_unpacked_pixel(out_row, x, wide, v, v, v, None);
                }
            }
            PixelFormat::Bpp16Grayscale => {
                for x in 0..src.width as usize {
                    let v = read_u16_ne(&in_row[x * 2..x * 2 + 2]);
                    write_unpacked_pixel_wide(out_row, x, wide, v, v, v, None);
                }
            }
            PixelFormat::Bpp16GrayscaleAlpha => {
                for x in 0..src.width as usize {
                    let v = in_row[x * 2];
                    let a = in_row[x * 2 + 1];
                    write_unpacked_pixel(out_row, x, wide, v, v, v, Some(a));
                }
            }
            PixelFormat::Bpp32GrayscaleAlpha => {
                for x in 0..src.width as usize {
                    let v = read_u16_ne(&in_row[x * 4..x * 4 + 2]);
                    let a = read_u16_ne(&in_row[x * 4 + 2..x * 4 + 4]);
                    write_unpacked_pixel_wide(out_row, x, wide, v, v, v, Some(a));
                }
            }
            PixelFormat::Bpp24Rgb => {
                for x in 0..src.width as usize {
                    let p = &in_row[x * 3..x * 3 + 3];
                    write_unpacked_pixel(out_row, x, wide, p[0], p[1], p[2], None);
                }
            }
            PixelFormat::Bpp24Bgr => {
                for x in 0..src.width as usize {
                    let p = &in_row[x * 3..x * 3 + 3];
                    write_unpacked_pixel(out_row, x, wide, p[2], p[1], p[0], None);
                }
            }
            PixelFormat::Bpp48Rgb => {
                for x in 0..src.width as usize {
                    let p = &in_row[x * 6..x * 6 + 6];
                    let r = read_u16_ne(&p[0..2]);
                    let g = read_u16_ne(&p[2..4]);
                    let b = read_u16_ne(&p[4..6]);
                    write_unpacked_pixel_wide(out_row, x, wide, r, g, b, None);
                }
            }
            PixelFormat::Bpp48Bgr => {
                for x in 0..src.width as usize {
                    let p = &in_row[x * 6..x * 6 + 6];
                    let b = read_u16_ne(&p[0..2]);
                    let g = read_u16_ne(&p[2..4]);
                    let r = read_u16_ne(&p[4..6]);
                    write_unpacked_pixel_wide(out_row, x, wide, r, g, b, None);
                }
            }
            PixelFormat::Bpp16Rgb555 | PixelFormat::Bpp16Bgr555 => {
                for x in 0..src.width as usize {
                    let v = read_u16_ne(&in_row[x * 2..x * 2 + 2]);
                    let a = (v >> 10) & 0x1f;
                    let b = (v >> 5) & 0x1f;
                    let c = v & 0x1f;
                    let scale5 = |c: u16| -> u8 { ((c << 3) | (c >> 2)) as u8 };
                    let (r, g, bl) = if src.pixel_format == PixelFormat::Bpp16Rgb555 {
                        (scale5(a), scale5(b), scale5(c))
                    } else {
                        (scale5(c), scale5(b), scale5(a))
                    };
                    write_unpacked_pixel(out_row, x, wide, r, g, bl, None);
                }
            }
            PixelFormat::Bpp16Rgb565 | PixelFormat::Bpp16Bgr565 => {
                for x in 0..src.width as usize {
                    let v = read_u16_ne(&in_row[x * 2..x * 2 + 2]);
                    let a = (v >> 11) & 0x1f;
                    let b = (v >> 5) & 0x3f;
                    let c = v & 0x1f;
                    let scale5 = |c: u16| -> u8 { ((c << 3) | (c >> 2)) as u8 };
                    let scale6 = |c: u16| -> u8 { ((c << 2) | (c >> 4)) as u8 };
                    let (r, g, bl) = if src.pixel_format == PixelFormat::Bpp16Rgb565 {
                        (scale5(a), scale6(b), scale5(c))
                    } else {
                        (scale5(c), scale6(b), scale5(a))
                    };
                    write_unpacked_pixel(out_row, x, wide, r, g, bl, None);
                }
            }
            fmt if offsets_32(fmt).is_some() => {
                let (ri, gi, bi, ai) = offsets_32(fmt).unwrap();
                for x in 0..src.width as usize {
                    let p = &in_row[x * 4..x * 4 + 4];
                    let a = ai.map(|i| p[i]);
                    write_unpacked_pixel(out_row, x, wide, p[ri], p[gi], p[bi], a);
                }
            }
            fmt if offsets_64(fmt).is_some() => {
                let (ri, gi, bi, ai) = offsets_64(fmt).unwrap();
                for x in 0..src.width as usize {
                    let p = &in_row[x * 8..x * 8 + 8];
                    let r = read_u16_ne(&p[ri * 2..ri * 2 + 2]);
                    let g = read_u16_ne(&p[gi * 2..gi * 2 + 2]);
                    let b = read_u16_ne(&p[bi * 2..bi * 2 + 2]);
                    let a = ai.map(|i| read_u16_ne(&p[i * 2..i * 2 + 2]));
                    write_unpacked_pixel_wide(out_row, x, wide, r, g, b, a);
                }
            }
            PixelFormat::Bpp32Cmyk => {
                for x in 0..src.width as usize {
                    let p = &in_row[x * 4..x * 4 + 4];
                    let (r, g, b) = cmyk_to_rgb_u8(p[0], p[1], p[2], p[3]);
                    write_unpacked_pixel(out_row, x, wide, r, g, b, None);
                }
            }
            PixelFormat::Bpp64Cmyk => {
                for x in 0..src.width as usize {
                    let p = &in_row[x * 8..x * 8 + 8];
                    let c = read_u16_ne(&p[0..2]);
                    let m = read_u16_ne(&p[2..4]);
                    let y = read_u16_ne(&p[4..6]);
                    let k = read_u16_ne(&p[6..8]);
                    let (r, g, b) = cmyk_to_rgb_u16(c, m, y, k);
                    write_unpacked_pixel_wide(out_row, x, wide, r, g, b, None);
                }
            }
            PixelFormat::Bpp24Ycbcr => {
                for x in 0..src.width as usize {
                    let p = &in_row[x * 3..x * 3 + 3];
                    let (r, g, b) = ycbcr_to_rgb(p[0], p[1], p[2]);
                    write_unpacked_pixel(out_row, x, wide, r, g, b, None);
                }
            }
            other => {
                return Err(Error::UnsupportedPixelFormat(pixel_format_unsupported_reason(other)))
            }
        }
    }

    Ok(out)
}

fn pixel_format_unsupported_reason(fmt: PixelFormat) -> &'static str {
    match fmt {
        PixelFormat::Bpp32Ycck => "YCCK is not a supported conversion endpoint",
        PixelFormat::Bpp16Indexed => "16-bit indexed is not a supported conversion endpoint",
        PixelFormat::Bpp12Yuv420
        | PixelFormat::Bpp16Yuv422
        | PixelFormat::Bpp24Yuv444
        | PixelFormat::Bpp32Yuva => "planar YUV formats are only used by the scaling back-end",
        PixelFormat::Unknown | PixelFormat::Source => "not a concrete pixel format",
        _ => "unsupported pixel format for this conversion",
    }
}

/// Write one unpacked pixel into an RGBA32 or RGBA64 intermediate scanline.
///
/// A source pixel with no alpha channel (`a == None`) always gets full
/// opacity here; there is no drop/blend policy on the unpack side.
fn write_unpacked_pixel(out_row: &mut [u8], x: usize, wide: bool, r: u8, g: u8, b: u8, a: Option<u8>) {
    if wide {
        let scan = &mut out_row[x * 8..x * 8 + 8];
        write_u16_ne(&mut scan[0..2], r as u16 * 257);
        write_u16_ne(&mut scan[2..4], g as u16 * 257);
        write_u16_ne(&mut scan[4..6], b as u16 * 257);
        write_u16_ne(&mut scan[6..8], a.map(|v| v as u16 * 257).unwrap_or(u16::MAX));
    } else {
        let scan = &mut out_row[x * 4..x * 4 + 4];
        scan[0] = r;
        scan[1] = g;
        scan[2] = b;
        scan[3] = a.unwrap_or(u8::MAX);
    }
}

/// 16-bit-per-channel equivalent of [`write_unpacked_pixel`].
fn write_unpacked_pixel_wide(out_row: &mut [u8], x: usize, wide: bool, r: u16, g: u16, b: u16, a: Option<u16>) {
    if wide {
        let scan = &mut out_row[x * 8..x * 8 + 8];
        write_u16_ne(&mut scan[0..2], r);
        write_u16_ne(&mut scan[2..4], g);
        write_u16_ne(&mut scan[4..6], b);
        write_u16_ne(&mut scan[6..8], a.unwrap_or(u16::MAX));
    } else {
        let scan = &mut out_row[x * 4..x * 4 + 4];
        scan[0] = (r / 257) as u8;
        scan[1] = (g / 257) as u8;
        scan[2] = (b / 257) as u8;
        scan[3] = a.map(|v| (v / 257) as u8).unwrap_or(u8::MAX);
    }
}

/// Convert an RGBA32/RGBA64 intermediate image into `target`.
///
/// The DROP_ALPHA/BLEND_ALPHA policy in `options` is applied here, and only
/// here: the intermediate's alpha channel is always fully populated (opaque
/// where the original source had none), and gets blended against the
/// background or simply dropped whenever `target` itself has no alpha slot.
fn pack_from_rgba(rgba: &Image, target: PixelFormat, options: &ConversionOptions) -> Result<Image> {
    let wide_source = rgba.pixel_format == RGBA64;
    let mut out = Image::new_owned(rgba.width, rgba.height, target)?;
    let bytes_per_line_out = out.bytes_per_line as usize;
    let out_buf = match &mut out.pixels {
        Pixels::Owned(v) => v,
        Pixels::Borrowed(..) => unreachable!("freshly allocated image is always owned"),
    };

    for y in 0..rgba.height {
        let in_row = rgba.row(y)?;
        let out_row = &mut out_buf[y as usize * bytes_per_line_out..(y as usize + 1) * bytes_per_line_out];

        for x in 0..rgba.width as usize {
            if wide_source {
                let p = &in_row[x * 8..x * 8 + 8];
                let r = read_u16_ne(&p[0..2]);
                let g = read_u16_ne(&p[2..4]);
                let b = read_u16_ne(&p[4..6]);
                let a = read_u16_ne(&p[6..8]);
                write_packed_pixel_from_u16(out_row, x, target, r, g, b, a, options)?;
            } else {
                let p = &in_row[x * 4..x * 4 + 4];
                write_packed_pixel_from_u8(out_row, x, target, p[0], p[1], p[2], p[3], options)?;
            }
        }
    }

    Ok(out)
}

fn blend_gray_u8(gray: u8, alpha: u8, options: &ConversionOptions) -> u8 {
    if options.should_blend() {
        let opacity = alpha as f64 / 255.0;
        let bg = options.background24;
        let bg_gray = (bg.r as u32 + bg.g as u32 + bg.b as u32) / 3;
        (opacity * gray as f64 + (1.0 - opacity) * bg_gray as f64) as u8
    } else {
        gray
    }
}

fn blend_gray_u16(gray: u16, alpha: u16, options: &ConversionOptions) -> u16 {
    if options.should_blend() {
        let opacity = alpha as f64 / 65535.0;
        let bg = options.background48;
        let bg_gray = (bg.r as u32 + bg.g as u32 + bg.b as u32) / 3;
        (opacity * gray as f64 + (1.0 - opacity) * bg_gray as f64) as u16
    } else {
        gray
    }
}

/// Pack one pixel whose source channels are 8-bit (read straight out of an
/// RGBA32 intermediate). Only narrow (8-bit-channel) targets are reachable
/// here, since a wide target forces an RGBA64 intermediate upstream.
fn write_packed_pixel_from_u8(
    out_row: &mut [u8],
    x: usize,
    target: PixelFormat,
    r: u8,
    g: u8,
    b: u8,
    a: u8,
    options: &ConversionOptions,
) -> Result<()> {
    match target {
        PixelFormat::Bpp8Grayscale => {
            let gray = ((r as u32 + g as u32 + b as u32) / 3) as u8;
            out_row[x] = blend_gray_u8(gray, a, options);
        }
        PixelFormat::Bpp16GrayscaleAlpha => {
            out_row[x * 2] = ((r as u32 + g as u32 + b as u32) / 3) as u8;
            out_row[x * 2 + 1] = a;
        }
        PixelFormat::Bpp24Rgb => {
            fill_rgba32_pixel_from_u8(r, g, b, Some(a), &mut out_row[x * 3..x * 3 + 3], 0, 1, 2, None, options);
        }
        PixelFormat::Bpp24Bgr => {
            fill_rgba32_pixel_from_u8(r, g, b, Some(a), &mut out_row[x * 3..x * 3 + 3], 2, 1, 0, None, options);
        }
        fmt if offsets_32(fmt).is_some() => {
            let (ri, gi, bi, ai) = offsets_32(fmt).unwrap();
            fill_rgba32_pixel_from_u8(r, g, b, Some(a), &mut out_row[x * 4..x * 4 + 4], ri, gi, bi, ai, options);
        }
        _ => {
            return Err(Error::UnsupportedPixelFormat(
                "engine does not produce this output pixel format",
            ))
        }
    }
    Ok(())
}

/// Pack one pixel whose source channels are 16-bit (read out of an RGBA64
/// intermediate), dispatching to an 8-bit- or 16-bit-channel target.
fn write_packed_pixel_from_u16(
    out_row: &mut [u8],
    x: usize,
    target: PixelFormat,
    r: u16,
    g: u16,
    b: u16,
    a: u16,
    options: &ConversionOptions,
) -> Result<()> {
    match target {
        PixelFormat::Bpp8Grayscale => {
            let gray8 = ((r as u32 + g as u32 + b as u32) / 3 / 257) as u8;
            out_row[x] = blend_gray_u8(gray8, (a / 257) as u8, options);
        }
        PixelFormat::Bpp16GrayscaleAlpha => {
            out_row[x * 2] = ((r as u32 + g as u32 + b as u32) / 3 / 257) as u8;
            out_row[x * 2 + 1] = (a / 257) as u8;
        }
        PixelFormat::Bpp16Grayscale => {
            let gray16 = ((r as u32 + g as u32 + b as u32) / 3) as u16;
            write_u16_ne(&mut out_row[x * 2..x * 2 + 2], blend_gray_u16(gray16, a, options));
        }
        PixelFormat::Bpp32GrayscaleAlpha => {
            let gray16 = ((r as u32 + g as u32 + b as u32) / 3) as u16;
            write_u16_ne(&mut out_row[x * 4..x * 4 + 2], blend_gray_u16(gray16, a, options));
            write_u16_ne(&mut out_row[x * 4 + 2..x * 4 + 4], a);
        }
        PixelFormat::Bpp24Rgb => {
            fill_rgba32_pixel_from_u16(r, g, b, Some(a), &mut out_row[x * 3..x * 3 + 3], 0, 1, 2, None, options);
        }
        PixelFormat::Bpp24Bgr => {
            fill_rgba32_pixel_from_u16(r, g, b, Some(a), &mut out_row[x * 3..x * 3 + 3], 2, 1, 0, None, options);
        }
        PixelFormat::Bpp48Rgb => {
            let mut scan = [0u16; 3];
            fill_rgba64_pixel_from_u16(r, g, b, Some(a), &mut scan, 0, 1, 2, None, options);
            for (i, v) in scan.iter().enumerate() {
                write_u16_ne(&mut out_row[x * 6 + i * 2..x * 6 + i * 2 + 2], *v);
            }
        }
        PixelFormat::Bpp48Bgr => {
            let mut scan = [0u16; 3];
            fill_rgba64_pixel_from_u16(r, g, b, Some(a), &mut scan, 2, 1, 0, None, options);
            for (i, v) in scan.iter().enumerate() {
                write_u16_ne(&mut out_row[x * 6 + i * 2..x * 6 + i * 2 + 2], *v);
            }
        }
        fmt if offsets_32(fmt).is_some() => {
            let (ri, gi, bi, ai) = offsets_32(fmt).unwrap();
            fill_rgba32_pixel_from_u16(r, g, b, Some(a), &mut out_row[x * 4..x * 4 + 4], ri, gi, bi, ai, options);
        }
        fmt if offsets_64(fmt).is_some() => {
            let (ri, gi, bi, ai) = offsets_64(fmt).unwrap();
            let mut scan = [0u16; 4];
            fill_rgba64_pixel_from_u16(r, g, b, Some(a), &mut scan, ri, gi, bi, ai, options);
            for (i, v) in scan.iter().enumerate() {
                write_u16_ne(&mut out_row[x * 8 + i * 2..x * 8 + i * 2 + 2], *v);
            }
        }
        _ => {
            return Err(Error::UnsupportedPixelFormat(
                "engine does not produce this output pixel format",
            ))
        }
    }
    Ok(())
}

/// Whether a target is one the engine can produce at all (used by
/// [`closest_pixel_format`] and [`can_convert`]).
fn is_producible_output(fmt: PixelFormat) -> bool {
    use PixelFormat::*;
    matches!(
        fmt,
        Bpp8Grayscale
            | Bpp16Grayscale
            | Bpp16GrayscaleAlpha
            | Bpp32GrayscaleAlpha
            | Bpp24Rgb
            | Bpp24Bgr
            | Bpp48Rgb
            | Bpp48Bgr
    ) || offsets_32(fmt).is_some()
        || offsets_64(fmt).is_some()
}

/// Whether the engine can decode `fmt` as a conversion source.
fn is_consumable_input(fmt: PixelFormat) -> bool {
    use PixelFormat::*;
    matches!(
        fmt,
        Bpp1Indexed
            | Bpp2Indexed
            | Bpp4Indexed
            | Bpp8Indexed
            | Bpp1Grayscale
            | Bpp2Grayscale
            | Bpp4Grayscale
            | Bpp8Grayscale
            | Bpp16Grayscale
            | Bpp16GrayscaleAlpha
            | Bpp32GrayscaleAlpha
            | Bpp24Rgb
            | Bpp24Bgr
            | Bpp48Rgb
            | Bpp48Bgr
            | Bpp16Rgb555
            | Bpp16Bgr555
            | Bpp16Rgb565
            | Bpp16Bgr565
            | Bpp32Cmyk
            | Bpp64Cmyk
            | Bpp24Ycbcr
    ) || offsets_32(fmt).is_some()
        || offsets_64(fmt).is_some()
}

/// Whether a source-to-target conversion is implemented.
pub fn can_convert(from: PixelFormat, to: PixelFormat) -> bool {
    is_consumable_input(from) && is_producible_output(to)
}

/// Convert `image` to `target`, staging through an RGBA32 or RGBA64 intermediate.
#[instrument(skip(image, options), fields(from = ?image.pixel_format, to = ?target))]
pub fn convert(image: &Image, target: PixelFormat, options: &ConversionOptions) -> Result<Image> {
    if !is_consumable_input(image.pixel_format) {
        return Err(Error::UnsupportedPixelFormat(pixel_format_unsupported_reason(
            image.pixel_format,
        )));
    }
    if !is_producible_output(target) {
        return Err(Error::UnsupportedPixelFormat(
            "engine does not produce this output pixel format",
        ));
    }

    let wide = image.pixel_format.is_wide() || target.is_wide();
    trace!(wide, "staging through RGBA{} intermediate", if wide { 64 } else { 32 });
    let rgba = unpack_to_rgba(image, wide)?;

    let mut out = if target == rgba.pixel_format {
        rgba
    } else {
        pack_from_rgba(&rgba, target, options)?
    };

    out.delay = image.delay;
    out.gamma = image.gamma;
    out.meta_data = image.meta_data.clone();
    out.iccp = image.iccp.clone();
    out.resolution = image.resolution;
    out.source_image = image.source_image.clone();
    out.orientation = image.orientation;
    Ok(out)
}

/// Convert `image` to the best format `save_features` advertises.
pub fn convert_to(
    image: &Image,
    save_features: &SaveFeatures,
    options: &ConversionOptions,
) -> Result<Image> {
    let target = closest_pixel_format(image.pixel_format, &save_features.pixel_formats);
    if target == PixelFormat::Unknown {
        return Err(Error::UnsupportedPixelFormat(
            "no candidate output format is acceptable",
        ));
    }
    convert(image, target, options)
}

/// Convert `image` in place to `target`, reusing its pixel buffer.
///
/// Fails if the target format's per-pixel byte size exceeds the source's,
/// since the existing buffer cannot be grown without reallocating.
pub fn update(image: &mut Image, target: PixelFormat, options: &ConversionOptions) -> Result<()> {
    let source_bpp = image.pixel_format.bits_per_pixel();
    let target_bpp = target.bits_per_pixel();
    if target_bpp > source_bpp {
        return Err(Error::InvalidArgument(
            "in-place update target pixel size exceeds source pixel size",
        ));
    }

    let converted = convert(image, target, options)?;
    image.pixel_format = converted.pixel_format;
    image.bytes_per_line = converted.bytes_per_line;
    match (&mut image.pixels, converted.pixels) {
        (Pixels::Owned(dst), Pixels::Owned(src)) => {
            dst[..src.len()].copy_from_slice(&src);
            dst.truncate(src.len());
        }
        _ => image.pixels = converted.pixels,
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Rgb,
    Grayscale,
    Ycbcr,
    Cmyk,
    Indexed,
    Other,
}

fn family_of(fmt: PixelFormat) -> Family {
    use PixelFormat::*;
    match fmt {
        Bpp24Rgb | Bpp24Bgr | Bpp48Rgb | Bpp48Bgr | Bpp16Rgb555 | Bpp16Bgr555 | Bpp16Rgb565
        | Bpp16Bgr565 => Family::Rgb,
        fmt if offsets_32(fmt).is_some() || offsets_64(fmt).is_some() => Family::Rgb,
        Bpp1Grayscale | Bpp2Grayscale | Bpp4Grayscale | Bpp8Grayscale | Bpp16Grayscale
        | Bpp16GrayscaleAlpha | Bpp32GrayscaleAlpha => Family::Grayscale,
        Bpp1Indexed | Bpp2Indexed | Bpp4Indexed | Bpp8Indexed | Bpp16Indexed => Family::Indexed,
        Bpp24Ycbcr => Family::Ycbcr,
        Bpp32Cmyk | Bpp64Cmyk | Bpp32Ycck => Family::Cmyk,
        _ => Family::Other,
    }
}

/// Pick the best candidate output format for `from`, per the ordering rules:
/// same family first, then equal-or-larger bit depth, then alpha-preserving
/// (when the source had alpha), then earliest candidate on ties.
pub fn closest_pixel_format(from: PixelFormat, candidates: &[PixelFormat]) -> PixelFormat {
    let from_family = family_of(from);
    let from_bits = from.bits_per_pixel();
    let from_alpha = from.has_alpha();

    let mut best: Option<(usize, PixelFormat)> = None;

    for &candidate in candidates {
        if !is_producible_output(candidate) {
            continue;
        }
        let same_family = family_of(candidate) == from_family
            || (from_family == Family::Indexed && family_of(candidate) == Family::Rgb);
        let bits_ok = candidate.bits_per_pixel() >= from_bits;
        let alpha_ok = !from_alpha || candidate.has_alpha();

        let score = (same_family as usize) * 100
            + (bits_ok as usize) * 10
            + (alpha_ok as usize) * 1;

        match best {
            Some((best_score, _)) if best_score >= score => {}
            _ => best = Some((score, candidate)),
        }
    }

    best.map(|(_, fmt)| fmt).unwrap_or(PixelFormat::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_common::image::Image;

    fn solid_rgb24(w: u32, h: u32, r: u8, g: u8, b: u8) -> Image {
        let mut img = Image::new_owned(w, h, PixelFormat::Bpp24Rgb).unwrap();
        if let Pixels::Owned(ref mut v) = img.pixels {
            for px in v.chunks_mut(3) {
                px[0] = r;
                px[1] = g;
                px[2] = b;
            }
        }
        img
    }

    #[test]
    fn convert_preserves_dimensions_and_sets_target_format() {
        let src = solid_rgb24(4, 3, 10, 20, 30);
        let options = ConversionOptions::default();
        let out = convert(&src, PixelFormat::Bpp32Rgba, &options).unwrap();
        assert_eq!(out.width, 4);
        assert_eq!(out.height, 3);
        assert_eq!(out.pixel_format, PixelFormat::Bpp32Rgba);
    }

    #[test]
    fn rgb24_round_trips_through_rgba32() {
        let src = solid_rgb24(2, 2, 200, 100, 50);
        let options = ConversionOptions::default();
        let rgba = convert(&src, PixelFormat::Bpp32Rgba, &options).unwrap();
        let back = convert(&rgba, PixelFormat::Bpp24Rgb, &options).unwrap();
        assert_eq!(back.row(0).unwrap(), src.row(0).unwrap());
    }

    #[test]
    fn rgb24_converts_to_plain_16_bit_grayscale() {
        let src = solid_rgb24(2, 1, 90, 90, 90);
        let out = convert(&src, PixelFormat::Bpp16Grayscale, &ConversionOptions::default()).unwrap();
        assert_eq!(out.pixel_format, PixelFormat::Bpp16Grayscale);
        let row = out.row(0).unwrap();
        assert_eq!(read_u16_ne(&row[0..2]), 90 * 257);
        assert_eq!(read_u16_ne(&row[2..4]), 90 * 257);
    }

    #[test]
    fn cmyk_pure_black_converts_to_black_rgb() {
        let mut img = Image::new_owned(1, 1, PixelFormat::Bpp32Cmyk).unwrap();
        if let Pixels::Owned(ref mut v) = img.pixels {
            v.copy_from_slice(&[0, 0, 0, 255]);
        }
        let options = ConversionOptions::default();
        let out = convert(&img, PixelFormat::Bpp24Rgb, &options).unwrap();
        assert_eq!(out.row(0).unwrap(), &[0, 0, 0]);
    }

    #[test]
    fn transparent_pixel_blends_against_background_only_when_target_has_no_alpha() {
        let mut img = Image::new_owned(1, 1, PixelFormat::Bpp32Rgba).unwrap();
        if let Pixels::Owned(ref mut v) = img.pixels {
            // Fully transparent red.
            v.copy_from_slice(&[255, 0, 0, 0]);
        }

        let dropped = convert(&img, PixelFormat::Bpp24Rgb, &ConversionOptions::default()).unwrap();
        assert_eq!(dropped.row(0).unwrap(), &[255, 0, 0]);

        let blend_options = ConversionOptions {
            flags: sail_common::options::ConversionFlags::BLEND_ALPHA,
            background24: sail_common::options::BackgroundColor24 { r: 0, g: 0, b: 255 },
            ..Default::default()
        };
        let blended = convert(&img, PixelFormat::Bpp24Rgb, &blend_options).unwrap();
        assert_eq!(blended.row(0).unwrap(), &[0, 0, 255]);

        // Alpha is preserved untouched when the target format keeps an alpha channel.
        let kept = convert(&img, PixelFormat::Bpp32Bgra, &ConversionOptions::default()).unwrap();
        assert_eq!(kept.row(0).unwrap()[3], 0);
    }

    #[test]
    fn indexed_output_is_unsupported() {
        let src = solid_rgb24(1, 1, 1, 2, 3);
        let options = ConversionOptions::default();
        assert!(convert(&src, PixelFormat::Bpp8Indexed, &options).is_err());
    }

    #[test]
    fn closest_pixel_format_prefers_same_family_and_alpha() {
        let candidates = [PixelFormat::Bpp24Rgb, PixelFormat::Bpp32Rgba];
        let best = closest_pixel_format(PixelFormat::Bpp32Bgra, &candidates);
        assert_eq!(best, PixelFormat::Bpp32Rgba);
    }

    #[test]
    fn closest_pixel_format_returns_unknown_for_no_candidates() {
        assert_eq!(closest_pixel_format(PixelFormat::Bpp24Rgb, &[]), PixelFormat::Unknown);
    }

    #[test]
    fn update_fails_when_target_is_larger() {
        let mut src = solid_rgb24(2, 2, 1, 2, 3);
        let options = ConversionOptions::default();
        assert!(update(&mut src, PixelFormat::Bpp32Rgba, &options).is_err());
    }

    #[test]
    fn update_shrinks_buffer_in_place() {
        let mut src = Image::new_owned(2, 2, PixelFormat::Bpp32Rgba).unwrap();
        let options = ConversionOptions::default();
        update(&mut src, PixelFormat::Bpp24Rgb, &options).unwrap();
        assert_eq!(src.pixel_format, PixelFormat::Bpp24Rgb);
        assert_eq!(src.pixels.len(), src.pixels_size());
    }
}
