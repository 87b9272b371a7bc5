//! Per-pixel helpers shared by the unpack/pack halves of the conversion engine.

use sail_common::options::ConversionOptions;

/// Blend or drop alpha while writing one pixel's R/G/B into an 8-bit-per-channel
/// RGBA32 scanline at byte offsets `r`, `g`, `b`, and optionally `a`.
///
/// `av == None` means the source pixel carries no alpha; in that case the
/// blend policy never applies and the channel values pass through untouched.
#[allow(clippy::too_many_arguments)]
pub fn fill_rgba32_pixel_from_u8(
    rv: u8,
    gv: u8,
    bv: u8,
    av: Option<u8>,
    scan: &mut [u8],
    r: usize,
    g: usize,
    b: usize,
    a: Option<usize>,
    options: &ConversionOptions,
) {
    match (av, a) {
        (Some(av), None) if options.should_blend() => {
            let opacity = av as f64 / 255.0;
            scan[r] = (opacity * rv as f64 + (1.0 - opacity) * options.background24.r as f64) as u8;
            scan[g] = (opacity * gv as f64 + (1.0 - opacity) * options.background24.g as f64) as u8;
            scan[b] = (opacity * bv as f64 + (1.0 - opacity) * options.background24.b as f64) as u8;
        }
        _ => {
            scan[r] = rv;
            scan[g] = gv;
            scan[b] = bv;
        }
    }
    if let (Some(av), Some(a)) = (av, a) {
        scan[a] = av;
    }
}

/// As [`fill_rgba32_pixel_from_u8`], but the source channels are 16-bit and
/// get scaled down to 8-bit (`÷257`) for the non-blended path.
#[allow(clippy::too_many_arguments)]
pub fn fill_rgba32_pixel_from_u16(
    rv: u16,
    gv: u16,
    bv: u16,
    av: Option<u16>,
    scan: &mut [u8],
    r: usize,
    g: usize,
    b: usize,
    a: Option<usize>,
    options: &ConversionOptions,
) {
    match (av, a) {
        (Some(av), None) if options.should_blend() => {
            let opacity = av as f64 / 65535.0;
            scan[r] = ((opacity * rv as f64 + (1.0 - opacity) * options.background24.r as f64 * 257.0) / 257.0) as u8;
            scan[g] = ((opacity * gv as f64 + (1.0 - opacity) * options.background24.g as f64 * 257.0) / 257.0) as u8;
            scan[b] = ((opacity * bv as f64 + (1.0 - opacity) * options.background24.b as f64 * 257.0) / 257.0) as u8;
        }
        _ => {
            scan[r] = (rv / 257) as u8;
            scan[g] = (gv / 257) as u8;
            scan[b] = (bv / 257) as u8;
        }
    }
    if let (Some(av), Some(a)) = (av, a) {
        scan[a] = (av / 257) as u8;
    }
}

/// 16-bit-per-channel equivalent of [`fill_rgba32_pixel_from_u8`]: the
/// source is 8-bit and gets widened (`×257`) for the non-blended path.
#[allow(clippy::too_many_arguments)]
pub fn fill_rgba64_pixel_from_u8(
    rv: u8,
    gv: u8,
    bv: u8,
    av: Option<u8>,
    scan: &mut [u16],
    r: usize,
    g: usize,
    b: usize,
    a: Option<usize>,
    options: &ConversionOptions,
) {
    match (av, a) {
        (Some(av), None) if options.should_blend() => {
            let opacity = av as f64 / 255.0;
            scan[r] = (opacity * (rv as f64 * 257.0) + (1.0 - opacity) * options.background48.r as f64) as u16;
            scan[g] = (opacity * (gv as f64 * 257.0) + (1.0 - opacity) * options.background48.g as f64) as u16;
            scan[b] = (opacity * (bv as f64 * 257.0) + (1.0 - opacity) * options.background48.b as f64) as u16;
        }
        _ => {
            scan[r] = rv as u16 * 257;
            scan[g] = gv as u16 * 257;
            scan[b] = bv as u16 * 257;
        }
    }
    if let (Some(av), Some(a)) = (av, a) {
        scan[a] = av as u16 * 257;
    }
}

/// 16-bit-per-channel equivalent of [`fill_rgba32_pixel_from_u16`]: source
/// and destination share bit depth, so the non-blended path is a plain copy.
#[allow(clippy::too_many_arguments)]
pub fn fill_rgba64_pixel_from_u16(
    rv: u16,
    gv: u16,
    bv: u16,
    av: Option<u16>,
    scan: &mut [u16],
    r: usize,
    g: usize,
    b: usize,
    a: Option<usize>,
    options: &ConversionOptions,
) {
    match (av, a) {
        (Some(av), None) if options.should_blend() => {
            let opacity = av as f64 / 65535.0;
            scan[r] = (opacity * rv as f64 + (1.0 - opacity) * options.background48.r as f64) as u16;
            scan[g] = (opacity * gv as f64 + (1.0 - opacity) * options.background48.g as f64) as u16;
            scan[b] = (opacity * bv as f64 + (1.0 - opacity) * options.background48.b as f64) as u16;
        }
        _ => {
            scan[r] = rv;
            scan[g] = gv;
            scan[b] = bv;
        }
    }
    if let (Some(av), Some(a)) = (av, a) {
        scan[a] = av;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_common::options::{BackgroundColor24, ConversionFlags};

    #[test]
    fn drop_alpha_by_default() {
        let options = ConversionOptions::default();
        let mut scan = [0u8; 3];
        fill_rgba32_pixel_from_u8(10, 20, 30, Some(0), &mut scan, 0, 1, 2, None, &options);
        assert_eq!(scan, [10, 20, 30]);
    }

    #[test]
    fn blend_alpha_against_background() {
        let options = ConversionOptions {
            flags: ConversionFlags::BLEND_ALPHA,
            background24: BackgroundColor24 { r: 255, g: 255, b: 255 },
            ..Default::default()
        };
        let mut scan = [0u8; 3];
        // Fully transparent source pixel should come out as pure background.
        fill_rgba32_pixel_from_u8(0, 0, 0, Some(0), &mut scan, 0, 1, 2, None, &options);
        assert_eq!(scan, [255, 255, 255]);
    }
}
