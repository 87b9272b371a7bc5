//! CMYK/YCCK to RGB conversion.
//!
//! The formula is a well-known approximation, not a color-managed
//! conversion: SAIL never applies ICC transforms.

/// Convert one CMYK pixel (each channel 0..=255, K meaning "key"/black) to RGB.
pub fn cmyk_to_rgb_u8(c: u8, m: u8, y: u8, k: u8) -> (u8, u8, u8) {
    let k = k as f64;
    let r = (c as f64 * k / 255.0 + 0.5) as u8;
    let g = (m as f64 * k / 255.0 + 0.5) as u8;
    let b = (y as f64 * k / 255.0 + 0.5) as u8;
    (r, g, b)
}

/// 16-bit-per-channel equivalent of [`cmyk_to_rgb_u8`].
pub fn cmyk_to_rgb_u16(c: u16, m: u16, y: u16, k: u16) -> (u16, u16, u16) {
    let k = k as f64;
    let r = (c as f64 * k / 65535.0 + 0.5) as u16;
    let g = (m as f64 * k / 65535.0 + 0.5) as u16;
    let b = (y as f64 * k / 65535.0 + 0.5) as u16;
    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_black_cmyk_is_black_rgb() {
        assert_eq!(cmyk_to_rgb_u8(0, 0, 0, 255), (0, 0, 0));
    }

    #[test]
    fn zero_key_collapses_every_channel_to_black() {
        assert_eq!(cmyk_to_rgb_u8(255, 255, 255, 0), (0, 0, 0));
    }
}
