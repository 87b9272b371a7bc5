//! Immutable per-codec metadata, parsed once from a descriptor file.

use crate::options::{LoadFeatures, SaveFeatures};

/// A single byte in a magic-number pattern: either a fixed value or a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicByte {
    Fixed(u8),
    Wildcard,
}

/// A magic-number pattern: up to 16 bytes, matched against the start of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicPattern(pub Vec<MagicByte>);

impl MagicPattern {
    /// Parse a whitespace-separated hex byte list, `xx` meaning wildcard.
    pub fn parse(s: &str) -> Option<Self> {
        let mut bytes = Vec::new();
        for token in s.split_whitespace() {
            if token.eq_ignore_ascii_case("xx") {
                bytes.push(MagicByte::Wildcard);
            } else {
                let value = u8::from_str_radix(token, 16).ok()?;
                bytes.push(MagicByte::Fixed(value));
            }
        }
        if bytes.is_empty() || bytes.len() > 16 {
            return None;
        }
        Some(MagicPattern(bytes))
    }

    /// Whether this pattern matches the start of `buffer`.
    pub fn matches(&self, buffer: &[u8]) -> bool {
        if buffer.len() < self.0.len() {
            return false;
        }
        self.0.iter().zip(buffer.iter()).all(|(pat, actual)| match pat {
            MagicByte::Wildcard => true,
            MagicByte::Fixed(expected) => expected == actual,
        })
    }
}

/// Parsed, immutable metadata for a single codec.
#[derive(Debug, Clone)]
pub struct CodecInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Higher priority wins when more than one codec otherwise matches.
    pub priority: i32,
    /// Lower-cased file extensions this codec claims, without a leading dot.
    pub extensions: Vec<String>,
    /// Lower-cased MIME types this codec claims.
    pub mime_types: Vec<String>,
    pub magic_numbers: Vec<MagicPattern>,
    pub load_features: LoadFeatures,
    pub save_features: SaveFeatures,
}

impl CodecInfo {
    pub fn supports_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.extensions.iter().any(|e| e == &ext)
    }

    pub fn supports_mime_type(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        self.mime_types.iter().any(|m| m == &mime)
    }

    /// Whether any of this codec's magic patterns match the start of `buffer`.
    pub fn matches_magic(&self, buffer: &[u8]) -> bool {
        self.magic_numbers.iter().any(|p| p.matches(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_pattern_matches_with_wildcard() {
        let pattern = MagicPattern::parse("42 4d xx xx").unwrap();
        assert!(pattern.matches(&[0x42, 0x4d, 0x00, 0xff, 0x10]));
        assert!(!pattern.matches(&[0x42, 0x00, 0x00, 0xff]));
    }

    #[test]
    fn magic_pattern_rejects_short_buffer() {
        let pattern = MagicPattern::parse("ff d8 ff").unwrap();
        assert!(!pattern.matches(&[0xff, 0xd8]));
    }

    #[test]
    fn magic_pattern_rejects_bad_hex() {
        assert!(MagicPattern::parse("zz zz").is_none());
    }
}
