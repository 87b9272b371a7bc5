//! Per-codec feature declarations and per-call load/save options.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::compression::Compression;
use crate::pixel_format::PixelFormat;
use crate::tuning::TuningValue;

bitflags! {
    /// Capabilities a codec declares for its load or save side.
    pub struct CodecFeatures: u32 {
        /// The codec only ever produces/consumes a single static frame.
        const STATIC = 0b0000_0001;
        /// The codec can hold more than one independent page (e.g. multi-page TIFF).
        const MULTI_PAGED = 0b0000_0010;
        /// The codec's frames form a timed animation.
        const ANIMATED = 0b0000_0100;
        /// The codec can read or write metadata entries.
        const META_DATA = 0b0000_1000;
        /// The codec supports interlaced (multi-pass) frames.
        const INTERLACED = 0b0001_0000;
        /// The codec can read or write an ICC profile.
        const ICCP = 0b0010_0000;
        /// The codec can report a `SourceImage` describing its native representation.
        const SOURCE_IMAGE = 0b0100_0000;
    }
}

bitflags! {
    /// Per-call selection of which optional data a load/save should touch.
    pub struct IoOptions: u32 {
        const META_DATA = 0b0000_0001;
        const ICCP = 0b0000_0010;
        const INTERLACED = 0b0000_0100;
    }
}

/// What a codec can do on the load side, parsed from its descriptor.
#[derive(Debug, Clone, Default)]
pub struct LoadFeatures {
    pub tuning_keys: Vec<String>,
    pub features: CodecFeatures,
}

impl Default for CodecFeatures {
    fn default() -> Self {
        CodecFeatures::empty()
    }
}

/// What a codec can do on the save side, parsed from its descriptor.
#[derive(Debug, Clone)]
pub struct SaveFeatures {
    pub pixel_formats: Vec<PixelFormat>,
    pub tuning_keys: Vec<String>,
    pub features: CodecFeatures,
    pub compressions: Vec<Compression>,
    pub default_compression: Compression,
    pub compression_level_min: i32,
    pub compression_level_max: i32,
    pub compression_level_default: i32,
    pub compression_level_step: i32,
    pub interlaced_passes: u32,
}

impl SaveFeatures {
    /// Whether `format` appears in this codec's advertised output formats.
    pub fn supports_pixel_format(&self, format: PixelFormat) -> bool {
        self.pixel_formats.contains(&format)
    }

    pub fn supports_compression(&self, compression: Compression) -> bool {
        self.compressions.contains(&compression)
    }
}

/// A string-to-value map for codec-specific hints, validated against a
/// codec's recognized tuning keys at call time.
pub type TuningMap = HashMap<String, TuningValue>;

/// Per-call options for a load operation.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub io_options: IoOptions,
    pub tuning: TuningMap,
}

impl Default for IoOptions {
    fn default() -> Self {
        IoOptions::empty()
    }
}

impl LoadOptions {
    /// The default options derived from a codec's load features: every
    /// optional behavior the codec supports is turned on.
    pub fn from_load_features(features: &LoadFeatures) -> Self {
        let mut io_options = IoOptions::empty();
        if features.features.contains(CodecFeatures::META_DATA) {
            io_options |= IoOptions::META_DATA;
        }
        if features.features.contains(CodecFeatures::ICCP) {
            io_options |= IoOptions::ICCP;
        }
        if features.features.contains(CodecFeatures::INTERLACED) {
            io_options |= IoOptions::INTERLACED;
        }
        LoadOptions {
            io_options,
            tuning: TuningMap::new(),
        }
    }
}

/// Per-call options for a save operation.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub io_options: IoOptions,
    pub compression: Compression,
    pub compression_level: i32,
    pub tuning: TuningMap,
}

impl SaveOptions {
    /// The default options derived from a codec's save features.
    pub fn from_save_features(features: &SaveFeatures) -> Self {
        let mut io_options = IoOptions::empty();
        if features.features.contains(CodecFeatures::META_DATA) {
            io_options |= IoOptions::META_DATA;
        }
        if features.features.contains(CodecFeatures::ICCP) {
            io_options |= IoOptions::ICCP;
        }
        SaveOptions {
            io_options,
            compression: features.default_compression,
            compression_level: features.compression_level_default,
            tuning: TuningMap::new(),
        }
    }
}

bitflags! {
    /// How the conversion engine should handle a source image's alpha
    /// channel when the output format carries none. `BLEND` wins if both
    /// bits are set.
    pub struct ConversionFlags: u32 {
        const DROP_ALPHA = 0b0000_0001;
        const BLEND_ALPHA = 0b0000_0010;
    }
}

impl Default for ConversionFlags {
    fn default() -> Self {
        ConversionFlags::DROP_ALPHA
    }
}

/// A 24-bit (8:8:8) background color used when blending alpha into an
/// 8-bit-per-channel target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundColor24 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A 48-bit (16:16:16) background color used when blending alpha into a
/// 16-bit-per-channel target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundColor48 {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

/// Options controlling the conversion engine's pixel-format conversion.
#[derive(Debug, Clone, Copy)]
pub struct ConversionOptions {
    pub flags: ConversionFlags,
    pub background24: BackgroundColor24,
    pub background48: BackgroundColor48,
}

impl ConversionOptions {
    /// Whether alpha should be blended into the background rather than dropped.
    pub fn should_blend(&self) -> bool {
        self.flags.contains(ConversionFlags::BLEND_ALPHA)
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            flags: ConversionFlags::default(),
            background24: BackgroundColor24 { r: 0, g: 0, b: 0 },
            background48: BackgroundColor48 { r: 0, g: 0, b: 0 },
        }
    }
}
