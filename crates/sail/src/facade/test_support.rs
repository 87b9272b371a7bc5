//! A codec registered once into the global registry so the facade layers'
//! tests have something to round-trip through without depending on a real
//! format implementation.

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;

use sail_common::codec_info::{CodecInfo, MagicPattern};
use sail_common::compression::Compression;
use sail_common::options::{CodecFeatures, LoadFeatures, SaveFeatures};
use sail_common::pixel_format::PixelFormat;

use crate::codec::Codec;
use crate::pipeline::test_support::StubCodec;
use crate::registry::CodecRegistry;

pub const STUB_EXTENSION: &str = "stubjr";
pub const STUB_NAME: &str = "SAIL-TEST-STUB";

static REGISTERED: Lazy<()> = Lazy::new(|| {
    let info = CodecInfo {
        name: STUB_NAME.to_string(),
        version: "0".to_string(),
        description: "in-memory stub used only by facade tests".to_string(),
        priority: 0,
        extensions: vec![STUB_EXTENSION.to_string()],
        mime_types: vec!["application/x-sail-test-stub".to_string()],
        magic_numbers: vec![MagicPattern::parse("53 54 55 42").unwrap()],
        load_features: LoadFeatures {
            features: CodecFeatures::STATIC,
            tuning_keys: Vec::new(),
        },
        save_features: SaveFeatures {
            features: CodecFeatures::STATIC,
            pixel_formats: vec![PixelFormat::Bpp24Rgb, PixelFormat::Bpp32Rgba],
            tuning_keys: Vec::new(),
            compressions: vec![Compression::None],
            default_compression: Compression::None,
            compression_level_min: 0,
            compression_level_max: 0,
            compression_level_default: 0,
            compression_level_step: 1,
            interlaced_passes: 1,
        },
    };
    CodecRegistry::global().register_static(info, make_stub);
});

fn make_stub() -> Arc<dyn Codec> {
    Arc::new(StubCodec)
}

/// Call at the top of any facade test that needs [`STUB_NAME`] registered.
/// Safe to call from many tests; registration happens exactly once.
pub fn ensure_stub_registered() {
    Lazy::force(&REGISTERED);
}

#[allow(dead_code)]
pub fn stub_descriptor_path() -> PathBuf {
    PathBuf::from("<in-memory-stub>")
}
