//! Parses a codec's INI-style descriptor file into a [`sail_common::codec_info::CodecInfo`].
//!
//! Sections: `[codec]`, `[load-features]`, `[save-features]`, and
//! `[save-pixel-formats-mapping]`. Unknown sections and keys are ignored so
//! a newer descriptor stays loadable by an older build, except for the
//! `layout` key, which must match the version this build understands.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sail_common::codec_info::{CodecInfo, MagicPattern};
use sail_common::compression::Compression;
use sail_common::error::{Error, Result};
use sail_common::options::{CodecFeatures, LoadFeatures, SaveFeatures};
use sail_common::pixel_format::PixelFormat;

/// The `layout` value every descriptor must declare to be accepted.
pub const SUPPORTED_LAYOUT: u32 = 1;

#[derive(Debug, Default)]
struct Section {
    entries: HashMap<String, String>,
}

/// Parse the raw text of a descriptor file into a [`CodecInfo`].
pub fn parse(path: &Path, text: &str) -> Result<CodecInfo> {
    let sections = split_sections(text);

    let codec = sections.get("codec").ok_or_else(|| Error::ParseFile {
        path: path.to_path_buf(),
        reason: "missing [codec] section".to_string(),
    })?;

    let layout: u32 = required(path, codec, "layout")?.parse().map_err(|_| Error::ParseFile {
        path: path.to_path_buf(),
        reason: "layout is not a valid integer".to_string(),
    })?;
    if layout != SUPPORTED_LAYOUT {
        return Err(Error::UnsupportedCodecLayout {
            expected: SUPPORTED_LAYOUT,
            found: layout,
        });
    }

    let name = required(path, codec, "name")?.to_string();
    let version = codec.entries.get("version").cloned().unwrap_or_default();
    let description = codec.entries.get("description").cloned().unwrap_or_default();
    let priority: i32 = codec
        .entries
        .get("priority")
        .map(|v| v.parse())
        .transpose()
        .map_err(|_| Error::ParseFile {
            path: path.to_path_buf(),
            reason: "priority is not a valid integer".to_string(),
        })?
        .unwrap_or(0);

    let extensions = semicolon_list(codec, "extensions");
    let mime_types = semicolon_list(codec, "mime-types");
    let magic_numbers = semicolon_list(codec, "magic-numbers")
        .into_iter()
        .map(|pattern| {
            MagicPattern::parse(&pattern).ok_or_else(|| Error::ParseFile {
                path: path.to_path_buf(),
                reason: format!("invalid magic-number pattern `{pattern}`"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let load_features = sections
        .get("load-features")
        .map(|s| parse_load_features(path, s))
        .transpose()?
        .unwrap_or_default();

    let save_features = match sections.get("save-features") {
        Some(s) => parse_save_features(path, s, sections.get("save-pixel-formats-mapping"))?,
        None => empty_save_features(),
    };

    Ok(CodecInfo {
        name,
        version,
        description,
        priority,
        extensions,
        mime_types,
        magic_numbers,
        load_features,
        save_features,
    })
}

fn required<'a>(path: &Path, section: &'a Section, key: &'static str) -> Result<&'a str> {
    section
        .entries
        .get(key)
        .map(|s| s.as_str())
        .ok_or(Error::IncompleteCodecInfo(key))
        .map_err(|_| Error::ParseFile {
            path: path.to_path_buf(),
            reason: format!("missing required key `{key}`"),
        })
}

fn semicolon_list(section: &Section, key: &str) -> Vec<String> {
    section
        .entries
        .get(key)
        .map(|v| v.split(';').map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn parse_load_features(path: &Path, section: &Section) -> Result<LoadFeatures> {
    let mut features = CodecFeatures::default();
    for flag in semicolon_list(section, "features") {
        features |= parse_codec_feature(path, &flag)?;
    }
    let tuning_keys = semicolon_list(section, "tuning");
    Ok(LoadFeatures { features, tuning_keys })
}

fn parse_save_features(path: &Path, section: &Section, mapping: Option<&Section>) -> Result<SaveFeatures> {
    let mut features = CodecFeatures::default();
    for flag in semicolon_list(section, "features") {
        features |= parse_codec_feature(path, &flag)?;
    }

    let mut pixel_formats = Vec::new();
    if let Some(mapping) = mapping {
        // [save-pixel-formats-mapping] has one key per input format; the
        // value lists which output formats a save of that input may pick
        // from. A save target is only accepted if some input maps to it.
        for value in mapping.entries.values() {
            for fmt in value.split(';').map(|s| s.trim()) {
                if fmt.is_empty() {
                    continue;
                }
                let parsed = PixelFormat::from_str_strict(&fmt.to_uppercase())?;
                if !pixel_formats.contains(&parsed) {
                    pixel_formats.push(parsed);
                }
            }
        }
    } else {
        return Err(Error::ParseFile {
            path: path.to_path_buf(),
            reason: "save features declared with no [save-pixel-formats-mapping] section".to_string(),
        });
    }

    let compressions = semicolon_list(section, "compressions")
        .into_iter()
        .map(|c| Compression::from_str_strict(&c.to_uppercase()))
        .collect::<Result<Vec<_>>>()?;

    let default_compression = section
        .entries
        .get("default-compression")
        .map(|c| Compression::from_str_strict(&c.to_uppercase()))
        .transpose()?
        .unwrap_or(Compression::None);

    Ok(SaveFeatures {
        features,
        pixel_formats,
        compressions,
        default_compression,
        compression_level_min: parse_i32(section, "compression-level-min").unwrap_or(0),
        compression_level_max: parse_i32(section, "compression-level-max").unwrap_or(0),
        compression_level_default: parse_i32(section, "compression-level-default").unwrap_or(0),
        compression_level_step: parse_i32(section, "compression-level-step").unwrap_or(1),
        interlaced_passes: section.entries.get("interlaced-passes").and_then(|v| v.parse().ok()).unwrap_or(1),
        tuning_keys: semicolon_list(section, "tuning"),
    })
}

fn parse_i32(section: &Section, key: &str) -> Option<i32> {
    section.entries.get(key).and_then(|v| v.parse().ok())
}

fn empty_save_features() -> SaveFeatures {
    SaveFeatures {
        features: CodecFeatures::default(),
        pixel_formats: Vec::new(),
        compressions: Vec::new(),
        default_compression: Compression::None,
        compression_level_min: 0,
        compression_level_max: 0,
        compression_level_default: 0,
        compression_level_step: 1,
        interlaced_passes: 1,
        tuning_keys: Vec::new(),
    }
}

fn parse_codec_feature(path: &Path, flag: &str) -> Result<CodecFeatures> {
    match flag {
        "static" => Ok(CodecFeatures::STATIC),
        "multi-paged" => Ok(CodecFeatures::MULTI_PAGED),
        "animated" => Ok(CodecFeatures::ANIMATED),
        "meta-data" => Ok(CodecFeatures::META_DATA),
        "interlaced" => Ok(CodecFeatures::INTERLACED),
        "iccp" => Ok(CodecFeatures::ICCP),
        "source-image" => Ok(CodecFeatures::SOURCE_IMAGE),
        other => Err(Error::ParseFile {
            path: path.to_path_buf(),
            reason: format!("unrecognized feature flag `{other}`"),
        }),
    }
}

fn split_sections(text: &str) -> HashMap<String, Section> {
    let mut sections: HashMap<String, Section> = HashMap::new();
    let mut current: Option<String> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            current = Some(name.trim().to_lowercase());
            sections.entry(current.clone().unwrap()).or_default();
            continue;
        }
        if let Some(name) = &current {
            if let Some((key, value)) = line.split_once('=') {
                sections
                    .entry(name.clone())
                    .or_default()
                    .entries
                    .insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
[codec]
layout=1
name=TESTFMT
priority=50
extensions=tst;test

[load-features]
features=static;meta-data

[save-features]
features=static
compressions=none
default-compression=none

[save-pixel-formats-mapping]
bpp24-rgb=bpp24-rgb;bpp32-rgba
";

    #[test]
    fn parses_minimal_descriptor() {
        let info = parse(&PathBuf::from("testfmt.codec.info"), MINIMAL).unwrap();
        assert_eq!(info.name, "TESTFMT");
        assert_eq!(info.priority, 50);
        assert_eq!(info.extensions, vec!["tst", "test"]);
        assert!(info.load_features.features.contains(CodecFeatures::META_DATA));
        assert!(info.save_features.pixel_formats.contains(&PixelFormat::Bpp32Rgba));
    }

    #[test]
    fn rejects_unsupported_layout() {
        let text = "[codec]\nlayout=99\nname=X\n";
        let err = parse(&PathBuf::from("x.codec.info"), text).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCodecLayout { .. }));
    }

    #[test]
    fn rejects_missing_name() {
        let text = "[codec]\nlayout=1\n";
        assert!(parse(&PathBuf::from("x.codec.info"), text).is_err());
    }

    #[test]
    fn save_features_require_pixel_formats_mapping() {
        let text = "[codec]\nlayout=1\nname=X\n\n[save-features]\nfeatures=static\n";
        assert!(parse(&PathBuf::from("x.codec.info"), text).is_err());
    }
}
