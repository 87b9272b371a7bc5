//! The process-wide table of known codecs: their parsed descriptors, and the
//! lazily-constructed [`Codec`](crate::codec::Codec) objects that back them.

pub mod descriptor;
pub mod magic;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, warn};

use sail_common::codec_info::CodecInfo;
use sail_common::error::{Error, Result};
use sail_common::io::Io;

use crate::codec::registry_static;
use crate::codec::Codec;

/// One registered format: its parsed metadata, plus whatever is needed to
/// eventually produce a live [`Codec`].
struct Entry {
    info: CodecInfo,
    source: CodecSource,
    /// Populated the first time this codec is actually used; dropped by
    /// [`CodecRegistry::flush`].
    live: RwLock<Option<Arc<dyn Codec>>>,
}

/// Where a codec's executable behavior comes from.
enum CodecSource {
    /// Built directly into this binary.
    Static(fn() -> Arc<dyn Codec>),
    /// A shared library path, resolved on first use via
    /// [`crate::codec::dynamic::DynamicCodec`].
    #[cfg_attr(not(feature = "dynamic-codecs"), allow(dead_code))]
    Dynamic(PathBuf),
}

/// The registry singleton. Construction order follows descriptor priority,
/// highest first, so ties in extension/MIME/magic matching favor the
/// codec a system administrator ranked higher.
pub struct CodecRegistry {
    entries: RwLock<Vec<Entry>>,
}

static REGISTRY: Lazy<CodecRegistry> = Lazy::new(|| {
    let mut entries = registry_static::built_in_entries()
        .into_iter()
        .map(|(info, make)| Entry {
            info,
            source: CodecSource::Static(make),
            live: RwLock::new(None),
        })
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| b.info.priority.cmp(&a.info.priority));
    CodecRegistry {
        entries: RwLock::new(entries),
    }
});

impl CodecRegistry {
    /// The global registry, built once on first access.
    pub fn global() -> &'static CodecRegistry {
        &REGISTRY
    }

    /// Register a codec discovered from a descriptor file and its module
    /// path, inserting it at the position its priority dictates.
    pub fn register_dynamic(&self, info: CodecInfo, module_path: PathBuf) {
        self.insert(info, CodecSource::Dynamic(module_path));
    }

    /// Register a codec whose constructor is already linked into this
    /// binary, bypassing [`crate::codec::registry_static::built_in_entries`].
    /// Used by embedders that assemble their codec set at runtime, and by
    /// this crate's own facade tests.
    pub fn register_static(&self, info: CodecInfo, make: fn() -> Arc<dyn Codec>) {
        self.insert(info, CodecSource::Static(make));
    }

    fn insert(&self, info: CodecInfo, source: CodecSource) {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.iter().position(|e| e.info.name == info.name) {
            entries.remove(existing);
        }
        let position = entries.partition_point(|e| e.info.priority >= info.priority);
        entries.insert(
            position,
            Entry {
                info,
                source,
                live: RwLock::new(None),
            },
        );
    }

    /// All known codecs' metadata, in priority order.
    pub fn infos(&self) -> Vec<CodecInfo> {
        self.entries.read().iter().map(|e| e.info.clone()).collect()
    }

    pub fn from_extension(&self, ext: &str) -> Result<CodecInfo> {
        self.find(|info| info.supports_extension(ext))
            .ok_or_else(|| Error::CodecNotFound(format!("no codec registered for extension `{ext}`")))
    }

    pub fn from_path(&self, path: &Path) -> Result<CodecInfo> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::CodecNotFound(format!("path `{}` has no extension", path.display())))?;
        self.from_extension(ext)
    }

    pub fn from_mime_type(&self, mime: &str) -> Result<CodecInfo> {
        self.find(|info| info.supports_mime_type(mime))
            .ok_or_else(|| Error::CodecNotFound(format!("no codec registered for MIME type `{mime}`")))
    }

    /// Identify a codec by sniffing the first bytes of `io`, leaving its
    /// read position unchanged.
    pub fn from_magic_number(&self, io: &mut dyn Io) -> Result<CodecInfo> {
        let buffer = magic::sniff(io)?;
        self.from_magic_number_memory(&buffer)
    }

    pub fn from_magic_number_path(&self, path: &Path) -> Result<CodecInfo> {
        let mut io = sail_common::io::FileIo::open_for_reading(path)?;
        self.from_magic_number(&mut io)
    }

    pub fn from_magic_number_memory(&self, buffer: &[u8]) -> Result<CodecInfo> {
        self.find(|info| info.matches_magic(buffer))
            .ok_or_else(|| Error::CodecNotFound("no codec's magic numbers matched this data".to_string()))
    }

    fn find(&self, mut predicate: impl FnMut(&CodecInfo) -> bool) -> Option<CodecInfo> {
        self.entries.read().iter().find(|e| predicate(&e.info)).map(|e| e.info.clone())
    }

    /// The live [`Codec`] object for the codec named `name`, constructing
    /// (and for dynamic codecs, loading) it on first use.
    pub fn codec_for(&self, name: &str) -> Result<Arc<dyn Codec>> {
        let entries = self.entries.read();
        let entry = entries
            .iter()
            .find(|e| e.info.name == name)
            .ok_or_else(|| Error::CodecNotFound(name.to_string()))?;

        if let Some(codec) = entry.live.read().as_ref() {
            return Ok(codec.clone());
        }

        let codec = match &entry.source {
            CodecSource::Static(make) => make(),
            CodecSource::Dynamic(path) => load_dynamic(path)?,
        };
        debug!(codec = name, "instantiated codec");
        *entry.live.write() = Some(codec.clone());
        Ok(codec)
    }

    /// Drop every lazily-constructed codec object, forcing the next
    /// `codec_for` call to rebuild (or reload) it. Does not forget
    /// registered descriptors.
    pub fn flush(&self) {
        for entry in self.entries.read().iter() {
            *entry.live.write() = None;
        }
        warn!("flushed all cached codec instances");
    }
}

#[cfg(feature = "dynamic-codecs")]
fn load_dynamic(path: &Path) -> Result<Arc<dyn Codec>> {
    let codec = unsafe { crate::codec::dynamic::DynamicCodec::load(path)? };
    Ok(Arc::new(codec))
}

#[cfg(not(feature = "dynamic-codecs"))]
fn load_dynamic(path: &Path) -> Result<Arc<dyn Codec>> {
    Err(Error::CodecLoadFailed {
        path: path.to_path_buf(),
        reason: "this build was compiled without the `dynamic-codecs` feature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_common::codec_info::CodecInfo;
    use sail_common::options::{CodecFeatures, LoadFeatures, SaveFeatures};

    fn sample_info(name: &str, priority: i32, extensions: &[&str]) -> CodecInfo {
        CodecInfo {
            name: name.to_string(),
            version: "1.0".to_string(),
            description: String::new(),
            priority,
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            mime_types: Vec::new(),
            magic_numbers: Vec::new(),
            load_features: LoadFeatures {
                features: CodecFeatures::STATIC,
                tuning_keys: Vec::new(),
            },
            save_features: SaveFeatures {
                features: CodecFeatures::empty(),
                pixel_formats: Vec::new(),
                tuning_keys: Vec::new(),
                compressions: Vec::new(),
                default_compression: sail_common::compression::Compression::None,
                compression_level_min: 0,
                compression_level_max: 0,
                compression_level_default: 0,
                compression_level_step: 1,
                interlaced_passes: 1,
            },
        }
    }

    #[test]
    fn built_in_table_is_empty_by_default() {
        assert!(registry_static::built_in_entries().is_empty());
    }

    #[test]
    fn register_dynamic_inserts_in_priority_order() {
        let registry = CodecRegistry {
            entries: RwLock::new(Vec::new()),
        };
        registry.register_dynamic(sample_info("LOW", 10, &["low"]), PathBuf::from("low.so"));
        registry.register_dynamic(sample_info("HIGH", 90, &["high"]), PathBuf::from("high.so"));
        registry.register_dynamic(sample_info("MID", 50, &["mid"]), PathBuf::from("mid.so"));

        let names: Vec<_> = registry.infos().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["HIGH", "MID", "LOW"]);
    }

    #[test]
    fn from_extension_finds_registered_codec() {
        let registry = CodecRegistry {
            entries: RwLock::new(Vec::new()),
        };
        registry.register_dynamic(sample_info("TESTFMT", 0, &["tst"]), PathBuf::from("testfmt.so"));
        let found = registry.from_extension("tst").unwrap();
        assert_eq!(found.name, "TESTFMT");
    }

    #[test]
    fn unknown_extension_is_not_found() {
        let registry = CodecRegistry {
            entries: RwLock::new(Vec::new()),
        };
        assert!(registry.from_extension("definitely-not-a-real-extension").is_err());
    }

    #[test]
    fn from_magic_number_memory_matches_registered_pattern() {
        use sail_common::codec_info::MagicPattern;
        let registry = CodecRegistry {
            entries: RwLock::new(Vec::new()),
        };
        let mut info = sample_info("TESTFMT", 0, &["tst"]);
        info.magic_numbers.push(MagicPattern::parse("42 4d").unwrap());
        registry.register_dynamic(info, PathBuf::from("testfmt.so"));

        let found = registry.from_magic_number_memory(&[0x42, 0x4d, 0x00]).unwrap();
        assert_eq!(found.name, "TESTFMT");
        assert!(registry.from_magic_number_memory(&[0x00, 0x00]).is_err());
    }

    #[test]
    fn flush_clears_cached_codec_instances_without_forgetting_descriptors() {
        let registry = CodecRegistry {
            entries: RwLock::new(Vec::new()),
        };
        registry.register_dynamic(sample_info("TESTFMT", 0, &["tst"]), PathBuf::from("testfmt.so"));
        registry.flush();
        assert_eq!(registry.infos().len(), 1);
    }
}
