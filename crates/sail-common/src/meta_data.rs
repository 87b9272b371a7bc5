//! Free-form and well-known image metadata (EXIF, XMP, comments, ...).

/// A well-known metadata key, or an arbitrary caller/codec-supplied string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaDataKey {
    Artist,
    Author,
    Comment,
    Copyright,
    CreationTime,
    Description,
    Disclaimer,
    Document,
    Exif,
    Iptc,
    Job,
    Name,
    Software,
    SoftwareVersion,
    Source,
    Title,
    Url,
    Warning,
    Xmp,
    /// A codec- or caller-defined key not covered by the well-known set.
    Unknown(String),
}

impl MetaDataKey {
    pub fn as_str(&self) -> &str {
        use MetaDataKey::*;
        match self {
            Artist => "Artist",
            Author => "Author",
            Comment => "Comment",
            Copyright => "Copyright",
            CreationTime => "Creation Time",
            Description => "Description",
            Disclaimer => "Disclaimer",
            Document => "Document",
            Exif => "Exif",
            Iptc => "Iptc",
            Job => "Job",
            Name => "Name",
            Software => "Software",
            SoftwareVersion => "Software Version",
            Source => "Source",
            Title => "Title",
            Url => "Url",
            Warning => "Warning",
            Xmp => "Xmp",
            Unknown(s) => s.as_str(),
        }
    }
}

/// A metadata value. Codecs and callers choose whatever variant fits the
/// underlying container format (e.g. EXIF and XMP are usually `Bytes`).
#[derive(Debug, Clone, PartialEq)]
pub enum MetaDataValue {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
}

/// A single key-value entry. An image carries these as an insertion-ordered list.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaDataEntry {
    pub key: MetaDataKey,
    pub value: MetaDataValue,
}

impl MetaDataEntry {
    pub fn new(key: MetaDataKey, value: MetaDataValue) -> Self {
        MetaDataEntry { key, value }
    }
}
