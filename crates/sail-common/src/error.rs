//! Common error type
//!
//! All fallible operations across the `sail-*` crates return a `Result<T, Error>`.
//! Each variant mirrors one of the status codes a reader of the SAIL C API would
//! recognize, so a caller porting code from that API can match error kinds one
//! for one.

use std::path::PathBuf;

/// Common alias for a Result with `crate::error::Error`
pub type Result<T> = std::result::Result<T, Error>;

/// The common error type shared by the registry, pipeline, conversion, and
/// scaling layers.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An argument failed a basic sanity check (zero dimensions, empty path, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A required pointer-equivalent (buffer, handle, option) was missing.
    #[error("required value was missing: {0}")]
    NullArgument(&'static str),

    /// Memory for an image, palette, or buffer could not be allocated.
    #[error("memory allocation failed while {0}")]
    MemoryAllocationFailed(&'static str),

    /// Opening a file for reading, writing, or as a write-temp failed.
    #[error("failed to open file {path:?}: {source}")]
    OpenFileFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Updating an environment-derived setting (e.g. codec search path) failed.
    #[error("failed to update environment state: {0}")]
    EnvironmentUpdateFailed(String),

    /// A read from an I/O stream failed or returned fewer bytes than requested.
    #[error("I/O read error: {0}")]
    Read(String),

    /// A write to an I/O stream failed.
    #[error("I/O write error: {0}")]
    Write(String),

    /// A seek on an I/O stream failed.
    #[error("I/O seek error: {0}")]
    Seek(String),

    /// Reading the current stream position failed.
    #[error("I/O tell error: {0}")]
    Tell(String),

    /// Flushing a stream failed.
    #[error("I/O flush error: {0}")]
    Flush(String),

    /// Closing a stream failed.
    #[error("I/O close error: {0}")]
    Close(String),

    /// Querying end-of-stream state failed.
    #[error("I/O eof error: {0}")]
    Eof(String),

    /// The supplied I/O handle did not implement every operation a caller needs.
    #[error("I/O handle does not support the requested operation: {0}")]
    InvalidIo(&'static str),

    /// A codec descriptor file could not be parsed.
    #[error("failed to parse codec descriptor {path:?}: {reason}")]
    ParseFile { path: PathBuf, reason: String },

    /// A codec descriptor declared a `layout` version this build does not support.
    #[error("codec declares unsupported layout version {found} (expected {expected})")]
    UnsupportedCodecLayout { expected: u32, found: u32 },

    /// A codec descriptor was missing required keys.
    #[error("codec descriptor is missing required information: {0}")]
    IncompleteCodecInfo(&'static str),

    /// No codec matched the requested path, extension, MIME type, or magic bytes.
    #[error("no codec found for {0}")]
    CodecNotFound(String),

    /// A codec module could not be loaded from disk.
    #[error("failed to load codec module {path:?}: {reason}")]
    CodecLoadFailed { path: PathBuf, reason: String },

    /// A codec module was loaded but did not expose the expected entry point.
    #[error("failed to resolve codec symbol {symbol:?} in {path:?}")]
    CodecSymbolResolveFailed { path: PathBuf, symbol: String },

    /// An image's width, height, or both were not positive.
    #[error("incorrect image dimensions: {width}x{height}")]
    IncorrectImageDimensions { width: u32, height: u32 },

    /// `bytes_per_line` was too small to hold a row of pixels at the given format.
    #[error("incorrect bytes per line: {found} is less than the minimum {minimum}")]
    IncorrectBytesPerLine { found: u32, minimum: u32 },

    /// A pixel format is not supported by the operation being attempted.
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(&'static str),

    /// A compression kind is not supported by the operation being attempted.
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(&'static str),

    /// An image property (e.g. an orientation or a chroma layout) is not supported here.
    #[error("unsupported image property: {0}")]
    UnsupportedImageProperty(&'static str),

    /// A codec reported interlacing but did not declare a usable pass count.
    #[error("interlaced image unsupported: {0}")]
    InterlacedUnsupported(&'static str),

    /// The underlying codec implementation reported a failure of its own.
    #[error("underlying codec error: {0}")]
    UnderlyingCodecError(String),

    /// A load operation reached the natural end of an animated or paged stream.
    ///
    /// Callers treat this as normal loop termination, not a failure.
    #[error("no more frames")]
    NoMoreFrames,

    /// Pixel data, palette indices, or container structure were internally inconsistent.
    #[error("broken image: {0}")]
    BrokenImage(&'static str),
}

impl Error {
    /// `true` for the one variant ([`Error::NoMoreFrames`]) that callers are
    /// expected to treat as end-of-stream rather than a user-visible failure.
    pub fn is_no_more_frames(&self) -> bool {
        matches!(self, Error::NoMoreFrames)
    }
}
