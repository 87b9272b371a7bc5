//! Sniffs a codec from the first bytes of a stream, restoring the original
//! read position afterward.

use sail_common::codec_info::CodecInfo;
use sail_common::error::Result;
use sail_common::io::{Io, Whence};

/// The longest magic-number pattern any codec may declare; also the number
/// of bytes sniffed from the stream.
pub const MAGIC_PROBE_LEN: usize = 16;

/// Read up to [`MAGIC_PROBE_LEN`] bytes from the current position, then seek
/// back to where `io` started. A short read (stream shorter than the probe
/// length) is not an error; the sniffed slice is just shorter.
pub fn sniff(io: &mut dyn Io) -> Result<Vec<u8>> {
    let start = io.tell()?;
    let mut buf = vec![0u8; MAGIC_PROBE_LEN];
    let n = io.read(&mut buf)?;
    buf.truncate(n);
    io.seek(start as i64, Whence::Set)?;
    Ok(buf)
}

/// The first registered codec (in priority order, already applied by the
/// caller) whose magic numbers match the sniffed bytes.
pub fn find_match<'a>(codecs: impl Iterator<Item = &'a CodecInfo>, buffer: &[u8]) -> Option<&'a CodecInfo> {
    codecs.into_iter().find(|info| info.matches_magic(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_common::io::MemoryIo;

    #[test]
    fn sniff_restores_original_position() {
        let mut io = MemoryIo::new_reader(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        io.seek(2, Whence::Set).unwrap();
        let bytes = sniff(&mut io).unwrap();
        assert_eq!(bytes, vec![3, 4, 5, 6, 7, 8]);
        assert_eq!(io.tell().unwrap(), 2);
    }

    #[test]
    fn sniff_truncates_on_short_stream() {
        let mut io = MemoryIo::new_reader(vec![9, 9]);
        let bytes = sniff(&mut io).unwrap();
        assert_eq!(bytes, vec![9, 9]);
    }
}
