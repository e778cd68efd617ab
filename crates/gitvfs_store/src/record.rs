//! Record framing primitives.
//!
//! One record on disk is `[1 byte prefix][payload][4 byte terminator]`.
//! The terminator is all zeroes and doubles as the truncation point when a
//! crash tears the final append. Payload strings use a 7-bit varint byte
//! length followed by UTF-8 bytes; the same scheme is used for write and
//! read everywhere.

use std::io::{self, Read};

/// Fixed sentinel marking the end of every record.
pub const RECORD_TERMINATOR: [u8; 4] = [0, 0, 0, 0];

/// Longest accepted varint for a string length (5 bytes covers u32).
const MAX_VARINT_BYTES: u32 = 5;

/// Prefix byte classifying a record.
///
/// The values are distinct bit flags, not sequential enum ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordPrefix {
    /// The record adds an entry.
    Add = 0x01,
    /// The record tombstones a prior add.
    Remove = 0x02,
}

impl RecordPrefix {
    /// Converts a byte to a prefix.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Add),
            0x02 => Some(Self::Remove),
            _ => None,
        }
    }

    /// Converts the prefix to its wire byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Appends a length-prefixed UTF-8 string to `buf`.
///
/// The length is the byte count encoded as a 7-bit varint: seven payload
/// bits per byte, high bit set on every byte except the last.
pub fn write_string(buf: &mut Vec<u8>, s: &str) {
    let mut len = s.len() as u32;
    loop {
        let byte = (len & 0x7F) as u8;
        len >>= 7;
        if len == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
    buf.extend_from_slice(s.as_bytes());
}

/// Reads a length-prefixed UTF-8 string written by [`write_string`].
///
/// # Errors
///
/// Returns `InvalidData` if the varint is malformed or the bytes are not
/// valid UTF-8, and `UnexpectedEof` if the stream ends mid-string.
pub fn read_string(reader: &mut dyn Read) -> io::Result<String> {
    let mut len: u32 = 0;
    let mut shift: u32 = 0;
    for _ in 0..MAX_VARINT_BYTES {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        len |= u32::from(byte[0] & 0x7F) << shift;
        if byte[0] & 0x80 == 0 {
            let mut bytes = vec![0u8; len as usize];
            reader.read_exact(&mut bytes)?;
            return String::from_utf8(bytes).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("invalid UTF-8: {e}"))
            });
        }
        shift += 7;
    }
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "string length varint exceeds 5 bytes",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn prefix_roundtrip() {
        for p in [RecordPrefix::Add, RecordPrefix::Remove] {
            assert_eq!(RecordPrefix::from_byte(p.as_byte()), Some(p));
        }
    }

    #[test]
    fn prefix_rejects_unknown_bytes() {
        assert_eq!(RecordPrefix::from_byte(0x00), None);
        assert_eq!(RecordPrefix::from_byte(0x03), None);
        assert_eq!(RecordPrefix::from_byte(0xFF), None);
    }

    #[test]
    fn string_roundtrip_short() {
        let mut buf = Vec::new();
        write_string(&mut buf, "src/lib.rs");
        let decoded = read_string(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, "src/lib.rs");
    }

    #[test]
    fn string_roundtrip_empty() {
        let mut buf = Vec::new();
        write_string(&mut buf, "");
        assert_eq!(buf, vec![0]);
        assert_eq!(read_string(&mut Cursor::new(&buf)).unwrap(), "");
    }

    #[test]
    fn long_string_uses_multibyte_varint() {
        let s = "a".repeat(300);
        let mut buf = Vec::new();
        write_string(&mut buf, &s);
        // 300 = 0b10_0101100 -> [0xAC, 0x02]
        assert_eq!(&buf[..2], &[0xAC, 0x02]);
        assert_eq!(read_string(&mut Cursor::new(&buf)).unwrap(), s);
    }

    #[test]
    fn truncated_string_is_eof() {
        let mut buf = Vec::new();
        write_string(&mut buf, "placeholder");
        buf.truncate(buf.len() - 3);
        let err = read_string(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let buf = vec![2, 0xFF, 0xFE];
        let err = read_string(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    proptest! {
        #[test]
        fn string_roundtrip(s in ".{0,512}") {
            let mut buf = Vec::new();
            write_string(&mut buf, &s);
            let decoded = read_string(&mut Cursor::new(&buf)).unwrap();
            prop_assert_eq!(decoded, s);
        }
    }
}
