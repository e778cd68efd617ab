//! Wire codec for placeholder records.
//!
//! Add payloads open with a type byte, then a length-prefixed UTF-8 path:
//!
//! ```text
//! file:            [0x01][varint len + path][40 ASCII hex bytes]
//! partial folder:  [0x02][varint len + path]
//! expanded folder: [0x04][varint len + path]
//! ```
//!
//! Remove payloads are the bare length-prefixed path; the outer record
//! prefix already says it is a remove.

use crate::entry::PlaceholderEntry;
use gitvfs_store::{read_string, write_string, RecordCodec, StoreError, StoreResult};
use std::io::{self, Read};

/// Add-payload type byte for a file.
const FILE_TAG: u8 = 0x01;
/// Add-payload type byte for a folder still partially virtual.
const PARTIAL_FOLDER_TAG: u8 = 0x02;
/// Add-payload type byte for a folder whose listing has been expanded.
const EXPANDED_FOLDER_TAG: u8 = 0x04;

/// Byte length of a hex SHA-1.
const SHA_LEN: usize = 40;

/// Codec for [`PlaceholderEntry`] records.
#[derive(Debug, Default)]
pub struct PlaceholderCodec;

impl PlaceholderCodec {
    fn invalid(message: impl Into<String>) -> StoreError {
        StoreError::Io(io::Error::new(io::ErrorKind::InvalidData, message.into()))
    }
}

impl RecordCodec for PlaceholderCodec {
    type Entry = PlaceholderEntry;

    fn encode_add(&self, entry: &PlaceholderEntry, buf: &mut Vec<u8>) -> StoreResult<()> {
        match entry {
            PlaceholderEntry::File { path, sha } => {
                if sha.len() != SHA_LEN || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(StoreError::invalid_operation(format!(
                        "blob sha must be {SHA_LEN} hex characters, got {sha:?}"
                    )));
                }
                buf.push(FILE_TAG);
                write_string(buf, path);
                buf.extend_from_slice(sha.as_bytes());
            }
            PlaceholderEntry::Folder { path, expanded } => {
                buf.push(if *expanded {
                    EXPANDED_FOLDER_TAG
                } else {
                    PARTIAL_FOLDER_TAG
                });
                write_string(buf, path);
            }
            PlaceholderEntry::Path { .. } => {
                return Err(StoreError::invalid_operation(
                    "bare path entries carry no add payload",
                ));
            }
        }
        Ok(())
    }

    fn encode_remove(&self, entry: &PlaceholderEntry, buf: &mut Vec<u8>) -> StoreResult<()> {
        write_string(buf, entry.path());
        Ok(())
    }

    fn decode_add(&self, reader: &mut dyn Read) -> StoreResult<PlaceholderEntry> {
        let mut tag = [0u8; 1];
        reader.read_exact(&mut tag)?;
        match tag[0] {
            FILE_TAG => {
                let path = read_string(reader)?;
                let mut sha = [0u8; SHA_LEN];
                reader.read_exact(&mut sha)?;
                if !sha.iter().all(|b| b.is_ascii_hexdigit()) {
                    return Err(Self::invalid("blob sha is not ASCII hex"));
                }
                let sha = String::from_utf8_lossy(&sha).into_owned();
                Ok(PlaceholderEntry::File { path, sha })
            }
            PARTIAL_FOLDER_TAG | EXPANDED_FOLDER_TAG => {
                let expanded = tag[0] == EXPANDED_FOLDER_TAG;
                let path = read_string(reader)?;
                Ok(PlaceholderEntry::Folder { path, expanded })
            }
            other => Err(Self::invalid(format!(
                "unknown placeholder type 0x{other:02x}"
            ))),
        }
    }

    fn decode_remove(&self, reader: &mut dyn Read) -> StoreResult<PlaceholderEntry> {
        let path = read_string(reader)?;
        Ok(PlaceholderEntry::Path { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn roundtrip_add(entry: &PlaceholderEntry) -> PlaceholderEntry {
        let codec = PlaceholderCodec;
        let mut buf = Vec::new();
        codec.encode_add(entry, &mut buf).unwrap();
        codec.decode_add(&mut buf.as_slice()).unwrap()
    }

    #[test]
    fn file_roundtrip() {
        let entry = PlaceholderEntry::file("src/main.rs", SHA);
        assert_eq!(roundtrip_add(&entry), entry);
    }

    #[test]
    fn file_wire_layout() {
        let codec = PlaceholderCodec;
        let mut buf = Vec::new();
        codec
            .encode_add(&PlaceholderEntry::file("ab", SHA), &mut buf)
            .unwrap();
        assert_eq!(buf[0], 0x01);
        assert_eq!(buf[1], 2); // varint path length
        assert_eq!(&buf[2..4], b"ab");
        assert_eq!(&buf[4..], SHA.as_bytes());
    }

    #[test]
    fn folder_tags_are_distinct_and_preserved() {
        let codec = PlaceholderCodec;

        let partial = PlaceholderEntry::folder("docs", false);
        let expanded = PlaceholderEntry::folder("docs", true);

        let mut partial_buf = Vec::new();
        codec.encode_add(&partial, &mut partial_buf).unwrap();
        assert_eq!(partial_buf[0], 0x02);

        let mut expanded_buf = Vec::new();
        codec.encode_add(&expanded, &mut expanded_buf).unwrap();
        assert_eq!(expanded_buf[0], 0x04);

        assert_eq!(roundtrip_add(&partial), partial);
        assert_eq!(roundtrip_add(&expanded), expanded);
    }

    #[test]
    fn remove_payload_is_bare_path() {
        let codec = PlaceholderCodec;
        let mut buf = Vec::new();
        codec
            .encode_remove(&PlaceholderEntry::file("src/gone.rs", SHA), &mut buf)
            .unwrap();

        let mut expected = Vec::new();
        write_string(&mut expected, "src/gone.rs");
        assert_eq!(buf, expected);

        let decoded = codec.decode_remove(&mut buf.as_slice()).unwrap();
        assert_eq!(
            decoded,
            PlaceholderEntry::Path {
                path: "src/gone.rs".to_string()
            }
        );
    }

    #[test]
    fn bad_sha_rejected_on_encode() {
        let codec = PlaceholderCodec;
        let mut buf = Vec::new();
        let err = codec
            .encode_add(&PlaceholderEntry::file("a", "not-a-sha"), &mut buf)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation { .. }));
    }

    #[test]
    fn unknown_type_tag_rejected_on_decode() {
        let codec = PlaceholderCodec;
        let mut buf = vec![0x08];
        write_string(&mut buf, "whatever");
        assert!(codec.decode_add(&mut buf.as_slice()).is_err());
    }
}
