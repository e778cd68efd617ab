//! Record codec trait for typed stores.

use crate::error::StoreResult;
use std::io::Read;

/// Trait connecting a [`RecordStore`](crate::RecordStore) to its entry type.
///
/// Add and remove records carry different payloads (a remove typically
/// persists only the entry's key), so encode and decode are split per
/// prefix. Decoders consume exactly their payload from the stream; the
/// store reads the record prefix before and the terminator after.
///
/// # Example
///
/// ```rust,ignore
/// use gitvfs_store::{read_string, write_string, RecordCodec, StoreResult};
///
/// struct PathCodec;
///
/// impl RecordCodec for PathCodec {
///     type Entry = String;
///
///     fn encode_add(&self, entry: &String, buf: &mut Vec<u8>) -> StoreResult<()> {
///         write_string(buf, entry);
///         Ok(())
///     }
///
///     fn encode_remove(&self, entry: &String, buf: &mut Vec<u8>) -> StoreResult<()> {
///         write_string(buf, entry);
///         Ok(())
///     }
///
///     fn decode_add(&self, reader: &mut dyn Read) -> StoreResult<String> {
///         Ok(read_string(reader)?)
///     }
///
///     fn decode_remove(&self, reader: &mut dyn Read) -> StoreResult<String> {
///         Ok(read_string(reader)?)
///     }
/// }
/// ```
pub trait RecordCodec {
    /// The entry type persisted by the store.
    type Entry;

    /// Encodes the payload of an add record.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be represented on the wire.
    fn encode_add(&self, entry: &Self::Entry, buf: &mut Vec<u8>) -> StoreResult<()>;

    /// Encodes the payload of a remove record.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be represented on the wire.
    fn encode_remove(&self, entry: &Self::Entry, buf: &mut Vec<u8>) -> StoreResult<()>;

    /// Decodes the payload of an add record.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed payload bytes; the store converts it
    /// into a fatal corruption error carrying the record ordinal.
    fn decode_add(&self, reader: &mut dyn Read) -> StoreResult<Self::Entry>;

    /// Decodes the payload of a remove record.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed payload bytes; the store converts it
    /// into a fatal corruption error carrying the record ordinal.
    fn decode_remove(&self, reader: &mut dyn Read) -> StoreResult<Self::Entry>;
}
