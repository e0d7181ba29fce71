//! Order-preserving key encoding for table, index and partition prefixes.
//!
//! Byte-wise comparison of encoded keys matches the SQL ordering of the
//! values, honoring each column's sort direction. Descending columns store
//! the bitwise complement of the ascending encoding, which stays
//! order-reversing because every ascending encoding is prefix-free.

use crate::descriptor::{ColumnDescriptor, ColumnType, Datum, Direction};
use zonal_core::{DescriptorId, IndexId};

const KEY_NULL_MARKER: u8 = 0x00;
const KEY_BOOL_TAG: u8 = 0x10;
const KEY_INT_TAG: u8 = 0x20;
const KEY_BYTES_TAG: u8 = 0x30;
const BYTES_ESCAPE: u8 = 0x00;
const BYTES_ESCAPED_00: u8 = 0xff;
const BYTES_TERMINATOR: u8 = 0x01;
const SIGN_FLIP_MASK: u64 = 1u64 << 63;

/// Encodes catalog values into ordered keys.
///
/// The default [`OrderedKeyEncoder`] is enough for the control plane and
/// its tests; a deployment reuses the storage layer's own row-key encoding
/// by implementing this trait.
pub trait KeyEncoder {
    /// Prefix every key of a table starts with.
    fn table_prefix(&self, table_id: DescriptorId) -> Vec<u8>;

    /// Prefix every key of an index starts with.
    fn index_prefix(&self, table_id: DescriptorId, index_id: IndexId) -> Vec<u8>;

    /// Append the encoding of `datum` for a key column. Returns a reason
    /// when the value cannot be encoded under the column's type.
    fn encode_datum(
        &self,
        buf: &mut Vec<u8>,
        datum: &Datum,
        column: &ColumnDescriptor,
        direction: Direction,
    ) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedKeyEncoder;

fn encode_i64_ordered(value: i64) -> [u8; 8] {
    (value as u64 ^ SIGN_FLIP_MASK).to_be_bytes()
}

fn encode_bytes_ordered(buf: &mut Vec<u8>, bytes: &[u8]) {
    for b in bytes {
        if *b == BYTES_ESCAPE {
            buf.extend_from_slice(&[BYTES_ESCAPE, BYTES_ESCAPED_00]);
        } else {
            buf.push(*b);
        }
    }
    buf.extend_from_slice(&[BYTES_ESCAPE, BYTES_TERMINATOR]);
}

fn encode_ascending(buf: &mut Vec<u8>, datum: &Datum, column: &ColumnDescriptor) -> Result<(), String> {
    match (datum, column.column_type) {
        (Datum::Null, _) => {
            if !column.nullable {
                return Err(format!(
                    "null value violates not-null constraint for column '{}'",
                    column.name
                ));
            }
            buf.push(KEY_NULL_MARKER);
        }
        (Datum::Bool(v), ColumnType::Bool) => {
            buf.extend_from_slice(&[KEY_BOOL_TAG, u8::from(*v)]);
        }
        (Datum::Int(v), ColumnType::Int) => {
            buf.push(KEY_INT_TAG);
            buf.extend_from_slice(&encode_i64_ordered(*v));
        }
        (Datum::String(v), ColumnType::String) => {
            buf.push(KEY_BYTES_TAG);
            encode_bytes_ordered(buf, v.as_bytes());
        }
        (Datum::Bytes(v), ColumnType::Bytes) => {
            buf.push(KEY_BYTES_TAG);
            encode_bytes_ordered(buf, v);
        }
        (other, expected) => {
            return Err(format!(
                "{} value is not valid for {:?} column '{}'",
                other.type_name(),
                expected,
                column.name
            ));
        }
    }
    Ok(())
}

impl KeyEncoder for OrderedKeyEncoder {
    fn table_prefix(&self, table_id: DescriptorId) -> Vec<u8> {
        table_id.to_be_bytes().to_vec()
    }

    fn index_prefix(&self, table_id: DescriptorId, index_id: IndexId) -> Vec<u8> {
        let mut key = self.table_prefix(table_id);
        key.extend_from_slice(&index_id.to_be_bytes());
        key
    }

    fn encode_datum(
        &self,
        buf: &mut Vec<u8>,
        datum: &Datum,
        column: &ColumnDescriptor,
        direction: Direction,
    ) -> Result<(), String> {
        match direction {
            Direction::Asc => encode_ascending(buf, datum, column),
            Direction::Desc => {
                let mut scratch = Vec::new();
                encode_ascending(&mut scratch, datum, column)?;
                buf.extend(scratch.into_iter().map(|b| !b));
                Ok(())
            }
        }
    }
}

/// First key that does not have `key` as a prefix.
///
/// Trailing `0xff` bytes are dropped and the last remaining byte is
/// incremented. A key made only of `0xff` bytes has no such successor and
/// is returned unchanged.
pub fn prefix_end(key: &[u8]) -> Vec<u8> {
    let mut end = key.to_vec();
    while let Some(last) = end.last_mut() {
        if *last < 0xff {
            *last += 1;
            return end;
        }
        end.pop();
    }
    key.to_vec()
}

/// Hex rendering of a key for logs and operator output.
pub fn pretty_key(key: &[u8]) -> String {
    format!("/{}", hex::encode(key))
}
