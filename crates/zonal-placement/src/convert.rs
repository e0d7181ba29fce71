//! Partition tuples to encoded key bounds.
//!
//! A tuple covers the index key columns that follow those fixed by the
//! enclosing partitions. Its key is the enclosing prefix followed by the
//! encoded concrete values; sentinels stop the encoding early.

use zonal_catalog::{IndexDescriptor, KeyEncoder, PartitionValue, TableDescriptor, prefix_end};

/// Which partition flavour a tuple belongs to; decides the legal sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleKind {
    List,
    Range,
}

/// An encoded partition tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTuple {
    pub key: Vec<u8>,
    /// Number of leading non-sentinel values.
    pub concrete: usize,
}

fn sentinel_name(value: &PartitionValue) -> &'static str {
    match value {
        PartitionValue::Default => "DEFAULT",
        PartitionValue::MinValue => "MINVALUE",
        PartitionValue::MaxValue => "MAXVALUE",
        PartitionValue::Datum(_) => "value",
    }
}

/// Encode one partition tuple under `prefix`.
///
/// `col_offset` is the position in the index's key columns of the first
/// column this partitioning covers. The reason string of an error is meant
/// to be wrapped into an `EncodingFailure`.
#[allow(clippy::too_many_arguments)]
pub fn encode_partition_tuple(
    encoder: &dyn KeyEncoder,
    table: &TableDescriptor,
    index: &IndexDescriptor,
    prefix: &[u8],
    col_offset: usize,
    num_columns: usize,
    values: &[PartitionValue],
    kind: TupleKind,
) -> Result<PartitionTuple, String> {
    if values.len() > num_columns {
        return Err(format!(
            "tuple has {} values but the partitioning covers {} columns",
            values.len(),
            num_columns
        ));
    }

    let mut key = prefix.to_vec();
    let mut concrete = 0;
    let mut sentinel: Option<&PartitionValue> = None;

    for (i, value) in values.iter().enumerate() {
        if let Some(first) = sentinel {
            if value != first {
                return Err(format!(
                    "{} cannot follow {}",
                    sentinel_name(value),
                    sentinel_name(first)
                ));
            }
            continue;
        }
        match (value, kind) {
            (PartitionValue::Default, TupleKind::List)
            | (PartitionValue::MinValue, TupleKind::Range)
            | (PartitionValue::MaxValue, TupleKind::Range) => sentinel = Some(value),
            (PartitionValue::Default, TupleKind::Range) => {
                return Err("DEFAULT is only valid in list partitions".to_string());
            }
            (PartitionValue::MinValue | PartitionValue::MaxValue, TupleKind::List) => {
                return Err(format!(
                    "{} is only valid in range partitions",
                    sentinel_name(value)
                ));
            }
            (PartitionValue::Datum(datum), _) => {
                let key_column = index.key_columns.get(col_offset + i).ok_or_else(|| {
                    format!(
                        "index \"{}\" has no key column at position {}",
                        index.name,
                        col_offset + i + 1
                    )
                })?;
                let column = table.column(&key_column.column).ok_or_else(|| {
                    format!("column \"{}\" does not exist", key_column.column)
                })?;
                encoder.encode_datum(&mut key, datum, column, key_column.direction)?;
                concrete += 1;
            }
        }
    }

    if sentinel == Some(&PartitionValue::MaxValue) {
        key = prefix_end(&key);
    }
    Ok(PartitionTuple { key, concrete })
}
