//! Subzone span generation.
//!
//! For one table, computes the sorted disjoint spans tiling
//! `[table_prefix, prefix_end(table_prefix))`, each tagged with the position
//! of the subzone governing it in the table's [`SubzoneTable`].
//!
//! Precedence, highest first:
//! 1. coverings of sub-partitions over their parent partition;
//! 2. within a list partitioning, tuples fixing more columns over tuples
//!    fixing fewer (so `DEFAULT` only takes the residual);
//! 3. any partition covering over the index-level subzone.
//!
//! Every partition tuple contributes a covering. One without its own subzone
//! carries the nearest enclosing partition's or index's subzone, or none, so
//! a less specific sibling (such as a `DEFAULT` tuple) never claims its keys.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zonal_catalog::{
    IndexDescriptor, KeyEncoder, PartitionValue, Partitioning, TableDescriptor, prefix_end,
};
use zonal_core::{IndexId, SubzoneTable, ZoneError, ZoneResult};

use crate::convert::{TupleKind, encode_partition_tuple};
use crate::covering::{Covering, overlap_merge};

/// One generated span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubzoneSpan {
    pub key: Vec<u8>,
    /// `None` means `prefix_end(key)`.
    pub end_key: Option<Vec<u8>>,
    /// Position in the table's subzones; `None` falls through to the table.
    pub subzone_index: Option<usize>,
}

impl SubzoneSpan {
    fn new(key: Vec<u8>, end: Vec<u8>, subzone_index: Option<usize>) -> Self {
        let end_key = if end == prefix_end(&key) { None } else { Some(end) };
        Self {
            key,
            end_key,
            subzone_index,
        }
    }

    /// The exclusive end key, with the implicit successor filled in.
    pub fn end(&self) -> Vec<u8> {
        match &self.end_key {
            Some(end) => end.clone(),
            None => prefix_end(&self.key),
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.key.as_slice() <= key && key < self.end().as_slice()
    }
}

/// True when some subzone names an index outside the table's stable set,
/// such as an index still being built.
pub fn has_new_subzones(table: &TableDescriptor, subzones: &SubzoneTable) -> bool {
    subzones
        .iter()
        .any(|s| !table.is_stable_index(s.index_id))
}

/// The span containing `key`, if any. `spans` must be sorted and disjoint.
pub fn lookup<'a>(spans: &'a [SubzoneSpan], key: &[u8]) -> Option<&'a SubzoneSpan> {
    let idx = spans.partition_point(|s| s.key.as_slice() <= key);
    let candidate = spans.get(idx.checked_sub(1)?)?;
    candidate.contains(key).then_some(candidate)
}

struct Generator<'a> {
    encoder: &'a dyn KeyEncoder,
    table: &'a TableDescriptor,
    positions: HashMap<(IndexId, &'a str), usize>,
}

impl<'a> Generator<'a> {
    fn position(&self, index_id: IndexId, partition: &str) -> Option<usize> {
        self.positions.get(&(index_id, partition)).copied()
    }

    fn encoding_failure(index: &IndexDescriptor, partition: &str, reason: String) -> ZoneError {
        ZoneError::EncodingFailure {
            index: index.name.clone(),
            partition: partition.to_string(),
            reason,
        }
    }

    /// Coverings for one partitioning level, highest precedence first.
    /// `inherited` is the subzone of the enclosing partition or index.
    fn partitioning_coverings(
        &self,
        index: &IndexDescriptor,
        part: &Partitioning,
        prefix: &[u8],
        col_offset: usize,
        inherited: Option<usize>,
    ) -> ZoneResult<Vec<Covering>> {
        let mut out = Vec::new();
        if !part.is_partitioned() {
            return Ok(out);
        }

        // List coverings bucketed by how many columns their tuple fixes.
        let mut by_concrete: Vec<Vec<Covering>> = vec![Vec::new(); part.num_columns + 1];
        for list in &part.list {
            let payload = self.position(index.id, &list.name).or(inherited);
            for values in &list.values {
                let tuple = encode_partition_tuple(
                    self.encoder,
                    self.table,
                    index,
                    prefix,
                    col_offset,
                    part.num_columns,
                    values,
                    TupleKind::List,
                )
                .map_err(|reason| Self::encoding_failure(index, &list.name, reason))?;

                if list.subpartitioning.is_partitioned() {
                    if tuple.concrete < part.num_columns {
                        return Err(Self::encoding_failure(
                            index,
                            &list.name,
                            "a sub-partitioned tuple must fix every column".to_string(),
                        ));
                    }
                    out.extend(self.partitioning_coverings(
                        index,
                        &list.subpartitioning,
                        &tuple.key,
                        col_offset + part.num_columns,
                        payload,
                    )?);
                }
                let end = prefix_end(&tuple.key);
                by_concrete[tuple.concrete].push(Covering::new(tuple.key, end, payload));
            }
        }
        out.extend(by_concrete.into_iter().rev().flatten());

        for range in &part.range {
            let encode = |values: &[PartitionValue], kind: TupleKind| {
                encode_partition_tuple(
                    self.encoder,
                    self.table,
                    index,
                    prefix,
                    col_offset,
                    part.num_columns,
                    values,
                    kind,
                )
                .map_err(|reason| Self::encoding_failure(index, &range.name, reason))
            };
            let from = encode(&range.from, TupleKind::Range)?;
            let to = encode(&range.to, TupleKind::Range)?;
            let payload = self.position(index.id, &range.name).or(inherited);
            if from.key >= to.key {
                debug!(index = %index.name, partition = %range.name, "empty range partition skipped");
                continue;
            }
            out.push(Covering::new(from.key, to.key, payload));
        }
        Ok(out)
    }
}

/// Generate the subzone spans of `table`.
///
/// Indexes considered are the stable ones, plus those still being added when
/// `has_new_subzones` is set. A subzone naming an index outside that set is
/// [`ZoneError::StaleSubzone`]; one naming a partition the index no longer
/// has is skipped. Bounds that cannot be encoded fail with
/// [`ZoneError::EncodingFailure`].
pub fn generate_subzone_spans(
    encoder: &dyn KeyEncoder,
    table: &TableDescriptor,
    subzones: &SubzoneTable,
    has_new_subzones: bool,
) -> ZoneResult<Vec<SubzoneSpan>> {
    let indexes: Vec<&IndexDescriptor> = if has_new_subzones {
        table.all_indexes().collect()
    } else {
        table.indexes.iter().collect()
    };
    let known: HashSet<IndexId> = indexes.iter().map(|i| i.id).collect();

    let mut positions = HashMap::new();
    for (pos, subzone) in subzones.iter().enumerate() {
        if !known.contains(&subzone.index_id) {
            return Err(ZoneError::StaleSubzone {
                table_id: table.id,
                index_id: subzone.index_id,
            });
        }
        if !subzone.is_index_subzone() {
            let present = indexes
                .iter()
                .find(|i| i.id == subzone.index_id)
                .is_some_and(|i| i.partitioning.find(&subzone.partition_name).is_some());
            if !present {
                warn!(
                    table_id = table.id,
                    index_id = subzone.index_id,
                    partition = %subzone.partition_name,
                    "subzone names a missing partition, ignoring"
                );
                continue;
            }
        }
        positions.insert((subzone.index_id, subzone.partition_name.as_str()), pos);
    }

    let generator = Generator {
        encoder,
        table,
        positions,
    };

    let mut partition_coverings = Vec::new();
    let mut index_coverings = Vec::new();
    for index in &indexes {
        let prefix = encoder.index_prefix(table.id, index.id);
        // Index prefixes are disjoint, so coverings of different indexes
        // never compete and can share one precedence list.
        let index_subzone = generator.position(index.id, "");
        partition_coverings.extend(generator.partitioning_coverings(
            index,
            &index.partitioning,
            &prefix,
            0,
            index_subzone,
        )?);
        if index_subzone.is_some() {
            let end = prefix_end(&prefix);
            index_coverings.push(Covering::new(prefix, end, index_subzone));
        }
    }
    partition_coverings.extend(index_coverings);
    let merged = overlap_merge(&partition_coverings);

    let table_start = encoder.table_prefix(table.id);
    let table_end = prefix_end(&table_start);
    let mut pieces: Vec<(Vec<u8>, Vec<u8>, Option<usize>)> = Vec::new();
    let mut cursor = table_start;
    for covering in merged {
        if cursor < covering.start {
            pieces.push((cursor, covering.start.clone(), None));
        }
        cursor = covering.end.clone();
        pieces.push((covering.start, covering.end, covering.payload));
    }
    if cursor < table_end {
        pieces.push((cursor, table_end, None));
    }

    let mut coalesced: Vec<(Vec<u8>, Vec<u8>, Option<usize>)> = Vec::with_capacity(pieces.len());
    for (start, end, tag) in pieces {
        match coalesced.last_mut() {
            Some(last) if last.2 == tag && last.1 == start => last.1 = end,
            _ => coalesced.push((start, end, tag)),
        }
    }

    let spans: Vec<SubzoneSpan> = coalesced
        .into_iter()
        .map(|(start, end, tag)| SubzoneSpan::new(start, end, tag))
        .collect();
    debug!(
        table_id = table.id,
        subzones = subzones.len(),
        spans = spans.len(),
        "generated subzone spans"
    );
    Ok(spans)
}
