//! zonal-placement — turns a table's subzones into key spans.
//!
//! The range-placement driver applies zone configs per key range. This
//! crate computes, for one table, the ordered disjoint spans that tile the
//! table's keyspace, each tagged with the subzone whose config governs it
//! (or untagged, falling through to the table's own zone).
//!
//! # Components
//!
//! - **`convert`**: Partition tuples to encoded key bounds
//! - **`covering`**: Precedence-ordered overlap merge of key ranges
//! - **`spans`**: Span generation, key lookup, new-subzone detection

pub mod convert;
pub mod covering;
pub mod spans;

pub use convert::{PartitionTuple, TupleKind, encode_partition_tuple};
pub use covering::{Covering, overlap_merge};
pub use spans::{SubzoneSpan, generate_subzone_spans, has_new_subzones, lookup};
