//! zonal-catalog — what the zone control plane knows about schema objects.
//!
//! A catalog snapshot of databases, tables, indexes and partitionings, the
//! ordered key encoding partition bounds are turned into, and resolution of
//! administrative targets (`TABLE d.t`, `PARTITION p OF INDEX d.t@i`, ...)
//! to descriptor ids.

pub mod descriptor;
pub mod keys;
pub mod target;

pub use descriptor::{
    Catalog, ColumnDescriptor, ColumnType, DatabaseDescriptor, Datum, Direction, IndexColumn,
    IndexDescriptor, ListPartition, PartitionValue, Partitioning, RangePartition, TableDescriptor,
};
pub use keys::{KeyEncoder, OrderedKeyEncoder, prefix_end, pretty_key};
pub use target::{IndexName, PartitionOf, ResolvedTarget, TableName, TargetResolver, TargetSpec};
