//! Catalog snapshot: databases, tables, indexes and their partitionings.
//!
//! The authoritative descriptor store lives elsewhere; callers hand the
//! control plane a consistent snapshot of it taken inside their transaction.

use serde::{Deserialize, Serialize};
use zonal_core::{DescriptorId, IndexId};

/// Column value type, as far as key encoding cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    String,
    Bool,
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

/// A key column of an index and its sort direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub column: String,
    #[serde(default)]
    pub direction: Direction,
}

/// A single SQL value appearing in a partition bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    Bytes(Vec<u8>),
}

impl Datum {
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "bool",
            Datum::Int(_) => "int",
            Datum::String(_) => "string",
            Datum::Bytes(_) => "bytes",
        }
    }
}

/// One element of a partition tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionValue {
    /// List catch-all; this and every later element match anything.
    Default,
    /// Range lower sentinel.
    MinValue,
    /// Range upper sentinel.
    MaxValue,
    #[serde(rename = "value")]
    Datum(Datum),
}

impl PartitionValue {
    pub fn int(v: i64) -> Self {
        PartitionValue::Datum(Datum::Int(v))
    }

    pub fn string(v: &str) -> Self {
        PartitionValue::Datum(Datum::String(v.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPartition {
    pub name: String,
    /// Tuples, each of at most `num_columns` elements.
    pub values: Vec<Vec<PartitionValue>>,
    #[serde(default)]
    pub subpartitioning: Partitioning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangePartition {
    pub name: String,
    pub from: Vec<PartitionValue>,
    pub to: Vec<PartitionValue>,
}

/// `PARTITION BY LIST` / `PARTITION BY RANGE` over the next `num_columns`
/// key columns of an index. `num_columns == 0` means unpartitioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partitioning {
    #[serde(default)]
    pub num_columns: usize,
    #[serde(default)]
    pub list: Vec<ListPartition>,
    #[serde(default)]
    pub range: Vec<RangePartition>,
}

impl Partitioning {
    pub fn is_partitioned(&self) -> bool {
        self.num_columns > 0
    }

    /// Names from the outermost partition down to `name`, searching nested
    /// sub-partitionings depth first.
    pub fn find(&self, name: &str) -> Option<Vec<String>> {
        for list in &self.list {
            if list.name == name {
                return Some(vec![list.name.clone()]);
            }
            if let Some(mut path) = list.subpartitioning.find(name) {
                path.insert(0, list.name.clone());
                return Some(path);
            }
        }
        self.range
            .iter()
            .find(|r| r.name == name)
            .map(|r| vec![r.name.clone()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub id: IndexId,
    pub name: String,
    pub key_columns: Vec<IndexColumn>,
    #[serde(default)]
    pub partitioning: Partitioning,
    /// Transient index absorbing writes during an online build.
    #[serde(default)]
    pub temporary: bool,
    /// For a temporary index, the index under construction it shadows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_for: Option<IndexId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub id: DescriptorId,
    /// Owning database.
    pub parent_id: DescriptorId,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Stable (public) indexes; the first is the primary index.
    pub indexes: Vec<IndexDescriptor>,
    /// Indexes being added by an in-flight schema change.
    #[serde(default)]
    pub adding_indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Stable indexes followed by indexes still being added.
    pub fn all_indexes(&self) -> impl Iterator<Item = &IndexDescriptor> {
        self.indexes.iter().chain(self.adding_indexes.iter())
    }

    pub fn find_index(&self, id: IndexId) -> Option<&IndexDescriptor> {
        self.all_indexes().find(|i| i.id == id)
    }

    pub fn find_index_by_name(&self, name: &str) -> Option<&IndexDescriptor> {
        self.all_indexes().find(|i| i.name == name)
    }

    pub fn is_stable_index(&self, id: IndexId) -> bool {
        self.indexes.iter().any(|i| i.id == id)
    }

    pub fn index_mut(&mut self, id: IndexId) -> Option<&mut IndexDescriptor> {
        self.indexes
            .iter_mut()
            .chain(self.adding_indexes.iter_mut())
            .find(|i| i.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    pub id: DescriptorId,
    pub name: String,
}

/// Consistent snapshot of the descriptors visible to one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub databases: Vec<DatabaseDescriptor>,
    #[serde(default)]
    pub tables: Vec<TableDescriptor>,
}

impl Catalog {
    pub fn database(&self, id: DescriptorId) -> Option<&DatabaseDescriptor> {
        self.databases.iter().find(|d| d.id == id)
    }

    pub fn database_by_name(&self, name: &str) -> Option<&DatabaseDescriptor> {
        self.databases.iter().find(|d| d.name == name)
    }

    pub fn table(&self, id: DescriptorId) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn table_mut(&mut self, id: DescriptorId) -> Option<&mut TableDescriptor> {
        self.tables.iter_mut().find(|t| t.id == id)
    }

    pub fn table_by_name(&self, database_id: DescriptorId, name: &str) -> Option<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.parent_id == database_id && t.name == name)
    }

    pub fn tables_in(&self, database_id: DescriptorId) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.iter().filter(move |t| t.parent_id == database_id)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
