//! Administrative targets: parsing, resolution against a catalog snapshot,
//! and the fixed ancestor chain the hierarchy resolver walks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zonal_core::{DescriptorId, IndexId, ZoneError, ZoneLocator, ZoneResult};

use crate::descriptor::{Catalog, DatabaseDescriptor, IndexDescriptor, TableDescriptor};

/// `[database.]table`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableName {
    pub database: Option<String>,
    pub table: String,
}

/// `[database.]table@index` or a bare `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexName {
    pub database: Option<String>,
    pub table: Option<String>,
    pub index: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionOf {
    Table(TableName),
    Index(IndexName),
}

/// An administrative target as written by an operator, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSpec {
    Default,
    Database { name: String },
    Table(TableName),
    Index(IndexName),
    Partition { partition: String, of: PartitionOf },
}

/// A target resolved to descriptor ids.
///
/// Each variant carries exactly the ids its ancestor chain needs, so
/// [`ResolvedTarget::parent`] needs no catalog access. A nested partition
/// lists its enclosing partitions outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvedTarget {
    Default,
    Database {
        database_id: DescriptorId,
    },
    Table {
        database_id: DescriptorId,
        table_id: DescriptorId,
    },
    Index {
        database_id: DescriptorId,
        table_id: DescriptorId,
        index_id: IndexId,
    },
    Partition {
        database_id: DescriptorId,
        table_id: DescriptorId,
        index_id: IndexId,
        name: String,
        parents: Vec<String>,
    },
}

impl ResolvedTarget {
    /// Next target up the inheritance chain. Partitions climb to their
    /// enclosing partition, then to their index.
    pub fn parent(&self) -> Option<ResolvedTarget> {
        match self {
            ResolvedTarget::Default => None,
            ResolvedTarget::Database { .. } => Some(ResolvedTarget::Default),
            ResolvedTarget::Table { database_id, .. } => Some(ResolvedTarget::Database {
                database_id: *database_id,
            }),
            ResolvedTarget::Index {
                database_id,
                table_id,
                ..
            } => Some(ResolvedTarget::Table {
                database_id: *database_id,
                table_id: *table_id,
            }),
            ResolvedTarget::Partition {
                database_id,
                table_id,
                index_id,
                parents,
                ..
            } => match parents.split_last() {
                Some((enclosing, rest)) => Some(ResolvedTarget::Partition {
                    database_id: *database_id,
                    table_id: *table_id,
                    index_id: *index_id,
                    name: enclosing.clone(),
                    parents: rest.to_vec(),
                }),
                None => Some(ResolvedTarget::Index {
                    database_id: *database_id,
                    table_id: *table_id,
                    index_id: *index_id,
                }),
            },
        }
    }

    /// This target followed by every ancestor, ending at the default.
    pub fn ancestry(&self) -> Vec<ResolvedTarget> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(ResolvedTarget::parent) {
            chain.push(parent);
        }
        chain
    }

    pub fn locator(&self) -> ZoneLocator {
        match self {
            ResolvedTarget::Default => ZoneLocator::root(),
            ResolvedTarget::Database { database_id } => ZoneLocator::object(*database_id),
            ResolvedTarget::Table { table_id, .. } => ZoneLocator::object(*table_id),
            ResolvedTarget::Index {
                table_id, index_id, ..
            } => ZoneLocator::index(*table_id, *index_id),
            ResolvedTarget::Partition {
                table_id,
                index_id,
                name,
                ..
            } => ZoneLocator::partition(*table_id, *index_id, name),
        }
    }

    pub fn table_id(&self) -> Option<DescriptorId> {
        match self {
            ResolvedTarget::Table { table_id, .. }
            | ResolvedTarget::Index { table_id, .. }
            | ResolvedTarget::Partition { table_id, .. } => Some(*table_id),
            _ => None,
        }
    }

    pub fn index_id(&self) -> Option<IndexId> {
        match self {
            ResolvedTarget::Index { index_id, .. } | ResolvedTarget::Partition { index_id, .. } => {
                Some(*index_id)
            }
            _ => None,
        }
    }

    /// The same index or partition target on another index of the table.
    pub fn on_index(&self, other: IndexId) -> Option<ResolvedTarget> {
        let mut moved = self.clone();
        match &mut moved {
            ResolvedTarget::Index { index_id, .. } | ResolvedTarget::Partition { index_id, .. } => {
                *index_id = other;
                Some(moved)
            }
            _ => None,
        }
    }
}

/// Resolves [`TargetSpec`]s against one catalog snapshot.
pub struct TargetResolver<'a> {
    catalog: &'a Catalog,
    current_database: Option<&'a str>,
}

impl<'a> TargetResolver<'a> {
    pub fn new(catalog: &'a Catalog, current_database: Option<&'a str>) -> Self {
        Self {
            catalog,
            current_database,
        }
    }

    /// Resolve to the preferred single target.
    pub fn resolve(&self, spec: &TargetSpec) -> ZoneResult<ResolvedTarget> {
        let mut all = self.resolve_all(spec)?;
        Ok(all.remove(0))
    }

    /// Resolve to every matching target, preferred first.
    ///
    /// Only partition-of-table targets can match more than once: when an
    /// index build is in flight, the new index and its temporary twin carry
    /// the same partitions.
    pub fn resolve_all(&self, spec: &TargetSpec) -> ZoneResult<Vec<ResolvedTarget>> {
        let resolved = match spec {
            TargetSpec::Default => vec![ResolvedTarget::Default],
            TargetSpec::Database { name } => {
                let db = self.database(name)?;
                vec![ResolvedTarget::Database { database_id: db.id }]
            }
            TargetSpec::Table(name) => {
                let table = self.table(name)?;
                vec![ResolvedTarget::Table {
                    database_id: table.parent_id,
                    table_id: table.id,
                }]
            }
            TargetSpec::Index(name) => {
                let (table, index) = self.index(name)?;
                vec![ResolvedTarget::Index {
                    database_id: table.parent_id,
                    table_id: table.id,
                    index_id: index.id,
                }]
            }
            TargetSpec::Partition { partition, of } => self.partition(partition, of)?,
        };
        debug!(zone = %spec, matches = resolved.len(), "resolved zone target");
        Ok(resolved)
    }

    fn database(&self, name: &str) -> ZoneResult<&'a DatabaseDescriptor> {
        self.catalog
            .database_by_name(name)
            .ok_or_else(|| ZoneError::not_found("database", name))
    }

    fn scope(&self, explicit: Option<&str>) -> ZoneResult<Option<&'a DatabaseDescriptor>> {
        match explicit.or(self.current_database) {
            Some(name) => self.database(name).map(Some),
            None => Ok(None),
        }
    }

    fn table(&self, name: &TableName) -> ZoneResult<&'a TableDescriptor> {
        let db = self
            .scope(name.database.as_deref())?
            .ok_or_else(|| ZoneError::not_found("relation", &name.table))?;
        self.catalog
            .table_by_name(db.id, &name.table)
            .ok_or_else(|| ZoneError::not_found("relation", &name.table))
    }

    fn index(&self, name: &IndexName) -> ZoneResult<(&'a TableDescriptor, &'a IndexDescriptor)> {
        if let Some(table) = &name.table {
            let table = self.table(&TableName {
                database: name.database.clone(),
                table: table.clone(),
            })?;
            let index = table
                .find_index_by_name(&name.index)
                .ok_or_else(|| ZoneError::not_found("index", &name.index))?;
            return Ok((table, index));
        }

        let Some(db) = self.scope(name.database.as_deref())? else {
            return Err(ZoneError::not_found("index", &name.index));
        };
        let matches: Vec<(&TableDescriptor, &IndexDescriptor)> = self
            .catalog
            .tables_in(db.id)
            .filter_map(|t| t.find_index_by_name(&name.index).map(|i| (t, i)))
            .collect();
        match matches.as_slice() {
            [] => Err(ZoneError::not_found("index", &name.index)),
            [only] => Ok(*only),
            many => Err(ZoneError::AmbiguousIndex {
                name: name.index.clone(),
                tables: many.iter().map(|(t, _)| t.name.clone()).collect(),
            }),
        }
    }

    fn partition(&self, partition: &str, of: &PartitionOf) -> ZoneResult<Vec<ResolvedTarget>> {
        let (table, candidates): (&TableDescriptor, Vec<&IndexDescriptor>) = match of {
            PartitionOf::Table(name) => {
                let table = self.table(name)?;
                let mut indexes: Vec<&IndexDescriptor> = table.all_indexes().collect();
                // Stable before in-flight, real before temporary; stable sort keeps id order.
                indexes.sort_by_key(|i| (!table.is_stable_index(i.id), i.temporary));
                (table, indexes)
            }
            PartitionOf::Index(name) => {
                let (table, index) = self.index(name)?;
                (table, vec![index])
            }
        };

        let found: Vec<ResolvedTarget> = candidates
            .into_iter()
            .filter_map(|index| {
                let mut path = index.partitioning.find(partition)?;
                let name = path.pop()?;
                Some(ResolvedTarget::Partition {
                    database_id: table.parent_id,
                    table_id: table.id,
                    index_id: index.id,
                    name,
                    parents: path,
                })
            })
            .collect();
        if found.is_empty() {
            return Err(ZoneError::not_found("partition", partition));
        }
        Ok(found)
    }

    /// Operator-facing name of a resolved target, e.g. `PARTITION p0 OF INDEX d.t@t_pkey`.
    pub fn describe(&self, target: &ResolvedTarget) -> String {
        let db_name = |id: DescriptorId| {
            self.catalog
                .database(id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| id.to_string())
        };
        let table_name = |id: DescriptorId| match self.catalog.table(id) {
            Some(t) => format!("{}.{}", db_name(t.parent_id), t.name),
            None => id.to_string(),
        };
        let index_name = |table_id: DescriptorId, index_id: IndexId| {
            let index = self
                .catalog
                .table(table_id)
                .and_then(|t| t.find_index(index_id))
                .map(|i| i.name.clone())
                .unwrap_or_else(|| index_id.to_string());
            format!("{}@{}", table_name(table_id), index)
        };
        match target {
            ResolvedTarget::Default => "RANGE default".to_string(),
            ResolvedTarget::Database { database_id } => format!("DATABASE {}", db_name(*database_id)),
            ResolvedTarget::Table { table_id, .. } => format!("TABLE {}", table_name(*table_id)),
            ResolvedTarget::Index {
                table_id, index_id, ..
            } => format!("INDEX {}", index_name(*table_id, *index_id)),
            ResolvedTarget::Partition {
                table_id,
                index_id,
                name,
                ..
            } => format!("PARTITION {name} OF INDEX {}", index_name(*table_id, *index_id)),
        }
    }
}

fn unquote(ident: &str) -> String {
    ident.trim().trim_matches('"').to_string()
}

fn parse_table_name(text: &str) -> ZoneResult<TableName> {
    let parts: Vec<&str> = text.split('.').collect();
    match parts.as_slice() {
        [table] => Ok(TableName {
            database: None,
            table: unquote(table),
        }),
        [db, table] | [db, _, table] => Ok(TableName {
            database: Some(unquote(db)),
            table: unquote(table),
        }),
        _ => Err(ZoneError::invalid(format!("invalid table name \"{text}\""))),
    }
}

fn parse_index_name(text: &str) -> ZoneResult<IndexName> {
    match text.split_once('@') {
        Some((table, index)) => {
            let table = parse_table_name(table)?;
            Ok(IndexName {
                database: table.database,
                table: Some(table.table),
                index: unquote(index),
            })
        }
        None => Ok(IndexName {
            database: None,
            table: None,
            index: unquote(text),
        }),
    }
}

impl FromStr for TargetSpec {
    type Err = ZoneError;

    /// Parses `RANGE default`, `DATABASE d`, `TABLE d.t`, `INDEX d.t@i`,
    /// `INDEX i`, `PARTITION p OF TABLE d.t` and `PARTITION p OF INDEX d.t@i`.
    fn from_str(s: &str) -> ZoneResult<Self> {
        let words: Vec<&str> = s.split_whitespace().collect();
        let upper: Vec<String> = words.iter().map(|w| w.to_ascii_uppercase()).collect();
        let upper: Vec<&str> = upper.iter().map(String::as_str).collect();
        match (upper.as_slice(), words.as_slice()) {
            (["RANGE", "DEFAULT"], _) => Ok(TargetSpec::Default),
            (["DATABASE", _], [_, name]) => Ok(TargetSpec::Database {
                name: unquote(name),
            }),
            (["TABLE", _], [_, name]) => Ok(TargetSpec::Table(parse_table_name(name)?)),
            (["INDEX", _], [_, name]) => Ok(TargetSpec::Index(parse_index_name(name)?)),
            (["PARTITION", _, "OF", "TABLE", _], [_, part, _, _, name]) => Ok(TargetSpec::Partition {
                partition: unquote(part),
                of: PartitionOf::Table(parse_table_name(name)?),
            }),
            (["PARTITION", _, "OF", "INDEX", _], [_, part, _, _, name]) => Ok(TargetSpec::Partition {
                partition: unquote(part),
                of: PartitionOf::Index(parse_index_name(name)?),
            }),
            _ => Err(ZoneError::invalid(format!("unrecognized zone target \"{s}\""))),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{db}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => {
                if let Some(db) = &self.database {
                    write!(f, "{db}.")?;
                }
                write!(f, "{table}@{}", self.index)
            }
            None => f.write_str(&self.index),
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Default => f.write_str("RANGE default"),
            TargetSpec::Database { name } => write!(f, "DATABASE {name}"),
            TargetSpec::Table(name) => write!(f, "TABLE {name}"),
            TargetSpec::Index(name) => write!(f, "INDEX {name}"),
            TargetSpec::Partition {
                partition,
                of: PartitionOf::Table(name),
            } => write!(f, "PARTITION {partition} OF TABLE {name}"),
            TargetSpec::Partition {
                partition,
                of: PartitionOf::Index(name),
            } => write!(f, "PARTITION {partition} OF INDEX {name}"),
        }
    }
}
