//! redb table definitions for the zone store.
//!
//! Keys are descriptor ids; values are JSON-serialized records.

use redb::TableDefinition;

/// Zone records for the default (id 0), databases and tables.
pub const ZONES: TableDefinition<u32, &[u8]> = TableDefinition::new("zones");

/// One `SubzoneTable` per table id. A table without subzones has no row.
pub const SUBZONES: TableDefinition<u32, &[u8]> = TableDefinition::new("subzones");
