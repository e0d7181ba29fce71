//! Identifiers and locators shared across zonal crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Descriptor id of a database or table.
pub type DescriptorId = u32;

/// Index id, unique within a table.
pub type IndexId = u32;

/// Sentinel descriptor id under which the global default zone is stored.
pub const ROOT_ZONE_ID: DescriptorId = 0;

/// Canonical storage address of an explicit zone configuration.
///
/// `id` is the root sentinel, a database id or a table id. Index and
/// partition locators always carry the owning table id and address a
/// subzone of that table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneLocator {
    pub id: DescriptorId,
    pub index_id: Option<IndexId>,
    pub partition: Option<String>,
}

impl ZoneLocator {
    pub fn root() -> Self {
        Self::object(ROOT_ZONE_ID)
    }

    pub fn object(id: DescriptorId) -> Self {
        Self {
            id,
            index_id: None,
            partition: None,
        }
    }

    pub fn index(table_id: DescriptorId, index_id: IndexId) -> Self {
        Self {
            id: table_id,
            index_id: Some(index_id),
            partition: None,
        }
    }

    pub fn partition(table_id: DescriptorId, index_id: IndexId, name: &str) -> Self {
        Self {
            id: table_id,
            index_id: Some(index_id),
            partition: Some(name.to_string()),
        }
    }

    /// True when the locator addresses a subzone rather than a zone record.
    pub fn is_subzone(&self) -> bool {
        self.index_id.is_some()
    }

    /// Partition name as stored in a subzone (empty for the index itself).
    pub fn partition_name(&self) -> &str {
        self.partition.as_deref().unwrap_or("")
    }
}

impl fmt::Display for ZoneLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(index_id) = self.index_id {
            write!(f, "@{index_id}")?;
        }
        if let Some(partition) = &self.partition {
            write!(f, ".{partition}")?;
        }
        Ok(())
    }
}
