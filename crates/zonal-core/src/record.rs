//! Stored zone records and per-table subzone tables.

use serde::{Deserialize, Serialize};

use crate::types::{DescriptorId, IndexId, ZoneLocator};
use crate::zone::ZoneConfig;

/// Explicit configuration stored for the default, a database or a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub config: ZoneConfig,
    /// TOML rendering of the config as last written, kept for display and audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl ZoneRecord {
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            config,
            raw_text: None,
        }
    }

    pub fn with_raw_text(mut self, raw: impl Into<String>) -> Self {
        self.raw_text = Some(raw.into());
        self
    }
}

/// An override scoped to one index (empty partition name) or one partition
/// of that index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subzone {
    pub index_id: IndexId,
    #[serde(default)]
    pub partition_name: String,
    pub config: ZoneConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl Subzone {
    pub fn for_index(index_id: IndexId, config: ZoneConfig) -> Self {
        Self {
            index_id,
            partition_name: String::new(),
            config,
            raw_text: None,
        }
    }

    pub fn for_partition(index_id: IndexId, partition: &str, config: ZoneConfig) -> Self {
        Self {
            index_id,
            partition_name: partition.to_string(),
            config,
            raw_text: None,
        }
    }

    pub fn is_index_subzone(&self) -> bool {
        self.partition_name.is_empty()
    }

    pub fn locator(&self, table_id: DescriptorId) -> ZoneLocator {
        if self.is_index_subzone() {
            ZoneLocator::index(table_id, self.index_id)
        } else {
            ZoneLocator::partition(table_id, self.index_id, &self.partition_name)
        }
    }

    fn matches(&self, index_id: IndexId, partition: &str) -> bool {
        self.index_id == index_id && self.partition_name == partition
    }
}

/// All subzones of one table, unique per (index, partition name).
///
/// A subzone's position in `subzones` is the `subzone_index` that generated
/// spans refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubzoneTable {
    pub table_id: DescriptorId,
    pub subzones: Vec<Subzone>,
}

impl SubzoneTable {
    pub fn new(table_id: DescriptorId) -> Self {
        Self {
            table_id,
            subzones: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subzones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subzones.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subzone> {
        self.subzones.iter()
    }

    pub fn get(&self, index_id: IndexId, partition: &str) -> Option<&Subzone> {
        self.subzones.iter().find(|s| s.matches(index_id, partition))
    }

    pub fn position(&self, index_id: IndexId, partition: &str) -> Option<usize> {
        self.subzones.iter().position(|s| s.matches(index_id, partition))
    }

    /// Replace the subzone with the same (index, partition) in place, or
    /// append it. Returns its position.
    pub fn set(&mut self, subzone: Subzone) -> usize {
        match self.position(subzone.index_id, &subzone.partition_name) {
            Some(pos) => {
                self.subzones[pos] = subzone;
                pos
            }
            None => {
                self.subzones.push(subzone);
                self.subzones.len() - 1
            }
        }
    }

    pub fn remove(&mut self, index_id: IndexId, partition: &str) -> Option<Subzone> {
        let pos = self.position(index_id, partition)?;
        Some(self.subzones.remove(pos))
    }

    /// Drop every subzone of an index. Returns how many were removed.
    pub fn remove_index(&mut self, index_id: IndexId) -> usize {
        let before = self.subzones.len();
        self.subzones.retain(|s| s.index_id != index_id);
        before - self.subzones.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place_and_appends_new() {
        let mut table = SubzoneTable::new(52);
        assert_eq!(table.set(Subzone::for_partition(1, "p0", ZoneConfig::new())), 0);
        assert_eq!(table.set(Subzone::for_index(2, ZoneConfig::new())), 1);

        let replaced = table.set(Subzone::for_partition(
            1,
            "p0",
            ZoneConfig::new().with_gc_ttl(42),
        ));

        assert_eq!(replaced, 0);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(1, "p0").and_then(|s| s.config.gc).map(|g| g.ttl_seconds),
            Some(42)
        );
    }

    #[test]
    fn index_and_partition_subzones_are_distinct() {
        let mut table = SubzoneTable::new(52);
        table.set(Subzone::for_index(1, ZoneConfig::new().with_num_replicas(5)));
        table.set(Subzone::for_partition(1, "p0", ZoneConfig::new().with_gc_ttl(42)));

        assert!(table.get(1, "").unwrap().is_index_subzone());
        assert!(table.remove(1, "").is_some());
        assert!(table.get(1, "p0").is_some());
        assert!(table.remove(1, "").is_none());
    }

    #[test]
    fn remove_index_drops_all_of_its_subzones() {
        let mut table = SubzoneTable::new(52);
        table.set(Subzone::for_index(2, ZoneConfig::new()));
        table.set(Subzone::for_partition(2, "p0", ZoneConfig::new()));
        table.set(Subzone::for_partition(3, "p0", ZoneConfig::new()));

        assert_eq!(table.remove_index(2), 2);
        assert_eq!(table.len(), 1);
        assert!(table.get(3, "p0").is_some());
    }

    #[test]
    fn locator_distinguishes_index_and_partition() {
        let idx = Subzone::for_index(4, ZoneConfig::new());
        let part = Subzone::for_partition(4, "p1", ZoneConfig::new());
        assert_eq!(idx.locator(9), ZoneLocator::index(9, 4));
        assert_eq!(part.locator(9), ZoneLocator::partition(9, 4, "p1"));
    }
}
