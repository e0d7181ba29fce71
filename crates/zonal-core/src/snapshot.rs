//! Point-in-time view of every explicit zone record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{SubzoneTable, ZoneRecord};
use crate::types::{DescriptorId, ZoneLocator};
use crate::zone::ZoneConfig;

/// Immutable snapshot of zone records and subzone tables, read in one
/// transaction. Resolution runs entirely against a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub zones: BTreeMap<DescriptorId, ZoneRecord>,
    pub subzones: BTreeMap<DescriptorId, SubzoneTable>,
}

impl ZoneSnapshot {
    pub fn zone(&self, id: DescriptorId) -> Option<&ZoneRecord> {
        self.zones.get(&id)
    }

    pub fn subzones_for(&self, table_id: DescriptorId) -> Option<&SubzoneTable> {
        self.subzones.get(&table_id)
    }

    /// The explicit configuration stored at `locator`, if any.
    pub fn explicit(&self, locator: &ZoneLocator) -> Option<&ZoneConfig> {
        match locator.index_id {
            Some(index_id) => self
                .subzones_for(locator.id)?
                .get(index_id, locator.partition_name())
                .map(|s| &s.config),
            None => self.zone(locator.id).map(|r| &r.config),
        }
    }

    /// Every explicit record in the snapshot, zones first then subzones.
    pub fn explicit_records(&self) -> Vec<(ZoneLocator, &ZoneConfig)> {
        let mut out: Vec<(ZoneLocator, &ZoneConfig)> = self
            .zones
            .iter()
            .map(|(id, rec)| (ZoneLocator::object(*id), &rec.config))
            .collect();
        for (table_id, table) in &self.subzones {
            out.extend(table.iter().map(|s| (s.locator(*table_id), &s.config)));
        }
        out
    }
}
