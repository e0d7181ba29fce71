//! Hierarchy resolution over a zone snapshot.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;
use zonal_catalog::{Catalog, ResolvedTarget, TableDescriptor, TargetResolver, TargetSpec};
use zonal_core::{ZoneConfig, ZoneField, ZoneResult, ZoneSnapshot};
use zonal_placement::{SubzoneSpan, lookup};

/// The complete configuration in effect at a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneResolution {
    pub target: ResolvedTarget,
    /// Every field set.
    pub config: ZoneConfig,
    /// Nearest member of the chain, the target included, holding an explicit
    /// record. The default when nothing else does.
    pub supplied_by: ResolvedTarget,
    /// Chain member each field was taken from.
    pub field_sources: BTreeMap<ZoneField, ResolvedTarget>,
}

/// Resolves effective configs against one snapshot.
///
/// `fallback` is the complete default zone used when the snapshot holds no
/// default record, and to fill anything the stored default leaves unset.
pub struct HierarchyResolver<'a> {
    snapshot: &'a ZoneSnapshot,
    fallback: &'a ZoneConfig,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(snapshot: &'a ZoneSnapshot, fallback: &'a ZoneConfig) -> Self {
        Self { snapshot, fallback }
    }

    /// Effective config of an already-resolved target. Cannot fail.
    pub fn resolve(&self, target: &ResolvedTarget) -> ZoneResolution {
        let mut config = ZoneConfig::new();
        let mut supplied_by = None;
        let mut field_sources = BTreeMap::new();

        for member in target.ancestry() {
            if config.is_complete() {
                break;
            }
            let Some(explicit) = self.snapshot.explicit(&member.locator()) else {
                continue;
            };
            if supplied_by.is_none() {
                supplied_by = Some(member.clone());
            }
            for field in config.inherit_from(explicit) {
                field_sources.insert(field, member.clone());
            }
        }
        for field in config.inherit_from(self.fallback) {
            field_sources.insert(field, ResolvedTarget::Default);
        }

        let supplied_by = supplied_by.unwrap_or(ResolvedTarget::Default);
        debug!(
            locator = %target.locator(),
            supplied_by = %supplied_by.locator(),
            "resolved zone config"
        );
        ZoneResolution {
            target: target.clone(),
            config,
            supplied_by,
            field_sources,
        }
    }

    /// Resolve a textual target against `catalog`, then its config.
    pub fn resolve_spec(
        &self,
        catalog: &Catalog,
        current_database: Option<&str>,
        spec: &TargetSpec,
    ) -> ZoneResult<ZoneResolution> {
        let target = TargetResolver::new(catalog, current_database).resolve(spec)?;
        Ok(self.resolve(&target))
    }

    /// Effective config of the row at `key` in `table`, given the table's
    /// generated spans. Keys in untagged spans, or outside every span,
    /// resolve as the table itself.
    pub fn resolve_key(
        &self,
        table: &TableDescriptor,
        spans: &[SubzoneSpan],
        key: &[u8],
    ) -> ZoneResolution {
        let table_target = ResolvedTarget::Table {
            database_id: table.parent_id,
            table_id: table.id,
        };
        let subzone = lookup(spans, key)
            .and_then(|span| span.subzone_index)
            .and_then(|pos| self.snapshot.subzones_for(table.id)?.subzones.get(pos));

        let target = match subzone {
            Some(subzone) if subzone.is_index_subzone() => ResolvedTarget::Index {
                database_id: table.parent_id,
                table_id: table.id,
                index_id: subzone.index_id,
            },
            Some(subzone) => {
                let path = table
                    .find_index(subzone.index_id)
                    .and_then(|i| i.partitioning.find(&subzone.partition_name));
                match path {
                    Some(mut parents) => {
                        parents.pop();
                        ResolvedTarget::Partition {
                            database_id: table.parent_id,
                            table_id: table.id,
                            index_id: subzone.index_id,
                            name: subzone.partition_name.clone(),
                            parents,
                        }
                    }
                    None => table_target,
                }
            }
            None => table_target,
        };
        self.resolve(&target)
    }
}
