//! ZoneAdmin — the administrative surface over the zone store.
//!
//! Every write resolves its target against the caller's catalog snapshot,
//! fans out to linked temporary indexes, writes all records and regenerates
//! the affected table's spans inside one store transaction. Span generation
//! failing aborts the whole write.

use serde::Serialize;
use tracing::{debug, info};
use zonal_catalog::{Catalog, OrderedKeyEncoder, ResolvedTarget, TargetResolver, TargetSpec};
use zonal_core::{
    DescriptorId, IndexId, ROOT_ZONE_ID, Subzone, ZoneConfig, ZoneError, ZoneLocator, ZoneRecord,
};
use zonal_placement::{SubzoneSpan, generate_subzone_spans, has_new_subzones};
use zonal_resolver::{HierarchyResolver, ZoneResolution};
use zonal_state::{ZoneStore, ZoneWriteTxn};

use crate::error::{AdminError, AdminResult};
use crate::mirror::TempIndexMirror;

/// How a configure call changes the target's explicit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneUpdate {
    /// Replace the record wholesale.
    Replace(ZoneConfig),
    /// Overlay the set fields onto the target's own existing record.
    SetFields(ZoneConfig),
    /// Inherit everything. For the default target, restore the configured
    /// default zone.
    UseDefault,
}

impl ZoneUpdate {
    fn config(&self) -> Option<&ZoneConfig> {
        match self {
            ZoneUpdate::Replace(config) | ZoneUpdate::SetFields(config) => Some(config),
            ZoneUpdate::UseDefault => None,
        }
    }
}

/// Result of a configure or discard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    /// Every target written, mirrors included.
    pub targets: Vec<ResolvedTarget>,
    /// Regenerated spans when the targets live inside a table.
    pub spans: Option<Vec<SubzoneSpan>>,
}

/// An explicit record as listed by [`ZoneAdmin::show_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplicitZone {
    pub locator: ZoneLocator,
    pub config: ZoneConfig,
}

pub struct ZoneAdmin {
    store: ZoneStore,
    mirror: TempIndexMirror,
    default_zone: ZoneConfig,
}

fn raw_text(config: &ZoneConfig) -> AdminResult<Option<String>> {
    if config.is_empty() {
        return Ok(None);
    }
    Ok(Some(config.to_toml_string()?))
}

impl ZoneAdmin {
    /// `default_zone` must be complete; it seeds the store and fills any
    /// field the stored default lacks.
    pub fn new(store: ZoneStore, default_zone: ZoneConfig) -> Self {
        Self {
            store,
            mirror: TempIndexMirror::new(),
            default_zone,
        }
    }

    /// Registry the schema-change executor reports temporary indexes to.
    pub fn mirror(&self) -> &TempIndexMirror {
        &self.mirror
    }

    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    /// Link every temporary index the catalog marks as shadowing a new
    /// index. Returns how many links it registered.
    pub fn link_from_catalog(&self, catalog: &Catalog) -> usize {
        let mut linked = 0;
        for table in &catalog.tables {
            for index in table.all_indexes() {
                let Some(new_index) = index.temporary_for else {
                    continue;
                };
                if self.mirror.temp_for(table.id, new_index) != Some(index.id) {
                    self.mirror.link(table.id, new_index, index.id);
                    linked += 1;
                }
            }
        }
        linked
    }

    /// Store the configured default zone unless one is already stored.
    /// Returns true when it wrote one.
    pub fn bootstrap(&self) -> AdminResult<bool> {
        if self.store.get_zone(ROOT_ZONE_ID)?.is_some() {
            return Ok(false);
        }
        self.default_zone.validate_complete()?;
        let mut record = ZoneRecord::new(self.default_zone.clone());
        record.raw_text = raw_text(&self.default_zone)?;
        self.store.put_zone(ROOT_ZONE_ID, &record)?;
        info!("default zone bootstrapped");
        Ok(true)
    }

    fn targets(
        &self,
        catalog: &Catalog,
        current_database: Option<&str>,
        spec: &TargetSpec,
    ) -> AdminResult<Vec<ResolvedTarget>> {
        let resolved = TargetResolver::new(catalog, current_database).resolve_all(spec)?;
        Ok(self.mirror.with_mirrors(resolved))
    }

    fn updated(&self, existing: Option<ZoneConfig>, update: &ZoneUpdate, is_default: bool) -> ZoneConfig {
        match update {
            ZoneUpdate::Replace(config) => config.clone(),
            ZoneUpdate::SetFields(config) => {
                let mut base = existing.unwrap_or_else(|| {
                    if is_default {
                        self.default_zone.clone()
                    } else {
                        ZoneConfig::new()
                    }
                });
                base.overlay(config);
                base
            }
            ZoneUpdate::UseDefault if is_default => self.default_zone.clone(),
            ZoneUpdate::UseDefault => ZoneConfig::new(),
        }
    }

    fn apply(&self, txn: &mut ZoneWriteTxn, target: &ResolvedTarget, update: &ZoneUpdate) -> AdminResult<()> {
        let locator = target.locator();
        match locator.index_id {
            None => {
                let is_default = *target == ResolvedTarget::Default;
                let existing = txn.zone(locator.id)?.map(|r| r.config);
                let config = self.updated(existing, update, is_default);
                config.validate()?;
                if is_default {
                    config.validate_complete()?;
                }
                let mut record = ZoneRecord::new(config);
                record.raw_text = raw_text(&record.config)?;
                txn.set_zone(locator.id, &record)?;
            }
            Some(index_id) => {
                let partition = locator.partition_name();
                let existing = txn
                    .subzones(locator.id)?
                    .get(index_id, partition)
                    .map(|s| s.config.clone());
                let config = self.updated(existing, update, false);
                config.validate()?;
                let mut subzone = Subzone::for_partition(index_id, partition, config);
                subzone.raw_text = raw_text(&subzone.config)?;
                txn.set_subzone(locator.id, subzone)?;
            }
        }
        debug!(%locator, "explicit zone written");
        Ok(())
    }

    /// A partial record can be valid alone yet contradict what it inherits,
    /// e.g. a `range_max_bytes` below an ancestor's `range_min_bytes`.
    fn validate_effective(&self, txn: &ZoneWriteTxn, targets: &[ResolvedTarget]) -> AdminResult<()> {
        let snapshot = txn.snapshot()?;
        let resolver = HierarchyResolver::new(&snapshot, &self.default_zone);
        for target in targets {
            resolver.resolve(target).config.validate()?;
        }
        Ok(())
    }

    fn regenerate(
        &self,
        txn: &ZoneWriteTxn,
        catalog: &Catalog,
        targets: &[ResolvedTarget],
    ) -> AdminResult<Option<Vec<SubzoneSpan>>> {
        let Some(table_id) = targets.iter().find_map(ResolvedTarget::table_id) else {
            return Ok(None);
        };
        let table = catalog
            .table(table_id)
            .ok_or_else(|| ZoneError::not_found("relation", table_id.to_string()))?;
        let subzones = txn.subzones(table_id)?;
        let spans = generate_subzone_spans(
            &OrderedKeyEncoder,
            table,
            &subzones,
            has_new_subzones(table, &subzones),
        )?;
        Ok(Some(spans))
    }

    /// Apply `update` at every index the target resolves to, and at linked
    /// temporary indexes, in one transaction.
    pub fn configure(
        &self,
        catalog: &Catalog,
        current_database: Option<&str>,
        spec: &TargetSpec,
        update: &ZoneUpdate,
    ) -> AdminResult<WriteOutcome> {
        if let Some(config) = update.config() {
            config.validate()?;
        }
        let targets = self.targets(catalog, current_database, spec)?;
        let spans = self.store.write(|txn| {
            for target in &targets {
                self.apply(txn, target, update)?;
            }
            self.validate_effective(txn, &targets)?;
            self.regenerate(txn, catalog, &targets)
        })?;
        info!(zone = %spec, writes = targets.len(), "zone config applied");
        Ok(WriteOutcome { targets, spans })
    }

    /// Remove the explicit record at the target and its mirrors. Removing
    /// a record that does not exist is not an error.
    pub fn discard(
        &self,
        catalog: &Catalog,
        current_database: Option<&str>,
        spec: &TargetSpec,
    ) -> AdminResult<WriteOutcome> {
        if *spec == TargetSpec::Default {
            return Err(ZoneError::invalid("cannot remove default zone").into());
        }
        let targets = self.targets(catalog, current_database, spec)?;
        let (removed, spans) = self.store.write(|txn| {
            let mut removed = 0;
            for target in &targets {
                let locator = target.locator();
                let existed = match locator.index_id {
                    None => txn.delete_zone(locator.id)?,
                    Some(index_id) => txn.delete_subzone(locator.id, index_id, locator.partition_name())?,
                };
                removed += usize::from(existed);
            }
            let spans = self.regenerate(txn, catalog, &targets)?;
            Ok::<_, AdminError>((removed, spans))
        })?;
        info!(zone = %spec, removed, "zone config discarded");
        Ok(WriteOutcome { targets, spans })
    }

    /// The complete config in effect at the target and where it came from.
    pub fn show(
        &self,
        catalog: &Catalog,
        current_database: Option<&str>,
        spec: &TargetSpec,
    ) -> AdminResult<ZoneResolution> {
        let snapshot = self.store.snapshot()?;
        let resolver = HierarchyResolver::new(&snapshot, &self.default_zone);
        Ok(resolver.resolve_spec(catalog, current_database, spec)?)
    }

    /// Every explicit record, zones before subzones.
    pub fn show_all(&self) -> AdminResult<Vec<ExplicitZone>> {
        let snapshot = self.store.snapshot()?;
        Ok(snapshot
            .explicit_records()
            .into_iter()
            .map(|(locator, config)| ExplicitZone {
                locator,
                config: config.clone(),
            })
            .collect())
    }

    /// Spans of the table the target names or lives in.
    pub fn spans(
        &self,
        catalog: &Catalog,
        current_database: Option<&str>,
        spec: &TargetSpec,
    ) -> AdminResult<Vec<SubzoneSpan>> {
        let target = TargetResolver::new(catalog, current_database).resolve(spec)?;
        let table = target
            .table_id()
            .and_then(|id| catalog.table(id))
            .ok_or_else(|| ZoneError::invalid(format!("{spec} does not name a table")))?;
        let subzones = self.store.get_subzones(table.id)?;
        Ok(generate_subzone_spans(
            &OrderedKeyEncoder,
            table,
            &subzones,
            has_new_subzones(table, &subzones),
        )?)
    }

    /// Called once the new index's backfill has been merged: drops the link
    /// and deletes the temporary index's subzones. Returns how many were
    /// deleted.
    pub fn index_build_finished(&self, table_id: DescriptorId, new_index: IndexId) -> AdminResult<usize> {
        let Some(temp) = self.mirror.temp_for(table_id, new_index) else {
            return Ok(0);
        };
        let removed = self
            .store
            .write(|txn| txn.delete_index_subzones(table_id, temp))?;
        self.mirror.retire(table_id, new_index);
        info!(table_id, new_index, temp, removed, "temporary index subzones removed");
        Ok(removed)
    }
}
