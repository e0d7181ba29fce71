//! Correspondence between indexes under construction and their temporary
//! twins.
//!
//! The schema-change executor calls [`TempIndexMirror::link`] when it
//! creates the temporary index for a new index and
//! [`TempIndexMirror::retire`] once the backfill has been merged. While a
//! link exists, every subzone write on the new index is repeated on the
//! temporary one in the same transaction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::info;
use zonal_catalog::ResolvedTarget;
use zonal_core::{DescriptorId, IndexId};

/// Shared link registry. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct TempIndexMirror {
    links: Arc<RwLock<HashMap<(DescriptorId, IndexId), IndexId>>>,
}

impl TempIndexMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&self, table_id: DescriptorId, new_index: IndexId, temp_index: IndexId) {
        let mut links = self.links.write().unwrap_or_else(|e| e.into_inner());
        links.insert((table_id, new_index), temp_index);
        info!(table_id, new_index, temp_index, "temporary index linked");
    }

    /// Drop a link. Returns the temporary index it pointed at.
    pub fn retire(&self, table_id: DescriptorId, new_index: IndexId) -> Option<IndexId> {
        let mut links = self.links.write().unwrap_or_else(|e| e.into_inner());
        let temp = links.remove(&(table_id, new_index));
        info!(table_id, new_index, ?temp, "temporary index link retired");
        temp
    }

    pub fn temp_for(&self, table_id: DescriptorId, index_id: IndexId) -> Option<IndexId> {
        let links = self.links.read().unwrap_or_else(|e| e.into_inner());
        links.get(&(table_id, index_id)).copied()
    }

    /// `targets` followed by their mirrors on linked temporary indexes,
    /// skipping any already present.
    pub fn with_mirrors(&self, targets: Vec<ResolvedTarget>) -> Vec<ResolvedTarget> {
        let mut out = targets.clone();
        for target in &targets {
            let (Some(table_id), Some(index_id)) = (target.table_id(), target.index_id()) else {
                continue;
            };
            let Some(mirror) = self
                .temp_for(table_id, index_id)
                .and_then(|temp| target.on_index(temp))
            else {
                continue;
            };
            if !out.contains(&mirror) {
                out.push(mirror);
            }
        }
        out
    }
}
