//! zonal-resolver — effective zone configs by per-field inheritance.
//!
//! Walks a target's ancestor chain (partition, index, table, database,
//! default) over a [`zonal_core::ZoneSnapshot`] and fills each unset field
//! from the nearest ancestor that sets it.

pub mod hierarchy;

pub use hierarchy::{HierarchyResolver, ZoneResolution};
