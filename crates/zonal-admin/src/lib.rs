//! zonal-admin — the administrative surface of the zonal control plane.
//!
//! Configure, discard and show zone configurations at any target, list
//! every explicit record, and produce a table's subzone spans. Writes
//! commit atomically together with their temporary-index mirrors.
//!
//! # Architecture
//!
//! ```text
//! ZoneAdmin
//!   ├── TargetResolver (catalog snapshot → targets)
//!   ├── TempIndexMirror (new index → temporary twin links)
//!   ├── ZoneStore (one write transaction per command)
//!   ├── HierarchyResolver (show)
//!   └── generate_subzone_spans (after every table write)
//! ```

pub mod admin;
pub mod error;
pub mod mirror;

pub use admin::{ExplicitZone, WriteOutcome, ZoneAdmin, ZoneUpdate};
pub use error::{AdminError, AdminResult};
pub use mirror::TempIndexMirror;
