//! zonal-core — shared types for the zonal placement control plane.
//!
//! Holds the zone configuration model (independently-unset fields,
//! inheritance helpers, validation), the stored record shapes (zone records
//! and per-table subzone tables), the snapshot resolution runs against, the
//! error taxonomy and the `zonal.toml` settings.

pub mod config;
pub mod error;
pub mod record;
pub mod snapshot;
pub mod types;
pub mod zone;

pub use config::ZonalSettings;
pub use error::{ErrorKind, ZoneError, ZoneResult};
pub use record::{Subzone, SubzoneTable, ZoneRecord};
pub use snapshot::ZoneSnapshot;
pub use types::*;
pub use zone::{Constraint, ConstraintKind, GcPolicy, LeasePreference, ZoneConfig, ZoneField};
