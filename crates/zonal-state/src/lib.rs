//! zonal-state — durable zone records for the zonal control plane.
//!
//! Backed by [redb](https://docs.rs/redb). Zone records and per-table
//! subzone tables are JSON-serialized into `&[u8]` value columns keyed by
//! descriptor id.
//!
//! Reads go through [`ZoneStore::snapshot`], which loads every record in one
//! read transaction. Writes go through [`ZoneStore::write`], which hands the
//! caller a [`ZoneWriteTxn`]; everything done inside the closure commits
//! together or not at all.
//!
//! The `ZoneStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::{ZoneStore, ZoneWriteTxn};
