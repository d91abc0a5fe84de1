//! # sas-store — Persistence for the Validation Engine
//!
//! The validation engine is the system of record for two singletons that
//! must survive power cycles: the Secure Enhanced registration (machine
//! validation ID and sequence) and the ticketing policy. This crate gives
//! them a storage seam.
//!
//! ## Layers
//!
//! - [`PersistentStore`] — key/value backend. A [`WriteBatch`] commits
//!   atomically (all entries or none).
//! - [`PersistedRecord`] — a serde type with a fixed key and first-boot
//!   defaults.
//! - [`WriteQueue`] — one background task per entity that applies writes in
//!   submission order. Callers get a [`SaveReceipt`] and may ignore it;
//!   awaiting it surfaces "not saved".
//!
//! The store performs no acceptance logic. Owners decide what to write and
//! when.

pub mod error;
pub mod queue;
pub mod store;

pub use error::StorageError;
pub use queue::{SaveReceipt, WriteQueue};
pub use store::{
    load_optional_record, load_record, save_record, FileStore, MemoryStore, PersistedRecord,
    PersistentStore, WriteBatch,
};
