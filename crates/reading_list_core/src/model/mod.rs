//! Reading-list domain model.
//!
//! # Responsibility
//! - Define the entry snapshot and its value types (sources, dates).
//! - Provide identifier, ordering and form-input helpers.
//!
//! # Invariants
//! - Entries are immutable values once cached; updates produce new snapshots.
//! - Deletion is not modeled.

pub mod date;
pub mod entry;
pub mod form;
pub mod order;
