//! Reconciliation of metadata and taxonomy assignments between item pairs.

pub mod metadata;
pub mod taxonomy;
