//! Subsystem implementations: each plugin owns its ledger schema, CLI
//! surface, and a `schema()` descriptor for discovery.

pub mod context;
pub mod curation;
pub mod era;
pub mod seed;
pub mod survival;
