//! portal-core: Shared infrastructure for the H-1B portal crates.
pub mod config;
pub mod observability;
