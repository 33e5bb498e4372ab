//! Usage: Infrastructure (configuration, credential persistence, logging).

pub mod config;
pub(crate) mod credential_store;
pub(crate) mod fs_atomic;
pub mod logging;
