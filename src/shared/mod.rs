//! Usage: Cross-cutting helpers (error model, lock recovery, secret masking).

pub(crate) mod error;
pub(crate) mod mutex_ext;
pub(crate) mod security;
