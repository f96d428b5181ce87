//! Domain layer: resource records, query signatures, permission decisions,
//! and the pure services that operate on them.
pub mod domain;
pub mod policies;
pub mod services;
