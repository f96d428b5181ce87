/// Application layer - Cache, use cases and read models
///
/// This layer orchestrates domain services and reaches infrastructure only
/// through ports.
pub mod collection_cache;
pub mod list_view;
pub mod read_models;
pub mod use_cases;
