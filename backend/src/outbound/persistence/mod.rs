//! Persistence adapters for places and categories.
//!
//! Both repositories keep their data in process behind async read/write
//! locks. They are thin translators: validation lives in the domain types,
//! and missing rows surface as the ports' `NotFound` variants.

mod in_memory_category_repository;
mod in_memory_place_repository;

pub use in_memory_category_repository::InMemoryCategoryRepository;
pub use in_memory_place_repository::InMemoryPlaceRepository;
