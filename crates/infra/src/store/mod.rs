//! Record storage abstractions.

pub mod in_memory;
pub mod repository;

pub use in_memory::InMemoryRepository;
pub use repository::Repository;
