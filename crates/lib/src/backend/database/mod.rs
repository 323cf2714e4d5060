//! Backend implementations.

pub mod in_memory;
#[cfg(feature = "sqlite")]
pub mod sql;

pub use in_memory::InMemory;
#[cfg(feature = "sqlite")]
pub use sql::SqlxBackend;
