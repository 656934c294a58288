// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod ors;
pub mod storage;

pub use ors::OrsClient;
pub use storage::LocalStorage;
