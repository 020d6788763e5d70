//! Session storage implementations
//!
//! - `file`: JSON file standing in for browser local storage
//! - `inmemory`: process-local map, for tests and throwaway sessions

pub mod file;
pub mod inmemory;

pub use file::FileSessionStorage;
pub use inmemory::InMemorySessionStorage;
