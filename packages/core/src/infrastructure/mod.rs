//! Infrastructure layer
//!
//! Concrete realtime stores and session storage backends.

pub mod session_storage;
pub mod store;
