//! Realtime store implementations
//!
//! - `inmemory`: in-process JSON tree, used for local mode and tests
//! - `rest`: hosted realtime database over its REST and event-stream interface

pub mod inmemory;
pub mod push_id;
pub mod rest;
pub mod sse;

pub use inmemory::InMemoryRealtimeStore;
pub use push_id::PushIdGenerator;
pub use rest::RestRealtimeStore;
