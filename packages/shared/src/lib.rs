//! Utilities shared by the Hiroba crates: logging setup and the clock abstraction.

pub mod logger;
pub mod time;
