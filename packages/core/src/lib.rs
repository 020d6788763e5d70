//! Chat core for Hiroba.
//!
//! This library holds everything between the views and the hosted realtime
//! database: the domain model, the chat and presence gateways, the client-side
//! send gate, the session context, and the store adapters.

// layers
pub mod domain;
pub mod infrastructure;
pub mod usecase;
