//! UseCase layer
//!
//! Gateways over the realtime store, the client-side send gate, and the
//! session context injected into every view.

pub mod chat_gateway;
pub mod error;
pub mod presence_gateway;
pub mod send_gate;
pub mod session;
pub mod subscription;

pub use chat_gateway::{ChatGateway, NewMessage};
pub use error::{GatewayError, SendRejection, SessionError};
pub use presence_gateway::PresenceGateway;
pub use send_gate::{MIN_SEND_INTERVAL_MS, SendAttempt, validate_send};
pub use session::Session;
pub use subscription::{MessageSubscription, PresenceSubscription, Subscription, SubscriptionHandle};
