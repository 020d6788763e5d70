//! Domain layer
//!
//! Entities, value objects and the seams (`RealtimeStore`, `SessionStorage`)
//! that the Infrastructure layer implements.

pub mod entity;
pub mod error;
pub mod record;
pub mod room_directory;
pub mod session_storage;
pub mod store;
pub mod value_object;

pub use entity::{
    ChatRoom, Message, MessageStatus, PresenceRecord, PresenceStatus, RegisteredUser, SessionUser,
};
pub use error::{StorageError, StoreError, ValueObjectError};
pub use room_directory::{RoomDirectory, RoomEntry};
pub use session_storage::SessionStorage;
pub use store::{RealtimeStore, StorePath, ValueWatch};
pub use value_object::{MAX_MESSAGE_CHARS, MessageText, PresenceKey, RoomId, Timestamp};
