//! Stored JSON shapes of the domain entities.
//!
//! The layout under `chatRooms` and `onlineUsers` and the local storage
//! entries are part of the data model shared by every client, so the records
//! live next to the entities rather than inside a particular store backend.
//!
//! - `schema`: JSON shapes stored under `chatRooms`, `onlineUsers` and in local storage
//! - `conversion`: conversions between records and domain entities

pub mod conversion;
pub mod schema;

pub use conversion::{messages_from_snapshot, presence_from_snapshot};
pub use schema::{MessageRecord, PresenceRecordDto, RegisteredUserDto, RoomRecord, SessionUserDto};
