//! Core domain types for the palaver platform.
//!
//! This crate provides the foundational ID types shared across the palaver
//! chat-room AI mediation service.

pub mod id;

pub use id::{MessageId, ParseIdError, RoomId, SessionId, UserId};
