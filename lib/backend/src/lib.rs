//! AI backend boundary for the palaver platform.
//!
//! This crate defines the request/response contract with the conversational
//! AI service. The transport implementation lives behind the [`ChatBackend`]
//! trait so the conversation core can be exercised without a network.

pub mod chat;
pub mod error;

pub use chat::{
    ChatBackend, ChatHandle, ChatRequest, Citation, ImageAttachment, TurnInput, TurnOutput,
    SUPPORTED_IMAGE_TYPES,
};
pub use error::{BackendError, BackendErrorKind};
