//! Error types for the conversation crate.
//!
//! Every error here is scoped to a single requested operation: none of them
//! is fatal to the process, and none of them leaves the session directory in
//! an inconsistent state.
//!
//! - `ParameterError`: rejected chat parameter values
//! - `ToolError`: tool activation rejected by configuration
//! - `SessionError`: session state-machine violations and backend failures
//! - `DirectoryError`: session registry conflicts and misses
//! - `ControlError`: rejected control interactions
//! - `ServiceError`: top-level wrapper returned by the service

use palaver_backend::BackendError;
use palaver_core::RoomId;
use std::fmt;

/// Errors from chat parameter validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A numeric parameter is outside the backend-accepted range.
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// max_tokens must be at least 1.
    ZeroMaxTokens,
    /// The model identifier is not in the known catalog.
    UnknownModel { model: String },
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => {
                write!(f, "{field} must be between {min} and {max}, got {value}")
            }
            Self::ZeroMaxTokens => write!(f, "max_tokens must be at least 1"),
            Self::UnknownModel { model } => write!(f, "unknown model: {model}"),
        }
    }
}

impl std::error::Error for ParameterError {}

/// Errors from tool activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Collections search requires at least one configured collection ID.
    CollectionsNotConfigured,
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollectionsNotConfigured => {
                write!(
                    f,
                    "collections search is unavailable: no collections are configured"
                )
            }
        }
    }
}

impl std::error::Error for ToolError {}

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The session has been stopped; stopped is terminal.
    Stopped,
    /// A new turn requires an active session.
    NotActive,
    /// Another turn for this session is already awaiting the backend.
    TurnInFlight,
    /// Not enough history to regenerate yet.
    NoHistory,
    /// A tool mutation was rejected by configuration.
    Tool(ToolError),
    /// The backend call failed; the session remains usable.
    Backend(BackendError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "conversation has ended"),
            Self::NotActive => write!(f, "conversation is not active"),
            Self::TurnInFlight => {
                write!(f, "a response is already being generated for this conversation")
            }
            Self::NoHistory => write!(f, "not enough history to regenerate yet"),
            Self::Tool(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ToolError> for SessionError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err)
    }
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

/// Errors from the session directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The room already anchors an active conversation.
    Conflict { room: RoomId },
    /// No session matches the lookup.
    NotFound,
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { room } => {
                write!(f, "an active conversation already exists in {room}")
            }
            Self::NotFound => write!(f, "no active conversation found"),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Errors from control interactions.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    /// The interacting user is not the conversation starter.
    NotOwner,
    /// The interaction does not resolve to a live session.
    NoSession,
    /// The requested transition was rejected by the session.
    Session(SessionError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOwner => {
                write!(f, "you are not allowed to control this conversation")
            }
            Self::NoSession => write!(f, "no active conversation found"),
            Self::Session(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ControlError {}

impl From<SessionError> for ControlError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

/// Top-level errors returned by the conversation service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The room is not on the authorized deployment list.
    UnauthorizedRoom { room: RoomId },
    /// Chat parameter validation failed.
    Parameter(ParameterError),
    /// Tool activation rejected by configuration.
    Tool(ToolError),
    /// Session registry conflict or miss.
    Directory(DirectoryError),
    /// Session state-machine violation or backend failure.
    Session(SessionError),
    /// Control interaction rejected.
    Control(ControlError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnauthorizedRoom { room } => {
                write!(f, "conversations are not enabled in {room}")
            }
            Self::Parameter(err) => write!(f, "{err}"),
            Self::Tool(err) => write!(f, "{err}"),
            Self::Directory(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Control(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ParameterError> for ServiceError {
    fn from(err: ParameterError) -> Self {
        Self::Parameter(err)
    }
}

impl From<ToolError> for ServiceError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err)
    }
}

impl From<DirectoryError> for ServiceError {
    fn from(err: DirectoryError) -> Self {
        Self::Directory(err)
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<ControlError> for ServiceError {
    fn from(err: ControlError) -> Self {
        Self::Control(err)
    }
}

impl ServiceError {
    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Session(SessionError::Backend(err)) if err.is_transient()
        )
    }
}
