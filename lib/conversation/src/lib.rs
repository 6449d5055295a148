//! Conversation mediation for the palaver platform.
//!
//! This crate provides:
//!
//! - **Session**: Conversation lifecycle state machine
//! - **Directory**: Room-to-session registry with idle eviction
//! - **Tool Registry**: The selectable backend capabilities
//! - **Control Surface**: Owner-checked button and menu dispatch
//! - **Service**: Gateway-facing orchestration entry points

pub mod config;
pub mod control;
pub mod directory;
pub mod error;
pub mod event;
pub mod params;
pub mod render;
pub mod service;
pub mod session;
pub mod tool;

pub use config::{ConversationConfig, EvictionConfig};
pub use control::{ControlOutcome, ControlSurface};
pub use directory::SessionDirectory;
pub use error::{
    ControlError, DirectoryError, ParameterError, ServiceError, SessionError, ToolError,
};
pub use event::{
    ButtonInteraction, ControlAction, FollowUpMessage, InboundEvent, MenuSelection,
    SlashInvocation,
};
pub use params::{ChatParameters, SamplingOptions, DEFAULT_MODEL, KNOWN_MODELS};
pub use render::{render_output, RenderedResponse};
pub use service::{ControlReply, ConversationService, StartReport, TurnReply};
pub use session::{ConversationSession, SessionStatus, TurnReport};
pub use tool::{ToolIdentity, ToolRegistry, ToolSpec};
