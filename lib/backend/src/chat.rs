//! Chat backend abstraction.
//!
//! Provides a unified interface to the conversational AI service. A
//! [`ChatBackend`] opens a [`ChatHandle`] per conversation; the handle
//! accumulates turn history internally and produces the next completion on
//! each [`ChatHandle::send`].

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Image content types accepted as turn attachments.
pub const SUPPORTED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// An image attachment supplied with a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// URL the backend can fetch the image from.
    pub url: String,
    /// MIME content type as reported by the gateway.
    pub content_type: String,
}

impl ImageAttachment {
    /// Creates a new attachment.
    #[must_use]
    pub fn new(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Returns true if the content type is one the backend accepts.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        SUPPORTED_IMAGE_TYPES.contains(&self.content_type.as_str())
    }
}

/// User input for a single turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInput {
    /// The user's message text.
    pub text: String,
    /// Image attachments, already filtered to supported types.
    pub attachments: Vec<ImageAttachment>,
}

impl TurnInput {
    /// Creates a text-only input.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Adds an attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: ImageAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns true if there is neither text nor any attachment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.attachments.is_empty()
    }
}

/// A citation reference attached to a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// The cited source: an HTTP(S) URL or an internal scheme reference
    /// (e.g. a collection document URI).
    pub source: String,
    /// Wire name of the tool that produced this citation, if reported.
    pub tool_artifact: Option<String>,
}

impl Citation {
    /// Creates a citation with no tool attribution.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            tool_artifact: None,
        }
    }

    /// Attributes the citation to a tool artifact.
    #[must_use]
    pub fn from_tool(mut self, artifact: impl Into<String>) -> Self {
        self.tool_artifact = Some(artifact.into());
        self
    }

    /// Returns true if the source is a web link.
    #[must_use]
    pub fn is_web_link(&self) -> bool {
        self.source.starts_with("https://") || self.source.starts_with("http://")
    }
}

/// The completion produced for one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnOutput {
    /// The generated response text.
    pub text: String,
    /// Reasoning trace, when the model produced one.
    pub reasoning: Option<String>,
    /// Citation sources referenced by the response.
    pub citations: Vec<Citation>,
}

impl TurnOutput {
    /// Creates a text-only output.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reasoning: None,
            citations: Vec::new(),
        }
    }
}

/// Configuration for opening a new chat.
///
/// Sampling parameters are fixed for the lifetime of the chat; the active
/// tool set is passed per-send because it can change between turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Optional system prompt.
    pub system: Option<String>,
    /// Maximum tokens in the response.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,
    /// Repetition penalty.
    pub frequency_penalty: Option<f32>,
    /// New-topic penalty.
    pub presence_penalty: Option<f32>,
    /// Sampling seed.
    pub seed: Option<i64>,
    /// Reasoning effort hint for reasoning-capable models.
    pub reasoning_effort: Option<String>,
}

impl ChatRequest {
    /// Creates a request for the given model.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// A live conversation with the backend.
///
/// The handle owns the accumulated turn history. Exactly one turn may be in
/// flight at a time; the caller enforces this.
#[async_trait]
pub trait ChatHandle: Send + Sync {
    /// Issues the next turn with the given input and the tool request
    /// fragments active at the time the call is issued.
    ///
    /// On success the exchange (input + completion) is appended to the
    /// handle's history. On failure the history is unchanged.
    async fn send(
        &mut self,
        input: TurnInput,
        tools: Vec<JsonValue>,
    ) -> Result<TurnOutput, BackendError>;

    /// Removes the most recent exchange from the history, returning it so
    /// the caller can reissue the input (and restore the exchange if the
    /// reissue fails). Returns `None` if there is no completed exchange.
    fn discard_last_exchange(&mut self) -> Option<(TurnInput, TurnOutput)>;

    /// Re-appends a previously discarded exchange to the history.
    fn push_exchange(&mut self, input: TurnInput, output: TurnOutput);
}

/// Trait for the conversational AI service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Opens a new chat with the given configuration.
    async fn start_chat(&self, request: ChatRequest) -> Result<Box<dyn ChatHandle>, BackendError>;
}
