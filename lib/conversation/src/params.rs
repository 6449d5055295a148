//! Per-call chat configuration.
//!
//! [`ChatParameters`] is the immutable-per-call snapshot of everything that
//! shapes the next model call: model, sampling knobs, and the active tool
//! set. It is created once per session start; the tool set is the only field
//! replaced afterwards, always through [`ChatParameters::with_tool_set`] so
//! already-issued turns are unaffected.

use crate::error::ParameterError;
use crate::tool::ToolIdentity;
use palaver_backend::ChatRequest;
use palaver_core::{RoomId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// All known chat models.
pub const KNOWN_MODELS: [&str; 9] = [
    "grok-4-1-fast-reasoning",
    "grok-4-1-fast-non-reasoning",
    "grok-code-fast-1",
    "grok-4-fast-reasoning",
    "grok-4-fast-non-reasoning",
    "grok-4-0709",
    "grok-3-mini",
    "grok-3",
    "grok-2-vision-1212",
];

/// Models that emit a reasoning trace and accept a reasoning-effort hint.
pub const REASONING_MODELS: [&str; 4] = [
    "grok-4-1-fast-reasoning",
    "grok-4-fast-reasoning",
    "grok-4-0709",
    "grok-3-mini",
];

/// Default model when the invocation does not name one.
pub const DEFAULT_MODEL: &str = "grok-4-1-fast-reasoning";

/// Default response token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 16_384;

/// Returns true if the model emits a reasoning trace.
#[must_use]
pub fn is_reasoning_model(model: &str) -> bool {
    REASONING_MODELS.contains(&model)
}

/// User-supplied sampling knobs, each optional and independently validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    /// Maximum tokens in the response.
    pub max_tokens: Option<u32>,
    /// Randomness, 0.0 to 2.0.
    pub temperature: Option<f32>,
    /// Nucleus sampling, 0.0 to 1.0.
    pub top_p: Option<f32>,
    /// Repetition penalty, -2.0 to 2.0.
    pub frequency_penalty: Option<f32>,
    /// New-topic penalty, -2.0 to 2.0.
    pub presence_penalty: Option<f32>,
    /// Sampling seed.
    pub seed: Option<i64>,
}

impl SamplingOptions {
    fn check_range(
        field: &'static str,
        value: Option<f32>,
        min: f32,
        max: f32,
    ) -> Result<(), ParameterError> {
        if let Some(v) = value {
            if v < min || v > max {
                return Err(ParameterError::OutOfRange {
                    field,
                    value: f64::from(v),
                    min: f64::from(min),
                    max: f64::from(max),
                });
            }
        }
        Ok(())
    }

    /// Validates every supplied knob against backend-accepted ranges.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.max_tokens == Some(0) {
            return Err(ParameterError::ZeroMaxTokens);
        }
        Self::check_range("temperature", self.temperature, 0.0, 2.0)?;
        Self::check_range("top_p", self.top_p, 0.0, 1.0)?;
        Self::check_range("frequency_penalty", self.frequency_penalty, -2.0, 2.0)?;
        Self::check_range("presence_penalty", self.presence_penalty, -2.0, 2.0)?;
        Ok(())
    }
}

/// Immutable-per-call configuration snapshot for a conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatParameters {
    /// Model identifier.
    pub model: String,
    /// Optional system prompt.
    pub system: Option<String>,
    /// Sampling knobs, fixed for the session.
    pub sampling: SamplingOptions,
    /// Room the session is anchored in.
    pub room: RoomId,
    /// The user who started the session; only they may continue or control it.
    pub requester: UserId,
    /// Active tool set. Unordered for evaluation; `BTreeSet` iteration gives
    /// the stable display order.
    pub tools: BTreeSet<ToolIdentity>,
}

impl ChatParameters {
    /// Creates a validated parameter snapshot.
    ///
    /// Fails with a [`ParameterError`] naming the offending field; there is
    /// no partial construction.
    pub fn new(
        model: impl Into<String>,
        system: Option<String>,
        sampling: SamplingOptions,
        room: RoomId,
        requester: UserId,
    ) -> Result<Self, ParameterError> {
        let model = model.into();
        if !KNOWN_MODELS.contains(&model.as_str()) {
            return Err(ParameterError::UnknownModel { model });
        }
        sampling.validate()?;

        Ok(Self {
            model,
            system,
            sampling,
            room,
            requester,
            tools: BTreeSet::new(),
        })
    }

    /// Returns a copy with the tool set replaced.
    ///
    /// The old value remains valid and unaffected; the session swaps its held
    /// snapshot for the new one so only future calls see the change.
    #[must_use]
    pub fn with_tool_set(&self, tools: BTreeSet<ToolIdentity>) -> Self {
        Self {
            tools,
            ..self.clone()
        }
    }

    /// Returns a copy with the initial tool set.
    #[must_use]
    pub fn with_initial_tools(mut self, tools: BTreeSet<ToolIdentity>) -> Self {
        self.tools = tools;
        self
    }

    /// Returns true if the model emits a reasoning trace.
    #[must_use]
    pub fn is_reasoning_model(&self) -> bool {
        is_reasoning_model(&self.model)
    }

    /// Builds the backend request for opening this session's chat.
    #[must_use]
    pub fn to_chat_request(&self) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            system: self.system.clone(),
            max_tokens: Some(self.sampling.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            frequency_penalty: self.sampling.frequency_penalty,
            presence_penalty: self.sampling.presence_penalty,
            seed: self.sampling.seed,
            reasoning_effort: self
                .is_reasoning_model()
                .then(|| "high".to_string()),
        }
    }
}
