//! Conversation session lifecycle.
//!
//! A session owns one [`ChatParameters`] snapshot and exclusively owns the
//! live backend chat handle. Lifecycle status, the tool set, and the
//! last-output marker are guarded by a synchronous lock that is never held
//! across an await; the chat handle sits behind an async lock reached only
//! by the single in-flight turn.
//!
//! Concurrency policy: pause, stop, and tool toggles are applied to session
//! metadata immediately, even while a turn is awaiting the backend. The
//! outstanding turn was issued with the parameters captured at issue time,
//! so its result is attributed to the tools that were actually used. A
//! result arriving after `stop` is discarded; after `pause` it is still
//! delivered and the session stays paused.

use crate::error::SessionError;
use crate::params::ChatParameters;
use crate::tool::{ToolIdentity, ToolRegistry};
use chrono::{DateTime, Utc};
use palaver_backend::{ChatHandle, TurnInput, TurnOutput};
use palaver_core::{MessageId, RoomId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::RwLock;
use tokio::sync::Mutex as AsyncMutex;

/// The lifecycle status of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting follow-ups and controls.
    Active,
    /// Follow-ups are ignored until resume.
    Paused,
    /// Terminal; no transitions out.
    Stopped,
}

impl SessionStatus {
    /// Returns true if the session accepts follow-up messages.
    #[must_use]
    pub fn accepts_follow_ups(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the session has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// The mutable per-session fields, guarded together.
#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    params: ChatParameters,
    last_response: Option<MessageId>,
    turn_in_flight: bool,
    last_active_at: DateTime<Utc>,
}

/// Outcome of an issued turn.
#[derive(Debug, Clone)]
pub enum TurnReport {
    /// The backend produced a completion to render.
    Completed(TurnOutput),
    /// The session was stopped while the call was outstanding; the
    /// completion is dropped rather than rendered.
    Discarded,
}

/// A live conversation session.
pub struct ConversationSession {
    id: SessionId,
    room: RoomId,
    starter: UserId,
    anchor: MessageId,
    created_at: DateTime<Utc>,
    state: RwLock<SessionState>,
    chat: AsyncMutex<Box<dyn ChatHandle>>,
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("id", &self.id)
            .field("room", &self.room)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl ConversationSession {
    /// Creates a new active session owning the given chat handle.
    #[must_use]
    pub fn new(params: ChatParameters, anchor: MessageId, chat: Box<dyn ChatHandle>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            room: params.room,
            starter: params.requester,
            anchor,
            created_at: now,
            state: RwLock::new(SessionState {
                status: SessionStatus::Active,
                params,
                last_response: None,
                turn_in_flight: false,
                last_active_at: now,
            }),
            chat: AsyncMutex::new(chat),
        }
    }

    /// Unique session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The room this session is anchored in.
    #[must_use]
    pub fn room(&self) -> RoomId {
        self.room
    }

    /// The user who started the session.
    #[must_use]
    pub fn starter(&self) -> UserId {
        self.starter
    }

    /// The message that anchors follow-up routing.
    #[must_use]
    pub fn anchor(&self) -> MessageId {
        self.anchor
    }

    /// When the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.read().unwrap().status
    }

    /// When the session last completed an interaction.
    #[must_use]
    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.state.read().unwrap().last_active_at
    }

    /// The identity of the last rendered response message, if any.
    #[must_use]
    pub fn last_response(&self) -> Option<MessageId> {
        self.state.read().unwrap().last_response
    }

    /// Records the gateway identity of the last rendered response.
    pub fn set_last_response(&self, message: MessageId) {
        let mut state = self.state.write().unwrap();
        state.last_response = Some(message);
    }

    /// A snapshot of the current parameters.
    #[must_use]
    pub fn params(&self) -> ChatParameters {
        self.state.read().unwrap().params.clone()
    }

    /// The currently active tool set.
    #[must_use]
    pub fn tool_set(&self) -> BTreeSet<ToolIdentity> {
        self.state.read().unwrap().params.tools.clone()
    }

    /// Pauses the session. Follow-ups are ignored until resume.
    pub fn pause(&self) -> Result<(), SessionError> {
        let mut state = self.state.write().unwrap();
        if state.status.is_stopped() {
            return Err(SessionError::Stopped);
        }
        state.status = SessionStatus::Paused;
        Ok(())
    }

    /// Resumes a paused session.
    pub fn resume(&self) -> Result<(), SessionError> {
        let mut state = self.state.write().unwrap();
        if state.status.is_stopped() {
            return Err(SessionError::Stopped);
        }
        state.status = SessionStatus::Active;
        Ok(())
    }

    /// Flips between active and paused, returning the new status.
    pub fn toggle_paused(&self) -> Result<SessionStatus, SessionError> {
        let mut state = self.state.write().unwrap();
        state.status = match state.status {
            SessionStatus::Stopped => return Err(SessionError::Stopped),
            SessionStatus::Active => SessionStatus::Paused,
            SessionStatus::Paused => SessionStatus::Active,
        };
        Ok(state.status)
    }

    /// Stops the session. Terminal; applies immediately even while a turn
    /// is outstanding (the eventual result is then discarded).
    pub fn stop(&self) -> Result<(), SessionError> {
        let mut state = self.state.write().unwrap();
        if state.status.is_stopped() {
            return Err(SessionError::Stopped);
        }
        state.status = SessionStatus::Stopped;
        Ok(())
    }

    /// Flips membership of one tool in the active set.
    ///
    /// Activation is subject to the registry's configuration guard; on
    /// rejection the set is left unapplied. No backend call happens until
    /// the next turn or regenerate. Returns the new active set.
    pub fn apply_tool_toggle(
        &self,
        identity: ToolIdentity,
        registry: &ToolRegistry,
    ) -> Result<BTreeSet<ToolIdentity>, SessionError> {
        let mut state = self.state.write().unwrap();
        if state.status.is_stopped() {
            return Err(SessionError::Stopped);
        }

        let mut tools = state.params.tools.clone();
        if tools.contains(&identity) {
            tools.remove(&identity);
        } else {
            registry.build(identity)?;
            tools.insert(identity);
        }

        state.params = state.params.with_tool_set(tools.clone());
        state.last_active_at = Utc::now();
        Ok(tools)
    }

    /// Replaces the whole active tool set (menu selection).
    ///
    /// All-or-nothing: a configuration guard failure leaves the previous
    /// set in place.
    pub fn replace_tool_set(
        &self,
        tools: BTreeSet<ToolIdentity>,
        registry: &ToolRegistry,
    ) -> Result<BTreeSet<ToolIdentity>, SessionError> {
        let mut state = self.state.write().unwrap();
        if state.status.is_stopped() {
            return Err(SessionError::Stopped);
        }

        registry.build_set(&tools)?;
        state.params = state.params.with_tool_set(tools.clone());
        state.last_active_at = Utc::now();
        Ok(tools)
    }

    /// Issues the next turn with the parameters captured at issue time.
    ///
    /// On backend failure the session stays active and the failed turn is
    /// not recorded; the caller may retry.
    pub async fn next_turn(
        &self,
        registry: &ToolRegistry,
        input: TurnInput,
    ) -> Result<TurnReport, SessionError> {
        let fragments = {
            let mut state = self.state.write().unwrap();
            match state.status {
                SessionStatus::Stopped => return Err(SessionError::Stopped),
                SessionStatus::Paused => return Err(SessionError::NotActive),
                SessionStatus::Active => {}
            }
            if state.turn_in_flight {
                return Err(SessionError::TurnInFlight);
            }
            let fragments = registry.fragments_for(&state.params.tools)?;
            state.turn_in_flight = true;
            fragments
        };

        let result = {
            let mut chat = self.chat.lock().await;
            chat.send(input, fragments).await
        };

        self.finish_turn(result)
    }

    /// Discards the last exchange's output and reissues its input under the
    /// current parameters, so a tool toggle since the last turn does affect
    /// the regenerated answer.
    pub async fn regenerate(&self, registry: &ToolRegistry) -> Result<TurnReport, SessionError> {
        let fragments = {
            let mut state = self.state.write().unwrap();
            match state.status {
                SessionStatus::Stopped => return Err(SessionError::Stopped),
                SessionStatus::Paused => return Err(SessionError::NotActive),
                SessionStatus::Active => {}
            }
            if state.turn_in_flight {
                return Err(SessionError::TurnInFlight);
            }
            let fragments = registry.fragments_for(&state.params.tools)?;
            state.turn_in_flight = true;
            fragments
        };

        let result = {
            let mut chat = self.chat.lock().await;
            match chat.discard_last_exchange() {
                None => {
                    let mut state = self.state.write().unwrap();
                    state.turn_in_flight = false;
                    return Err(SessionError::NoHistory);
                }
                Some((input, prior_output)) => {
                    match chat.send(input.clone(), fragments).await {
                        Ok(output) => Ok(output),
                        Err(err) => {
                            // Restore the discarded exchange so the failed
                            // regenerate is not recorded as lost history.
                            chat.push_exchange(input, prior_output);
                            Err(err)
                        }
                    }
                }
            }
        };

        self.finish_turn(result)
    }

    fn finish_turn(
        &self,
        result: Result<TurnOutput, palaver_backend::BackendError>,
    ) -> Result<TurnReport, SessionError> {
        let mut state = self.state.write().unwrap();
        state.turn_in_flight = false;

        let output = result?;
        if state.status.is_stopped() {
            tracing::debug!(session = %self.id, "discarding completion for stopped session");
            return Ok(TurnReport::Discarded);
        }
        state.last_active_at = Utc::now();
        Ok(TurnReport::Completed(output))
    }

    /// Returns true if the session has been idle since before the cutoff.
    #[must_use]
    pub fn idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        let state = self.state.read().unwrap();
        !state.turn_in_flight && state.last_active_at < cutoff
    }
}
