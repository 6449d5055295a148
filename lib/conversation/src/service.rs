//! Conversation service.
//!
//! Ties the pieces together for the gateway adapter: starting sessions from
//! slash invocations, routing reply follow-ups, dispatching control
//! interactions, and sweeping idle sessions. The service holds no gateway
//! state of its own; everything lives in the injected directory.

use crate::config::ConversationConfig;
use crate::control::{ControlOutcome, ControlSurface};
use crate::directory::SessionDirectory;
use crate::error::{ControlError, ServiceError};
use crate::event::{ButtonInteraction, FollowUpMessage, MenuSelection, SlashInvocation};
use crate::params::{ChatParameters, DEFAULT_MODEL};
use crate::render::{RenderedResponse, render_output};
use crate::session::{ConversationSession, SessionStatus, TurnReport};
use crate::tool::{ToolIdentity, ToolRegistry};
use palaver_backend::{ChatBackend, ImageAttachment, TurnInput};
use palaver_core::{MessageId, SessionId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A started conversation, ready for the gateway to announce.
#[derive(Debug)]
pub struct StartReport {
    /// The registered session.
    pub session: Arc<ConversationSession>,
    /// One-line start summary (model and active tools).
    pub summary: String,
    /// The rendered first completion.
    pub response: RenderedResponse,
}

/// A completed follow-up turn.
#[derive(Debug)]
pub struct TurnReply {
    /// The session that answered.
    pub session: Arc<ConversationSession>,
    /// The rendered completion.
    pub response: RenderedResponse,
}

/// What a control interaction did, shaped for the gateway.
#[derive(Debug)]
pub enum ControlReply {
    /// Regenerate completed; `None` if a concurrent stop discarded the
    /// result.
    Regenerated(Option<TurnReply>),
    /// Pause/resume flipped the session to this status.
    StatusChanged(SessionStatus),
    /// The session was stopped.
    Stopped,
}

/// The conversation service.
pub struct ConversationService {
    backend: Arc<dyn ChatBackend>,
    directory: Arc<SessionDirectory>,
    registry: Arc<ToolRegistry>,
    control: ControlSurface,
    config: ConversationConfig,
}

impl ConversationService {
    /// Creates a service over the given backend and directory.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        directory: Arc<SessionDirectory>,
        config: ConversationConfig,
    ) -> Self {
        let registry = Arc::new(ToolRegistry::new(config.collection_ids.clone()));
        let control = ControlSurface::new(Arc::clone(&registry));
        Self {
            backend,
            directory,
            registry,
            control,
            config,
        }
    }

    /// The shared session directory.
    #[must_use]
    pub fn directory(&self) -> &Arc<SessionDirectory> {
        &self.directory
    }

    /// The tool registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Starts a conversation from a slash invocation.
    ///
    /// `anchor` is the gateway message that will carry the session's
    /// controls. Validation happens before any backend call; registration is
    /// atomic, so a concurrent start in the same room gets a conflict.
    pub async fn start_conversation(
        &self,
        invocation: SlashInvocation,
        anchor: MessageId,
    ) -> Result<StartReport, ServiceError> {
        if !self.config.is_room_authorized(invocation.room) {
            return Err(ServiceError::UnauthorizedRoom {
                room: invocation.room,
            });
        }

        let model = invocation
            .model
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let params = ChatParameters::new(
            model,
            invocation.system,
            invocation.sampling,
            invocation.room,
            invocation.user,
        )?;

        // The configuration guard runs before anything is committed.
        self.registry.build_set(&invocation.tools)?;
        let params = params.with_initial_tools(invocation.tools);

        let chat = self
            .backend
            .start_chat(params.to_chat_request())
            .await
            .map_err(crate::error::SessionError::Backend)?;
        let session = Arc::new(ConversationSession::new(params, anchor, chat));
        self.directory.start_session(Arc::clone(&session))?;

        tracing::info!(
            session = %session.id(),
            room = %session.room(),
            "started conversation"
        );

        let summary = Self::start_summary(&session);
        let input = Self::sanitize_input(invocation.input);
        let report = match session.next_turn(&self.registry, input).await {
            Ok(report) => report,
            Err(err) => {
                // A session whose opening turn never completed does not hold
                // the room; a retried start must not hit a conflict.
                self.directory.remove(session.id());
                return Err(err.into());
            }
        };
        let response = match report {
            TurnReport::Completed(output) => render_output(&output, &self.registry),
            TurnReport::Discarded => RenderedResponse {
                chunks: Vec::new(),
                reasoning: None,
                citation_lines: Vec::new(),
            },
        };

        Ok(StartReport {
            session,
            summary,
            response,
        })
    }

    fn start_summary(session: &ConversationSession) -> String {
        let params = session.params();
        let tools = if params.tools.is_empty() {
            "none".to_string()
        } else {
            params
                .tools
                .iter()
                .map(ToolIdentity::label)
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("Model: {} | Tools: {}", params.model, tools)
    }

    /// Drops attachments of types the backend does not accept; the text
    /// still goes through.
    fn sanitize_input(mut input: TurnInput) -> TurnInput {
        let before = input.attachments.len();
        input.attachments.retain(ImageAttachment::is_supported);
        if input.attachments.len() < before {
            tracing::debug!(
                dropped = before - input.attachments.len(),
                "dropping unsupported attachments"
            );
        }
        input
    }

    /// Routes a plain room message to the room's session, if any.
    ///
    /// Any message from the session starter in a room with an active session
    /// continues that session; no reply is required. Returns `Ok(None)` when
    /// the message is ordinary room chatter: the room has no active session,
    /// or the poster is not the session starter. Only real failures of an
    /// accepted follow-up become errors.
    pub async fn handle_follow_up(
        &self,
        message: FollowUpMessage,
    ) -> Result<Option<TurnReply>, ServiceError> {
        let Some(session) = self.directory.resolve_follow_up(message.room) else {
            return Ok(None);
        };
        if session.starter() != message.user || message.input.is_empty() {
            return Ok(None);
        }

        let input = Self::sanitize_input(message.input);
        let report = session.next_turn(&self.registry, input).await?;
        match report {
            TurnReport::Completed(output) => Ok(Some(TurnReply {
                response: render_output(&output, &self.registry),
                session,
            })),
            TurnReport::Discarded => Ok(None),
        }
    }

    /// Dispatches a control button press.
    pub async fn handle_button(
        &self,
        interaction: ButtonInteraction,
    ) -> Result<ControlReply, ServiceError> {
        let session = self
            .directory
            .resolve_anchor(interaction.anchor)
            .ok_or(ControlError::NoSession)?;

        let outcome = self.control.handle_button(&session, interaction).await?;
        Ok(match outcome {
            ControlOutcome::Regenerated(TurnReport::Completed(output)) => {
                ControlReply::Regenerated(Some(TurnReply {
                    response: render_output(&output, &self.registry),
                    session,
                }))
            }
            ControlOutcome::Regenerated(TurnReport::Discarded) => {
                ControlReply::Regenerated(None)
            }
            ControlOutcome::StatusChanged(status) => ControlReply::StatusChanged(status),
            ControlOutcome::Stopped => {
                // Removal is the only destruction path; late interactions
                // against the old anchor resolve to nothing.
                self.directory.remove(session.id());
                ControlReply::Stopped
            }
        })
    }

    /// Dispatches a tool menu submission, returning the new active set.
    pub fn handle_menu(
        &self,
        selection: MenuSelection,
    ) -> Result<BTreeSet<ToolIdentity>, ServiceError> {
        let session = self
            .directory
            .resolve_anchor(selection.anchor)
            .ok_or(ControlError::NoSession)?;

        Ok(self.control.handle_menu(&session, selection)?)
    }

    /// Records the gateway identity of a rendered response so replies to it
    /// route back to the session and late control presses resolve.
    pub fn record_reply(&self, session: &Arc<ConversationSession>, message: MessageId) {
        session.set_last_response(message);
        self.directory.link_message(session, message);
    }

    /// Runs one idle-eviction sweep.
    pub fn evict_idle(&self) -> Vec<SessionId> {
        self.directory.evict_idle(self.config.eviction.idle_ttl())
    }
}
