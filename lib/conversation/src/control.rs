//! Control surface for session interactions.
//!
//! Buttons and the tool menu ride along on every rendered response. Each
//! interaction resolves to its session, passes the owner check, and causes
//! exactly one state transition. Permission is checked before anything else
//! so a non-owner press has no side effect at all.

use crate::error::ControlError;
use crate::event::{ButtonInteraction, ControlAction, MenuSelection};
use crate::session::{ConversationSession, SessionStatus, TurnReport};
use crate::tool::{ToolIdentity, ToolRegistry};
use palaver_core::UserId;
use std::collections::BTreeSet;
use std::sync::Arc;

/// What a successful button press did.
#[derive(Debug, Clone)]
pub enum ControlOutcome {
    /// Regenerate produced a new completion (or was discarded by a
    /// concurrent stop).
    Regenerated(TurnReport),
    /// Pause/resume flipped the session to this status.
    StatusChanged(SessionStatus),
    /// The session was stopped.
    Stopped,
}

/// Owner-checked dispatcher from interactions to session transitions.
#[derive(Debug, Clone)]
pub struct ControlSurface {
    registry: Arc<ToolRegistry>,
}

impl ControlSurface {
    /// Creates a control surface using the given tool registry.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    fn check_owner(
        session: &ConversationSession,
        user: UserId,
    ) -> Result<(), ControlError> {
        if session.starter() != user {
            tracing::debug!(
                session = %session.id(),
                user = %user,
                "rejecting control interaction from non-starter"
            );
            return Err(ControlError::NotOwner);
        }
        Ok(())
    }

    /// Handles a button press against its resolved session.
    pub async fn handle_button(
        &self,
        session: &Arc<ConversationSession>,
        interaction: ButtonInteraction,
    ) -> Result<ControlOutcome, ControlError> {
        Self::check_owner(session, interaction.user)?;

        match interaction.action {
            ControlAction::Regenerate => {
                let report = session.regenerate(&self.registry).await?;
                Ok(ControlOutcome::Regenerated(report))
            }
            ControlAction::PauseResume => {
                let status = session.toggle_paused()?;
                Ok(ControlOutcome::StatusChanged(status))
            }
            ControlAction::Stop => {
                session.stop()?;
                Ok(ControlOutcome::Stopped)
            }
        }
    }

    /// Handles a tool menu submission against its resolved session,
    /// returning the new active set.
    pub fn handle_menu(
        &self,
        session: &Arc<ConversationSession>,
        selection: MenuSelection,
    ) -> Result<BTreeSet<ToolIdentity>, ControlError> {
        Self::check_owner(session, selection.user)?;

        Ok(session.replace_tool_set(selection.tools, &self.registry)?)
    }
}
