//! Inbound gateway events.
//!
//! The gateway adapter normalizes whatever its platform delivers into these
//! types before handing them to the service. Everything here is plain data;
//! routing and permission decisions live with the service and control
//! surface.

use crate::params::SamplingOptions;
use crate::tool::ToolIdentity;
use palaver_backend::TurnInput;
use palaver_core::{MessageId, RoomId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A control button attached to a session's responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Discard the last answer and answer the same input again.
    Regenerate,
    /// Flip between active and paused.
    PauseResume,
    /// End the conversation permanently.
    Stop,
}

/// A slash-command invocation that starts a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashInvocation {
    /// Room the command was issued in.
    pub room: RoomId,
    /// The invoking user; becomes the session starter.
    pub user: UserId,
    /// Requested model, or `None` for the default.
    pub model: Option<String>,
    /// Optional system prompt.
    pub system: Option<String>,
    /// Sampling knobs.
    pub sampling: SamplingOptions,
    /// Tools to activate from the start.
    pub tools: BTreeSet<ToolIdentity>,
    /// The opening turn.
    pub input: TurnInput,
}

/// An ordinary room message.
///
/// Routing is by room: any plain message from the session starter in a room
/// with an active session continues that session, reply or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpMessage {
    /// Room the message was posted in.
    pub room: RoomId,
    /// The posting user.
    pub user: UserId,
    /// The message this one replies to, when the gateway reports one.
    pub reply_to: Option<MessageId>,
    /// The message content.
    pub input: TurnInput,
}

/// A press of one of the session control buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonInteraction {
    /// The interacting user.
    pub user: UserId,
    /// The message carrying the controls.
    pub anchor: MessageId,
    /// Which button was pressed.
    pub action: ControlAction,
}

/// A submission of the tool selection menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSelection {
    /// The interacting user.
    pub user: UserId,
    /// The message carrying the menu.
    pub anchor: MessageId,
    /// The full selected tool set; replaces the active set wholesale.
    pub tools: BTreeSet<ToolIdentity>,
}

/// Any inbound event the gateway can deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum InboundEvent {
    /// Start a new conversation.
    Slash(SlashInvocation),
    /// Continue an existing conversation.
    FollowUp(FollowUpMessage),
    /// Press a control button.
    Button(ButtonInteraction),
    /// Submit the tool menu.
    Menu(MenuSelection),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_event_serde_tags() {
        let event = InboundEvent::Button(ButtonInteraction {
            user: UserId::new(1),
            anchor: MessageId::new(2),
            action: ControlAction::Stop,
        });
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["kind"], "button");
        assert_eq!(json["action"], "stop");
    }

    #[test]
    fn menu_selection_preserves_tool_set() {
        let tools: BTreeSet<ToolIdentity> =
            [ToolIdentity::WebSearch, ToolIdentity::XSearch]
                .into_iter()
                .collect();
        let selection = MenuSelection {
            user: UserId::new(1),
            anchor: MessageId::new(2),
            tools: tools.clone(),
        };
        let json = serde_json::to_string(&selection).expect("serialize");
        let parsed: MenuSelection = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.tools, tools);
    }
}
