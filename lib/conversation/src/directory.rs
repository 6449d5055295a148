//! Session directory.
//!
//! Tracks the single live session per room plus a message-to-session index
//! so control interactions on any of a session's rendered responses resolve
//! back to it. Follow-up routing is by room; the message index serves
//! control anchoring only. Registration and the single-anchor check happen
//! atomically under one lock; there is no window in which two starts in the
//! same room can both succeed.

use crate::error::DirectoryError;
use crate::session::{ConversationSession, SessionStatus};
use chrono::{Duration, Utc};
use palaver_core::{MessageId, RoomId, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of live conversation sessions.
///
/// One per process, shared behind an `Arc` and injected wherever lookups or
/// registration happen.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    inner: RwLock<DirectoryInner>,
}

#[derive(Debug, Default)]
struct DirectoryInner {
    by_room: HashMap<RoomId, Arc<ConversationSession>>,
    by_message: HashMap<MessageId, Arc<ConversationSession>>,
}

impl SessionDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session as the room's anchor.
    ///
    /// Fails with a conflict if the room already anchors a session that is
    /// not stopped. A stopped leftover is evicted and replaced.
    pub fn start_session(
        &self,
        session: Arc<ConversationSession>,
    ) -> Result<(), DirectoryError> {
        let room = session.room();
        let mut inner = self.inner.write().unwrap();

        if let Some(existing) = inner.by_room.get(&room) {
            if !existing.status().is_stopped() {
                return Err(DirectoryError::Conflict { room });
            }
            let stale = existing.id();
            inner.by_message.retain(|_, s| s.id() != stale);
        }

        inner.by_message.insert(session.anchor(), Arc::clone(&session));
        inner.by_room.insert(room, session);
        Ok(())
    }

    /// Resolves a plain room message to the room's session, if that session
    /// is accepting follow-ups.
    ///
    /// Paused and stopped sessions are not returned; a message to them falls
    /// through as ordinary room chatter.
    #[must_use]
    pub fn resolve_follow_up(&self, room: RoomId) -> Option<Arc<ConversationSession>> {
        let inner = self.inner.read().unwrap();
        inner
            .by_room
            .get(&room)
            .filter(|s| s.status() == SessionStatus::Active)
            .cloned()
    }

    /// Resolves a control anchor (the session's start message or any of its
    /// rendered responses) to its session, regardless of status.
    #[must_use]
    pub fn resolve_anchor(&self, anchor: MessageId) -> Option<Arc<ConversationSession>> {
        let inner = self.inner.read().unwrap();
        inner.by_message.get(&anchor).cloned()
    }

    /// The room's current session, regardless of status.
    #[must_use]
    pub fn session_for_room(&self, room: RoomId) -> Option<Arc<ConversationSession>> {
        let inner = self.inner.read().unwrap();
        inner.by_room.get(&room).cloned()
    }

    /// Indexes a rendered response message so control interactions on it
    /// resolve to the session.
    pub fn link_message(&self, session: &Arc<ConversationSession>, message: MessageId) {
        let mut inner = self.inner.write().unwrap();
        inner.by_message.insert(message, Arc::clone(session));
    }

    /// Removes a session and all of its message links.
    pub fn remove(&self, id: SessionId) {
        let mut inner = self.inner.write().unwrap();
        inner.by_room.retain(|_, s| s.id() != id);
        inner.by_message.retain(|_, s| s.id() != id);
    }

    /// Evicts sessions idle longer than the TTL, and any stopped leftovers.
    ///
    /// Returns the IDs of the evicted sessions. Sessions with a turn in
    /// flight are never evicted.
    pub fn evict_idle(&self, ttl: Duration) -> Vec<SessionId> {
        let cutoff = Utc::now() - ttl;
        let mut inner = self.inner.write().unwrap();

        let evicted: Vec<SessionId> = inner
            .by_room
            .values()
            .filter(|s| s.status().is_stopped() || s.idle_since(cutoff))
            .map(|s| s.id())
            .collect();

        for id in &evicted {
            tracing::info!(session = %id, "evicting idle session");
            inner.by_room.retain(|_, s| s.id() != *id);
            inner.by_message.retain(|_, s| s.id() != *id);
        }

        evicted
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().by_room.len()
    }

    /// Returns true if no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().by_room.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ChatParameters, DEFAULT_MODEL, SamplingOptions};
    use async_trait::async_trait;
    use palaver_backend::{BackendError, ChatHandle, TurnInput, TurnOutput};
    use palaver_core::UserId;
    use serde_json::Value as JsonValue;

    struct IdleChat;

    #[async_trait]
    impl ChatHandle for IdleChat {
        async fn send(
            &mut self,
            _input: TurnInput,
            _tools: Vec<JsonValue>,
        ) -> Result<TurnOutput, BackendError> {
            Ok(TurnOutput::text("ok"))
        }

        fn discard_last_exchange(&mut self) -> Option<(TurnInput, TurnOutput)> {
            None
        }

        fn push_exchange(&mut self, _input: TurnInput, _output: TurnOutput) {}
    }

    fn session(room: u64, anchor: u64) -> Arc<ConversationSession> {
        let params = ChatParameters::new(
            DEFAULT_MODEL,
            None,
            SamplingOptions::default(),
            RoomId::new(room),
            UserId::new(7),
        )
        .expect("valid params");
        Arc::new(ConversationSession::new(
            params,
            MessageId::new(anchor),
            Box::new(IdleChat),
        ))
    }

    #[test]
    fn start_and_resolve() {
        let directory = SessionDirectory::new();
        let s = session(1, 100);
        directory.start_session(Arc::clone(&s)).expect("start");

        let found = directory
            .resolve_follow_up(RoomId::new(1))
            .expect("resolves");
        assert_eq!(found.id(), s.id());
    }

    #[test]
    fn second_start_in_same_room_conflicts() {
        let directory = SessionDirectory::new();
        directory.start_session(session(1, 100)).expect("start");

        let result = directory.start_session(session(1, 200));
        assert_eq!(
            result,
            Err(DirectoryError::Conflict {
                room: RoomId::new(1)
            })
        );
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn stopped_leftover_is_replaced() {
        let directory = SessionDirectory::new();
        let first = session(1, 100);
        directory.start_session(Arc::clone(&first)).expect("start");
        first.stop().expect("stop");

        let second = session(1, 200);
        directory
            .start_session(Arc::clone(&second))
            .expect("replaces stopped session");
        assert_eq!(directory.len(), 1);

        // The stale anchor no longer resolves.
        assert!(directory.resolve_anchor(MessageId::new(100)).is_none());
        assert!(directory.resolve_anchor(MessageId::new(200)).is_some());
    }

    #[test]
    fn different_rooms_coexist() {
        let directory = SessionDirectory::new();
        directory.start_session(session(1, 100)).expect("start");
        directory.start_session(session(2, 200)).expect("start");
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn follow_up_requires_matching_room() {
        let directory = SessionDirectory::new();
        directory.start_session(session(1, 100)).expect("start");

        assert!(directory.resolve_follow_up(RoomId::new(2)).is_none());
    }

    #[test]
    fn follow_up_to_paused_session_falls_through() {
        let directory = SessionDirectory::new();
        let s = session(1, 100);
        directory.start_session(Arc::clone(&s)).expect("start");
        s.pause().expect("pause");

        assert!(directory.resolve_follow_up(RoomId::new(1)).is_none());
        // The control anchor still resolves so resume remains possible.
        assert!(directory.resolve_anchor(MessageId::new(100)).is_some());
    }

    #[test]
    fn linked_messages_resolve_as_control_anchors() {
        let directory = SessionDirectory::new();
        let s = session(1, 100);
        directory.start_session(Arc::clone(&s)).expect("start");
        directory.link_message(&s, MessageId::new(101));
        directory.link_message(&s, MessageId::new(102));

        for msg in [100, 101, 102] {
            let found = directory
                .resolve_anchor(MessageId::new(msg))
                .expect("resolves");
            assert_eq!(found.id(), s.id());
        }
    }

    #[test]
    fn remove_clears_all_links() {
        let directory = SessionDirectory::new();
        let s = session(1, 100);
        directory.start_session(Arc::clone(&s)).expect("start");
        directory.link_message(&s, MessageId::new(101));

        directory.remove(s.id());
        assert!(directory.is_empty());
        assert!(directory.resolve_anchor(MessageId::new(101)).is_none());
    }

    #[test]
    fn evict_removes_stopped_sessions() {
        let directory = SessionDirectory::new();
        let s = session(1, 100);
        directory.start_session(Arc::clone(&s)).expect("start");
        s.stop().expect("stop");

        let evicted = directory.evict_idle(Duration::hours(6));
        assert_eq!(evicted, vec![s.id()]);
        assert!(directory.is_empty());
    }

    #[test]
    fn evict_keeps_recently_active_sessions() {
        let directory = SessionDirectory::new();
        let s = session(1, 100);
        directory.start_session(Arc::clone(&s)).expect("start");

        let evicted = directory.evict_idle(Duration::hours(6));
        assert!(evicted.is_empty());
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn evict_removes_idle_sessions_past_ttl() {
        let directory = SessionDirectory::new();
        let s = session(1, 100);
        directory.start_session(Arc::clone(&s)).expect("start");

        // Zero TTL makes any completed-creation session idle.
        let evicted = directory.evict_idle(Duration::zero());
        assert_eq!(evicted, vec![s.id()]);
    }
}
