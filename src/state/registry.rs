//! Connection registry: user id -> live sessions.
//!
//! A user may hold several simultaneous connections (multiple devices), each
//! with its own session. Broadcasts fan out to every live session of every
//! addressed user; users with no live session are silently skipped, nothing
//! is queued for offline delivery.

use dashmap::DashMap;
use mentord_proto::ServerFrame;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// One live session's delivery handle.
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: Uuid,
    pub tx: mpsc::Sender<ServerFrame>,
}

/// Process-wide mapping from user id to that user's live sessions.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: DashMap<String, Vec<SessionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for a user. Idempotent per session id.
    pub fn register(&self, user_id: &str, handle: SessionHandle) {
        let mut entry = self.sessions.entry(user_id.to_string()).or_default();
        if entry.iter().any(|h| h.session_id == handle.session_id) {
            return;
        }
        debug!(user_id, session_id = %handle.session_id, "Session registered");
        entry.push(handle);
    }

    /// Remove one session; drops the user's entry when it empties.
    pub fn deregister(&self, user_id: &str, session_id: Uuid) {
        let emptied = if let Some(mut entry) = self.sessions.get_mut(user_id) {
            entry.retain(|h| h.session_id != session_id);
            entry.is_empty()
        } else {
            false
        };
        if emptied {
            self.sessions.remove(user_id);
        }
        debug!(user_id, %session_id, "Session deregistered");
    }

    /// Number of live sessions for a user.
    pub fn live_sessions(&self, user_id: &str) -> usize {
        self.sessions.get(user_id).map(|e| e.len()).unwrap_or(0)
    }

    /// Deliver a frame to every live session of every listed user.
    ///
    /// Handles are cloned out before sending so no map guard is held across
    /// an await. Full or closed channels drop the frame for that session.
    pub async fn broadcast(&self, user_ids: &[&str], frame: &ServerFrame) {
        let mut targets = Vec::new();
        for user_id in user_ids {
            if let Some(entry) = self.sessions.get(*user_id) {
                targets.extend(entry.iter().cloned());
            }
        }

        for handle in targets {
            if let Err(e) = handle.tx.try_send(frame.clone()) {
                warn!(session_id = %handle.session_id, error = %e, "Dropping broadcast frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (SessionHandle, mpsc::Receiver<ServerFrame>) {
        let (tx, rx) = mpsc::channel(8);
        (
            SessionHandle {
                session_id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn register_is_idempotent_per_session() {
        let registry = ConnectionRegistry::new();
        let (h, _rx) = handle();
        registry.register("u1", h.clone());
        registry.register("u1", h);
        assert_eq!(registry.live_sessions("u1"), 1);
    }

    #[tokio::test]
    async fn deregister_drops_empty_entries() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();
        registry.register("u1", a.clone());
        registry.register("u1", b.clone());

        registry.deregister("u1", a.session_id);
        assert_eq!(registry.live_sessions("u1"), 1);

        registry.deregister("u1", b.session_id);
        assert_eq!(registry.live_sessions("u1"), 0);
        assert!(registry.sessions.get("u1").is_none());
    }

    #[tokio::test]
    async fn broadcast_reaches_all_sessions_and_skips_offline() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = handle();
        let (b, mut rx_b) = handle();
        registry.register("u1", a);
        registry.register("u1", b);

        let frame = ServerFrame::State {
            state: "authed_user".into(),
        };
        registry.broadcast(&["u1", "ghost"], &frame).await;

        assert!(matches!(rx_a.try_recv(), Ok(ServerFrame::State { .. })));
        assert!(matches!(rx_b.try_recv(), Ok(ServerFrame::State { .. })));
    }
}
