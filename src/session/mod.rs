//! Per-connection session state machine.
//!
//! Each connection owns exactly one [`Session`]. The session's phase decides
//! which commands are accepted, and moving between phases swaps the entire
//! command table at once; tables are never edited incrementally. Every
//! transition pushes a `state` frame so the client always knows the phase.

mod machine;

pub use machine::{enter_authed_user, resolve_subject};

use crate::handlers::Registry;
use crate::state::Hub;
use mentord_proto::ServerFrame;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Phases a session moves through.
///
/// ```text
/// connecting ──resolve──▶ authed_nouser ──createUser──▶ authed_user
///      │
///      └──storage failure──▶ connect_error (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Transport is up, subject extracted, user record not yet resolved.
    Connecting,
    /// Authenticated subject with no user record. Only `createUser` works.
    AuthedNoUser,
    /// Authenticated subject bound to a user record. Full command set.
    AuthedUser,
    /// Resolution failed. No commands are accepted; the connection closes.
    ConnectError,
}

impl SessionPhase {
    /// Wire name pushed in `state` frames.
    pub fn name(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::AuthedNoUser => "authed_nouser",
            Self::AuthedUser => "authed_user",
            Self::ConnectError => "connect_error",
        }
    }
}

/// One connection's session.
///
/// `user_id` is set exactly when the phase is [`SessionPhase::AuthedUser`].
/// Handlers never cache the user record here; they re-fetch a fresh snapshot
/// per command.
pub struct Session {
    pub session_id: Uuid,
    pub subject: String,
    pub phase: SessionPhase,
    pub user_id: Option<String>,
    pub tx: mpsc::Sender<ServerFrame>,
    pub commands: Arc<Registry>,
}

impl Session {
    /// New session in the `connecting` phase.
    pub fn new(hub: &Hub, subject: String, tx: mpsc::Sender<ServerFrame>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            subject,
            phase: SessionPhase::Connecting,
            user_id: None,
            tx,
            commands: hub.tables.table_for(SessionPhase::Connecting),
        }
    }

    /// Move to `phase`: swap the command table wholesale and push the state
    /// name to the client.
    pub async fn transition(&mut self, hub: &Hub, phase: SessionPhase) {
        debug!(session_id = %self.session_id, from = self.phase.name(), to = phase.name(), "Session transition");
        self.phase = phase;
        self.commands = hub.tables.table_for(phase);
        let _ = self
            .tx
            .send(ServerFrame::State {
                state: phase.name().to_string(),
            })
            .await;
    }

    /// Push a frame to this session's writer, dropping it if the connection
    /// is gone.
    pub async fn push(&self, frame: ServerFrame) {
        let _ = self.tx.send(frame).await;
    }
}
