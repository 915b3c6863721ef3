//! Command handlers and per-phase dispatch.
//!
//! Each session phase owns a complete command table; dispatch looks the
//! command up in the session's active table, enforces the callback contract,
//! refreshes the caller's user snapshot, and maps handler errors to a banner
//! plus a `false` ack. Fatal errors additionally end the connection.

mod assessments;
mod create_user;
mod mentors;
mod mentorship;
mod profile;
mod queries;

use crate::error::{CommandError, CommandResult};
use crate::model::{User, collections};
use crate::session::Session;
use crate::state::Hub;
use async_trait::async_trait;
use mentord_proto::{ClientFrame, ServerFrame, commands};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, Level, debug, error, span};

/// Per-command execution context. `user` is a fresh snapshot of the caller's
/// record, present exactly for commands dispatched in the `authed_user`
/// phase.
pub struct Context<'a> {
    pub hub: &'a Arc<Hub>,
    pub session: &'a mut Session,
    pub user: Option<User>,
}

impl Context<'_> {
    /// The caller's snapshot. Absence in an authed command means the
    /// dispatcher contract was broken, which is a session-fatal condition.
    pub fn current_user(&self) -> CommandResult<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| CommandError::Fatal("missing user snapshot".into()))
    }
}

/// A single inbound command.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>, payload: Value) -> CommandResult<Value>;
}

/// Immutable command table for one session phase.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Table with no commands, for phases that accept nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table for `authed_nouser`: account creation only.
    pub fn authed_nouser() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();
        handlers.insert(commands::CREATE_USER, Box::new(create_user::CreateUser));
        Self { handlers }
    }

    /// Table for `authed_user`: the full authenticated command set.
    pub fn authed_user() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();
        handlers.insert(commands::UPDATE_PROFILE, Box::new(profile::UpdateProfile));
        handlers.insert(commands::GET_ALL_MENTORS, Box::new(mentors::GetAllMentors));
        handlers.insert(
            commands::SUBMIT_ASSESSMENT,
            Box::new(assessments::SubmitAssessment),
        );
        handlers.insert(
            commands::MENTORSHIP_REQUEST,
            Box::new(mentorship::MentorshipRequestCmd),
        );
        handlers.insert(commands::GET_USER, Box::new(queries::GetUser));
        handlers.insert(
            commands::GET_ASSESSMENT,
            Box::new(assessments::GetAssessment),
        );
        handlers.insert(
            commands::GET_AVAILABLE_ASSESSMENT_QUESTIONS,
            Box::new(assessments::GetQuestions),
        );
        handlers.insert(
            commands::GET_MENTORSHIP_REQUEST_BETWEEN_USERS,
            Box::new(queries::GetRequestBetweenUsers),
        );
        Self { handlers }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Handler> {
        self.handlers.get(name).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

/// One prebuilt table per phase. Transitions swap the session's pointer to
/// one of these; tables are never edited after construction.
pub struct PhaseTables {
    empty: Arc<Registry>,
    authed_nouser: Arc<Registry>,
    authed_user: Arc<Registry>,
}

impl PhaseTables {
    pub fn new() -> Self {
        Self {
            empty: Arc::new(Registry::empty()),
            authed_nouser: Arc::new(Registry::authed_nouser()),
            authed_user: Arc::new(Registry::authed_user()),
        }
    }

    pub fn table_for(&self, phase: crate::session::SessionPhase) -> Arc<Registry> {
        use crate::session::SessionPhase::*;
        match phase {
            Connecting | ConnectError => self.empty.clone(),
            AuthedNoUser => self.authed_nouser.clone(),
            AuthedUser => self.authed_user.clone(),
        }
    }
}

impl Default for PhaseTables {
    fn default() -> Self {
        Self::new()
    }
}

/// What the connection loop should do after a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    Disconnect,
}

/// Run one client frame against the session's active command table.
///
/// Contract, in order: unknown command gets a banner (plus a `false` ack when
/// a callback was supplied); a frame without `seq` is refused with a banner
/// only, before any side effect; authed commands get a fresh caller snapshot,
/// and a failed refresh is fatal.
pub async fn dispatch(
    hub: &Arc<Hub>,
    session: &mut Session,
    frame: ClientFrame,
) -> DispatchOutcome {
    let table = session.commands.clone();
    let Some(handler) = table.get(&frame.cmd) else {
        debug!(session_id = %session.session_id, cmd = %frame.cmd, "Command not available in phase");
        session
            .push(ServerFrame::error(
                "Not allowed",
                format!("The command {:?} is not available right now.", frame.cmd),
            ))
            .await;
        if let Some(seq) = frame.seq {
            session.push(ServerFrame::ack_bool(seq, false)).await;
        }
        return DispatchOutcome::Continue;
    };

    let Some(seq) = frame.seq else {
        debug!(session_id = %session.session_id, cmd = %frame.cmd, "Frame without completion callback refused");
        session
            .push(ServerFrame::error(
                "Invalid request",
                "A completion callback is required for this command.",
            ))
            .await;
        return DispatchOutcome::Continue;
    };

    // Snapshots are never trusted across commands; other sessions may have
    // mutated the caller's record since the last read.
    let user = match refresh_snapshot(hub, session).await {
        Ok(user) => user,
        Err(e) => {
            error!(session_id = %session.session_id, error = %e, "Caller snapshot refresh failed");
            session
                .push(ServerFrame::error(
                    e.title(),
                    "Your account could not be loaded. Please reconnect.",
                ))
                .await;
            session.push(ServerFrame::ack_bool(seq, false)).await;
            return DispatchOutcome::Disconnect;
        }
    };

    let cmd_span = span!(
        Level::DEBUG,
        "session.command",
        cmd = %frame.cmd,
        session_id = %session.session_id,
        user_id = session.user_id.as_deref(),
    );

    let mut ctx = Context {
        hub,
        session: &mut *session,
        user,
    };
    let result = handler.handle(&mut ctx, frame.payload).instrument(cmd_span).await;

    match result {
        Ok(value) => {
            session
                .push(ServerFrame::Ack { seq, result: value })
                .await;
            DispatchOutcome::Continue
        }
        Err(e) => {
            debug!(session_id = %session.session_id, cmd = %frame.cmd, code = e.error_code(), error = %e, "Command failed");
            session
                .push(ServerFrame::error(e.title(), e.to_string()))
                .await;
            session.push(ServerFrame::ack_bool(seq, false)).await;
            if e.is_fatal() {
                DispatchOutcome::Disconnect
            } else {
                DispatchOutcome::Continue
            }
        }
    }
}

/// Re-read the caller's user record for authed commands. `Ok(None)` for
/// phases with no bound user; a missing or unreadable record is fatal.
async fn refresh_snapshot(hub: &Hub, session: &Session) -> CommandResult<Option<User>> {
    let Some(user_id) = session.user_id.as_deref() else {
        return Ok(None);
    };

    let doc = hub
        .store
        .get(collections::USERS, user_id)
        .await?
        .ok_or_else(|| CommandError::Fatal("user record vanished".into()))?;
    let user =
        User::from_doc(&doc).map_err(|e| CommandError::Fatal(format!("unreadable user record: {e}")))?;
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestionCatalog;
    use crate::session::SessionPhase;
    use crate::store::MemoryStore;
    use serde_json::json;
    use tokio::sync::mpsc;

    async fn authed_fixture() -> (Arc<Hub>, Session, mpsc::Receiver<ServerFrame>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.put_raw(
            "users",
            "u1",
            json!({"id": "u1", "subject": "auth0|u1", "fName": "Ada"}),
        );
        let hub = Hub::new(store.clone(), QuestionCatalog::default(), "test.local".into())
            .await
            .unwrap();
        let (tx, rx) = mpsc::channel(32);
        let mut session = Session::new(&hub, "auth0|u1".into(), tx);
        session.user_id = Some("u1".into());
        session.phase = SessionPhase::AuthedUser;
        session.commands = hub.tables.table_for(SessionPhase::AuthedUser);
        (hub, session, rx, store)
    }

    #[tokio::test]
    async fn phase_tables_gate_commands() {
        let tables = PhaseTables::new();
        assert!(!tables.table_for(SessionPhase::Connecting).contains(commands::CREATE_USER));
        assert!(tables.table_for(SessionPhase::AuthedNoUser).contains(commands::CREATE_USER));
        assert!(!tables.table_for(SessionPhase::AuthedUser).contains(commands::CREATE_USER));
        assert!(tables.table_for(SessionPhase::AuthedUser).contains(commands::GET_USER));
        assert!(!tables.table_for(SessionPhase::AuthedNoUser).contains(commands::GET_USER));
    }

    #[tokio::test]
    async fn authed_user_table_matches_the_advertised_set() {
        let table = Registry::authed_user();
        for cmd in commands::AUTHED_USER_SET {
            assert!(table.contains(cmd), "missing advertised command {cmd}");
        }
        assert_eq!(table.handlers.len(), commands::AUTHED_USER_SET.len());
    }

    #[tokio::test]
    async fn missing_callback_gets_banner_and_no_ack() {
        let (hub, mut session, mut rx, _store) = authed_fixture().await;
        let frame = ClientFrame {
            cmd: commands::GET_USER.into(),
            seq: None,
            payload: json!({"userID": "u1"}),
        };

        let outcome = dispatch(&hub, &mut session, frame).await;
        assert_eq!(outcome, DispatchOutcome::Continue);

        match rx.try_recv().unwrap() {
            ServerFrame::Message { title, .. } => assert_eq!(title, "Invalid request"),
            other => panic!("unexpected frame: {other:?}"),
        }
        assert!(rx.try_recv().is_err(), "no ack may follow a callback-less frame");
    }

    #[tokio::test]
    async fn unknown_command_is_refused() {
        let (hub, mut session, mut rx, _store) = authed_fixture().await;
        let frame = ClientFrame {
            cmd: "selfDestruct".into(),
            seq: Some(1),
            payload: Value::Null,
        };

        dispatch(&hub, &mut session, frame).await;

        match rx.try_recv().unwrap() {
            ServerFrame::Message { title, .. } => assert_eq!(title, "Not allowed"),
            other => panic!("unexpected frame: {other:?}"),
        }
        match rx.try_recv().unwrap() {
            ServerFrame::Ack { seq, result } => {
                assert_eq!(seq, 1);
                assert_eq!(result, Value::Bool(false));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_snapshot_refresh_disconnects() {
        let (hub, mut session, mut rx, store) = authed_fixture().await;
        store.set_failing(true);

        let frame = ClientFrame {
            cmd: commands::GET_USER.into(),
            seq: Some(9),
            payload: json!({"userID": "u1"}),
        };
        let outcome = dispatch(&hub, &mut session, frame).await;
        assert_eq!(outcome, DispatchOutcome::Disconnect);

        match rx.try_recv().unwrap() {
            ServerFrame::Message { .. } => {}
            other => panic!("unexpected frame: {other:?}"),
        }
        match rx.try_recv().unwrap() {
            ServerFrame::Ack { seq, result } => {
                assert_eq!(seq, 9);
                assert_eq!(result, Value::Bool(false));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
