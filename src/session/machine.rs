//! Phase resolution for freshly connected sessions.

use super::{Session, SessionPhase};
use crate::model::{User, collections};
use crate::state::{Hub, SessionHandle};
use crate::store::{Combine, Filter};
use mentord_proto::{DataPayload, ServerFrame};
use tracing::{error, info, warn};

/// Resolve the session's subject against the user collection and enter the
/// matching phase. Returns `false` when the session ended in `connect_error`
/// and the connection should close.
pub async fn resolve_subject(hub: &Hub, session: &mut Session) -> bool {
    let found = hub
        .store
        .find(
            collections::USERS,
            &[Filter::eq("subject", session.subject.clone())],
            Combine::And,
        )
        .await;

    let docs = match found {
        Ok(docs) => docs,
        Err(e) => {
            error!(session_id = %session.session_id, error = %e, "Subject resolution failed");
            session.transition(hub, SessionPhase::ConnectError).await;
            session
                .push(ServerFrame::error(
                    "Session error",
                    "Could not load your account. Please reconnect.",
                ))
                .await;
            return false;
        }
    };

    if docs.len() > 1 {
        warn!(subject = %session.subject, count = docs.len(), "Multiple users share a subject; using the first");
    }

    match docs.into_iter().next() {
        Some(doc) => match User::from_doc(&doc) {
            Ok(user) => {
                enter_authed_user(hub, session, &user).await;
                true
            }
            Err(e) => {
                error!(session_id = %session.session_id, error = %e, "Undecodable user record for subject");
                session.transition(hub, SessionPhase::ConnectError).await;
                session
                    .push(ServerFrame::error(
                        "Session error",
                        "Your account record is unreadable. Please contact support.",
                    ))
                    .await;
                false
            }
        },
        None => {
            session.transition(hub, SessionPhase::AuthedNoUser).await;
            true
        }
    }
}

/// Bind the session to `user` and enter the full-command phase: register for
/// broadcasts, announce the state, then push the one-shot initial snapshot.
pub async fn enter_authed_user(hub: &Hub, session: &mut Session, user: &User) {
    session.user_id = Some(user.id.clone());
    hub.registry.register(
        &user.id,
        SessionHandle {
            session_id: session.session_id,
            tx: session.tx.clone(),
        },
    );
    info!(session_id = %session.session_id, user_id = %user.id, "Session bound to user");

    session.transition(hub, SessionPhase::AuthedUser).await;
    session
        .push(ServerFrame::Data {
            data: DataPayload::InitialData {
                user: user.to_doc(),
                questions: hub.catalog.to_value(),
            },
        })
        .await;
}
