//! Mentorship relationship engine.
//!
//! A pending request is stored three times: one standalone record in
//! `mentorship_requests` plus the record id in both parties'
//! `mentorshipRequests` lists. The copies are eventually consistent; the
//! lookup path detects and repairs every recognized divergence (dangling
//! ids, malformed records, malformed lists) as a side effect of reading.
//!
//! Multi-document updates here are sequences of independent single-document
//! writes. A failure between two writes leaves one side stale until a later
//! read repairs it; nothing in this module takes a lock or a transaction.

use crate::error::{CommandError, CommandResult};
use crate::model::{MentorshipRequest, User, collections};
use crate::state::Hub;
use mentord_proto::{DataPayload, RequestStatus, ServerFrame};
use serde_json::{Value, json};
use std::collections::HashSet;
use tracing::{info, warn};

/// Read one user document, failing with not-found when absent.
async fn user_doc(hub: &Hub, user_id: &str, role: &str) -> CommandResult<Value> {
    hub.store
        .get(collections::USERS, user_id)
        .await?
        .ok_or_else(|| CommandError::not_found(format!("{role} not found")))
}

/// A user's `mentorshipRequests` list as read from the raw document.
enum ListState {
    Usable(Vec<String>),
    Malformed,
}

fn request_list(doc: &Value) -> ListState {
    match doc.get("mentorshipRequests") {
        None | Some(Value::Null) => ListState::Usable(Vec::new()),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(id) => out.push(id.to_string()),
                    None => return ListState::Malformed,
                }
            }
            ListState::Usable(out)
        }
        Some(_) => ListState::Malformed,
    }
}

async fn write_request_list(hub: &Hub, user_id: &str, list: &[String]) -> CommandResult<()> {
    hub.store
        .set(
            collections::USERS,
            user_id,
            json!({ "mentorshipRequests": list }),
            true,
        )
        .await?;
    Ok(())
}

/// Append `request_id` to a user's list, re-reading the list first so a
/// repair that ran in the meantime is not clobbered. Missing users are
/// skipped.
async fn append_ref(hub: &Hub, user_id: &str, request_id: &str) -> CommandResult<()> {
    let Some(doc) = hub.store.get(collections::USERS, user_id).await? else {
        warn!(user_id, request_id, "Cannot back-reference request on missing user");
        return Ok(());
    };
    let mut list = match request_list(&doc) {
        ListState::Usable(list) => list,
        ListState::Malformed => Vec::new(),
    };
    if !list.iter().any(|id| id == request_id) {
        list.push(request_id.to_string());
        write_request_list(hub, user_id, &list).await?;
    }
    Ok(())
}

/// Remove `request_id` from a user's list. Missing users and absent ids are
/// fine; this runs on repair paths where either side may already be gone.
async fn remove_ref(hub: &Hub, user_id: &str, request_id: &str) -> CommandResult<()> {
    let Some(doc) = hub.store.get(collections::USERS, user_id).await? else {
        return Ok(());
    };
    let list = match request_list(&doc) {
        ListState::Usable(list) => list,
        ListState::Malformed => Vec::new(),
    };
    let kept: Vec<String> = list.into_iter().filter(|id| id != request_id).collect();
    write_request_list(hub, user_id, &kept).await?;
    Ok(())
}

/// Tell both parties' live sessions about a request lifecycle event.
async fn broadcast_request(hub: &Hub, request: Value, status: RequestStatus, parties: [&str; 2]) {
    let frame = ServerFrame::Data {
        data: DataPayload::MentorshipRequest { request, status },
    };
    hub.registry.broadcast(&parties, &frame).await;
}

/// Full deletion of a request: both back-references, the standalone record,
/// and a lifecycle broadcast to both parties.
async fn delete_request(
    hub: &Hub,
    req: &MentorshipRequest,
    status: RequestStatus,
) -> CommandResult<()> {
    remove_ref(hub, &req.mentor_id, &req.id).await?;
    remove_ref(hub, &req.mentee_id, &req.id).await?;
    hub.store
        .delete(collections::MENTORSHIP_REQUESTS, &req.id)
        .await?;
    info!(request_id = %req.id, status = ?status, "Mentorship request deleted");
    broadcast_request(hub, req.to_doc(), status, [&req.mentor_id, &req.mentee_id]).await;
    Ok(())
}

/// Create a pending request from `caller` (the mentee) to `mentor_id`.
pub async fn send_request(hub: &Hub, caller: &User, mentor_id: &str) -> CommandResult<()> {
    if mentor_id == caller.id {
        return Err(CommandError::denied(
            "you cannot send a mentorship request to yourself",
        ));
    }

    let mentor_doc = user_doc(hub, mentor_id, "mentor").await?;
    let mentor = User::from_doc(&mentor_doc)
        .map_err(|e| CommandError::Corrupt(format!("mentor record unreadable: {e}")))?;
    if !mentor.is_mentor {
        return Err(CommandError::denied("that user is not a mentor"));
    }
    if !mentor.accepting_mentees {
        return Err(CommandError::denied("that mentor is not accepting mentees"));
    }

    if find_request_between(hub, mentor_id, &caller.id).await?.is_some()
        || find_request_between(hub, &caller.id, mentor_id).await?.is_some()
    {
        return Err(CommandError::denied(
            "a mentorship request between you two already exists",
        ));
    }

    let mut req = MentorshipRequest::new(mentor_id, &caller.id);
    req.id = hub
        .store
        .create(collections::MENTORSHIP_REQUESTS, req.to_doc())
        .await?;

    append_ref(hub, mentor_id, &req.id).await?;
    append_ref(hub, &caller.id, &req.id).await?;

    info!(request_id = %req.id, mentor_id, mentee_id = %caller.id, "Mentorship request sent");
    broadcast_request(hub, req.to_doc(), RequestStatus::Sent, [mentor_id, &caller.id]).await;
    Ok(())
}

/// Load a request for an action, deleting it outright when malformed.
async fn load_request(hub: &Hub, request_id: &str) -> CommandResult<MentorshipRequest> {
    let doc = hub
        .store
        .get(collections::MENTORSHIP_REQUESTS, request_id)
        .await?
        .ok_or_else(|| CommandError::not_found("mentorship request not found"))?;

    match MentorshipRequest::from_doc_checked(&doc) {
        Some(req) => Ok(req),
        None => {
            warn!(request_id, "Deleting malformed mentorship request record");
            hub.store
                .delete(collections::MENTORSHIP_REQUESTS, request_id)
                .await?;
            Err(CommandError::Corrupt(
                "the mentorship request was malformed and has been removed".to_string(),
            ))
        }
    }
}

/// Mentor accepts: the request is torn down and the relationship created.
pub async fn accept_request(hub: &Hub, caller: &User, request_id: &str) -> CommandResult<()> {
    let req = load_request(hub, request_id).await?;
    if caller.id != req.mentor_id {
        return Err(CommandError::denied("only the mentor can accept a request"));
    }
    delete_request(hub, &req, RequestStatus::Accepted).await?;
    add_mentorship(hub, &req.mentor_id, &req.mentee_id).await
}

/// Mentor declines: the request is torn down, nothing else changes.
pub async fn decline_request(hub: &Hub, caller: &User, request_id: &str) -> CommandResult<()> {
    let req = load_request(hub, request_id).await?;
    if caller.id != req.mentor_id {
        return Err(CommandError::denied("only the mentor can decline a request"));
    }
    delete_request(hub, &req, RequestStatus::Declined).await
}

/// Mentee withdraws their own pending request.
pub async fn cancel_request(hub: &Hub, caller: &User, request_id: &str) -> CommandResult<()> {
    let req = load_request(hub, request_id).await?;
    if caller.id != req.mentee_id {
        return Err(CommandError::denied("only the mentee can cancel a request"));
    }
    delete_request(hub, &req, RequestStatus::Cancelled).await
}

/// Establish the relationship on both user records.
///
/// Two independent writes, mentee side first. Both endpoints must exist
/// before either write happens.
pub async fn add_mentorship(hub: &Hub, mentor_id: &str, mentee_id: &str) -> CommandResult<()> {
    let mentor_doc = user_doc(hub, mentor_id, "mentor").await?;
    user_doc(hub, mentee_id, "mentee").await?;

    let mentor = User::from_doc(&mentor_doc)
        .map_err(|e| CommandError::Corrupt(format!("mentor record unreadable: {e}")))?;

    hub.store
        .set(
            collections::USERS,
            mentee_id,
            json!({ "mentorID": mentor_id }),
            true,
        )
        .await?;

    let mut mentees = mentor.mentee_ids;
    if !mentees.iter().any(|id| id == mentee_id) {
        mentees.push(mentee_id.to_string());
    }
    hub.store
        .set(
            collections::USERS,
            mentor_id,
            json!({ "menteeIDs": mentees }),
            true,
        )
        .await?;

    info!(mentor_id, mentee_id, "Mentorship established");
    Ok(())
}

/// Tear the relationship down on both user records. Same two-write shape as
/// [`add_mentorship`].
pub async fn remove_mentorship(hub: &Hub, mentor_id: &str, mentee_id: &str) -> CommandResult<()> {
    let mentor_doc = user_doc(hub, mentor_id, "mentor").await?;
    user_doc(hub, mentee_id, "mentee").await?;

    let mentor = User::from_doc(&mentor_doc)
        .map_err(|e| CommandError::Corrupt(format!("mentor record unreadable: {e}")))?;

    hub.store
        .set(
            collections::USERS,
            mentee_id,
            json!({ "mentorID": Value::Null }),
            true,
        )
        .await?;

    let mentees: Vec<String> = mentor
        .mentee_ids
        .into_iter()
        .filter(|id| id != mentee_id)
        .collect();
    hub.store
        .set(
            collections::USERS,
            mentor_id,
            json!({ "menteeIDs": mentees }),
            true,
        )
        .await?;

    info!(mentor_id, mentee_id, "Mentorship removed");
    Ok(())
}

/// Caller drops their own mentor.
pub async fn remove_mentor(hub: &Hub, caller: &User) -> CommandResult<()> {
    let mentor_id = caller
        .mentor_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CommandError::denied("you do not have a mentor"))?;
    remove_mentorship(hub, mentor_id, &caller.id).await
}

/// Caller (a mentor) drops one of their mentees.
pub async fn remove_mentee(hub: &Hub, caller: &User, mentee_id: &str) -> CommandResult<()> {
    if !caller.mentee_ids.iter().any(|id| id == mentee_id) {
        return Err(CommandError::denied("that user is not your mentee"));
    }
    remove_mentorship(hub, &caller.id, mentee_id).await
}

/// Direction-sensitive duplicate-request lookup with inline self-healing.
///
/// Intersects both users' `mentorshipRequests` lists (iterating the smaller
/// one) and checks each common id's standalone record. Dangling ids are
/// pruned from both lists; malformed records are fully deleted; a record
/// matching exactly this mentor→mentee orientation is the hit. A malformed
/// list on either side is reset to empty and the lookup reports no match.
pub async fn find_request_between(
    hub: &Hub,
    mentor_id: &str,
    mentee_id: &str,
) -> CommandResult<Option<Value>> {
    let mentor_doc = user_doc(hub, mentor_id, "mentor").await?;
    let mentee_doc = user_doc(hub, mentee_id, "mentee").await?;

    let mentor_list = request_list(&mentor_doc);
    let mentee_list = request_list(&mentee_doc);

    let (mut mentor_ids, mut mentee_ids) = match (mentor_list, mentee_list) {
        (ListState::Usable(a), ListState::Usable(b)) => (a, b),
        (mentor_state, mentee_state) => {
            if matches!(mentor_state, ListState::Malformed) {
                warn!(user_id = mentor_id, "Resetting malformed mentorshipRequests list");
                write_request_list(hub, mentor_id, &[]).await?;
            }
            if matches!(mentee_state, ListState::Malformed) {
                warn!(user_id = mentee_id, "Resetting malformed mentorshipRequests list");
                write_request_list(hub, mentee_id, &[]).await?;
            }
            return Ok(None);
        }
    };

    if mentor_ids.is_empty() || mentee_ids.is_empty() {
        return Ok(None);
    }

    let common: Vec<String> = if mentor_ids.len() <= mentee_ids.len() {
        let larger: HashSet<&str> = mentee_ids.iter().map(String::as_str).collect();
        mentor_ids
            .iter()
            .filter(|id| larger.contains(id.as_str()))
            .cloned()
            .collect()
    } else {
        let larger: HashSet<&str> = mentor_ids.iter().map(String::as_str).collect();
        mentee_ids
            .iter()
            .filter(|id| larger.contains(id.as_str()))
            .cloned()
            .collect()
    };

    for id in common {
        let record = hub
            .store
            .get(collections::MENTORSHIP_REQUESTS, &id)
            .await?;

        let Some(doc) = record else {
            // Dangling id: the standalone record is gone. Prune both sides.
            warn!(request_id = %id, "Pruning dangling mentorship request id");
            mentor_ids.retain(|r| *r != id);
            mentee_ids.retain(|r| *r != id);
            write_request_list(hub, mentor_id, &mentor_ids).await?;
            write_request_list(hub, mentee_id, &mentee_ids).await?;
            continue;
        };

        match MentorshipRequest::from_doc_checked(&doc) {
            None => {
                // Malformed record: full teardown against the queried pair.
                warn!(request_id = %id, "Deleting malformed mentorship request found in lookup");
                let stub = MentorshipRequest {
                    id: id.clone(),
                    mentor_id: mentor_id.to_string(),
                    mentee_id: mentee_id.to_string(),
                    created_at: 0,
                };
                delete_request(hub, &stub, RequestStatus::Declined).await?;
                mentor_ids.retain(|r| *r != id);
                mentee_ids.retain(|r| *r != id);
            }
            Some(req) if req.mentor_id == mentor_id && req.mentee_id == mentee_id => {
                return Ok(Some(doc));
            }
            // Reverse orientation or a third party's request; not a match.
            Some(_) => {}
        }
    }

    Ok(None)
}

/// Idempotent repair of all recognized divergences between two users: run
/// the lookup in both orientations and discard the results.
pub async fn reconcile(hub: &Hub, user_a: &str, user_b: &str) -> CommandResult<()> {
    find_request_between(hub, user_a, user_b).await?;
    find_request_between(hub, user_b, user_a).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestionCatalog;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    async fn hub() -> (Arc<Hub>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let hub = Hub::new(store.clone(), QuestionCatalog::default(), "test.local".into())
            .await
            .unwrap();
        (hub, store)
    }

    fn seed_user(store: &MemoryStore, id: &str, mentor: bool, accepting: bool) -> User {
        let mut user = User::new(&format!("auth0|{id}"), "Test", None, "User", id);
        user.id = id.to_string();
        user.is_mentor = mentor;
        user.accepting_mentees = accepting;
        store.put_raw("users", id, user.to_doc());
        user
    }

    async fn load_user(hub: &Hub, id: &str) -> User {
        let doc = hub.store.get(collections::USERS, id).await.unwrap().unwrap();
        User::from_doc(&doc).unwrap()
    }

    async fn only_request_id(hub: &Hub) -> String {
        let docs = hub
            .store
            .find(collections::MENTORSHIP_REQUESTS, &[], crate::store::Combine::And)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        docs[0]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn send_creates_symmetric_state() {
        let (hub, store) = hub().await;
        let mentee = seed_user(&store, "mentee", false, false);
        seed_user(&store, "mentor", true, true);

        send_request(&hub, &mentee, "mentor").await.unwrap();

        let req_id = only_request_id(&hub).await;
        let mentor = load_user(&hub, "mentor").await;
        let mentee = load_user(&hub, "mentee").await;
        assert_eq!(mentor.mentorship_requests, vec![req_id.clone()]);
        assert_eq!(mentee.mentorship_requests, vec![req_id.clone()]);

        let doc = hub
            .store
            .get(collections::MENTORSHIP_REQUESTS, &req_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["mentorID"], "mentor");
        assert_eq!(doc["menteeID"], "mentee");
    }

    #[tokio::test]
    async fn duplicate_send_is_rejected() {
        let (hub, store) = hub().await;
        let mentee = seed_user(&store, "mentee", false, false);
        seed_user(&store, "mentor", true, true);

        send_request(&hub, &mentee, "mentor").await.unwrap();
        let mentee = load_user(&hub, "mentee").await;
        let err = send_request(&hub, &mentee, "mentor").await.unwrap_err();
        assert_eq!(err.error_code(), "denied");

        // Still exactly one standalone record.
        only_request_id(&hub).await;
    }

    #[tokio::test]
    async fn send_to_non_mentor_creates_nothing() {
        let (hub, store) = hub().await;
        let mentee = seed_user(&store, "mentee", false, false);
        seed_user(&store, "notmentor", false, false);

        let err = send_request(&hub, &mentee, "notmentor").await.unwrap_err();
        assert_eq!(err.error_code(), "denied");

        let docs = hub
            .store
            .find(collections::MENTORSHIP_REQUESTS, &[], crate::store::Combine::And)
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn send_to_self_is_rejected() {
        let (hub, store) = hub().await;
        let user = seed_user(&store, "solo", true, true);
        let err = send_request(&hub, &user, "solo").await.unwrap_err();
        assert_eq!(err.error_code(), "denied");
    }

    #[tokio::test]
    async fn accept_establishes_relationship_and_clears_request() {
        let (hub, store) = hub().await;
        let mentee = seed_user(&store, "mentee", false, false);
        seed_user(&store, "mentor", true, true);
        send_request(&hub, &mentee, "mentor").await.unwrap();
        let req_id = only_request_id(&hub).await;

        let mentor = load_user(&hub, "mentor").await;
        accept_request(&hub, &mentor, &req_id).await.unwrap();

        let mentor = load_user(&hub, "mentor").await;
        let mentee = load_user(&hub, "mentee").await;
        assert_eq!(mentee.mentor_id.as_deref(), Some("mentor"));
        assert_eq!(mentor.mentee_ids, vec!["mentee".to_string()]);
        assert!(mentor.mentorship_requests.is_empty());
        assert!(mentee.mentorship_requests.is_empty());
        assert!(
            hub.store
                .get(collections::MENTORSHIP_REQUESTS, &req_id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn only_the_mentor_may_accept() {
        let (hub, store) = hub().await;
        let mentee = seed_user(&store, "mentee", false, false);
        seed_user(&store, "mentor", true, true);
        send_request(&hub, &mentee, "mentor").await.unwrap();
        let req_id = only_request_id(&hub).await;

        let mentee = load_user(&hub, "mentee").await;
        let err = accept_request(&hub, &mentee, &req_id).await.unwrap_err();
        assert_eq!(err.error_code(), "denied");
    }

    #[tokio::test]
    async fn cancel_round_trips_to_pre_send_state() {
        let (hub, store) = hub().await;
        let mentee = seed_user(&store, "mentee", false, false);
        seed_user(&store, "mentor", true, true);
        send_request(&hub, &mentee, "mentor").await.unwrap();
        let req_id = only_request_id(&hub).await;

        let mentee = load_user(&hub, "mentee").await;
        cancel_request(&hub, &mentee, &req_id).await.unwrap();

        let mentor = load_user(&hub, "mentor").await;
        let mentee = load_user(&hub, "mentee").await;
        assert!(mentor.mentorship_requests.is_empty());
        assert!(mentee.mentorship_requests.is_empty());
        assert!(
            hub.store
                .get(collections::MENTORSHIP_REQUESTS, &req_id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn dangling_id_is_pruned_by_lookup() {
        let (hub, store) = hub().await;
        let mut mentor = seed_user(&store, "mentor", true, true);
        let mut mentee = seed_user(&store, "mentee", false, false);
        mentor.mentorship_requests = vec!["ghost".into()];
        mentee.mentorship_requests = vec!["ghost".into()];
        store.put_raw("users", "mentor", mentor.to_doc());
        store.put_raw("users", "mentee", mentee.to_doc());

        let hit = find_request_between(&hub, "mentor", "mentee").await.unwrap();
        assert!(hit.is_none());

        let mentor = load_user(&hub, "mentor").await;
        let mentee = load_user(&hub, "mentee").await;
        assert!(mentor.mentorship_requests.is_empty());
        assert!(mentee.mentorship_requests.is_empty());
    }

    #[tokio::test]
    async fn malformed_list_is_reset() {
        let (hub, store) = hub().await;
        seed_user(&store, "mentee", false, false);
        let mentor = seed_user(&store, "mentor", true, true);
        let mut doc = mentor.to_doc();
        doc["mentorshipRequests"] = serde_json::json!("not-a-list");
        store.put_raw("users", "mentor", doc);

        let hit = find_request_between(&hub, "mentor", "mentee").await.unwrap();
        assert!(hit.is_none());

        let mentor_doc = hub.store.get(collections::USERS, "mentor").await.unwrap().unwrap();
        assert_eq!(mentor_doc["mentorshipRequests"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn lookup_is_direction_sensitive() {
        let (hub, store) = hub().await;
        let mentee = seed_user(&store, "mentee", true, true);
        seed_user(&store, "mentor", true, true);
        send_request(&hub, &mentee, "mentor").await.unwrap();

        assert!(
            find_request_between(&hub, "mentor", "mentee")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            find_request_between(&hub, "mentee", "mentor")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn malformed_record_is_torn_down_by_lookup() {
        let (hub, store) = hub().await;
        let mut mentor = seed_user(&store, "mentor", true, true);
        let mut mentee = seed_user(&store, "mentee", false, false);
        mentor.mentorship_requests = vec!["bad".into()];
        mentee.mentorship_requests = vec!["bad".into()];
        store.put_raw("users", "mentor", mentor.to_doc());
        store.put_raw("users", "mentee", mentee.to_doc());
        store.put_raw(
            "mentorship_requests",
            "bad",
            serde_json::json!({"id": "bad", "mentorID": "mentor"}),
        );

        let hit = find_request_between(&hub, "mentor", "mentee").await.unwrap();
        assert!(hit.is_none());

        assert!(
            hub.store
                .get(collections::MENTORSHIP_REQUESTS, "bad")
                .await
                .unwrap()
                .is_none()
        );
        let mentor = load_user(&hub, "mentor").await;
        let mentee = load_user(&hub, "mentee").await;
        assert!(mentor.mentorship_requests.is_empty());
        assert!(mentee.mentorship_requests.is_empty());
    }

    #[tokio::test]
    async fn remove_mentee_requires_membership() {
        let (hub, store) = hub().await;
        let mentor = seed_user(&store, "mentor", true, true);
        seed_user(&store, "stranger", false, false);

        let err = remove_mentee(&hub, &mentor, "stranger").await.unwrap_err();
        assert_eq!(err.error_code(), "denied");

        let stranger = load_user(&hub, "stranger").await;
        assert!(stranger.mentor_id.is_none());
    }

    #[tokio::test]
    async fn remove_mentor_clears_both_sides() {
        let (hub, store) = hub().await;
        seed_user(&store, "mentor", true, true);
        seed_user(&store, "mentee", false, false);
        add_mentorship(&hub, "mentor", "mentee").await.unwrap();

        let mentee = load_user(&hub, "mentee").await;
        assert_eq!(mentee.mentor_id.as_deref(), Some("mentor"));
        remove_mentor(&hub, &mentee).await.unwrap();

        let mentor = load_user(&hub, "mentor").await;
        let mentee = load_user(&hub, "mentee").await;
        assert!(mentee.mentor_id.is_none());
        assert!(mentor.mentee_ids.is_empty());
    }

    #[tokio::test]
    async fn diverged_relationship_is_tolerated() {
        // One-sided state, as left by a failure between the two writes of
        // add_mentorship: the mentee points at the mentor but the mentor's
        // list never got the mentee. Teardown still completes from either
        // side without erroring.
        let (hub, store) = hub().await;
        seed_user(&store, "mentor", true, true);
        let mut mentee = seed_user(&store, "mentee", false, false);
        mentee.mentor_id = Some("mentor".into());
        store.put_raw("users", "mentee", mentee.to_doc());

        let mentor = load_user(&hub, "mentor").await;
        assert!(mentor.mentee_ids.is_empty());

        let mentee = load_user(&hub, "mentee").await;
        remove_mentor(&hub, &mentee).await.unwrap();

        let mentee = load_user(&hub, "mentee").await;
        assert!(mentee.mentor_id.is_none());
    }

    #[tokio::test]
    async fn reconcile_repairs_both_orientations() {
        let (hub, store) = hub().await;
        let mut a = seed_user(&store, "a", true, true);
        let mut b = seed_user(&store, "b", true, true);
        a.mentorship_requests = vec!["ghost1".into(), "ghost2".into()];
        b.mentorship_requests = vec!["ghost1".into(), "ghost2".into()];
        store.put_raw("users", "a", a.to_doc());
        store.put_raw("users", "b", b.to_doc());

        reconcile(&hub, "a", "b").await.unwrap();

        let a = load_user(&hub, "a").await;
        let b = load_user(&hub, "b").await;
        assert!(a.mentorship_requests.is_empty());
        assert!(b.mentorship_requests.is_empty());
    }
}
