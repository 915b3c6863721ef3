//! Mentor availability index.
//!
//! Denormalized set of user ids with `isMentor && acceptingMentees`, rebuilt
//! at startup and maintained incrementally on profile updates. Entries that
//! turn out stale are evicted on access from the list-mentors read path, not
//! eagerly.

use crate::model::{User, collections};
use crate::store::{Combine, DocumentStore, Filter, StoreError};
use dashmap::DashSet;
use tracing::{debug, info};

/// Process-wide set of users currently eligible to receive requests.
#[derive(Default)]
pub struct MentorIndex {
    ids: DashSet<String>,
}

impl MentorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from storage; returns the number of indexed mentors.
    pub async fn rebuild(&self, store: &dyn DocumentStore) -> Result<usize, StoreError> {
        let docs = store
            .find(
                collections::USERS,
                &[
                    Filter::eq("isMentor", true),
                    Filter::eq("acceptingMentees", true),
                ],
                Combine::And,
            )
            .await?;

        self.ids.clear();
        for doc in &docs {
            if let Some(id) = doc.get("id").and_then(|v| v.as_str()) {
                self.ids.insert(id.to_string());
            }
        }
        info!(count = self.ids.len(), "Mentor availability index rebuilt");
        Ok(self.ids.len())
    }

    /// Reconcile the index with a user's current flags.
    pub fn apply(&self, user: &User) {
        if user.is_accepting_mentor() {
            if self.ids.insert(user.id.clone()) {
                debug!(user_id = %user.id, "Mentor added to availability index");
            }
        } else if self.ids.remove(&user.id).is_some() {
            debug!(user_id = %user.id, "Mentor removed from availability index");
        }
    }

    /// Evict a stale entry discovered during a read.
    pub fn prune(&self, user_id: &str) {
        if self.ids.remove(user_id).is_some() {
            debug!(user_id, "Pruned stale mentor index entry");
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.ids.contains(user_id)
    }

    /// Current ids, for iteration by the read path.
    pub fn snapshot(&self) -> Vec<String> {
        self.ids.iter().map(|id| id.clone()).collect()
    }
}
