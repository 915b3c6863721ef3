//! The Hub. Central shared state for the mentorship server.
//!
//! Holds the persistence gateway, connection registry, mentor availability
//! index, question catalog and the per-phase command tables, accessible from
//! any async task.

use crate::catalog::QuestionCatalog;
use crate::handlers::PhaseTables;
use crate::state::{ConnectionRegistry, MentorIndex};
use crate::store::{DocumentStore, StoreError};
use std::sync::Arc;

/// Central shared state container. One per process, behind an `Arc`.
pub struct Hub {
    /// Document storage for users, assessments and mentorship requests.
    pub store: Arc<dyn DocumentStore>,

    /// Live sessions indexed by user id, for broadcast delivery.
    pub registry: ConnectionRegistry,

    /// Users currently eligible to receive mentorship requests.
    pub mentors: MentorIndex,

    /// Assessment questions served to clients.
    pub catalog: QuestionCatalog,

    /// Command tables, one per session phase.
    pub tables: PhaseTables,

    /// This server's display name, used in banner messages.
    pub server_name: String,
}

impl Hub {
    /// Build the hub and warm the mentor index from storage.
    pub async fn new(
        store: Arc<dyn DocumentStore>,
        catalog: QuestionCatalog,
        server_name: String,
    ) -> Result<Arc<Self>, StoreError> {
        let mentors = MentorIndex::new();
        mentors.rebuild(store.as_ref()).await?;

        Ok(Arc::new(Self {
            store,
            registry: ConnectionRegistry::new(),
            mentors,
            catalog,
            tables: PhaseTables::new(),
            server_name,
        }))
    }
}
