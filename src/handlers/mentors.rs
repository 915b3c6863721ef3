//! Mentor listing with stale-entry eviction.

use super::{Context, Handler};
use crate::error::CommandResult;
use crate::model::{User, collections};
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

pub struct GetAllMentors;

#[async_trait]
impl Handler for GetAllMentors {
    async fn handle(&self, ctx: &mut Context<'_>, _payload: Value) -> CommandResult<Value> {
        ctx.current_user()?;

        let mut mentors = Vec::new();
        for id in ctx.hub.mentors.snapshot() {
            let doc = match ctx.hub.store.get(collections::USERS, &id).await {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    ctx.hub.mentors.prune(&id);
                    continue;
                }
                Err(e) => {
                    warn!(user_id = %id, error = %e, "Mentor fetch failed; evicting from index");
                    ctx.hub.mentors.prune(&id);
                    continue;
                }
            };

            match User::from_doc(&doc) {
                Ok(user) if user.is_accepting_mentor() => mentors.push(doc),
                Ok(user) => {
                    // Flags changed under us; the index entry is stale.
                    ctx.hub.mentors.apply(&user);
                }
                Err(e) => {
                    warn!(user_id = %id, error = %e, "Undecodable mentor record; evicting from index");
                    ctx.hub.mentors.prune(&id);
                }
            }
        }
        Ok(Value::Array(mentors))
    }
}
