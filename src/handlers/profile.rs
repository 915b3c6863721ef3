//! Profile updates.
//!
//! Updates are a shallow merge of permitted fields. Relationship fields and
//! identity fields are stripped before the write; only the relationship
//! engine mutates those.

use super::{Context, Handler};
use crate::error::{CommandError, CommandResult};
use crate::model::{User, collections};
use crate::store::{Combine, Filter, merge_fields};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

/// Fields a profile update may never touch.
const PROTECTED_FIELDS: &[&str] = &[
    "id",
    "subject",
    "usernameLower",
    "mentorID",
    "menteeIDs",
    "assessments",
    "mentorshipRequests",
    "createdAt",
];

pub struct UpdateProfile;

#[async_trait]
impl Handler for UpdateProfile {
    async fn handle(&self, ctx: &mut Context<'_>, payload: Value) -> CommandResult<Value> {
        let user = ctx.current_user()?.clone();
        let Value::Object(mut patch) = payload else {
            return Err(CommandError::bad_payload("profile update must be an object"));
        };

        for field in PROTECTED_FIELDS {
            patch.remove(*field);
        }
        if patch.is_empty() {
            return Err(CommandError::bad_payload("no updatable fields supplied"));
        }

        if let Some(raw) = patch.get("username") {
            let Some(username) = raw.as_str().filter(|u| !u.is_empty()) else {
                return Err(CommandError::bad_payload("username must be a non-empty string"));
            };
            let lower = username.to_lowercase();
            if lower != user.username_lower {
                let taken = ctx
                    .hub
                    .store
                    .find(
                        collections::USERS,
                        &[Filter::eq("usernameLower", lower.clone())],
                        Combine::And,
                    )
                    .await?;
                if taken.iter().any(|d| d.get("id") != Some(&Value::String(user.id.clone()))) {
                    return Err(CommandError::denied("that username is already taken"));
                }
            }
            patch.insert("usernameLower".into(), Value::String(lower));
        }

        // Merge in memory and prove the result still decodes before anything
        // is written. A wrong-typed field persisted here would poison every
        // later snapshot refresh for this subject.
        let mut merged = ctx
            .hub
            .store
            .get(collections::USERS, &user.id)
            .await?
            .ok_or_else(|| CommandError::Fatal("user record vanished".into()))?;
        merge_fields(&mut merged, Value::Object(patch.clone()));
        let updated = User::from_doc(&merged)
            .map_err(|e| CommandError::bad_payload(format!("invalid profile field: {e}")))?;

        ctx.hub
            .store
            .set(collections::USERS, &user.id, Value::Object(patch), true)
            .await?;

        // Flag changes move the user in or out of the availability index.
        ctx.hub.mentors.apply(&updated);

        info!(user_id = %user.id, "Profile updated");
        Ok(Value::Bool(true))
    }
}
