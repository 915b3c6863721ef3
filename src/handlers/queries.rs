//! Read-only lookups.

use super::assessments::id_from;
use super::{Context, Handler};
use crate::engine;
use crate::error::{CommandError, CommandResult};
use crate::model::collections;
use async_trait::async_trait;
use serde_json::Value;

pub struct GetUser;

#[async_trait]
impl Handler for GetUser {
    async fn handle(&self, ctx: &mut Context<'_>, payload: Value) -> CommandResult<Value> {
        ctx.current_user()?;
        let id = id_from(&payload, "userID")
            .ok_or_else(|| CommandError::bad_payload("userID is required"))?;
        ctx.hub
            .store
            .get(collections::USERS, &id)
            .await?
            .ok_or_else(|| CommandError::not_found("user not found"))
    }
}

pub struct GetRequestBetweenUsers;

#[async_trait]
impl Handler for GetRequestBetweenUsers {
    async fn handle(&self, ctx: &mut Context<'_>, payload: Value) -> CommandResult<Value> {
        ctx.current_user()?;
        let mentor_id = id_from(&payload, "mentorID")
            .ok_or_else(|| CommandError::bad_payload("mentorID is required"))?;
        let mentee_id = payload
            .get("menteeID")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CommandError::bad_payload("menteeID is required"))?;

        let hit = engine::find_request_between(ctx.hub, &mentor_id, mentee_id).await?;
        Ok(hit.unwrap_or(Value::Null))
    }
}
