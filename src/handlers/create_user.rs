//! Account creation, the sole `authed_nouser` command.

use super::{Context, Handler};
use crate::error::{CommandError, CommandResult};
use crate::model::{User, collections};
use crate::session::enter_authed_user;
use crate::store::{Combine, Filter};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserPayload {
    f_name: String,
    #[serde(default)]
    m_name: Option<String>,
    l_name: String,
    username: String,
}

fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
}

pub struct CreateUser;

#[async_trait]
impl Handler for CreateUser {
    async fn handle(&self, ctx: &mut Context<'_>, payload: Value) -> CommandResult<Value> {
        let p: CreateUserPayload = serde_json::from_value(payload)
            .map_err(|e| CommandError::bad_payload(format!("invalid createUser payload: {e}")))?;

        if p.f_name.trim().is_empty() || p.l_name.trim().is_empty() {
            return Err(CommandError::bad_payload("first and last name are required"));
        }
        let username = p.username.to_lowercase();
        if !valid_username(&username) {
            return Err(CommandError::bad_payload(
                "username may only contain a-z, 0-9, '_', '.' and '-'",
            ));
        }

        let taken = ctx
            .hub
            .store
            .find(
                collections::USERS,
                &[Filter::eq("usernameLower", username.clone())],
                Combine::And,
            )
            .await?;
        if !taken.is_empty() {
            return Err(CommandError::denied("that username is already taken"));
        }

        let mut user = User::new(
            &ctx.session.subject,
            p.f_name.trim(),
            p.m_name.as_deref(),
            p.l_name.trim(),
            &p.username,
        );
        user.id = ctx
            .hub
            .store
            .create(collections::USERS, user.to_doc())
            .await?;
        info!(user_id = %user.id, username = %user.username_lower, "User created");

        enter_authed_user(ctx.hub, ctx.session, &user).await;
        Ok(Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_charset() {
        assert!(valid_username("ada.lovelace-1_x"));
        assert!(!valid_username(""));
        assert!(!valid_username("Ada"));
        assert!(!valid_username("ada lovelace"));
        assert!(!valid_username("ada@host"));
    }
}
