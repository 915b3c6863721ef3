//! Mentorship-request action dispatch into the relationship engine.

use super::{Context, Handler};
use crate::engine;
use crate::error::{CommandError, CommandResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum RequestAction {
    Send,
    Accept,
    Decline,
    Cancel,
    RemoveMentor,
    RemoveMentee,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestPayload {
    action: RequestAction,
    #[serde(default, rename = "mentorID")]
    mentor_id: Option<String>,
    #[serde(default, rename = "menteeID")]
    mentee_id: Option<String>,
    #[serde(default, rename = "mentorshipRequestID")]
    request_id: Option<String>,
}

fn required(field: Option<String>, name: &str) -> CommandResult<String> {
    field
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CommandError::bad_payload(format!("{name} is required")))
}

pub struct MentorshipRequestCmd;

#[async_trait]
impl Handler for MentorshipRequestCmd {
    async fn handle(&self, ctx: &mut Context<'_>, payload: Value) -> CommandResult<Value> {
        let caller = ctx.current_user()?.clone();
        let p: RequestPayload = serde_json::from_value(payload).map_err(|e| {
            CommandError::bad_payload(format!("invalid mentorshipRequest payload: {e}"))
        })?;

        match p.action {
            RequestAction::Send => {
                let mentor_id = required(p.mentor_id, "mentorID")?;
                engine::send_request(ctx.hub, &caller, &mentor_id).await?;
            }
            RequestAction::Accept => {
                let id = required(p.request_id, "mentorshipRequestID")?;
                engine::accept_request(ctx.hub, &caller, &id).await?;
            }
            RequestAction::Decline => {
                let id = required(p.request_id, "mentorshipRequestID")?;
                engine::decline_request(ctx.hub, &caller, &id).await?;
            }
            RequestAction::Cancel => {
                let id = required(p.request_id, "mentorshipRequestID")?;
                engine::cancel_request(ctx.hub, &caller, &id).await?;
            }
            RequestAction::RemoveMentor => {
                engine::remove_mentor(ctx.hub, &caller).await?;
            }
            RequestAction::RemoveMentee => {
                let mentee_id = required(p.mentee_id, "menteeID")?;
                engine::remove_mentee(ctx.hub, &caller, &mentee_id).await?;
            }
        }
        Ok(Value::Bool(true))
    }
}
