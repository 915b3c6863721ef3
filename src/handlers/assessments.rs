//! Assessment commands: owner-scoped lifecycle plus reads.

use super::{Context, Handler};
use crate::error::{CommandError, CommandResult};
use crate::model::{AnsweredQuestion, Assessment, collections};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum AssessmentAction {
    Create,
    Edit,
    Delete,
    Publish,
    Unpublish,
}

#[derive(Deserialize)]
struct SubmitPayload {
    action: AssessmentAction,
    #[serde(default)]
    questions: Option<Vec<AnsweredQuestion>>,
    #[serde(default)]
    id: Option<String>,
}

pub struct SubmitAssessment;

impl SubmitAssessment {
    /// Fetch an assessment and verify the caller owns it.
    async fn owned(
        ctx: &Context<'_>,
        id: &str,
        owner_id: &str,
    ) -> CommandResult<Assessment> {
        let doc = ctx
            .hub
            .store
            .get(collections::ASSESSMENTS, id)
            .await?
            .ok_or_else(|| CommandError::not_found("assessment not found"))?;
        let assessment = Assessment::from_doc(&doc)
            .map_err(|e| CommandError::bad_payload(format!("unreadable assessment: {e}")))?;
        if assessment.user_id != owner_id {
            return Err(CommandError::denied("only the owner can modify an assessment"));
        }
        Ok(assessment)
    }
}

#[async_trait]
impl Handler for SubmitAssessment {
    async fn handle(&self, ctx: &mut Context<'_>, payload: Value) -> CommandResult<Value> {
        let user = ctx.current_user()?.clone();
        let p: SubmitPayload = serde_json::from_value(payload)
            .map_err(|e| CommandError::bad_payload(format!("invalid submitAssessment payload: {e}")))?;

        match p.action {
            AssessmentAction::Create => {
                let questions = p
                    .questions
                    .ok_or_else(|| CommandError::bad_payload("questions are required"))?;
                let assessment = Assessment::new(&user.id, questions);
                let id = ctx
                    .hub
                    .store
                    .create(collections::ASSESSMENTS, assessment.to_doc())
                    .await?;

                let mut owned = user.assessments.clone();
                owned.push(id.clone());
                ctx.hub
                    .store
                    .set(
                        collections::USERS,
                        &user.id,
                        json!({ "assessments": owned }),
                        true,
                    )
                    .await?;

                info!(user_id = %user.id, assessment_id = %id, "Assessment created");
                Ok(Value::String(id))
            }
            AssessmentAction::Edit => {
                let id = p.id.ok_or_else(|| CommandError::bad_payload("id is required"))?;
                let questions = p
                    .questions
                    .ok_or_else(|| CommandError::bad_payload("questions are required"))?;
                Self::owned(ctx, &id, &user.id).await?;
                ctx.hub
                    .store
                    .set(
                        collections::ASSESSMENTS,
                        &id,
                        json!({ "questions": questions }),
                        true,
                    )
                    .await?;
                Ok(Value::Bool(true))
            }
            AssessmentAction::Delete => {
                let id = p.id.ok_or_else(|| CommandError::bad_payload("id is required"))?;
                Self::owned(ctx, &id, &user.id).await?;
                ctx.hub.store.delete(collections::ASSESSMENTS, &id).await?;

                let owned: Vec<String> = user
                    .assessments
                    .iter()
                    .filter(|a| *a != &id)
                    .cloned()
                    .collect();
                ctx.hub
                    .store
                    .set(
                        collections::USERS,
                        &user.id,
                        json!({ "assessments": owned }),
                        true,
                    )
                    .await?;

                info!(user_id = %user.id, assessment_id = %id, "Assessment deleted");
                Ok(Value::Bool(true))
            }
            AssessmentAction::Publish | AssessmentAction::Unpublish => {
                let id = p.id.ok_or_else(|| CommandError::bad_payload("id is required"))?;
                Self::owned(ctx, &id, &user.id).await?;
                let published = matches!(p.action, AssessmentAction::Publish);
                ctx.hub
                    .store
                    .set(
                        collections::ASSESSMENTS,
                        &id,
                        json!({ "published": published }),
                        true,
                    )
                    .await?;
                Ok(Value::Bool(true))
            }
        }
    }
}

/// Extract an entity id from a payload that is either a bare string or an
/// object carrying the id under `key`.
pub(super) fn id_from(payload: &Value, key: &str) -> Option<String> {
    payload
        .as_str()
        .or_else(|| payload.get(key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub struct GetAssessment;

#[async_trait]
impl Handler for GetAssessment {
    async fn handle(&self, ctx: &mut Context<'_>, payload: Value) -> CommandResult<Value> {
        ctx.current_user()?;
        let id = id_from(&payload, "assessmentID")
            .ok_or_else(|| CommandError::bad_payload("assessmentID is required"))?;
        ctx.hub
            .store
            .get(collections::ASSESSMENTS, &id)
            .await?
            .ok_or_else(|| CommandError::not_found("assessment not found"))
    }
}

pub struct GetQuestions;

#[async_trait]
impl Handler for GetQuestions {
    async fn handle(&self, ctx: &mut Context<'_>, _payload: Value) -> CommandResult<Value> {
        ctx.current_user()?;
        Ok(ctx.hub.catalog.to_value())
    }
}
