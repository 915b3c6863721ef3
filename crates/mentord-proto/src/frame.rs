//! Frame envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from decoding a client frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid frame: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("empty command name")]
    EmptyCommand,
}

/// A command frame sent by a client.
///
/// `seq` is the completion-callback token. When present, the server sends
/// exactly one [`ServerFrame::Ack`] carrying the same value once the command
/// finishes; when absent the command has no callback and is refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(default)]
    pub payload: Value,
}

/// Parse a client frame from raw text, rejecting empty command names.
pub fn parse_client_frame(text: &str) -> Result<ClientFrame, FrameError> {
    let frame: ClientFrame = serde_json::from_str(text)?;
    if frame.cmd.is_empty() {
        return Err(FrameError::EmptyCommand);
    }
    Ok(frame)
}

/// Terminal status attached to a mentorship-request lifecycle broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Request was just created.
    Sent,
    /// Mentor accepted; the relationship now exists.
    Accepted,
    /// Mentor declined.
    Declined,
    /// Mentee withdrew the request.
    Cancelled,
}

/// Payload of a `data` push.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DataPayload {
    /// One-shot snapshot sent on entering `authed_user`.
    #[serde(rename_all = "camelCase")]
    InitialData { user: Value, questions: Value },

    /// A mentorship-request lifecycle event for one of the parties.
    #[serde(rename_all = "camelCase")]
    MentorshipRequest { request: Value, status: RequestStatus },
}

/// A frame sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Completion callback for a client frame that carried `seq`.
    Ack { seq: u64, result: Value },

    /// Session state name push, emitted on every transition.
    State { state: String },

    /// Out-of-band banner (errors and notices).
    Message { title: String, body: String },

    /// Data push (initial snapshot or request lifecycle event).
    Data { data: DataPayload },
}

impl ServerFrame {
    /// Ack with a bare success/failure flag.
    pub fn ack_bool(seq: u64, ok: bool) -> Self {
        Self::Ack {
            seq,
            result: Value::Bool(ok),
        }
    }

    /// Out-of-band error banner.
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Message {
            title: title.into(),
            body: body.into(),
        }
    }
}
