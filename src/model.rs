//! Persistent document types.
//!
//! Documents are stored as JSON with camelCase field names. Decoders are
//! tolerant where the data model recognizes divergence: relationship lists
//! default to empty on missing or wrong-typed values so a damaged record can
//! still be loaded and repaired, rather than failing the whole read.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Collection names used with the persistence gateway.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ASSESSMENTS: &str = "assessments";
    pub const MENTORSHIP_REQUESTS: &str = "mentorship_requests";
}

/// Deserialize a string list, falling back to empty on a wrong-typed value.
fn list_or_default<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(de)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

/// A social profile link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// A work-experience entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub start: String,
    pub end: Option<String>,
    pub description: Option<String>,
}

/// An education entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub start: String,
    pub end: Option<String>,
}

/// A showcased project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// An identity record with profile and relationship state.
///
/// `subject` is the external identity-provider subject and is immutable once
/// set. Relationship fields (`mentor_id`, `mentee_ids`,
/// `mentorship_requests`) are only mutated by the relationship engine, never
/// by profile updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub subject: String,

    pub f_name: String,
    pub m_name: Option<String>,
    pub l_name: String,
    pub username: String,
    pub username_lower: String,
    pub bio: Option<String>,
    pub socials: Vec<SocialLink>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub certifications: Vec<String>,
    pub projects: Vec<Project>,
    pub soft_skills: Vec<String>,

    pub is_mentor: bool,
    pub is_mentee: bool,
    pub accepting_mentees: bool,

    #[serde(rename = "mentorID")]
    pub mentor_id: Option<String>,
    #[serde(rename = "menteeIDs", deserialize_with = "list_or_default")]
    pub mentee_ids: Vec<String>,
    #[serde(deserialize_with = "list_or_default")]
    pub assessments: Vec<String>,
    #[serde(deserialize_with = "list_or_default")]
    pub mentorship_requests: Vec<String>,

    pub created_at: i64,
}

impl User {
    /// Build a fresh user for `subject` with empty relationship state.
    pub fn new(subject: &str, f_name: &str, m_name: Option<&str>, l_name: &str, username: &str) -> Self {
        Self {
            subject: subject.to_string(),
            f_name: f_name.to_string(),
            m_name: m_name.map(str::to_string),
            l_name: l_name.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            created_at: Utc::now().timestamp(),
            ..Self::default()
        }
    }

    /// Whether this user can currently receive mentorship requests.
    #[inline]
    pub fn is_accepting_mentor(&self) -> bool {
        self.is_mentor && self.accepting_mentees
    }

    pub fn from_doc(doc: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.clone())
    }

    pub fn to_doc(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// One answered question inside an assessment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
}

/// A self-evaluation record owned by a single user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assessment {
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub questions: Vec<AnsweredQuestion>,
    pub published: bool,
    pub created_at: i64,
}

impl Assessment {
    pub fn new(user_id: &str, questions: Vec<AnsweredQuestion>) -> Self {
        Self {
            user_id: user_id.to_string(),
            questions,
            published: false,
            created_at: Utc::now().timestamp(),
            ..Self::default()
        }
    }

    pub fn from_doc(doc: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.clone())
    }

    pub fn to_doc(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A question offered by the assessment catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentQuestion {
    pub id: String,
    pub text: String,
}

/// A pending mentorship proposal, stored standalone and back-referenced from
/// both parties' `mentorshipRequests` lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MentorshipRequest {
    pub id: String,
    #[serde(rename = "mentorID")]
    pub mentor_id: String,
    #[serde(rename = "menteeID")]
    pub mentee_id: String,
    pub created_at: i64,
}

impl MentorshipRequest {
    pub fn new(mentor_id: &str, mentee_id: &str) -> Self {
        Self {
            id: String::new(),
            mentor_id: mentor_id.to_string(),
            mentee_id: mentee_id.to_string(),
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn to_doc(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Decode a request document, returning `None` when either endpoint id
    /// is missing or not a string (the recognized corruption mode).
    pub fn from_doc_checked(doc: &Value) -> Option<Self> {
        let mentor = doc.get("mentorID")?.as_str()?;
        let mentee = doc.get("menteeID")?.as_str()?;
        if mentor.is_empty() || mentee.is_empty() {
            return None;
        }
        Some(Self {
            id: doc.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
            mentor_id: mentor.to_string(),
            mentee_id: mentee.to_string(),
            created_at: doc.get("createdAt").and_then(Value::as_i64).unwrap_or_default(),
        })
    }
}
