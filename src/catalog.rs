//! Assessment question catalog.
//!
//! The catalog is static per process: configured questions if any, otherwise
//! the built-in set. Served by `getAvailableAssessmentQuestions` and included
//! in the `initialData` push.

use crate::model::AssessmentQuestion;
use serde_json::Value;

const DEFAULT_QUESTIONS: &[(&str, &str)] = &[
    ("goals", "What do you want to get out of a mentorship?"),
    ("strengths", "What are your three strongest skills?"),
    ("growth", "Which skill do you most want to improve this year?"),
    ("style", "How do you prefer to receive feedback?"),
    ("availability", "How much time per week can you commit?"),
];

/// Ordered, immutable question catalog.
pub struct QuestionCatalog {
    questions: Vec<AssessmentQuestion>,
}

impl QuestionCatalog {
    /// Build from configured questions, falling back to the built-in set.
    pub fn new(configured: Vec<AssessmentQuestion>) -> Self {
        let questions = if configured.is_empty() {
            DEFAULT_QUESTIONS
                .iter()
                .map(|(id, text)| AssessmentQuestion {
                    id: (*id).to_string(),
                    text: (*text).to_string(),
                })
                .collect()
        } else {
            configured
        };
        Self { questions }
    }

    pub fn questions(&self) -> &[AssessmentQuestion] {
        &self.questions
    }

    /// The catalog as a wire value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.questions).unwrap_or(Value::Array(Vec::new()))
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
