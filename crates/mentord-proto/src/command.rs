//! Command name constants.
//!
//! Handlers register under these names; keeping them in the protocol crate
//! lets clients avoid stringly-typed drift.

/// Inbound command names, grouped by the session phase that accepts them.
pub mod commands {
    /// Sole command accepted while authenticated without a user record.
    pub const CREATE_USER: &str = "createUser";

    // Full authenticated command set.
    pub const UPDATE_PROFILE: &str = "updateProfile";
    pub const GET_ALL_MENTORS: &str = "getAllMentors";
    pub const SUBMIT_ASSESSMENT: &str = "submitAssessment";
    pub const MENTORSHIP_REQUEST: &str = "mentorshipRequest";
    pub const GET_USER: &str = "getUser";
    pub const GET_ASSESSMENT: &str = "getAssessment";
    pub const GET_AVAILABLE_ASSESSMENT_QUESTIONS: &str = "getAvailableAssessmentQuestions";
    pub const GET_MENTORSHIP_REQUEST_BETWEEN_USERS: &str = "getMentorshipRequestBetweenUsers";

    /// Commands installed for the `authed_user` phase.
    pub const AUTHED_USER_SET: &[&str] = &[
        UPDATE_PROFILE,
        GET_ALL_MENTORS,
        SUBMIT_ASSESSMENT,
        MENTORSHIP_REQUEST,
        GET_USER,
        GET_ASSESSMENT,
        GET_AVAILABLE_ASSESSMENT_QUESTIONS,
        GET_MENTORSHIP_REQUEST_BETWEEN_USERS,
    ];
}
