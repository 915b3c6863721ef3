//! mentord - real-time mentorship matching server.
//!
//! Users connect over authenticated WebSockets, create profiles, submit
//! self-assessments and establish mentor/mentee relationships through a
//! request/accept/decline workflow. Relationship records are stored
//! redundantly and reconciled on read.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod model;
pub mod network;
pub mod session;
pub mod state;
pub mod store;
