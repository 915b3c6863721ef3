//! Network layer: listener, WebSocket upgrade and per-connection loops.

mod connection;
mod gateway;

pub use gateway::Gateway;

use std::sync::Arc;

/// Extracts the caller's verified subject from the bearer token presented
/// during the WebSocket upgrade. Token issuance and signature verification
/// live outside this process; implementations only map an already-verified
/// token to a subject.
pub trait SubjectResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Option<String>;
}

/// Development and test resolver: the token is taken as the subject itself.
pub struct TokenIsSubject;

impl SubjectResolver for TokenIsSubject {
    fn resolve(&self, token: &str) -> Option<String> {
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

/// Shared resolver handle used by the gateway.
pub type Resolver = Arc<dyn SubjectResolver>;
