//! Process-wide shared state.

mod hub;
mod mentors;
mod registry;

pub use hub::Hub;
pub use mentors::MentorIndex;
pub use registry::{ConnectionRegistry, SessionHandle};
