//! External completion-service boundary
//!
//! The routing decision itself lives inside an opaque completion service.
//! The harness talks to it through the [`SessionService`] trait: submit one
//! conversation turn into a delegation tree for a session, get back ordered
//! author-tagged output events. Production uses the Gemini HTTP client;
//! tests use the deterministic scripted stub in `crate::testing`.

pub mod gemini;
pub mod service;

pub use gemini::{GeminiConfig, GeminiService};
pub use service::{OutputEvent, ServiceError, SessionContext, SessionService};
