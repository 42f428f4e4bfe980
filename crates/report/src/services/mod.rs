//! Outbound collaborators of a report run.
//!
//! # Services
//!
//! - `email` - Report delivery via SMTP
//! - `narrative` - Claude-generated per-brand summaries

pub mod email;
pub mod narrative;

pub use email::{EmailError, EmailService, Mailer};
pub use narrative::{
    NARRATIVE_PLACEHOLDER, NarrativeError, NarrativeService, Narrator, summarize_or_placeholder,
};
