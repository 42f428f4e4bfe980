//! Anthropic Messages API client for narrative summaries.
//!
//! Only the non-streaming, text-only subset of the API is used: one user
//! message in, the concatenated text blocks out.

mod client;
mod error;
pub mod types;

pub use client::ClaudeClient;
pub use error::ClaudeError;
