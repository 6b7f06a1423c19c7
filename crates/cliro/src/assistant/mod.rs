//! Text assistant: action parsing, prompt construction and the hosted generator client.

pub mod action;
pub mod client;
pub mod prompt;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use action::{Action, TargetLanguage, Tone};
pub use client::{GeminiClient, GenerationClient, GenerationError, UnconfiguredClient};
pub use prompt::build_prompt;
pub use router::assistant_router;
pub use service::{
    AssistantError, AssistantRequest, AssistantService, TracingUsageLog, UsageEvent, UsageLog,
};
