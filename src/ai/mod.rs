//! Summarization of cleaned message text
//!
//! The gateway truncates input and builds the prompt; the chat client talks to
//! an OpenAI-compatible chat completions endpoint.

mod client;
mod gateway;
mod prompts;

pub use client::ChatClient;
pub use gateway::{CompletionBackend, SummaryGateway};
pub use prompts::DEFAULT_SUMMARY_PROMPT;

#[cfg(test)]
pub(crate) use gateway::tests::StubBackend;
