//! Prompt headers for summarization

/// Used by the command line when no prompt header is given
pub const DEFAULT_SUMMARY_PROMPT: &str = r#"You are an email summarization assistant. Summarize the email below in 2-3 sentences, capturing the key points and any action items. Be direct and factual. Do not include greetings or sign-offs."#;
