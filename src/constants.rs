//! Application-wide constants and defaults
//!
//! Centralizes magic values so configuration defaults and tests agree on them.

/// Subject used when a message has no (or an empty) subject.
pub const NO_SUBJECT: &str = "(no subject)";

/// Body used when cleaning leaves nothing behind.
pub const EMPTY_BODY: &str = "(empty)";

/// File extension that selects the Outlook compound-document parser.
pub const COMPOUND_DOCUMENT_EXTENSION: &str = ".msg";

/// Environment variable holding the summarization API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "MAILBRIEF_CONFIG";

/// Environment variable naming a log file (stderr is used otherwise).
pub const LOG_FILE_ENV: &str = "MAILBRIEF_LOG_FILE";

// === Summarization ===

/// Characters of message text forwarded to the summarization service.
/// Truncation is by character, with no word-boundary awareness.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 6000;

pub const DEFAULT_AI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

/// Low sampling temperature keeps summaries close to deterministic.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

pub const DEFAULT_SUMMARY_MAX_TOKENS: u32 = 120;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// === Server ===

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

pub const DEFAULT_STATIC_DIR: &str = "static";

/// Largest accepted upload (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// === Scrubbing ===

/// Substrings that must all appear on the first line for it to count as a banner header.
pub const DEFAULT_BANNER_KEYWORDS: &[&str] = &["cyber", "safety"];

/// Substrings marking the start of a footer; matching is case-insensitive.
pub const DEFAULT_FOOTER_MARKERS: &[&str] = &[
    "unsubscribe",
    "©",
    "privacy",
    "report spam",
    "provide feedback",
];
