use serde::Serialize;

use crate::constants::{COMPOUND_DOCUMENT_EXTENSION, EMPTY_BODY, NO_SUBJECT};
use crate::text::{Scrubber, flatten};

/// Container format of an uploaded message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// RFC 5322 message with MIME body parts (`.eml`)
    InternetMessage,
    /// Outlook compound-document message (`.msg`)
    CompoundDocument,
}

impl MessageFormat {
    /// Pick the format from an upload's file name. Anything that is not `.msg`
    /// is treated as an internet message.
    pub fn from_filename(name: Option<&str>) -> Self {
        match name {
            Some(name)
                if name
                    .to_ascii_lowercase()
                    .ends_with(COMPOUND_DOCUMENT_EXTENSION) =>
            {
                MessageFormat::CompoundDocument
            }
            _ => MessageFormat::InternetMessage,
        }
    }
}

/// One uploaded file
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub bytes: Vec<u8>,
    pub format: MessageFormat,
}

impl RawMessage {
    pub fn new(bytes: Vec<u8>, format: MessageFormat) -> Self {
        Self { bytes, format }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMessage {
    pub sender: Option<String>,
    pub subject: String,
    pub body: String,
}

impl ParsedMessage {
    /// Apply the placeholder rules for a missing subject and an empty body.
    pub fn new(sender: Option<String>, subject: Option<String>, body: String) -> Self {
        let subject = subject
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_SUBJECT.to_string());
        let body = if body.is_empty() {
            EMPTY_BODY.to_string()
        } else {
            body
        };

        Self {
            sender: sender.filter(|s| !s.is_empty()),
            subject,
            body,
        }
    }
}

/// Candidate bodies exposed by a message container
#[derive(Debug, Clone, Default)]
pub struct EmailBody {
    pub text: Option<String>,
    pub html: Option<String>,
}

impl EmailBody {
    /// Produce the cleaned body text.
    ///
    /// A plain part is used as-is whenever the container has one; otherwise
    /// the HTML part is flattened. Either way the result is scrubbed.
    pub fn clean(&self, scrubber: &Scrubber) -> String {
        match (&self.text, &self.html) {
            (Some(text), _) => scrubber.scrub(text),
            (None, Some(html)) => scrubber.scrub(&flatten(html)),
            (None, None) => String::new(),
        }
    }
}

/// Render a sender as `Name <address>`, or whichever half is present.
pub fn format_sender(name: Option<&str>, address: Option<&str>) -> Option<String> {
    let name = name.map(str::trim).filter(|s| !s.is_empty());
    let address = address.map(str::trim).filter(|s| !s.is_empty());

    match (name, address) {
        (Some(name), Some(address)) if name != address => Some(format!("{name} <{address}>")),
        (_, Some(address)) => Some(address.to_string()),
        (Some(name), None) => Some(name.to_string()),
        (None, None) => None,
    }
}
