use mail_parser::{MessageParser, PartType};

use super::MessageExtractor;
use super::types::{EmailBody, ParsedMessage, format_sender};
use crate::error::ParseError;
use crate::text::Scrubber;

/// Extractor for RFC 5322 / MIME messages (`.eml`)
#[derive(Debug, Clone, Default)]
pub struct InternetMessageExtractor {
    scrubber: Scrubber,
}

impl InternetMessageExtractor {
    pub fn new(scrubber: Scrubber) -> Self {
        Self { scrubber }
    }
}

impl MessageExtractor for InternetMessageExtractor {
    fn extract(&self, raw: &[u8]) -> Result<ParsedMessage, ParseError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::InternetMessage("message is empty".to_string()));
        }

        let message = MessageParser::default().parse(raw).ok_or_else(|| {
            ParseError::InternetMessage("unrecognized message structure".to_string())
        })?;

        let sender = message.from().map(|from| {
            from.iter()
                .filter_map(|addr| format_sender(addr.name(), addr.address()))
                .collect::<Vec<_>>()
                .join(", ")
        });

        let subject = message.subject().map(|s| s.to_string());

        let body = parse_body(&message).clean(&self.scrubber);

        tracing::debug!(
            has_sender = sender.is_some(),
            body_len = body.len(),
            "Extracted internet message"
        );

        Ok(ParsedMessage::new(sender, subject, body))
    }
}

pub fn parse_body(message: &mail_parser::Message) -> EmailBody {
    EmailBody {
        text: extract_text_body(message),
        html: extract_html_body(message),
    }
}

fn extract_text_body(message: &mail_parser::Message) -> Option<String> {
    // text_bodies() also lists HTML parts for HTML-only messages
    for part in message.text_bodies() {
        if let PartType::Text(text) = &part.body {
            return Some(text.to_string());
        }
    }

    None
}

fn extract_html_body(message: &mail_parser::Message) -> Option<String> {
    for part in message.html_bodies() {
        if let PartType::Html(html) = &part.body {
            return Some(html.to_string());
        }
    }

    None
}
