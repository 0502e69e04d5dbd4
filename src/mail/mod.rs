//! Message extraction from uploaded email files
//!
//! Two container formats are supported, each behind [`MessageExtractor`]:
//! - RFC 5322 / MIME messages (`.eml`) via mail-parser
//! - Outlook compound-document messages (`.msg`) via cfb

pub mod msg;
pub mod parser;
pub mod types;

pub use msg::CompoundDocumentExtractor;
pub use parser::InternetMessageExtractor;
pub use types::{MessageFormat, ParsedMessage, RawMessage};

use crate::error::ParseError;
use crate::text::Scrubber;

/// Turns the bytes of one container format into a [`ParsedMessage`].
pub trait MessageExtractor {
    fn extract(&self, raw: &[u8]) -> Result<ParsedMessage, ParseError>;
}

/// Extract sender, subject and cleaned body using the parser for `raw.format`.
pub fn extract(raw: &RawMessage, scrubber: &Scrubber) -> Result<ParsedMessage, ParseError> {
    let extractor: Box<dyn MessageExtractor> = match raw.format {
        MessageFormat::InternetMessage => {
            Box::new(InternetMessageExtractor::new(scrubber.clone()))
        }
        MessageFormat::CompoundDocument => {
            Box::new(CompoundDocumentExtractor::new(scrubber.clone()))
        }
    };

    extractor.extract(&raw.bytes)
}
