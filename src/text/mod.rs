//! Text normalization for message bodies
//!
//! - HTML flattening to plain text
//! - Banner/footer scrubbing of newsletter chrome

mod flatten;
mod scrub;

pub use flatten::flatten;
pub use scrub::{ScrubRules, Scrubber};
