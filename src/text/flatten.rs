//! HTML to plain-text flattening.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node};

/// Elements whose entire subtree is dropped from the output.
const SKIPPED_ELEMENTS: &[&str] = &["style", "script", "head", "meta", "noscript"];

static BLANK_LINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n\s*\n+").expect("blank line pattern is valid"));

static HORIZONTAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("horizontal whitespace pattern is valid"));

/// Convert an HTML fragment or document into normalized plain text.
///
/// Non-content elements are removed with their contents, `<br>` becomes a
/// newline and every `<p>` is wrapped in newlines. Entities are decoded by the
/// HTML tokenizer. Malformed markup is parsed best-effort and never fails.
pub fn flatten(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() / 2);
    collect_text(document.root_element(), &mut out);
    normalize_whitespace(&out)
}

/// Collapse blank-line runs to one blank line and space/tab runs to one space, then trim.
fn normalize_whitespace(text: &str) -> String {
    let text = BLANK_LINE_RUN.replace_all(text, "\n\n");
    let text = HORIZONTAL_RUN.replace_all(&text, " ");
    text.trim().to_string()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }

    match name {
        "br" => {
            out.push('\n');
            return;
        }
        "p" => out.push('\n'),
        _ => {}
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }

    if name == "p" {
        out.push('\n');
    }
}
