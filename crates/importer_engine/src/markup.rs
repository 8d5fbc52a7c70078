//! Parse-then-query access to HTML pages.
//!
//! Queries are CSS selector expressions evaluated with `scraper`. A query
//! yields element nodes; the `*_text` and `*_attr` helpers reduce the first
//! match to a string, returning an empty string when nothing matches.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("failed to decode bytes with {encoding}")]
    Decode { encoding: String },
    #[error("invalid query {expression:?}: {message}")]
    Query { expression: String, message: String },
}

/// A parsed HTML document.
pub struct MarkupDocument {
    html: Html,
    encoding_label: String,
}

impl MarkupDocument {
    /// Decode raw bytes (BOM, then Content-Type charset, then detection) and parse.
    pub fn parse(bytes: &[u8], content_type: Option<&str>) -> Result<Self, MarkupError> {
        let encoding = detect_encoding(bytes, content_type);
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(MarkupError::Decode {
                encoding: encoding.name().to_string(),
            });
        }
        Ok(Self {
            html: Html::parse_document(&text),
            encoding_label: encoding.name().to_string(),
        })
    }

    pub fn parse_str(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            encoding_label: "UTF-8".to_string(),
        }
    }

    pub fn encoding_label(&self) -> &str {
        &self.encoding_label
    }

    pub fn query(&self, expression: &str) -> Result<Vec<MarkupNode<'_>>, MarkupError> {
        let selector = compile(expression)?;
        Ok(self.html.select(&selector).map(MarkupNode).collect())
    }

    /// Trimmed text content of every match.
    pub fn query_text(&self, expression: &str) -> Result<Vec<String>, MarkupError> {
        Ok(self.query(expression)?.iter().map(MarkupNode::text).collect())
    }
}

/// An element inside a [`MarkupDocument`].
#[derive(Clone, Copy)]
pub struct MarkupNode<'a>(ElementRef<'a>);

impl<'a> MarkupNode<'a> {
    pub fn query(&self, expression: &str) -> Result<Vec<MarkupNode<'a>>, MarkupError> {
        let selector = compile(expression)?;
        Ok(self.0.select(&selector).map(MarkupNode).collect())
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    pub fn text(&self) -> String {
        self.0.text().collect::<String>().trim().to_string()
    }

    pub fn first_text(&self, expression: &str) -> Result<String, MarkupError> {
        Ok(self
            .query(expression)?
            .first()
            .map(MarkupNode::text)
            .unwrap_or_default())
    }

    pub fn first_attr(&self, expression: &str, name: &str) -> Result<String, MarkupError> {
        Ok(self
            .query(expression)?
            .first()
            .and_then(|node| node.attr(name))
            .map(|value| value.trim().to_string())
            .unwrap_or_default())
    }
}

fn compile(expression: &str) -> Result<Selector, MarkupError> {
    Selector::parse(expression).map_err(|err| MarkupError::Query {
        expression: expression.to_string(),
        message: err.to_string(),
    })
}

fn detect_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if let Some(encoding) = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim_matches(&[' ', '"', '\''][..]).to_string())
    })
}
