use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::Serialize;

/// A heading found in a markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub text: String,
    /// Heading depth, `#` = 1.
    pub level: usize,
    /// Zero-based line of the heading in the source document.
    pub line: usize,
    /// Last line the heading occupies; the underline for setext headings.
    pub end_line: usize,
}

/// Extract every heading of `source` in document order.
pub fn extract_headers(source: &str) -> Vec<Header> {
    let mut headers = Vec::new();
    let mut current: Option<Header> = None;

    for (event, range) in Parser::new(source).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Header {
                    text: String::new(),
                    level: level as usize,
                    line: line_of_offset(source, range.start),
                    end_line: line_of_offset(source, range.end.saturating_sub(1).max(range.start)),
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(ref mut header) = current {
                    header.text.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(ref mut header) = current {
                    header.text.push(' ');
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut header) = current.take() {
                    header.text = header.text.trim().to_string();
                    headers.push(header);
                }
            }
            _ => {}
        }
    }

    headers
}

fn line_of_offset(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
}
