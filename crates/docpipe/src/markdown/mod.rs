//! Markdown header structure analysis.
//!
//! Headers are extracted with pulldown-cmark, so `#` lines inside fenced code
//! blocks are not mistaken for section titles.

pub mod headers;
pub mod sections;

pub use headers::{extract_headers, Header};
pub use sections::{extract_section, find_subsection_titles, section_range};
