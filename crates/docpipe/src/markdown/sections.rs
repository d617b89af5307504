use std::ops::Range;

use crate::error::AnalyzeError;

use super::headers::{extract_headers, Header};

/// Titles of the sections nested directly beneath the first section titled
/// `parent_title`, in document order.
///
/// The scan stops at the first header at or above the parent's level, so a
/// later section with the same title never contributes children. Headers more
/// than one level deeper than the parent are skipped.
pub fn find_subsection_titles(
    headers: &[Header],
    parent_title: &str,
) -> Result<Vec<String>, AnalyzeError> {
    let (index, parent) = find_header(headers, parent_title)?;
    let start_level = parent.level;

    let mut titles = Vec::new();
    for header in &headers[index + 1..] {
        if header.level <= start_level {
            break;
        }
        if header.level == start_level + 1 {
            titles.push(header.text.clone());
        }
    }

    Ok(titles)
}

/// Half-open line range `[heading, next heading at same or shallower level)`
/// of the first section titled `title`. Runs to `total_lines` when the section
/// is the last one at its level.
pub fn section_range(
    headers: &[Header],
    title: &str,
    total_lines: usize,
) -> Result<Range<usize>, AnalyzeError> {
    let (index, start) = find_header(headers, title)?;

    let end = headers[index + 1..]
        .iter()
        .find(|h| h.level <= start.level)
        .map(|h| h.line)
        .unwrap_or(total_lines);

    Ok(start.line..end)
}

/// Copy the body of section `title` under a fresh heading of `new_level`.
///
/// The original heading lines are dropped, as are trailing blank lines. The
/// result always ends in a newline.
pub fn extract_section(source: &str, title: &str, new_level: usize) -> Result<String, AnalyzeError> {
    let headers = extract_headers(source);
    let lines: Vec<&str> = source.lines().collect();
    let range = section_range(&headers, title, lines.len())?;
    let (_, heading) = find_header(&headers, title)?;
    let body_start = heading.end_line + 1;

    let mut body: Vec<&str> = lines
        .get(body_start.min(range.end)..range.end)
        .unwrap_or_default()
        .to_vec();
    while body.last().is_some_and(|l| l.trim().is_empty()) {
        body.pop();
    }

    let mut section = format!("{} {}\n", "#".repeat(new_level), title);
    for line in body {
        section.push_str(line);
        section.push('\n');
    }

    Ok(section)
}

fn find_header<'a>(
    headers: &'a [Header],
    title: &str,
) -> Result<(usize, &'a Header), AnalyzeError> {
    headers
        .iter()
        .enumerate()
        .find(|(_, h)| h.text == title)
        .ok_or_else(|| AnalyzeError::SectionNotFound {
            title: title.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(text: &str, level: usize, line: usize) -> Header {
        Header {
            text: text.to_string(),
            level,
            line,
            end_line: line,
        }
    }

    #[test]
    fn test_direct_children_only() {
        let headers = vec![
            header("Report", 1, 0),
            header("User Journeys", 2, 2),
            header("Journey A", 3, 4),
            header("Step 1", 4, 6),
            header("Journey B", 3, 8),
            header("Data Layer", 2, 10),
            header("Tables", 3, 12),
        ];

        let titles = find_subsection_titles(&headers, "User Journeys").unwrap();
        assert_eq!(titles, vec!["Journey A", "Journey B"]);
    }

    #[test]
    fn test_second_occurrence_ignored() {
        let headers = vec![
            header("User Journeys", 2, 0),
            header("Login", 3, 1),
            header("Appendix", 2, 2),
            header("User Journeys", 2, 3),
            header("Logout", 3, 4),
        ];

        let titles = find_subsection_titles(&headers, "User Journeys").unwrap();
        assert_eq!(titles, vec!["Login"]);
    }

    #[test]
    fn test_deeper_parent_stops_at_shallower_header() {
        let headers = vec![
            header("Top", 1, 0),
            header("User Journeys", 3, 1),
            header("Only Child", 4, 2),
            header("Next Chapter", 1, 3),
            header("Unrelated", 4, 4),
        ];

        let titles = find_subsection_titles(&headers, "User Journeys").unwrap();
        assert_eq!(titles, vec!["Only Child"]);
    }

    #[test]
    fn test_no_children_is_empty() {
        let headers = vec![header("User Journeys", 2, 0), header("Other", 2, 3)];
        let titles = find_subsection_titles(&headers, "User Journeys").unwrap();
        assert!(titles.is_empty());
    }

    #[test]
    fn test_missing_parent_is_not_found() {
        let headers = vec![header("Something Else", 1, 0)];
        let result = find_subsection_titles(&headers, "User Journeys");

        match result {
            Err(AnalyzeError::SectionNotFound { title }) => assert_eq!(title, "User Journeys"),
            other => panic!("Expected SectionNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_title_match_is_exact() {
        let headers = vec![header("User Journeys Overview", 2, 0), header("A", 3, 1)];
        assert!(find_subsection_titles(&headers, "User Journeys").is_err());
    }

    #[test]
    fn test_section_range_runs_to_eof() {
        let headers = vec![header("A", 2, 0), header("B", 2, 5), header("B.1", 3, 7)];
        assert_eq!(section_range(&headers, "A", 20).unwrap(), 0..5);
        assert_eq!(section_range(&headers, "B", 20).unwrap(), 5..20);
    }

    #[test]
    fn test_extract_section_releveled() {
        let source = "# Data Layer\n\n## Key Data Entities\n\nUser\nAccount\n\n### Fields\n\nid\n\n## Data Flow\n\nflows\n";
        let section = extract_section(source, "Key Data Entities", 3).unwrap();

        assert_eq!(
            section,
            "### Key Data Entities\n\nUser\nAccount\n\n### Fields\n\nid\n"
        );
    }

    #[test]
    fn test_extract_last_section() {
        let source = "## Intro\n\nhello\n\n## Data Flow\n\nflows\n\n\n";
        let section = extract_section(source, "Data Flow", 2).unwrap();
        assert_eq!(section, "## Data Flow\n\nflows\n");
    }

    #[test]
    fn test_extract_setext_section() {
        let source = "Overview\n========\n\nbody text\n";
        let section = extract_section(source, "Overview", 2).unwrap();
        assert_eq!(section, "## Overview\n\nbody text\n");
    }

    #[test]
    fn test_extract_multiline_setext_section() {
        let section = extract_section("Data\nFlow\n====\n\nbody\n", "Data Flow", 2).unwrap();
        assert_eq!(section, "## Data Flow\n\nbody\n");
    }

    #[test]
    fn test_extract_setext_section_starting_with_hash() {
        let section = extract_section("#tag\n===\n\nbody\n", "#tag", 3).unwrap();
        assert_eq!(section, "### #tag\n\nbody\n");
    }

    #[test]
    fn test_extract_missing_section() {
        assert!(extract_section("# A\n", "B", 2).is_err());
    }
}
