/// File path → route pattern parsing
///
/// Pure functions that turn a route file location (relative to the routes
/// directory, extension already stripped) into a [`Pattern`].

use serde::{Deserialize, Serialize};

use super::pattern::{Pattern, Segment, ANONYMOUS_WILDCARD};
use crate::error::Result;
use crate::path::segments;

/// How route file names spell dynamic segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSyntax {
    /// `[id]` for a parameter, `[...rest]` for a catch-all
    #[default]
    Brackets,
    /// `:id` for a parameter, `*rest` for a catch-all
    Colon,
}

/// Classification of one file or directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSegment {
    /// Contributes a segment to the pattern
    Route(Segment),
    /// `(group)` folders organize files without changing the URL
    Group,
}

/// Classifies a single file or directory name (extension already stripped)
///
/// # Examples
///
/// ```
/// use verb_router::route::parser::{classify_segment, FileSegment, ParameterSyntax};
/// use verb_router::route::pattern::Segment;
///
/// let seg = classify_segment("[id]", ParameterSyntax::Brackets);
/// assert_eq!(seg, FileSegment::Route(Segment::Param("id".into())));
///
/// let seg = classify_segment("[...rest]", ParameterSyntax::Brackets);
/// assert_eq!(seg, FileSegment::Route(Segment::CatchAll("rest".into())));
///
/// let seg = classify_segment(":id", ParameterSyntax::Colon);
/// assert_eq!(seg, FileSegment::Route(Segment::Param("id".into())));
///
/// assert_eq!(classify_segment("(admin)", ParameterSyntax::Brackets), FileSegment::Group);
/// ```
pub fn classify_segment(segment: &str, syntax: ParameterSyntax) -> FileSegment {
    if segment.len() > 1 && segment.starts_with('(') && segment.ends_with(')') {
        return FileSegment::Group;
    }

    let classified = match syntax {
        ParameterSyntax::Brackets => classify_bracketed(segment),
        ParameterSyntax::Colon => Segment::parse(segment),
    };
    FileSegment::Route(classified)
}

fn classify_bracketed(segment: &str) -> Segment {
    match segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => match inner.strip_prefix("...") {
            Some("") => Segment::CatchAll(ANONYMOUS_WILDCARD.to_string()),
            Some(name) => Segment::CatchAll(name.to_string()),
            None => Segment::Param(inner.to_string()),
        },
        None => Segment::Static(segment.to_string()),
    }
}

/// Parses a relative route file location into a pattern
///
/// The last component is the file stem; when it equals `index_file_name` it
/// maps to its parent directory's path.
///
/// # Examples
///
/// ```
/// use verb_router::route::parser::{parse_file_path, ParameterSyntax};
///
/// let pattern = parse_file_path("users/[id]/index", "index", ParameterSyntax::Brackets).unwrap();
/// assert_eq!(pattern.as_str(), "/users/:id");
///
/// let pattern = parse_file_path("files/[...rest]", "index", ParameterSyntax::Brackets).unwrap();
/// assert_eq!(pattern.as_str(), "/files/*rest");
///
/// let pattern = parse_file_path("index", "index", ParameterSyntax::Brackets).unwrap();
/// assert_eq!(pattern.as_str(), "/");
/// ```
///
/// Fails with a conflict error when the derived pattern is malformed, e.g. a
/// catch-all directory with files below it.
pub fn parse_file_path(
    relative: &str,
    index_file_name: &str,
    syntax: ParameterSyntax,
) -> Result<Pattern> {
    let names: Vec<&str> = segments(relative).collect();
    let last = names.len().saturating_sub(1);

    let route_segments = names
        .iter()
        .enumerate()
        .filter(|(idx, name)| !(*idx == last && **name == index_file_name))
        .filter_map(|(_, name)| match classify_segment(name, syntax) {
            FileSegment::Route(segment) => Some(segment),
            FileSegment::Group => None,
        })
        .collect();

    Pattern::new(route_segments)
}
