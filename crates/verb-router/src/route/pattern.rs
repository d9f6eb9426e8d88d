/// Registration pattern parsing
///
/// Turns a pattern such as `/users/:id/files/*rest` into typed segments.
/// A leading `:` marks a named parameter, a leading `*` marks a wildcard
/// (`*` alone binds the name `*`). Everything else is literal text.

use crate::error::{Result, RouterError};
use crate::path::{normalize_path, segments};

/// Name bound by a bare `*` wildcard.
pub const ANONYMOUS_WILDCARD: &str = "*";

/// One parsed pattern segment.
///
/// # Examples
///
/// ```
/// use verb_router::route::pattern::Segment;
///
/// assert_eq!(Segment::parse("users"), Segment::Static("users".into()));
/// assert_eq!(Segment::parse(":id"), Segment::Param("id".into()));
/// assert_eq!(Segment::parse("*rest"), Segment::CatchAll("rest".into()));
/// assert_eq!(Segment::parse("*"), Segment::CatchAll("*".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal text, matched exactly
    Static(String),
    /// `:name`, matches exactly one segment
    Param(String),
    /// `*name`, matches the remainder of the path
    CatchAll(String),
}

impl Segment {
    pub fn parse(segment: &str) -> Self {
        if let Some(name) = segment.strip_prefix(':') {
            Segment::Param(name.to_string())
        } else if let Some(name) = segment.strip_prefix('*') {
            if name.is_empty() {
                Segment::CatchAll(ANONYMOUS_WILDCARD.to_string())
            } else {
                Segment::CatchAll(name.to_string())
            }
        } else {
            Segment::Static(segment.to_string())
        }
    }

    /// Parameter name bound by this segment, if any.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param(name) | Segment::CatchAll(name) => Some(name),
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Static(text) => write!(f, "{}", text),
            Segment::Param(name) => write!(f, ":{}", name),
            Segment::CatchAll(name) if name == ANONYMOUS_WILDCARD => write!(f, "*"),
            Segment::CatchAll(name) => write!(f, "*{}", name),
        }
    }
}

/// A validated route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses and validates a pattern.
    ///
    /// Fails with [`RouterError::Conflict`] when a wildcard is not the final
    /// segment or a parameter has no name.
    ///
    /// ```
    /// use verb_router::route::pattern::Pattern;
    ///
    /// let pattern = Pattern::parse("/files/*rest/").unwrap();
    /// assert_eq!(pattern.as_str(), "/files/*rest");
    /// assert_eq!(pattern.param_names(), vec!["rest".to_string()]);
    ///
    /// assert!(Pattern::parse("/files/*rest/meta").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self> {
        let normalized = normalize_path(pattern);
        Self::new(segments(&normalized).map(Segment::parse).collect())
    }

    /// Validates already classified segments and assembles the pattern.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        let raw = render(&segments);

        for (idx, segment) in segments.iter().enumerate() {
            match segment {
                Segment::CatchAll(_) if idx + 1 != segments.len() => {
                    return Err(RouterError::conflict(&raw, "wildcard must be the last segment"));
                }
                Segment::Param(name) | Segment::CatchAll(name) if name.is_empty() => {
                    return Err(RouterError::conflict(&raw, "parameter without a name"));
                }
                _ => {}
            }
        }

        Ok(Self { raw, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in the order they appear in the pattern.
    pub fn param_names(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|s| s.param_name().map(str::to_string))
            .collect()
    }

    pub fn has_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }
}

fn render(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments.iter().map(|s| format!("/{}", s)).collect()
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
