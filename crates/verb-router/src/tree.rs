//! Segment-keyed radix tree.
//!
//! Each level of the tree is one path segment. A node owns its literal
//! children (keyed by exact text), at most one parameter child and at most one
//! wildcard child. The tree is generic over the payload stored on terminal
//! nodes so the programmatic router and the filesystem router share the same
//! matching rules.
//!
//! Lookup prefers, at every level, the literal child, then the parameter
//! child, then the wildcard child, and backtracks to the next alternative when
//! a branch dead-ends without reaching a terminal. The most specific
//! registered route therefore wins regardless of registration order. The
//! first terminal reached is final; callers decide what it can serve.

use std::collections::HashMap;

use crate::path::{normalize_path, segments};
use crate::route::{Pattern, Segment};

/// One path segment level.
#[derive(Debug, Clone)]
pub struct RadixNode<T> {
    children: HashMap<String, RadixNode<T>>,
    param: Option<Box<RadixNode<T>>>,
    wildcard: Option<Box<RadixNode<T>>>,
    value: Option<T>,
}

impl<T> Default for RadixNode<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            param: None,
            wildcard: None,
            value: None,
        }
    }
}

/// A successful lookup: the terminal payload plus the captured values of the
/// parameter and wildcard segments, in pattern order.
#[derive(Debug)]
pub struct Found<'t, T> {
    pub value: &'t T,
    pub captures: Vec<String>,
}

impl<T> RadixNode<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks the tree along `pattern`, creating nodes as needed, and returns
    /// the terminal payload (initialized with `init` on first use).
    pub fn insert_with(&mut self, pattern: &Pattern, init: impl FnOnce() -> T) -> &mut T {
        let mut node = self;
        for segment in pattern.segments() {
            node = match segment {
                Segment::Static(text) => node.children.entry(text.clone()).or_default(),
                Segment::Param(_) => &mut **node.param.get_or_insert_with(Default::default),
                Segment::CatchAll(_) => &mut **node.wildcard.get_or_insert_with(Default::default),
            };
        }
        node.value.get_or_insert_with(init)
    }

    /// Returns the terminal payload registered for exactly `pattern`.
    pub fn get(&self, pattern: &Pattern) -> Option<&T> {
        let mut node = self;
        for segment in pattern.segments() {
            node = match segment {
                Segment::Static(text) => node.children.get(text)?,
                Segment::Param(_) => node.param.as_deref()?,
                Segment::CatchAll(_) => node.wildcard.as_deref()?,
            };
        }
        node.value.as_ref()
    }

    /// Matches a request path, returning the most specific terminal it
    /// reaches.
    pub fn lookup<'t>(&'t self, path: &str) -> Option<Found<'t, T>> {
        let normalized = normalize_path(path);
        let parts: Vec<&str> = segments(&normalized).collect();

        let mut captures = Vec::new();
        let value = self.search(&parts, &mut captures)?;
        Some(Found { value, captures })
    }

    fn search<'t>(&'t self, parts: &[&str], captures: &mut Vec<String>) -> Option<&'t T> {
        let Some((head, rest)) = parts.split_first() else {
            return self.value.as_ref();
        };

        if let Some(child) = self.children.get(*head) {
            if let Some(value) = child.search(rest, captures) {
                return Some(value);
            }
        }

        if let Some(param) = self.param.as_deref() {
            captures.push(head.to_string());
            if let Some(value) = param.search(rest, captures) {
                return Some(value);
            }
            captures.pop();
        }

        // A wildcard consumes the remainder (at least one segment) and ends traversal.
        let value = self.wildcard.as_deref()?.value.as_ref()?;
        captures.push(parts.join("/"));
        Some(value)
    }

    /// All terminal payloads, depth first.
    pub fn values(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_values(&mut out);
        out
    }

    fn collect_values<'t>(&'t self, out: &mut Vec<&'t T>) {
        out.extend(self.value.iter());
        let mut keys: Vec<&String> = self.children.keys().collect();
        keys.sort();
        for key in keys {
            self.children[key].collect_values(out);
        }
        if let Some(param) = self.param.as_deref() {
            param.collect_values(out);
        }
        if let Some(wildcard) = self.wildcard.as_deref() {
            wildcard.collect_values(out);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.children.is_empty()
            && self.param.is_none()
            && self.wildcard.is_none()
    }
}
