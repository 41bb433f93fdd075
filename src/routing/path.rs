//! Path normalization and pattern matching.
//!
//! # Responsibilities
//! - Normalize request and registration paths to one canonical form
//! - Compile `:name` / `*` paths into segment patterns
//! - Match normalized paths and extract named captures
//!
//! # Design Decisions
//! - Matching is segment-by-segment; no regex, no pattern library
//! - `:name` binds exactly one segment; `*` binds the (possibly empty) rest
//! - Wildcards capture under their ordinal position ("0", "1", ...)
//! - Matching is case-sensitive

use std::collections::HashMap;

/// Normalize a path: collapse repeated separators, strip a trailing
/// separator unless the path is the root.
pub fn normalize_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_slash = false;
    for c in raw.chars() {
        if c == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Fixed text that must match exactly.
    Literal(String),
    /// `:name` matches one segment, captured under `name`.
    Param(String),
    /// `*` matches zero or more trailing segments, captured under its
    /// ordinal among the pattern's wildcards.
    Wildcard(usize),
}

/// A compiled route path.
#[derive(Debug, Clone)]
pub struct PathPattern {
    segments: Vec<Segment>,
    dynamic: bool,
}

impl PathPattern {
    /// Compile a normalized path into a pattern.
    pub fn compile(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut wildcards = 0;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if part == "*" {
                segments.push(Segment::Wildcard(wildcards));
                wildcards += 1;
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    segments.push(Segment::Literal(part.to_string()));
                } else {
                    segments.push(Segment::Param(name.to_string()));
                }
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }
        let dynamic = segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)));
        Self { segments, dynamic }
    }

    /// True if the pattern contains any `:name` or `*` token.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Whether the pattern accepts the normalized path.
    pub fn matches(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match the normalized path and return the capture map, or `None`
    /// when the path does not fit the pattern.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let mut caps = HashMap::new();
        if match_segments(&self.segments, &parts, &mut caps) {
            Some(caps)
        } else {
            None
        }
    }
}

fn match_segments(
    pattern: &[Segment],
    path: &[&str],
    caps: &mut HashMap<String, String>,
) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return path.is_empty();
    };
    match head {
        Segment::Literal(lit) => match path.split_first() {
            Some((part, tail)) if part == lit => match_segments(rest, tail, caps),
            _ => false,
        },
        Segment::Param(name) => match path.split_first() {
            Some((part, tail)) => {
                if match_segments(rest, tail, caps) {
                    caps.insert(name.clone(), (*part).to_string());
                    true
                } else {
                    false
                }
            }
            None => false,
        },
        Segment::Wildcard(ordinal) => {
            // Greedy: try the longest remainder first.
            for taken in (0..=path.len()).rev() {
                if match_segments(rest, &path[taken..], caps) {
                    caps.insert(ordinal.to_string(), path[..taken].join("/"));
                    return true;
                }
            }
            false
        }
    }
}
