//! Column specification parsing.
//!
//! A column specification is a whitespace separated list of column names in
//! which the token `*` stands for "every available column not already
//! listed". [`resolve_columns`] turns such a specification into the concrete,
//! ordered list of columns a view displays.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SourceError};

/// The wildcard token.
pub const WILDCARD: &str = "*";

/// One token with its surrounding whitespace.
static TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(\S+)\s*").unwrap_or_else(|_| unreachable!()));

/// Resolves a column specification against the available column names.
///
/// Returns `Ok(None)` when `spec` is empty or only whitespace; the caller
/// decides which columns to fall back to.
///
/// A `*` appends, in `available` order, every column not already present in
/// the result. A literal token is appended verbatim, except that a column
/// already pulled in by a wildcard is absorbed rather than repeated. Literal
/// tokens repeated by the caller are kept as given.
///
/// # Errors
///
/// Returns [`SourceError::MalformedSpec`] if tokenization stops making
/// progress.
pub fn resolve_columns<S: AsRef<str>>(
    spec: &str,
    available: &[S],
) -> Result<Option<Vec<String>>> {
    if spec.trim().is_empty() {
        return Ok(None);
    }

    let mut resolved: Vec<String> = Vec::new();
    let mut expanded: HashSet<String> = HashSet::new();
    let mut index = 0;

    while index < spec.len() {
        let Some(caps) = TOKEN_REGEX.captures_at(spec, index) else {
            return Err(malformed(spec, index));
        };
        let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
            return Err(malformed(spec, index));
        };
        if whole.start() != index || whole.end() <= index {
            return Err(malformed(spec, index));
        }

        let name = token.as_str();
        if name == WILDCARD {
            let start_count = resolved.len();
            for column in available {
                let column = column.as_ref();
                if resolved[..start_count].iter().any(|c| c == column) {
                    continue;
                }
                resolved.push(column.to_string());
                expanded.insert(column.to_string());
            }
        } else if !expanded.contains(name) {
            resolved.push(name.to_string());
        }

        index = whole.end();
    }

    Ok(Some(resolved))
}

fn malformed(spec: &str, position: usize) -> SourceError {
    SourceError::MalformedSpec {
        spec: spec.to_string(),
        position,
    }
}
