// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Compiled pathname patterns.
//!
//! Pattern syntax is a small subset of URL-pattern pathnames:
//!
//! * `:name` matches one path segment (`[^/]+`)
//! * `*` matches anything, including `/`
//! * every other character is literal
//!
//! Patterns are anchored at both ends and always start with `/`.

use guidepost_proto::{Directive, RawUrlPattern};
use regex::Regex;
use tracing::warn;

/// A raw pattern compiled once when the local guide copy is built.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    directive: Directive,
    source: String,
    matcher: Option<Regex>,
}

impl UrlPattern {
    /// Compile a raw pattern. A pattern that fails to compile never matches.
    pub fn compile(raw: &RawUrlPattern) -> Self {
        let matcher = match Regex::new(&pathname_regex(&raw.pathname)) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(pattern = %raw.pathname, %err, "url pattern did not compile");
                None
            }
        };
        Self {
            directive: raw.directive,
            source: raw.pathname.clone(),
            matcher,
        }
    }

    /// Allow or block.
    pub fn directive(&self) -> Directive {
        self.directive
    }

    /// Pattern source as received.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Test a pathname.
    pub fn is_match(&self, pathname: &str) -> bool {
        self.matcher.as_ref().is_some_and(|re| re.is_match(pathname))
    }
}

fn pathname_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut literal = String::new();
    if !pattern.starts_with('/') {
        literal.push('/');
    }
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                flush_literal(&mut out, &mut literal);
                out.push_str(".*");
            }
            ':' if chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
            {
                flush_literal(&mut out, &mut literal);
                while chars
                    .peek()
                    .is_some_and(|n| n.is_ascii_alphanumeric() || *n == '_')
                {
                    chars.next();
                }
                out.push_str("[^/]+");
            }
            _ => literal.push(c),
        }
    }
    flush_literal(&mut out, &mut literal);
    out.push('$');
    out
}

fn flush_literal(out: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        out.push_str(&regex::escape(literal));
        literal.clear();
    }
}
