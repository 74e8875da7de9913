//! Glob-style matching of port names (`*`, `?`, `[...]` character classes).
//!
//! Patterns are compiled to anchored regexes. Matching is case-sensitive.

use regex::Regex;

use crate::error::{Error, Result};

/// Does `name` match the glob `pattern`?
pub fn glob_match(pattern: &str, name: &str) -> Result<bool> {
    Ok(compile(pattern)?.is_match(name))
}

/// Compile a glob pattern into an anchored regex.
pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(&glob_to_regex(pattern))
        .map_err(|e| Error::InvalidPattern(format!("{pattern}: {e}")))
}

fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                if let Some((body, next)) = class_body(&chars, i + 1) {
                    out.push('[');
                    // Glob negation spells '!', regex spells '^'
                    if let Some(rest) = body.strip_prefix('!') {
                        out.push('^');
                        out.push_str(&escape_class_body(rest));
                    } else {
                        out.push_str(&escape_class_body(&body));
                    }
                    out.push(']');
                    i = next;
                    continue;
                }
                // Unclosed class: only the bracket itself is literal; the
                // rest of the pattern keeps its glob meaning.
                out.push_str(&regex::escape("["));
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    out
}

// Body of a class opening just before `start`. Returns the body and the index
// past the closing bracket, or None if the class never closes. A ']' in first
// position is part of the body, matching fnmatch.
fn class_body(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut body = String::new();
    for (i, &c) in chars.iter().enumerate().skip(start) {
        if c == ']' && !body.is_empty() {
            return Some((body, i + 1));
        }
        body.push(c);
    }
    None
}

// Inside a class, '-' and '^' keep their regex meaning; only escape what
// would open, close, or escape a class.
fn escape_class_body(body: &str) -> String {
    body.replace('\\', "\\\\")
        .replace('[', "\\[")
        .replace(']', "\\]")
}
