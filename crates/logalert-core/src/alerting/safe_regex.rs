//! Construction of regexes from user-supplied patterns
//!
//! Patterns are screened for the usual catastrophic-backtracking shapes
//! before they are compiled. The screen is a heuristic: it rejects the known
//! signatures and lets everything else through to the regex engine.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Longest pattern accepted, in characters
pub const MAX_PATTERN_LENGTH: usize = 200;

/// Upper bound on the compiled program size of a user pattern
const COMPILED_SIZE_LIMIT: usize = 1 << 20;

/// Check a pattern against the length limit and the backtracking heuristics.
///
/// Rejects empty patterns, patterns longer than [`MAX_PATTERN_LENGTH`],
/// quantified groups whose body ends in a quantifier (`(a+)+`, `(.*)*`),
/// doubled quantifiers (`a++`, `a+*`) and groups with identical alternation
/// branches (`(a|a)`).
///
/// Only a group whose body *ends* in a quantifier counts as nested, so
/// shapes like `(\w+\s?)+` or `(a+b)+` are accepted. The `regex` engine
/// matches in linear time, which keeps such patterns harmless.
pub fn is_pattern_safe(pattern: &str) -> bool {
    if pattern.is_empty() || pattern.chars().count() > MAX_PATTERN_LENGTH {
        return false;
    }

    !has_risky_structure(pattern)
}

/// Build a regex from a user pattern, or `None` if the pattern is unsafe,
/// uses an unknown flag, or does not compile.
///
/// Supported flags: `i` (case-insensitive), `m` (multi-line), `s` (`.`
/// matches newlines).
pub fn safe_create_regex(pattern: &str, flags: &str) -> Option<Regex> {
    if !is_pattern_safe(pattern) {
        debug!(pattern, "Rejected unsafe regex pattern");
        return None;
    }

    let mut builder = RegexBuilder::new(pattern);
    builder.size_limit(COMPILED_SIZE_LIMIT);

    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            other => {
                debug!(pattern, flag = %other, "Unsupported regex flag");
                return None;
            }
        }
    }

    match builder.build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            debug!(pattern, error = %e, "Regex pattern failed to compile");
            None
        }
    }
}

/// Test `text` against a regex built by [`safe_create_regex`]
pub fn safe_regex_test(regex: &Regex, text: &str) -> bool {
    regex.is_match(text)
}

struct OpenGroup {
    body_start: usize,
    has_subgroup: bool,
}

/// Single left-to-right scan. Escaped characters and character-class
/// contents are literals and never count as operators.
fn has_risky_structure(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut groups: Vec<OpenGroup> = Vec::new();
    let mut escaped = false;
    let mut in_class = false;
    let mut prev_quantifier = false;

    for (i, &c) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            prev_quantifier = false;
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                prev_quantifier = false;
            }
            _ if in_class => {
                if c == ']' {
                    in_class = false;
                }
                prev_quantifier = false;
            }
            '[' => {
                in_class = true;
                prev_quantifier = false;
            }
            '(' => {
                if let Some(parent) = groups.last_mut() {
                    parent.has_subgroup = true;
                }
                groups.push(OpenGroup {
                    body_start: i + 1,
                    has_subgroup: false,
                });
                prev_quantifier = false;
            }
            ')' => {
                if let Some(group) = groups.pop() {
                    if !group.has_subgroup {
                        let quantified = matches!(chars.get(i + 1), Some('+' | '*'));
                        if quantified && prev_quantifier {
                            return true;
                        }
                        if has_duplicate_branches(&chars[group.body_start..i]) {
                            return true;
                        }
                    }
                }
                prev_quantifier = false;
            }
            '+' | '*' => {
                if prev_quantifier {
                    return true;
                }
                prev_quantifier = true;
            }
            _ => prev_quantifier = false,
        }
    }

    false
}

fn has_duplicate_branches(body: &[char]) -> bool {
    let body = match body {
        ['?', ':', rest @ ..] => rest,
        other => other,
    };

    let mut branches = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    let mut in_class = false;

    for &c in body {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                current.push(c);
            }
            '[' if !in_class => {
                in_class = true;
                current.push(c);
            }
            ']' if in_class => {
                in_class = false;
                current.push(c);
            }
            '|' if !in_class => branches.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    branches.push(current);

    if branches.len() < 2 {
        return false;
    }

    let mut seen = HashSet::with_capacity(branches.len());
    branches.iter().any(|branch| !seen.insert(branch.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("(a+)+")]
    #[case("(.*)*")]
    #[case("(x+)*")]
    #[case("(x*)+")]
    #[case("(?:\\d+)+")]
    #[case("(foo|foo)*")]
    #[case("(a|a)")]
    #[case("(?:get|put|get)")]
    #[case("a++")]
    #[case("a**")]
    #[case("a+*")]
    #[case("")]
    fn test_rejects_risky_patterns(#[case] pattern: &str) {
        assert!(!is_pattern_safe(pattern), "{pattern} should be rejected");
    }

    #[rstest]
    #[case("error|timeout")]
    #[case("timeout after \\d+ms")]
    #[case("(get|put) failed")]
    #[case("(a+)?")]
    #[case(".*?connection")]
    #[case("\\(a+\\)+")]
    #[case("[+*]+")]
    #[case("a\\++")]
    #[case("([a|a])")]
    #[case("(a+b)+")]
    #[case("(\\w+\\s?)+")]
    fn test_accepts_ordinary_patterns(#[case] pattern: &str) {
        assert!(is_pattern_safe(pattern), "{pattern} should be accepted");
    }

    #[test]
    fn test_length_limit() {
        assert!(is_pattern_safe(&"a".repeat(MAX_PATTERN_LENGTH)));
        assert!(!is_pattern_safe(&"a".repeat(MAX_PATTERN_LENGTH + 1)));
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(is_pattern_safe(&"é".repeat(MAX_PATTERN_LENGTH)));
    }

    #[test]
    fn test_create_case_insensitive() {
        let regex = safe_create_regex("timeout", "i").unwrap();
        assert!(safe_regex_test(&regex, "Request TIMEOUT after 30s"));

        let regex = safe_create_regex("timeout", "").unwrap();
        assert!(!safe_regex_test(&regex, "Request TIMEOUT after 30s"));
    }

    #[test]
    fn test_create_rejects_unsafe_and_invalid() {
        assert!(safe_create_regex("(a+)+", "i").is_none());
        assert!(safe_create_regex("unclosed(", "").is_none());
        assert!(safe_create_regex("(?<=x)y", "").is_none());
        assert!(safe_create_regex("ok", "q").is_none());
    }

    #[test]
    fn test_multi_line_flag() {
        let regex = safe_create_regex("^failed$", "m").unwrap();
        assert!(safe_regex_test(&regex, "step 1\nfailed\nstep 3"));
    }
}
