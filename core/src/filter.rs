#![deny(missing_docs)]

//! # Include/Exclude Filter
//!
//! Gitignore-style matching over the limited pattern subset this pipeline
//! needs: `*` (any run of non-separator characters), `**` (any run of
//! characters, separators included), `?` (one character), a leading `/`
//! that anchors the pattern to the start of the candidate string, and a
//! trailing `/` that only matches a candidate ending in a path
//! separator. Hand-rolled over `regex`, translating each pattern to an
//! anchored regex and reusing the same memoized cache the pattern
//! matchers use, since this dependency stack carries no dedicated
//! glob/gitignore crate.

use crate::patterns::{cached_is_match, IncludeExclude};

/// Translates a gitignore-style pattern into an equivalent anchored
/// regex source string.
fn to_regex(pattern: &str) -> String {
    let anchored_start = pattern.starts_with('/');
    let dir_only = pattern.ends_with('/') && pattern.len() > 1;
    let body = pattern.trim_start_matches('/').trim_end_matches('/');

    let mut out = String::from("^");
    if !anchored_start {
        out.push_str("(?:.*/)?");
    }

    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '{' | '}' | '[' | ']' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }

    if dir_only {
        out.push_str("(?:/.*)?$");
    } else {
        out.push('$');
    }
    out
}

/// Whether `candidate` is included under `rule`: included if `include`
/// is empty or any include pattern matches; excluded if any exclude
/// pattern matches; exclude always wins.
pub fn is_included(rule: &IncludeExclude, candidate: &str) -> bool {
    let included = rule.include.is_empty() || rule.include.iter().any(|p| cached_is_match(&to_regex(p), candidate));
    if !included {
        return false;
    }
    !rule.exclude.iter().any(|p| cached_is_match(&to_regex(p), candidate))
}

/// Looks up the rule for `category` in `filters` and applies
/// [`is_included`]; a category with no configured rule always includes.
pub fn passes(
    filters: &std::collections::HashMap<String, IncludeExclude>,
    category: &str,
    candidate: &str,
) -> bool {
    match filters.get(category) {
        Some(rule) => is_included(rule, candidate),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_include_means_include_everything() {
        let rule = IncludeExclude::default();
        assert!(is_included(&rule, "app/handlers/user.go"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let rule = IncludeExclude { include: vec!["**".into()], exclude: vec!["**/internal/**".into()] };
        assert!(is_included(&rule, "app/handlers/user.go"));
        assert!(!is_included(&rule, "app/internal/secret.go"));
    }

    #[test]
    fn star_does_not_cross_separator() {
        let rule = IncludeExclude { include: vec!["handlers/*.go".into()], exclude: vec![] };
        assert!(is_included(&rule, "handlers/user.go"));
        assert!(!is_included(&rule, "handlers/nested/user.go"));
    }

    #[test]
    fn double_star_crosses_separators() {
        let rule = IncludeExclude { include: vec!["handlers/**/user.go".into()], exclude: vec![] };
        assert!(is_included(&rule, "handlers/nested/deep/user.go"));
    }

    #[test]
    fn leading_slash_anchors_to_root() {
        let rule = IncludeExclude { include: vec![], exclude: vec!["/vendor/**".into()] };
        assert!(!is_included(&rule, "vendor/pkg/file.go"));
        assert!(is_included(&rule, "app/vendor/pkg/file.go"));
    }

    #[test]
    fn trailing_slash_is_directory_only() {
        let rule = IncludeExclude { include: vec![], exclude: vec!["generated/".into()] };
        assert!(!is_included(&rule, "app/generated/file.go"));
        assert!(is_included(&rule, "app/generated_file.go"));
    }

    #[test]
    fn unconfigured_category_always_passes() {
        let filters = std::collections::HashMap::new();
        assert!(passes(&filters, "files", "anything.go"));
    }
}
