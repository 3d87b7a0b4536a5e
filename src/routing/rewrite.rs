//! Regex path rewriting.
//!
//! A rewrite is a compiled pattern plus a replacement template. Named
//! capture groups are referenced as `${name}`; the escaped `$\{name}`
//! form found in YAML-era gateway configs is accepted as well.

use regex::Regex;

/// One `(pattern, replacement)` pair.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    regex: Regex,
    replacement: String,
}

impl RewriteRule {
    /// Compile a rewrite rule.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            replacement: replacement.replace("$\\{", "${"),
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Rewrite `path`, or `None` when the pattern does not match.
    pub fn apply(&self, path: &str) -> Option<String> {
        if !self.regex.is_match(path) {
            return None;
        }
        Some(
            self.regex
                .replace_all(path, self.replacement.as_str())
                .into_owned(),
        )
    }
}

/// Apply `rules` in order. Rules that do not match leave the path as is.
///
/// The result always starts with `/`.
pub fn rewrite_path(rules: &[RewriteRule], path: &str) -> String {
    let mut current = path.to_string();
    for rule in rules {
        if let Some(rewritten) = rule.apply(&current) {
            tracing::trace!(
                pattern = rule.pattern(),
                from = %current,
                to = %rewritten,
                "Rewrote path"
            );
            current = rewritten;
        }
    }

    if current.starts_with('/') {
        current
    } else {
        format!("/{current}")
    }
}
