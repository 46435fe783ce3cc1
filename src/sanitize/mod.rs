//! Issue body sanitizer.
//!
//! Issue templates leave a lot of scaffolding in issue bodies: HTML comment
//! markers, "Steps to reproduce" headings, placeholder bullet lists. The
//! sanitizer drops every body line that matches a denylist entry and joins the
//! remaining lines back together.
//!
//! # Match modes
//!
//! - `substring`: a line is dropped if it contains an entry anywhere. This can
//!   over-strip text that merely quotes a template phrase.
//! - `exact_line`: a line is dropped only if its trimmed text equals a trimmed
//!   entry.
//! - `regex`: entries are regular expressions matched against the line.
//!
//! The line separator defaults to the empty string, so kept lines are
//! concatenated verbatim.


use crate::config::{MatchMode, SanitizerConfig};
use crate::error::{IssueCrewError, Result};
use regex::Regex;

/// Compiled form of the denylist.
#[derive(Debug, Clone)]
enum Matcher {
    Substring(Vec<String>),
    ExactLine(Vec<String>),
    Regex(Vec<Regex>),
}

/// Removes boilerplate lines from issue bodies.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    matcher: Matcher,
    line_separator: String,
}

impl Sanitizer {
    /// Build a sanitizer from its settings.
    ///
    /// Fails if a denylist entry is blank (it would match every line, or every
    /// blank line once trimmed) or, in
    /// `regex` mode, is not a valid regular expression.
    pub fn new(settings: &SanitizerConfig) -> Result<Self> {
        if settings.denylist.iter().any(|entry| entry.trim().is_empty()) {
            return Err(IssueCrewError::UserError(
                "sanitizer denylist entries must not be empty or whitespace-only".to_string(),
            ));
        }

        let matcher = match settings.match_mode {
            MatchMode::Substring => Matcher::Substring(settings.denylist.clone()),
            MatchMode::ExactLine => Matcher::ExactLine(
                settings
                    .denylist
                    .iter()
                    .map(|entry| entry.trim().to_string())
                    .collect(),
            ),
            MatchMode::Regex => {
                let patterns = settings
                    .denylist
                    .iter()
                    .map(|entry| {
                        Regex::new(entry).map_err(|e| {
                            IssueCrewError::UserError(format!(
                                "invalid sanitizer pattern '{}': {}",
                                entry, e
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Matcher::Regex(patterns)
            }
        };

        Ok(Self {
            matcher,
            line_separator: settings.line_separator.clone(),
        })
    }

    /// Whether `line` matches any denylist entry.
    pub fn is_boilerplate(&self, line: &str) -> bool {
        match &self.matcher {
            Matcher::Substring(entries) => {
                entries.iter().any(|entry| line.contains(entry.as_str()))
            }
            Matcher::ExactLine(entries) => {
                let trimmed = line.trim();
                entries.iter().any(|entry| entry == trimmed)
            }
            Matcher::Regex(patterns) => patterns.iter().any(|re| re.is_match(line)),
        }
    }

    /// Strip boilerplate lines from a raw issue body.
    ///
    /// The body is split on `\n`; lines that match the denylist are dropped
    /// and the rest are joined with the configured separator. A body made
    /// entirely of boilerplate yields an empty string.
    pub fn strip_body(&self, raw_body: &str) -> String {
        raw_body
            .split('\n')
            .filter(|line| !self.is_boilerplate(line))
            .collect::<Vec<_>>()
            .join(&self.line_separator)
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        let settings = SanitizerConfig::default();
        Self {
            matcher: Matcher::Substring(settings.denylist),
            line_separator: settings.line_separator,
        }
    }
}
