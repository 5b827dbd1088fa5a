//! Label Rules
//!
//! Maps file paths to labels via shell-style glob patterns

use std::collections::{BTreeMap, BTreeSet};

use glob::Pattern;

use crate::error::{Error, Result};

/// Label rule set
///
/// Maps each label name to the glob patterns that trigger it. Patterns use
/// fnmatch semantics: `*` matches any run of characters including path
/// separators, `?` matches a single character, `[...]` matches a character
/// class. Patterns are compiled once at load time; matching is read-only and
/// safe to call from concurrent tasks.
#[derive(Debug, Clone)]
pub struct LabelRules {
    rules: BTreeMap<String, Vec<Pattern>>,
}

impl LabelRules {
    /// Build a rule set from (label, patterns) pairs
    ///
    /// # Errors
    /// Returns an error if any pattern fails to compile, so malformed
    /// configuration is rejected before any network call.
    pub fn new<I, P>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, P)>,
        P: IntoIterator<Item = String>,
    {
        let mut rules = BTreeMap::new();
        for (label, patterns) in pairs {
            let mut compiled = Vec::new();
            for pattern in patterns {
                let glob = Pattern::new(&pattern).map_err(|source| Error::Pattern {
                    label: label.clone(),
                    pattern: pattern.clone(),
                    source,
                })?;
                compiled.push(glob);
            }
            rules.insert(label, compiled);
        }
        Ok(Self { rules })
    }

    /// Labels whose patterns match the given path
    ///
    /// A label is included once if any of its patterns matches; further
    /// patterns for that label are not tried.
    pub fn match_path(&self, path: &str) -> BTreeSet<String> {
        self.rules
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|p| p.matches(path)))
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// The set of labels this rule set is authoritative over
    pub fn known_labels(&self) -> BTreeSet<String> {
        self.rules.keys().cloned().collect()
    }

    /// Iterate over (label, patterns) pairs in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Pattern])> {
        self.rules
            .iter()
            .map(|(label, patterns)| (label.as_str(), patterns.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
