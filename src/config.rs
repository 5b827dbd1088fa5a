//! Configuration Management
//!
//! Reposlug parsing and INI-style configuration loading for auth and rules

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::rules::LabelRules;

/// Environment variable naming the webhook shared secret
pub const WEBHOOK_SECRET_ENV: &str = "WEBHOOK_SECRET";

/// Environment variable holding a colon-separated list of config files
pub const CONFIG_ENV: &str = "FILABEL_CONFIG";

/// A repository identifier of the form `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reposlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for Reposlug {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Reposlug {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::InvalidReposlug(s.to_string())),
        }
    }
}

impl fmt::Display for Reposlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parsed INI content: section name -> key -> value
type IniSections = BTreeMap<String, BTreeMap<String, String>>;

/// Parse configparser-dialect INI content
///
/// Supports `[section]` headers, `key = value` pairs, `#`/`;` comments, and
/// indented continuation lines that extend the previous value with a newline
/// (the dialect the labels table uses for multi-pattern values).
fn parse_ini(content: &str) -> Result<IniSections> {
    let mut sections = IniSections::new();
    let mut current_section: Option<String> = None;
    let mut current_key: Option<String> = None;

    for (number, raw) in content.lines().enumerate() {
        let line = raw.trim_end();
        let trimmed = line.trim_start();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        // Indented lines continue the previous value
        if line.starts_with(char::is_whitespace) {
            let (section, key) = match (&current_section, &current_key) {
                (Some(s), Some(k)) => (s.clone(), k.clone()),
                _ => {
                    return Err(Error::config(format!(
                        "line {}: continuation without a preceding key",
                        number + 1
                    )))
                }
            };
            let value = sections
                .entry(section)
                .or_default()
                .entry(key)
                .or_default();
            value.push('\n');
            value.push_str(trimmed);
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let name = trimmed[1..trimmed.len() - 1].trim().to_string();
            sections.entry(name.clone()).or_default();
            current_section = Some(name);
            current_key = None;
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(Error::config(format!(
                "line {}: expected 'key = value', got '{}'",
                number + 1,
                trimmed
            )));
        };
        let Some(section) = &current_section else {
            return Err(Error::config(format!(
                "line {}: key outside of any section",
                number + 1
            )));
        };

        let key = key.trim().to_string();
        sections
            .entry(section.clone())
            .or_default()
            .insert(key.clone(), value.trim().to_string());
        current_key = Some(key);
    }

    Ok(sections)
}

fn section_value(sections: &IniSections, section: &str, key: &str) -> Option<String> {
    sections.get(section).and_then(|s| s.get(key)).cloned()
}

/// Split a rules value into its newline-separated patterns
fn split_patterns(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn rules_from_sections(sections: &IniSections) -> Result<Option<LabelRules>> {
    let Some(labels) = sections.get("labels") else {
        return Ok(None);
    };
    let pairs = labels
        .iter()
        .map(|(label, value)| (label.clone(), split_patterns(value)));
    LabelRules::new(pairs).map(Some)
}

/// Load the access token from an auth configuration file
///
/// Expects a `[github]` section with a `token` key.
///
/// # Errors
/// Returns a configuration error if the file cannot be read or the token is
/// missing.
pub fn load_token(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
    let sections = parse_ini(&content)?;
    section_value(&sections, "github", "token")
        .ok_or_else(|| Error::config("missing [github] token"))
}

/// Load the label rules from a labels configuration file
///
/// Expects a `[labels]` section mapping each label to a newline-separated
/// list of glob patterns.
///
/// # Errors
/// Returns an error if the file cannot be read, the section is missing, or
/// any pattern fails to compile.
pub fn load_rules(path: &Path) -> Result<LabelRules> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
    let sections = parse_ini(&content)?;
    rules_from_sections(&sections)?.ok_or_else(|| Error::config("missing [labels] section"))
}

/// Webhook server configuration assembled from the environment
///
/// `FILABEL_CONFIG` names one or more INI files separated by colons; the
/// token, the webhook secret, and the labels table may live in separate
/// files. The secret comes from the `[github]` section's `secret` key; a
/// `WEBHOOK_SECRET` env var overrides it when set.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub token: String,
    pub rules: LabelRules,
    pub secret: String,
}

impl WebConfig {
    /// Read the webhook configuration from the process environment
    ///
    /// # Errors
    /// Fails fast if `FILABEL_CONFIG` is missing, a file is unreadable, or
    /// no token, secret, or labels table is found.
    pub fn from_env() -> Result<Self> {
        let files = std::env::var(CONFIG_ENV)
            .map_err(|_| Error::config(format!("missing env {}", CONFIG_ENV)))?;
        let env_secret = std::env::var(WEBHOOK_SECRET_ENV).ok();

        let mut token = None;
        let mut secret = None;
        let mut rules = None;

        for file in files.split(':').filter(|f| !f.is_empty()) {
            let path = Path::new(file);
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::config(format!("cannot read {}: {}", file, e)))?;
            let sections = parse_ini(&content)?;

            if let Some(found) = section_value(&sections, "github", "token") {
                token = Some(found);
            }
            if let Some(found) = section_value(&sections, "github", "secret") {
                secret = Some(found);
            }
            if let Some(found) = rules_from_sections(&sections)? {
                rules = Some(found);
            }
        }

        Ok(WebConfig {
            token: token.ok_or_else(|| Error::config("missing [github] token"))?,
            rules: rules.ok_or_else(|| Error::config("missing [labels] section"))?,
            secret: env_secret.or(secret).ok_or_else(|| {
                Error::config(format!(
                    "missing webhook secret ([github] secret or env {})",
                    WEBHOOK_SECRET_ENV
                ))
            })?,
        })
    }
}
