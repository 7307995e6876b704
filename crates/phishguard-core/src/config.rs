//! Static detector configuration.
//!
//! The three lists are read once at startup and shared read-only by the rule
//! engine and the feature extractor for the lifetime of the process.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// TLD suffixes a URL must end with to avoid an immediate malicious verdict.
pub const SAFE_TLDS: &[&str] = &[".com", ".org", ".edu", ".in", ".net", ".gov"];

/// Tokens commonly seen in phishing URLs.
pub const MALICIOUS_WORDS: &[&str] = &[
    "login", "secure", "update", "bank", "verify", "account", "password",
];

/// Brands checked for digit-substitution typosquatting.
pub const BRAND_NAMES: &[&str] = &["google", "paypal", "microsoft", "amazon", "facebook", "apple"];

/// Lists consulted by the rule engine and the feature extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Accepted TLD suffixes, including the leading dot.
    pub safe_tlds: Vec<String>,
    /// Suspicious-word tokens matched as case-insensitive substrings.
    pub malicious_words: Vec<String>,
    /// Brand names checked for typosquatting.
    pub brand_names: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            safe_tlds: to_owned(SAFE_TLDS),
            malicious_words: to_owned(MALICIOUS_WORDS),
            brand_names: to_owned(BRAND_NAMES),
        }
    }
}

impl DetectorConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Keys absent from the file keep their built-in defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Parses a configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: DetectorConfig = serde_json::from_str(raw)?;
        config.normalized()
    }

    /// Returns a copy with every entry trimmed and lower-cased.
    ///
    /// Matching is always done against lower-cased URLs, so upper-case
    /// entries would otherwise never match.
    pub fn normalized(&self) -> Result<Self> {
        let config = Self {
            safe_tlds: normalize_list("safe_tlds", &self.safe_tlds)?,
            malicious_words: normalize_list("malicious_words", &self.malicious_words)?,
            brand_names: normalize_list("brand_names", &self.brand_names)?,
        };

        if config.safe_tlds.is_empty() {
            warn!("safe_tlds is empty; every URL will be rejected by the TLD rule");
        }
        for tld in &config.safe_tlds {
            if !tld.starts_with('.') {
                warn!(tld = %tld, "safe TLD has no leading dot and will match bare suffixes");
            }
        }

        Ok(config)
    }

    /// Returns true if the (lower-cased) URL ends with one of the safe TLDs.
    pub fn has_safe_tld(&self, url: &str) -> bool {
        self.safe_tlds.iter().any(|tld| url.ends_with(tld.as_str()))
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn normalize_list(name: &str, items: &[String]) -> Result<Vec<String>> {
    items
        .iter()
        .map(|item| {
            let item = item.trim().to_lowercase();
            if item.is_empty() {
                Err(Error::InvalidConfig(format!("{} contains a blank entry", name)))
            } else {
                Ok(item)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lists() {
        let config = DetectorConfig::default();
        assert_eq!(config.safe_tlds.len(), 6);
        assert_eq!(config.malicious_words.len(), 7);
        assert_eq!(config.brand_names.len(), 6);
        assert!(config.safe_tlds.contains(&".gov".to_string()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DetectorConfig::from_json(r#"{"brand_names": ["Netflix"]}"#).unwrap();
        assert_eq!(config.brand_names, vec!["netflix".to_string()]);
        assert_eq!(config.safe_tlds, DetectorConfig::default().safe_tlds);
    }

    #[test]
    fn entries_are_lowercased_and_trimmed() {
        let config = DetectorConfig::from_json(r#"{"safe_tlds": [" .COM "]}"#).unwrap();
        assert_eq!(config.safe_tlds, vec![".com".to_string()]);
    }

    #[test]
    fn blank_entry_rejected() {
        let err = DetectorConfig::from_json(r#"{"malicious_words": ["login", "  "]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_rejected() {
        let err = DetectorConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DetectorConfig::from_file("nonexistent/config.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn safe_tld_suffix_match() {
        let config = DetectorConfig::default();
        assert!(config.has_safe_tld("https://example.com"));
        assert!(config.has_safe_tld("www.iitb.ac.in"));
        assert!(!config.has_safe_tld("http://example.ru"));
        assert!(!config.has_safe_tld("https://example.com/path"));
    }
}
