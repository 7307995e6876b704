//! URL feature extraction.
//!
//! Maps a URL string to the fixed-shape [`FeatureRecord`] the classifier was
//! trained on. Field order is part of the model contract: see
//! [`FeatureRecord::FIELD_NAMES`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;

/// Dotted-quad shape; octets are not range-checked. `\d` is any Unicode decimal digit.
static IPV4_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}\.){3}\d{1,3}").expect("Invalid IPv4 pattern"));

static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("Invalid digit pattern"));

/// Letters and numbers by general category. Combining marks are excluded.
static ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]").expect("Invalid alphanumeric pattern"));

/// Returns true if `text` contains a Unicode decimal digit.
pub(crate) fn has_digit(text: &str) -> bool {
    DIGIT.is_match(text)
}

/// Number of fields in a [`FeatureRecord`].
pub const FEATURE_COUNT: usize = 7;

/// Numeric summary of a URL.
///
/// Boolean fields serialize as `0`/`1` so the JSON form matches the
/// training data column-for-column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Character count of the URL.
    pub length: usize,
    /// Count of Unicode decimal digits.
    pub num_digits: usize,
    /// Count of characters that are neither letters nor numbers.
    pub num_special: usize,
    /// Count of literal `.` characters.
    pub num_subdomains: usize,
    /// URL starts with `https` (case-sensitive).
    #[serde(with = "flag")]
    pub has_https: bool,
    /// A dotted-quad IPv4 shape appears anywhere.
    #[serde(with = "flag")]
    pub has_ip: bool,
    /// A suspicious word appears as a case-insensitive substring.
    #[serde(with = "flag")]
    pub has_suspicious_words: bool,
}

impl FeatureRecord {
    /// Field names in model input order.
    pub const FIELD_NAMES: [&'static str; FEATURE_COUNT] = [
        "length",
        "num_digits",
        "num_special",
        "num_subdomains",
        "has_https",
        "has_ip",
        "has_suspicious_words",
    ];

    /// Returns the record as a model input vector, ordered as [`Self::FIELD_NAMES`].
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.length as f64,
            self.num_digits as f64,
            self.num_special as f64,
            self.num_subdomains as f64,
            f64::from(u8::from(self.has_https)),
            f64::from(u8::from(self.has_ip)),
            f64::from(u8::from(self.has_suspicious_words)),
        ]
    }

    /// Returns the field names as owned strings.
    pub fn field_names() -> Vec<String> {
        Self::FIELD_NAMES.iter().map(|s| s.to_string()).collect()
    }
}

/// Computes [`FeatureRecord`]s.
///
/// Pure and total: every string, including the empty one, yields a record.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    suspicious_words: Vec<String>,
}

impl FeatureExtractor {
    /// Creates an extractor using the configured suspicious words.
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            suspicious_words: config
                .malicious_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        }
    }

    /// Extracts features from the URL as given.
    ///
    /// Pass the original (trimmed, not lower-cased) URL: `has_https` is
    /// case-sensitive, exactly as the training data was computed.
    pub fn extract(&self, url: &str) -> FeatureRecord {
        let lowered = url.to_lowercase();

        let length = url.chars().count();

        FeatureRecord {
            length,
            num_digits: DIGIT.find_iter(url).count(),
            num_special: length - ALNUM.find_iter(url).count(),
            num_subdomains: url.matches('.').count(),
            has_https: url.starts_with("https"),
            has_ip: IPV4_SHAPE.is_match(url),
            has_suspicious_words: self
                .suspicious_words
                .iter()
                .any(|w| lowered.contains(w.as_str())),
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

/// Serializes `bool` as the integers `0`/`1`.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(serde::de::Error::custom(format!(
                "expected 0 or 1, got {}",
                other
            ))),
        }
    }
}
