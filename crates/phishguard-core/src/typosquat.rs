//! Brand typosquat detection.
//!
//! Each brand is compiled to a pattern where every vowel position accepts any
//! vowel or an ASCII digit, while consonants must match literally. `paypal`
//! therefore matches `paypal`, `p4yp4l` and `payp4l`, but not `pajpal`.
//!
//! A pattern match alone is not enough: the URL must also contain at least one
//! digit somewhere. The digit does not have to sit inside the matched brand
//! and may be any Unicode decimal digit; substitutions inside the brand are
//! still limited to ASCII `0-9`.

use regex::Regex;
use tracing::trace;

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::features::has_digit;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];
const VOWEL_OR_DIGIT: &str = "[aeiou0-9]";

/// Compiled pattern for one brand.
#[derive(Debug, Clone)]
struct BrandPattern {
    brand: String,
    regex: Regex,
}

/// Flags URLs that imitate known brands through vowel/digit substitution.
#[derive(Debug, Clone)]
pub struct TyposquatDetector {
    patterns: Vec<BrandPattern>,
}

impl TyposquatDetector {
    /// Compiles patterns for the configured brand names.
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let patterns = config
            .brand_names
            .iter()
            .map(|brand| {
                let brand = brand.to_lowercase();
                let regex = Regex::new(&brand_pattern(&brand))?;
                Ok(BrandPattern { brand, regex })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if the URL looks like a typosquat of any configured brand.
    pub fn is_typosquat(&self, url: &str) -> bool {
        self.matched_brand(url).is_some()
    }

    /// Returns the first brand (in configuration order) the URL imitates.
    pub fn matched_brand(&self, url: &str) -> Option<&str> {
        let url = url.to_lowercase();
        if !has_digit(&url) {
            return None;
        }

        let hit = self
            .patterns
            .iter()
            .find(|p| p.regex.is_match(&url))
            .map(|p| p.brand.as_str());

        if let Some(brand) = hit {
            trace!(brand, "typosquat pattern matched");
        }
        hit
    }

    /// Returns the number of compiled brand patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no brands are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Builds the regex source for a lower-cased brand.
fn brand_pattern(brand: &str) -> String {
    brand
        .chars()
        .map(|c| {
            if VOWELS.contains(&c) {
                VOWEL_OR_DIGIT.to_string()
            } else {
                regex::escape(&c.to_string())
            }
        })
        .collect()
}
