//! Deterministic URL rules.
//!
//! Rules run against the trimmed, lower-cased URL in a fixed order and the
//! first one that produces a label wins:
//!
//! 1. Loopback host (`127.0.0.1` or `localhost` anywhere) - safe
//! 2. No `http://`, `https://` or `www.` prefix - malicious
//! 3. No safe TLD suffix - malicious
//! 4. Brand typosquat - malicious
//! 5. `https://` prefix - safe
//! 6. `www.` prefix with a safe TLD - safe
//!
//! If none fires, the URL is deferred to the model. Plain `http://` URLs that
//! pass rules 2-4 always defer, since rules 5 and 6 need `https://` or `www.`.

use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::typosquat::TyposquatDetector;
use crate::verdict::Label;

const LOOPBACK_MARKERS: &[&str] = &["127.0.0.1", "localhost"];
const ACCEPTED_PREFIXES: &[&str] = &["http://", "https://", "www."];

/// Identifies a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Local development host.
    Loopback,
    /// Missing `http://`, `https://` or `www.` prefix.
    UnsupportedScheme,
    /// TLD not in the safe list.
    UntrustedTld,
    /// Brand imitation with digit substitution.
    Typosquat,
    /// Served over HTTPS.
    Https,
    /// `www.` host on a safe TLD.
    WwwSafeTld,
}

impl RuleId {
    /// All rules, in evaluation order.
    pub const ORDER: [RuleId; 6] = [
        RuleId::Loopback,
        RuleId::UnsupportedScheme,
        RuleId::UntrustedTld,
        RuleId::Typosquat,
        RuleId::Https,
        RuleId::WwwSafeTld,
    ];

    /// Returns a human-readable name for this rule.
    pub fn name(&self) -> &'static str {
        match self {
            RuleId::Loopback => "Loopback",
            RuleId::UnsupportedScheme => "Unsupported scheme",
            RuleId::UntrustedTld => "Untrusted TLD",
            RuleId::Typosquat => "Typosquat",
            RuleId::Https => "HTTPS",
            RuleId::WwwSafeTld => "www + safe TLD",
        }
    }
}

/// A label produced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleVerdict {
    /// The rule that fired.
    pub rule: RuleId,
    /// The label it assigned.
    pub label: Label,
    /// Always 100 for rules.
    pub confidence: f64,
}

impl RuleVerdict {
    fn new(rule: RuleId, label: Label) -> Self {
        Self {
            rule,
            label,
            confidence: 100.0,
        }
    }
}

/// Ordered, short-circuiting rule set.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    config: DetectorConfig,
    typosquat: TyposquatDetector,
}

impl RuleEngine {
    /// Creates a rule engine from the given configuration.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let typosquat = TyposquatDetector::new(&config)?;
        Ok(Self { config, typosquat })
    }

    /// Creates a rule engine with the built-in lists.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DetectorConfig::default())
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluates all rules in order and returns the first verdict, if any.
    ///
    /// `None` means no rule applies and the URL should go to the model.
    pub fn evaluate(&self, url: &str) -> Option<RuleVerdict> {
        let url = url.trim().to_lowercase();

        RuleId::ORDER
            .iter()
            .find_map(|&rule| self.apply(rule, &url).map(|label| RuleVerdict::new(rule, label)))
    }

    /// Applies one rule to an already trimmed, lower-cased URL.
    fn apply(&self, rule: RuleId, url: &str) -> Option<Label> {
        let fired = match rule {
            RuleId::Loopback => LOOPBACK_MARKERS.iter().any(|m| url.contains(m)),
            RuleId::UnsupportedScheme => !ACCEPTED_PREFIXES.iter().any(|p| url.starts_with(p)),
            RuleId::UntrustedTld => !self.config.has_safe_tld(url),
            RuleId::Typosquat => self.typosquat.is_typosquat(url),
            RuleId::Https => url.starts_with("https://"),
            RuleId::WwwSafeTld => url.starts_with("www.") && self.config.has_safe_tld(url),
        };

        fired.then_some(match rule {
            RuleId::Loopback | RuleId::Https | RuleId::WwwSafeTld => Label::Safe,
            RuleId::UnsupportedScheme | RuleId::UntrustedTld | RuleId::Typosquat => {
                Label::Malicious
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RuleEngine {
        RuleEngine::with_defaults().unwrap()
    }

    fn fired(url: &str) -> Option<(RuleId, Label)> {
        engine().evaluate(url).map(|v| (v.rule, v.label))
    }

    #[test]
    fn loopback_always_safe() {
        assert_eq!(fired("http://127.0.0.1:5000/predict"), Some((RuleId::Loopback, Label::Safe)));
        assert_eq!(fired("localhost:3000"), Some((RuleId::Loopback, Label::Safe)));
        assert_eq!(fired("ftp://LOCALHOST.xyz/login"), Some((RuleId::Loopback, Label::Safe)));
    }

    #[test]
    fn missing_prefix_is_malicious() {
        assert_eq!(
            fired("ftp://badsite.xyz"),
            Some((RuleId::UnsupportedScheme, Label::Malicious))
        );
        assert_eq!(
            fired("google.com"),
            Some((RuleId::UnsupportedScheme, Label::Malicious))
        );
        assert_eq!(fired(""), Some((RuleId::UnsupportedScheme, Label::Malicious)));
    }

    #[test]
    fn untrusted_tld_is_malicious() {
        assert_eq!(
            fired("http://secure-bank-login.ru"),
            Some((RuleId::UntrustedTld, Label::Malicious))
        );
        // Trailing path means no safe suffix.
        assert_eq!(
            fired("https://example.com/index.html"),
            Some((RuleId::UntrustedTld, Label::Malicious))
        );
    }

    #[test]
    fn typosquat_is_malicious() {
        assert_eq!(
            fired("http://g00gle.com"),
            Some((RuleId::Typosquat, Label::Malicious))
        );
        // Typosquat beats https.
        assert_eq!(
            fired("https://payp4l.com"),
            Some((RuleId::Typosquat, Label::Malicious))
        );
    }

    #[test]
    fn tld_rule_dominates_typosquat() {
        // ".com1" is not a safe suffix, so rule 3 fires before rule 4.
        assert_eq!(
            fired("http://g00gle.com1"),
            Some((RuleId::UntrustedTld, Label::Malicious))
        );
    }

    #[test]
    fn https_is_safe() {
        assert_eq!(fired("https://google.com"), Some((RuleId::Https, Label::Safe)));
        assert_eq!(fired("HTTPS://GitHub.COM"), Some((RuleId::Https, Label::Safe)));
    }

    #[test]
    fn www_with_safe_tld_is_safe() {
        assert_eq!(
            fired("www.wikipedia.org"),
            Some((RuleId::WwwSafeTld, Label::Safe))
        );
    }

    #[test]
    fn plain_http_defers_to_model() {
        assert_eq!(fired("http://paypal-login.com"), None);
        assert_eq!(fired("http://example.com"), None);
        assert_eq!(fired("http://www.example.org"), None);
    }

    #[test]
    fn input_is_trimmed() {
        assert_eq!(fired("  https://google.com \n"), Some((RuleId::Https, Label::Safe)));
    }

    #[test]
    fn rule_confidence_is_100() {
        let v = engine().evaluate("https://google.com").unwrap();
        assert_eq!(v.confidence, 100.0);
    }

    #[test]
    fn custom_tlds_respected() {
        let config = DetectorConfig {
            safe_tlds: vec![".io".to_string()],
            ..Default::default()
        };
        let engine = RuleEngine::new(config).unwrap();
        assert_eq!(
            engine.evaluate("https://example.com").map(|v| v.rule),
            Some(RuleId::UntrustedTld)
        );
        assert_eq!(
            engine.evaluate("https://crates.io").map(|v| v.rule),
            Some(RuleId::Https)
        );
    }

    #[test]
    fn order_is_fixed() {
        assert_eq!(RuleId::ORDER[0], RuleId::Loopback);
        assert_eq!(RuleId::ORDER[5], RuleId::WwwSafeTld);
        assert_eq!(RuleId::Typosquat.name(), "Typosquat");
    }
}
