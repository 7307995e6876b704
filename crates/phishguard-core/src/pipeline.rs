//! Two-stage URL classification pipeline.
//!
//! Orchestrates the rule engine and the model with short-circuit optimization:
//! 1. Rules checked first (pure string checks)
//! 2. Return immediately if a rule fires
//! 3. Otherwise extract features and ask the model

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::classifier::{validate_contract, UrlClassifier};
use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::features::FeatureExtractor;
use crate::rule_engine::{RuleEngine, RuleId};
use crate::verdict::{Label, Verdict};

/// URL classification pipeline.
///
/// Holds only immutable state, so one instance behind an `Arc` can serve any
/// number of concurrent callers.
pub struct UrlPipeline {
    rules: RuleEngine,
    extractor: FeatureExtractor,
    model: Arc<dyn UrlClassifier>,
}

impl UrlPipeline {
    /// Creates a pipeline from a configuration and a loaded model.
    ///
    /// Fails if the configuration is unusable or the model was trained on a
    /// different feature schema. Both are startup errors.
    pub fn new(config: DetectorConfig, model: Arc<dyn UrlClassifier>) -> Result<Self> {
        let config = config.normalized()?;
        validate_contract(model.as_ref())?;

        Ok(Self {
            extractor: FeatureExtractor::new(&config),
            rules: RuleEngine::new(config)?,
            model,
        })
    }

    /// Returns the rule engine.
    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    /// Returns the feature extractor.
    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Classifies a request field that may be absent.
    ///
    /// Returns [`Error::InvalidInput`] when `url` is `None`.
    pub fn classify_field(&self, url: Option<&str>) -> Result<Verdict> {
        url.map(|u| self.classify(u)).ok_or(Error::InvalidInput)
    }

    /// Classifies a URL.
    pub fn classify(&self, raw_url: &str) -> Verdict {
        self.classify_with_stats(raw_url).0
    }

    /// Classifies a URL and reports how the decision was reached.
    pub fn classify_with_stats(&self, raw_url: &str) -> (Verdict, PipelineStats) {
        let url = raw_url.trim();

        let rule_start = Instant::now();
        let rule_verdict = self.rules.evaluate(url);
        let rule_duration_us = rule_start.elapsed().as_micros() as u64;

        if let Some(rv) = rule_verdict {
            debug!(
                url_len = url.len(),
                rule = rv.rule.name(),
                label = %rv.label,
                "Rule decided"
            );
            let stats = PipelineStats {
                rule_duration_us,
                model_duration_us: None,
                short_circuited: true,
                rule: Some(rv.rule),
            };
            return (Verdict::from_rule(url, rv.rule, rv.label), stats);
        }

        let model_start = Instant::now();
        let features = self.extractor.extract(url);
        let prediction = self.model.predict(&features);
        let model_duration_us = model_start.elapsed().as_micros() as u64;

        debug!(
            url_len = url.len(),
            model = self.model.name(),
            label = %prediction.label,
            probability = prediction.probability,
            "Model decided"
        );

        let stats = PipelineStats {
            rule_duration_us,
            model_duration_us: Some(model_duration_us),
            short_circuited: false,
            rule: None,
        };
        (
            Verdict::from_model(url, prediction.label, prediction.probability, features),
            stats,
        )
    }

    /// Classifies a URL and returns only its label.
    pub fn label(&self, raw_url: &str) -> Label {
        self.classify(raw_url).label
    }
}

impl std::fmt::Debug for UrlPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlPipeline")
            .field("rules", &self.rules)
            .field("model", &self.model.name())
            .finish()
    }
}

/// Statistics about a single classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    /// Time spent evaluating rules (microseconds).
    pub rule_duration_us: u64,
    /// Time spent in feature extraction and the model (microseconds), if run.
    pub model_duration_us: Option<u64>,
    /// Whether a rule decided and the model was skipped.
    pub short_circuited: bool,
    /// The rule that fired, if any.
    pub rule: Option<RuleId>,
}

impl PipelineStats {
    /// Returns the total classification duration in microseconds.
    pub fn total_duration_us(&self) -> u64 {
        self.rule_duration_us + self.model_duration_us.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Prediction, RandomForest};
    use crate::features::FeatureRecord;
    use crate::verdict::VerdictSource;

    const DEMO: &str = include_str!("../../../models/demo_forest.json");

    fn pipeline() -> UrlPipeline {
        let model = RandomForest::from_json_str(DEMO).unwrap();
        UrlPipeline::new(DetectorConfig::default(), Arc::new(model)).unwrap()
    }

    struct WrongSchema {
        names: Vec<String>,
    }

    impl UrlClassifier for WrongSchema {
        fn predict(&self, _features: &FeatureRecord) -> Prediction {
            Prediction::from_probabilities([1.0, 0.0])
        }

        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn name(&self) -> &'static str {
            "wrong_schema"
        }
    }

    #[test]
    fn https_google_is_rule_safe() {
        let v = pipeline().classify("https://google.com");
        assert_eq!(v.label, Label::Safe);
        assert_eq!(v.confidence, 100.0);
        assert_eq!(v.source, VerdictSource::Rule);
        assert_eq!(v.rule, Some(RuleId::Https));
        assert!(v.features.is_none());
    }

    #[test]
    fn http_paypal_login_goes_to_model() {
        let v = pipeline().classify("http://paypal-login.com");
        assert_eq!(v.source, VerdictSource::Model);
        assert_eq!(v.label, Label::Malicious);
        assert!((v.confidence - 78.54).abs() < 1e-9);
        let features = v.features.unwrap();
        assert!(features.has_suspicious_words);
        assert!(!features.has_https);
    }

    #[test]
    fn ftp_is_rule_malicious() {
        let v = pipeline().classify("ftp://badsite.xyz");
        assert_eq!(v.label, Label::Malicious);
        assert_eq!(v.confidence, 100.0);
        assert_eq!(v.rule, Some(RuleId::UnsupportedScheme));
    }

    #[test]
    fn ru_tld_is_rule_malicious() {
        let v = pipeline().classify("http://secure-bank-login.ru");
        assert_eq!(v.label, Label::Malicious);
        assert_eq!(v.rule, Some(RuleId::UntrustedTld));
    }

    #[test]
    fn digit_brand_is_rule_malicious() {
        let v = pipeline().classify("http://g00gle.com");
        assert_eq!(v.label, Label::Malicious);
        assert_eq!(v.rule, Some(RuleId::Typosquat));
    }

    #[test]
    fn non_ascii_digit_brand_is_rule_malicious() {
        let v = pipeline().classify("http://google\u{0661}.com");
        assert_eq!(v.label, Label::Malicious);
        assert_eq!(v.rule, Some(RuleId::Typosquat));
        assert!(v.features.is_none());
    }

    #[test]
    fn loopback_wins_over_everything() {
        for url in [
            "ftp://localhost.xyz",
            "http://127.0.0.1:5000/login",
            "LOCALHOST",
            "http://g00gle.com/localhost",
        ] {
            let v = pipeline().classify(url);
            assert_eq!(v.label, Label::Safe, "{}", url);
            assert_eq!(v.rule, Some(RuleId::Loopback), "{}", url);
        }
    }

    #[test]
    fn url_is_trimmed_but_case_preserved() {
        let v = pipeline().classify("  HTTPS://Google.COM  ");
        assert_eq!(v.url, "HTTPS://Google.COM");
        assert_eq!(v.label, Label::Safe);
    }

    #[test]
    fn model_sees_case_preserved_url() {
        // Rules see "http://example.com" and defer; features use the original.
        let v = pipeline().classify("HTTP://Example.com");
        let features = v.features.unwrap();
        assert_eq!(features.length, 18);
        assert!(!features.has_https);
    }

    #[test]
    fn missing_field_is_invalid_input() {
        let err = pipeline().classify_field(None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput));

        let v = pipeline().classify_field(Some("https://google.com")).unwrap();
        assert_eq!(v.label, Label::Safe);
    }

    #[test]
    fn empty_url_is_malicious() {
        let v = pipeline().classify("   ");
        assert_eq!(v.url, "");
        assert_eq!(v.label, Label::Malicious);
        assert_eq!(v.rule, Some(RuleId::UnsupportedScheme));
    }

    #[test]
    fn stats_report_short_circuit() {
        let p = pipeline();
        let (_, stats) = p.classify_with_stats("https://google.com");
        assert!(stats.short_circuited);
        assert!(stats.model_duration_us.is_none());
        assert_eq!(stats.rule, Some(RuleId::Https));

        let (_, stats) = p.classify_with_stats("http://example.com");
        assert!(!stats.short_circuited);
        assert!(stats.model_duration_us.is_some());
        assert!(stats.rule.is_none());
        assert!(stats.total_duration_us() >= stats.rule_duration_us);
    }

    #[test]
    fn classification_is_idempotent() {
        let p = pipeline();
        for url in ["http://paypal-login.com", "https://google.com", "http://10.0.0.1.com"] {
            assert_eq!(p.classify(url), p.classify(url));
        }
    }

    #[test]
    fn concurrent_callers_agree() {
        let p = Arc::new(pipeline());
        let urls = ["http://paypal-login.com", "http://example.com", "www.github.com"];
        let expected: Vec<_> = urls.iter().map(|u| p.classify(u)).collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || urls.iter().map(|u| p.classify(u)).collect::<Vec<_>>())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn rejects_model_with_wrong_schema() {
        let model = WrongSchema {
            names: vec!["length".to_string()],
        };
        let err = UrlPipeline::new(DetectorConfig::default(), Arc::new(model)).unwrap_err();
        assert!(matches!(err, Error::ModelContractMismatch { .. }));
    }

    #[test]
    fn rejects_blank_config_entry() {
        let model = RandomForest::from_json_str(DEMO).unwrap();
        let config = DetectorConfig {
            brand_names: vec!["".to_string()],
            ..Default::default()
        };
        let err = UrlPipeline::new(config, Arc::new(model)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UrlPipeline>();
    }
}
