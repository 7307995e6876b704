//! Statistical fallback classification.
//!
//! The pipeline only talks to a [`UrlClassifier`]; [`RandomForest`] is the
//! implementation that evaluates an exported tree ensemble.

mod forest;

pub use forest::{ModelInfo, RandomForest, FORMAT_VERSION};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::FeatureRecord;
use crate::verdict::Label;

/// Output of a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted label.
    pub label: Label,
    /// Probability of `label` as a percentage, rounded to 2 decimal places (ties to even).
    pub probability: f64,
}

impl Prediction {
    /// Builds a prediction from per-class probabilities (`[safe, malicious]`).
    ///
    /// Picks the more likely class; a tie goes to safe.
    pub fn from_probabilities(proba: [f64; 2]) -> Self {
        let label = if proba[1] > proba[0] {
            Label::Malicious
        } else {
            Label::Safe
        };
        Self {
            label,
            probability: round2(proba[label.class_index()] * 100.0),
        }
    }
}

/// A trained binary URL classifier.
///
/// Implementations are immutable after construction and shared read-only by
/// every request, hence `&self` and the `Send + Sync` bound.
pub trait UrlClassifier: Send + Sync {
    /// Classifies a feature record.
    fn predict(&self, features: &FeatureRecord) -> Prediction;

    /// Feature names the classifier was trained on, in input order.
    fn feature_names(&self) -> &[String];

    /// Returns the name of this classifier for logging/debugging.
    fn name(&self) -> &'static str;
}

/// Checks that a classifier consumes exactly the extractor's feature schema.
pub fn validate_contract(classifier: &dyn UrlClassifier) -> Result<()> {
    let found = classifier.feature_names();
    if found.iter().map(String::as_str).eq(FeatureRecord::FIELD_NAMES) {
        Ok(())
    } else {
        Err(Error::ModelContractMismatch {
            expected: FeatureRecord::field_names(),
            found: found.to_vec(),
        })
    }
}

/// Rounds to 2 decimal places, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        names: Vec<String>,
    }

    impl UrlClassifier for FixedClassifier {
        fn predict(&self, _features: &FeatureRecord) -> Prediction {
            Prediction::from_probabilities([0.25, 0.75])
        }

        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn picks_more_likely_class() {
        let p = Prediction::from_probabilities([0.2, 0.8]);
        assert_eq!(p.label, Label::Malicious);
        assert_eq!(p.probability, 80.0);

        let p = Prediction::from_probabilities([0.875, 0.125]);
        assert_eq!(p.label, Label::Safe);
        assert_eq!(p.probability, 87.5);
    }

    #[test]
    fn tie_goes_to_safe() {
        let p = Prediction::from_probabilities([0.5, 0.5]);
        assert_eq!(p.label, Label::Safe);
        assert_eq!(p.probability, 50.0);
    }

    #[test]
    fn probability_rounded_to_two_places() {
        let p = Prediction::from_probabilities([1.0 / 3.0, 2.0 / 3.0]);
        assert_eq!(p.probability, 66.67);
    }

    #[test]
    fn exact_ties_round_to_even() {
        // 78.125 and 59.375 are exact in binary.
        let p = Prediction::from_probabilities([0.21875, 0.78125]);
        assert_eq!(p.probability, 78.12);

        let p = Prediction::from_probabilities([0.59375, 0.40625]);
        assert_eq!(p.label, Label::Safe);
        assert_eq!(p.probability, 59.38);
    }

    #[test]
    fn contract_accepts_matching_schema() {
        let c = FixedClassifier {
            names: FeatureRecord::field_names(),
        };
        assert!(validate_contract(&c).is_ok());
    }

    #[test]
    fn contract_rejects_reordered_schema() {
        let mut names = FeatureRecord::field_names();
        names.swap(0, 1);
        let c = FixedClassifier { names };
        let err = validate_contract(&c).unwrap_err();
        assert!(matches!(err, Error::ModelContractMismatch { .. }));
    }

    #[test]
    fn contract_rejects_missing_field() {
        let mut names = FeatureRecord::field_names();
        names.pop();
        let c = FixedClassifier { names };
        assert!(validate_contract(&c).is_err());
    }

    #[test]
    fn trait_object_works() {
        let c: Box<dyn UrlClassifier> = Box::new(FixedClassifier {
            names: FeatureRecord::field_names(),
        });
        let p = c.predict(&FeatureRecord::default());
        assert_eq!(p.label, Label::Malicious);
        assert_eq!(c.name(), "fixed");
    }
}
