//! Classification outcome types.

use serde::{Deserialize, Serialize};

use crate::features::FeatureRecord;
use crate::rule_engine::RuleId;

/// Binary classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// The URL is considered safe.
    Safe,
    /// The URL is considered malicious.
    Malicious,
}

impl Label {
    /// Maps a model class index to a label (`0` safe, `1` malicious).
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Label::Safe),
            1 => Some(Label::Malicious),
            _ => None,
        }
    }

    /// Returns the model class index for this label.
    pub fn class_index(&self) -> usize {
        match self {
            Label::Safe => 0,
            Label::Malicious => 1,
        }
    }

    /// Returns the wire name of this label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Safe => "safe",
            Label::Malicious => "malicious",
        }
    }

    /// Returns true if this is [`Label::Malicious`].
    pub fn is_malicious(&self) -> bool {
        matches!(self, Label::Malicious)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    /// A deterministic rule decided.
    Rule,
    /// The statistical model decided.
    Model,
}

/// Final classification of a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// The trimmed input URL, case preserved.
    pub url: String,
    /// Predicted label.
    #[serde(rename = "prediction")]
    pub label: Label,
    /// Confidence in `label`, as a percentage in `[0, 100]`.
    pub confidence: f64,
    /// Which stage decided.
    pub source: VerdictSource,
    /// The rule that fired, for rule-sourced verdicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleId>,
    /// Features the model saw; `None` for rule-sourced verdicts.
    #[serde(default)]
    pub features: Option<FeatureRecord>,
}

impl Verdict {
    /// Confidence reported for every rule-sourced verdict.
    pub const RULE_CONFIDENCE: f64 = 100.0;

    /// Creates a verdict decided by a rule.
    pub fn from_rule(url: impl Into<String>, rule: RuleId, label: Label) -> Self {
        Self {
            url: url.into(),
            label,
            confidence: Self::RULE_CONFIDENCE,
            source: VerdictSource::Rule,
            rule: Some(rule),
            features: None,
        }
    }

    /// Creates a verdict decided by the model.
    pub fn from_model(
        url: impl Into<String>,
        label: Label,
        confidence: f64,
        features: FeatureRecord,
    ) -> Self {
        Self {
            url: url.into(),
            label,
            confidence: confidence.clamp(0.0, 100.0),
            source: VerdictSource::Model,
            rule: None,
            features: Some(features),
        }
    }

    /// Returns true if the URL was classified as malicious.
    pub fn is_malicious(&self) -> bool {
        self.label.is_malicious()
    }

    /// Returns true if a rule decided this verdict.
    pub fn is_rule_decided(&self) -> bool {
        self.source == VerdictSource::Rule
    }
}
