//! PhishGuard Core - URL classification pipeline.
//!
//! A URL is first run through an ordered set of deterministic rules
//! ([`RuleEngine`]). Obvious cases stop there; everything else is reduced to
//! a fixed [`FeatureRecord`] and handed to a trained binary classifier
//! ([`classifier::RandomForest`]). [`UrlPipeline`] sequences both stages and
//! assembles the [`Verdict`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use phishguard_core::{classifier::RandomForest, DetectorConfig, UrlPipeline};
//!
//! let model = RandomForest::load("models/url_forest.json").unwrap();
//! let pipeline = UrlPipeline::new(DetectorConfig::default(), Arc::new(model)).unwrap();
//! let verdict = pipeline.classify("https://google.com");
//! assert_eq!(verdict.label.as_str(), "safe");
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod rule_engine;
pub mod typosquat;
pub mod verdict;

pub use classifier::{Prediction, UrlClassifier};
pub use config::DetectorConfig;
pub use error::{Error, Result};
pub use features::{FeatureExtractor, FeatureRecord};
pub use pipeline::{PipelineStats, UrlPipeline};
pub use rule_engine::{RuleEngine, RuleId, RuleVerdict};
pub use typosquat::TyposquatDetector;
pub use verdict::{Label, Verdict, VerdictSource};
