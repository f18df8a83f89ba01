//! Email classification on top of a fine-tuned ONNX sequence-classification
//! model.

mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod encoding;
mod error;
pub mod features;

pub use builder::ClassifierBuilder;
pub use classifier::Classifier;
pub use error::ClassifierError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete outcome of a single classification.
///
/// The class indices match the labels the model was fine-tuned with:
/// 0 = legitimate, 1 = phishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionLabel {
    Legit,
    Phishing,
}

impl PredictionLabel {
    /// Maps a class index (the arg-max over the model's logits) to a label.
    pub fn from_index(index: usize) -> Self {
        if index == 1 {
            Self::Phishing
        } else {
            Self::Legit
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Legit => 0,
            Self::Phishing => 1,
        }
    }

    /// The human-readable label string returned on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legit => "Legit ✅",
            Self::Phishing => "Phishing 🚨",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one forward pass: the arg-max label plus the raw logits.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub label: PredictionLabel,
    /// Raw, unnormalized per-class scores, indexed by class.
    pub logits: [f32; 2],
}

impl Prediction {
    /// Arg-max over the two class logits. Ties resolve to legitimate.
    pub fn from_logits(logits: [f32; 2]) -> Self {
        let label = if logits[1] > logits[0] {
            PredictionLabel::Phishing
        } else {
            PredictionLabel::Legit
        };
        Self { label, logits }
    }
}

/// The classification seam between the inference stack and the service layer.
///
/// The production implementation is [`Classifier`]; tests substitute
/// deterministic stand-ins so the HTTP surface can be exercised without
/// model artifacts on disk.
pub trait EmailClassifier: Send + Sync {
    /// Classifies already-preprocessed text (URL flag marker included).
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError>;
}

/// Information about a loaded classifier's artifact and limits.
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    pub model_path: String,
    pub tokenizer_path: String,
    pub num_labels: usize,
    pub max_sequence_length: usize,
}
