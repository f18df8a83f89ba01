//! Prediction orchestration: feature injection, inference, label mapping,
//! and per-user logging.

use log::debug;
use std::sync::Arc;

use crate::classifier::{features, ClassifierError, EmailClassifier, Prediction, PredictionLabel};
use crate::store::Store;

/// Applies the canonical preprocessing and runs one classification.
///
/// Every inference path in the binary goes through this function, so the
/// URL-flag rule applied at serving time cannot drift from the one applied
/// when the training data was prepared.
pub fn classify_email(
    classifier: &dyn EmailClassifier,
    email_text: &str,
) -> Result<Prediction, ClassifierError> {
    classifier.classify(&features::with_url_flag(email_text))
}

/// Runs the full inference pipeline for one request and records the outcome.
#[derive(Clone)]
pub struct PredictionService {
    classifier: Arc<dyn EmailClassifier>,
    store: Store,
    log_predictions: bool,
}

impl PredictionService {
    pub fn new(classifier: Arc<dyn EmailClassifier>, store: Store, log_predictions: bool) -> Self {
        Self {
            classifier,
            store,
            log_predictions,
        }
    }

    /// Classifies an email body on behalf of `username`.
    ///
    /// The original (untagged) email text is what gets persisted; the URL
    /// flag is derived per request, not stored.
    pub async fn predict(
        &self,
        username: &str,
        email_text: &str,
    ) -> Result<PredictionLabel, ClassifierError> {
        let prediction = classify_email(self.classifier.as_ref(), email_text)?;
        debug!(
            "classified email for '{}': {} (logits {:?})",
            username, prediction.label, prediction.logits
        );

        if self.log_predictions {
            self.store
                .append_prediction(username, email_text, prediction.label)
                .await;
        }

        Ok(prediction.label)
    }
}
