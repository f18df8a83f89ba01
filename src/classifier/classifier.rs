use ort::session::Session;
use std::sync::Arc;
use tokenizers::Tokenizer;

use super::encoding::TextInference;
use super::error::ClassifierError;
use super::{ClassifierInfo, EmailClassifier, Prediction};

/// A thread-safe email classifier backed by a fine-tuned ONNX
/// sequence-classification model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are
/// thread-safe: `String` and `usize` are `Send + Sync`, and the `Tokenizer`
/// and `Session` are wrapped in `Arc` and only ever read after construction.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use rodcheck::Classifier;
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(
///     Classifier::builder()
///         .with_model_files("models/model.onnx", "models/tokenizer.json", Some(512))?
///         .build()?,
/// );
///
/// let classifier_clone = Arc::clone(&classifier);
/// thread::spawn(move || {
///     classifier_clone.predict("URL_FLAG_0 test text").unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub(super) model_path: String,
    pub(super) tokenizer_path: String,
    pub(super) tokenizer: Arc<Tokenizer>,
    pub(super) session: Arc<Session>,
    pub(super) max_sequence_length: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl TextInference for Classifier {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.max_sequence_length)
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's loaded artifact.
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            num_labels: 2,
            max_sequence_length: self.max_sequence_length,
        }
    }

    /// Predicts the class of the input text.
    ///
    /// The text is expected to carry the URL flag marker already; callers go
    /// through [`crate::classify_email`] or the prediction service, which
    /// apply the canonical preprocessing rule.
    ///
    /// Inference is deterministic: with a fixed artifact, the same input
    /// always yields the same logits and label.
    ///
    /// # Errors
    /// - `ValidationError` if the text is empty
    /// - `TokenizerError` / `ModelError` forwarded from the inference path
    pub fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        if text.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Input text cannot be empty".into(),
            ));
        }
        self.infer(text)
    }
}

impl EmailClassifier for Classifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        self.predict(text)
    }
}
