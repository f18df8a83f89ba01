use log::{error, info};
use ort::session::Session;
use std::sync::Arc;
use tokenizers::Tokenizer;

use super::classifier::Classifier;
use super::error::ClassifierError;
use crate::artifacts::{ArtifactStore, ModelArtifact};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Default model window when the caller does not specify one; matches the
/// DistilBERT family the service is fine-tuned from.
const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// A builder for constructing a [`Classifier`] with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    max_sequence_length: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty builder with default runtime configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads a managed artifact from the local artifact store.
    ///
    /// # Errors
    /// Returns `BuildError` if the paths are already set, the artifact is not
    /// downloaded, or the model/tokenizer fail to load.
    pub fn with_artifact(
        self,
        store: &ArtifactStore,
        artifact: &ModelArtifact,
    ) -> Result<Self, ClassifierError> {
        if !store.is_present(artifact) {
            return Err(ClassifierError::BuildError(format!(
                "Model artifact '{}' is not downloaded. Fetch it first with ArtifactStore::download()",
                artifact.name
            )));
        }

        let model_path = store.model_path(artifact);
        let tokenizer_path = store.tokenizer_path(artifact);
        self.with_model_files(
            &model_path.to_string_lossy(),
            &tokenizer_path.to_string_lossy(),
            Some(artifact.max_sequence_length),
        )
    }

    /// Sets explicit model and tokenizer file paths.
    ///
    /// # Arguments
    /// * `model_path` - Path to the exported ONNX model file
    /// * `tokenizer_path` - Path to the tokenizer file
    /// * `max_sequence_length` - Optional model window; defaults to 512
    ///   tokens when not provided. Inputs longer than this are truncated.
    ///
    /// # Errors
    /// Returns `BuildError` if the paths are empty or already set, the files
    /// don't exist, loading fails, or the model structure is invalid.
    pub fn with_model_files(
        mut self,
        model_path: &str,
        tokenizer_path: &str,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths cannot be empty".to_string(),
            ));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths already set".to_string(),
            ));
        }
        if !std::path::Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Model file not found: {}",
                model_path
            )));
        }
        if !std::path::Path::new(tokenizer_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Tokenizer file not found: {}",
                tokenizer_path
            )));
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        // Create session using the singleton environment
        let session = create_session_builder(&self.runtime_config)?.commit_from_file(model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.max_sequence_length =
            Some(max_sequence_length.unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH));
        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(self)
    }

    /// Builds and returns the final [`Classifier`] instance.
    ///
    /// # Errors
    /// Returns `BuildError` if no model and tokenizer have been loaded.
    pub fn build(mut self) -> Result<Classifier, ClassifierError> {
        if self.model_path.is_none() || self.tokenizer_path.is_none() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths must be set".to_string(),
            ));
        }

        let tokenizer = Arc::new(
            self.tokenizer
                .take()
                .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?,
        );
        let session = Arc::new(
            self.session
                .take()
                .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?,
        );
        let max_sequence_length = self
            .max_sequence_length
            .ok_or_else(|| ClassifierError::BuildError("Max sequence length not set".into()))?;

        Ok(Classifier {
            model_path: self.model_path.take().unwrap(),
            tokenizer_path: self.tokenizer_path.take().unwrap(),
            tokenizer,
            session,
            max_sequence_length,
        })
    }

    /// Validates that the model has the expected input/output structure.
    ///
    /// # Errors
    /// Returns `ModelError` if the model is missing the two required input
    /// tensors or has no output tensor for the logits.
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(ClassifierError::ModelError(format!(
                "Model must have at least 2 inputs (input_ids and attention_mask), found {}",
                inputs.len()
            )));
        }

        let outputs = &session.outputs;
        if outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for the logits".to_string(),
            ));
        }

        Ok(())
    }
}
