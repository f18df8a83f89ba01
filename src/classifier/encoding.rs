use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use std::collections::HashMap;
use tokenizers::Tokenizer;

use super::error::ClassifierError;
use super::Prediction;

/// Runs text through the fine-tuned sequence-classification model.
///
/// This trait handles the path from raw (already feature-tagged) text to a
/// discrete prediction:
/// 1. Tokenization with special tokens, truncated to the model window
/// 2. Building the input_ids / attention_mask tensors
/// 3. The forward pass
/// 4. Arg-max over the two output logits
///
/// The ONNX model is expected to:
/// - Accept two inputs: input_ids and attention_mask (both shape
///   [batch_size, sequence_length])
/// - Output logits of shape [batch_size, num_labels] with num_labels = 2
pub(crate) trait TextInference {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the maximum sequence length the model can handle
    fn max_sequence_length(&self) -> Option<usize>;

    /// Converts text into token IDs suitable for model input.
    ///
    /// Over-long inputs are truncated to the model window rather than
    /// rejected; the model saw truncated sequences at training time, so this
    /// keeps serving behavior aligned with training behavior. Truncation
    /// drops content tokens and keeps the trailing separator, matching how
    /// the training pipeline truncated.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized
    /// - `TokenizerError` if the text cannot be encoded
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        let tokenizer = self
            .tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;
        let max_length = self
            .max_sequence_length()
            .ok_or_else(|| ClassifierError::TokenizerError("Max sequence length not set".into()))?;

        // Special tokens on: the fine-tuned head reads the [CLS] position.
        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        let mut token_ids = encoding.get_ids().to_vec();
        truncate_keeping_separator(&mut token_ids, max_length);
        Ok(token_ids)
    }

    /// Runs the forward pass and returns the raw two-class logits.
    ///
    /// # Errors
    /// - `ModelError` if the session is not initialized
    /// - `ModelError` if tensor creation, execution, or extraction fails
    /// - `ModelError` if the output shape is not [1, 2]
    fn logits(&self, tokens: &[u32]) -> Result<[f32; 2], ClassifierError> {
        let session = self
            .session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;

        let input_array = Array2::from_shape_vec(
            (1, tokens.len()),
            tokens.iter().map(|&x| x as i64).collect(),
        )
        .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        // No padding in a batch of one, so the mask is all ones.
        let mask_array = Array2::from_shape_vec((1, tokens.len()), vec![1i64; tokens.len()])
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask array: {}", e)))?;
        let mask_dyn = mask_array.into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(&input_ids).map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create input tensor: {}", e))
            })?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(&attention_mask).map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e))
            })?,
        );

        let outputs = session
            .run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e))
        })?;

        let shape = output_tensor.shape();
        if shape.len() != 2 || shape[1] != 2 {
            return Err(ClassifierError::ModelError(format!(
                "Unexpected logits shape {:?}, expected [1, 2]",
                shape
            )));
        }

        let row: ndarray::ArrayView1<f32> = output_tensor.slice(ndarray::s![0, ..]);
        Ok([row[[0]], row[[1]]])
    }

    /// Tokenizes, runs inference, and maps the logits to a prediction.
    ///
    /// # Errors
    /// - Forwards all errors from `tokenize()` and `logits()`
    fn infer(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let tokens = self.tokenize(text)?;
        let logits = self.logits(&tokens)?;
        Ok(Prediction::from_logits(logits))
    }
}

/// Truncates an encoded sequence to `max_length` the way the training
/// pipeline did: content tokens are dropped, the trailing separator stays.
/// A plain `truncate()` would instead chop the separator off, handing the
/// model a sequence shape it never saw during fine-tuning.
pub(crate) fn truncate_keeping_separator(token_ids: &mut Vec<u32>, max_length: usize) {
    if token_ids.len() <= max_length {
        return;
    }
    if let Some(&separator) = token_ids.last() {
        token_ids.truncate(max_length.saturating_sub(1));
        token_ids.push(separator);
    }
}
