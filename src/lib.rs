//! A phishing-email classification service built on a fine-tuned ONNX
//! sequence-classification model.
//!
//! The crate has two halves:
//!
//! - [`classifier`] wraps the exported transformer artifact (`model.onnx` +
//!   `tokenizer.json`) and turns email text into a discrete
//!   legitimate/phishing label via arg-max over the model's two logits.
//! - [`server`] exposes the classifier behind a JSON API with user accounts,
//!   JWT bearer auth, and per-user prediction logging.
//!
//! # Basic usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rodcheck::{classify_email, Classifier};
//!
//! let classifier = Classifier::builder()
//!     .with_model_files("models/model.onnx", "models/tokenizer.json", Some(512))?
//!     .build()?;
//!
//! let prediction = classify_email(&classifier, "Did you finish work last week?")?;
//! println!("{}", prediction.label);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread safety
//!
//! The classifier is `Send + Sync`: it is built once at startup and shared
//! read-only across request handlers behind an `Arc`.

pub mod artifacts;
pub mod auth;
pub mod classifier;
pub mod config;
mod runtime;
pub mod server;
pub mod service;
pub mod store;

pub use artifacts::{ArtifactError, ArtifactStore, ModelArtifact};
pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, EmailClassifier, Prediction,
    PredictionLabel,
};
pub use config::Config;
pub use runtime::{create_session_builder, RuntimeConfig};
pub use server::AppState;
pub use service::{classify_email, PredictionService};
pub use store::Store;

pub fn init_logger() {
    env_logger::init();
}
