//! Model artifact management: directory resolution, download, and
//! hash verification of the exported model and tokenizer files.

use sha2::{Digest, Sha256};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Artifact verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Describes a deployable model artifact pair: the exported ONNX graph and
/// its matching tokenizer.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    /// Directory name the artifact is cached under
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    /// Pinned SHA-256 digest of the model file; `None` skips verification
    /// (locally exported artifacts have no published digest)
    pub model_sha256: Option<String>,
    /// Pinned SHA-256 digest of the tokenizer file
    pub tokenizer_sha256: Option<String>,
    /// Model window; longer inputs are truncated at inference time
    pub max_sequence_length: usize,
    pub num_labels: usize,
}

impl ModelArtifact {
    /// The fine-tuned DistilBERT phishing model this service ships with.
    ///
    /// Characteristics:
    /// - Max sequence length: 512
    /// - Labels: 2 (0 = legitimate, 1 = phishing)
    /// - Trained on email bodies prefixed with the `URL_FLAG_{0,1}` marker
    pub fn distilbert_phishing() -> Self {
        Self {
            name: "rodcheck-distilbert".to_string(),
            model_url:
                "https://huggingface.co/rodcheck/rodcheck-distilbert/resolve/main/model.onnx"
                    .to_string(),
            tokenizer_url:
                "https://huggingface.co/rodcheck/rodcheck-distilbert/resolve/main/tokenizer.json"
                    .to_string(),
            model_sha256: None,
            tokenizer_sha256: None,
            max_sequence_length: 512,
            num_labels: 2,
        }
    }
}

/// Local cache of model artifacts, keyed by artifact name.
#[derive(Clone)]
pub struct ArtifactStore {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ArtifactStore {
    /// Creates a new ArtifactStore with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_models_dir())
    }

    /// Returns the default models directory path
    pub fn default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("RODCHECK_MODEL_DIR") {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("rodcheck").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("rodcheck").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("rodcheck").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn model_path(&self, artifact: &ModelArtifact) -> PathBuf {
        self.models_dir.join(&artifact.name).join("model.onnx")
    }

    pub fn tokenizer_path(&self, artifact: &ModelArtifact) -> PathBuf {
        self.models_dir.join(&artifact.name).join("tokenizer.json")
    }

    pub fn is_present(&self, artifact: &ModelArtifact) -> bool {
        let model_path = self.model_path(artifact);
        let tokenizer_path = self.tokenizer_path(artifact);
        log::debug!(
            "Artifact check: model {:?} (exists: {}), tokenizer {:?} (exists: {})",
            model_path,
            model_path.exists(),
            tokenizer_path,
            tokenizer_path.exists()
        );
        model_path.exists() && tokenizer_path.exists()
    }

    /// Downloads both artifact files, verifying pinned hashes where present.
    /// Partial downloads are cleaned up on failure.
    pub async fn download(&self, artifact: &ModelArtifact) -> Result<(), ArtifactError> {
        let _lock = self.download_lock.lock().await;

        let artifact_dir = self.models_dir.join(&artifact.name);
        log::info!("Creating artifact directory at {:?}", artifact_dir);
        fs::create_dir_all(&artifact_dir)?;

        let model_result = self
            .fetch_file(
                &artifact.model_url,
                &self.model_path(artifact),
                artifact.model_sha256.as_deref(),
                "model",
            )
            .await;
        let tokenizer_result = self
            .fetch_file(
                &artifact.tokenizer_url,
                &self.tokenizer_path(artifact),
                artifact.tokenizer_sha256.as_deref(),
                "tokenizer",
            )
            .await;

        match (model_result, tokenizer_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model and tokenizer ready to use");
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                log::error!("Failed to set up artifact files: {}", e);
                let _ = self.remove(artifact);
                Err(e)
            }
        }
    }

    /// Verifies both files against their pinned hashes. Files without a
    /// pinned hash pass if they exist.
    pub fn verify(&self, artifact: &ModelArtifact) -> Result<bool, ArtifactError> {
        let model_path = self.model_path(artifact);
        let tokenizer_path = self.tokenizer_path(artifact);

        if !model_path.exists() || !tokenizer_path.exists() {
            log::info!("One or both artifact files do not exist");
            return Ok(false);
        }

        let model_ok = match &artifact.model_sha256 {
            Some(expected) => self.verify_file(&model_path, expected)?,
            None => true,
        };
        let tokenizer_ok = match &artifact.tokenizer_sha256 {
            Some(expected) => self.verify_file(&tokenizer_path, expected)?,
            None => true,
        };

        Ok(model_ok && tokenizer_ok)
    }

    pub fn remove(&self, artifact: &ModelArtifact) -> Result<(), ArtifactError> {
        let model_path = self.model_path(artifact);
        let tokenizer_path = self.tokenizer_path(artifact);

        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        if tokenizer_path.exists() {
            fs::remove_file(&tokenizer_path)?;
        }
        Ok(())
    }

    /// Ensures that an artifact is downloaded and verified.
    /// If it doesn't exist it is downloaded; if verification fails it is
    /// re-downloaded.
    pub async fn ensure_present(&self, artifact: &ModelArtifact) -> Result<(), ArtifactError> {
        if !self.is_present(artifact) {
            log::info!("Artifact '{}' not found, downloading...", artifact.name);
            self.download(artifact).await?;
        } else if !self.verify(artifact)? {
            log::warn!(
                "Artifact '{}' failed verification, re-downloading...",
                artifact.name
            );
            self.remove(artifact)?;
            self.download(artifact).await?;
        }
        Ok(())
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());
        log::debug!(
            "Verifying {:?}: calculated {}, expected {}",
            path,
            hash,
            expected_hash
        );
        Ok(hash == expected_hash)
    }

    async fn fetch_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ArtifactError> {
        if path.exists() {
            match expected_hash {
                Some(expected) if !self.verify_file(path, expected)? => {
                    log::warn!("{} file failed verification, redownloading", file_type);
                }
                _ => {
                    log::info!("Existing {} file is usable, skipping download", file_type);
                    return Ok(());
                }
            }
        }

        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            let hash = format!("{:x}", hasher.finalize());
            if hash != expected {
                log::error!(
                    "{} hash mismatch: expected {}, got {}",
                    file_type,
                    expected,
                    hash
                );
                return Err(ArtifactError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if let Some(expected) = expected_hash {
            if !self.verify_file(path, expected)? {
                return Err(ArtifactError::VerificationFailed);
            }
        }

        log::info!("{} file downloaded successfully", file_type);
        Ok(())
    }
}
