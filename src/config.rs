//! Service configuration.
//!
//! Defaults match the development setup (port 5000, a React dev server as
//! the allowed CORS origin); every field can be overridden through
//! `RODCHECK_*` environment variables, and the CLI layers its flags on top.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Directory containing `model.onnx` and `tokenizer.json`; `None` falls
    /// back to the managed artifact cache
    pub model_dir: Option<PathBuf>,
    /// The single origin allowed by CORS
    pub cors_origin: String,
    pub jwt_secret: String,
    /// Whether successful predictions are persisted per user
    pub log_predictions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            model_dir: None,
            cors_origin: "http://localhost:3000".to_string(),
            jwt_secret: "rodcheck-dev-secret-change-in-production".to_string(),
            log_predictions: true,
        }
    }
}

impl Config {
    /// Applies `RODCHECK_*` environment overrides on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = env::var("RODCHECK_LISTEN") {
            match addr.parse() {
                Ok(parsed) => config.listen_addr = parsed,
                Err(e) => log::warn!("Ignoring invalid RODCHECK_LISTEN '{}': {}", addr, e),
            }
        }
        if let Ok(dir) = env::var("RODCHECK_MODEL_DIR") {
            config.model_dir = Some(PathBuf::from(dir));
        }
        if let Ok(origin) = env::var("RODCHECK_CORS_ORIGIN") {
            config.cors_origin = origin;
        }
        if let Ok(secret) = env::var("RODCHECK_JWT_SECRET") {
            config.jwt_secret = secret;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serve_on_port_5000() {
        let config = Config::default();
        assert_eq!(config.listen_addr.port(), 5000);
        assert!(config.log_predictions);
        assert!(config.model_dir.is_none());
    }
}
