pub mod local;
pub mod prompt;

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use crate::config::{AnalysisConfig, BackendKind, EnvConfig};
use crate::data::gemini_api::GeminiClient;
use crate::data::types::Market;
use local::LocalAnalyzer;

/// Built-in system instruction shared by every backend
pub const SYSTEM_INSTRUCTION: &str = include_str!("instruction.md");

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("API key is missing. Please set GEMINI_API_KEY.")]
    MissingApiKey,

    #[error("Failed to read system instruction {path}: {source}")]
    Instruction {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Turns a market snapshot into analysis text
pub trait AnalysisBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze<'a>(&'a self, market: &'a Market) -> BoxFuture<'a, Result<String, AnalysisError>>;
}

/// Select the backend named in config
pub fn build_backend(
    config: &AnalysisConfig,
    env: &EnvConfig,
) -> Result<Arc<dyn AnalysisBackend>, AnalysisError> {
    match config.backend {
        BackendKind::Local => Ok(Arc::new(LocalAnalyzer::new(Duration::from_millis(
            config.latency_ms,
        )))),
        BackendKind::Gemini => {
            let instruction = match &config.instruction_path {
                Some(path) => std::fs::read_to_string(path).map_err(|source| {
                    AnalysisError::Instruction {
                        path: path.clone(),
                        source,
                    }
                })?,
                None => SYSTEM_INSTRUCTION.to_string(),
            };

            Ok(Arc::new(GeminiClient::new(
                config.base_url.clone(),
                config.model.clone(),
                config.temperature,
                instruction,
                env.gemini_api_key.clone(),
            )))
        }
    }
}
