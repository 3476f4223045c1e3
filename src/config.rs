use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_seed_history_len")]
    pub seed_history_len: usize,
    #[serde(default = "default_seed_step_secs")]
    pub seed_step_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Gemini,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Overrides the built-in system instruction when set
    #[serde(default)]
    pub instruction_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_summary_every_ticks")]
    pub summary_every_ticks: u64,
    #[serde(default)]
    pub auto_analyze_secs: Option<u64>,
}

fn default_tick_interval_ms() -> u64 { 2000 }
fn default_history_window() -> usize { 50 }
fn default_seed_history_len() -> usize { 50 }
fn default_seed_step_secs() -> u64 { 5 }
fn default_latency_ms() -> u64 { 1500 }
fn default_model() -> String { "gemini-3-flash-preview".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_base_url() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_summary_every_ticks() -> u64 { 15 }

/// Seeded samples are at most one day apart
pub const MAX_SEED_STEP_SECS: u64 = 86_400;

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            history_window: default_history_window(),
            seed_history_len: default_seed_history_len(),
            seed_step_secs: default_seed_step_secs(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            latency_ms: default_latency_ms(),
            model: default_model(),
            temperature: default_temperature(),
            base_url: default_base_url(),
            instruction_path: None,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            summary_every_ticks: default_summary_every_ticks(),
            auto_analyze_secs: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub gemini_api_key: Option<String>,
    pub config_path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or run on defaults when the file does not exist
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::warn!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.simulation.tick_interval_ms == 0 {
            anyhow::bail!("simulation.tick_interval_ms must be greater than zero");
        }
        if self.simulation.history_window == 0 {
            anyhow::bail!("simulation.history_window must be greater than zero");
        }
        if self.simulation.seed_history_len > self.simulation.history_window {
            anyhow::bail!(
                "simulation.seed_history_len ({}) must not exceed simulation.history_window ({})",
                self.simulation.seed_history_len,
                self.simulation.history_window
            );
        }
        if self.simulation.seed_step_secs > MAX_SEED_STEP_SECS {
            anyhow::bail!(
                "simulation.seed_step_secs must be at most {}",
                MAX_SEED_STEP_SECS
            );
        }
        if self.monitoring.auto_analyze_secs == Some(0) {
            anyhow::bail!("monitoring.auto_analyze_secs must be greater than zero");
        }
        Ok(())
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            config_path: std::env::var("OTC_CONFIG")
                .unwrap_or_else(|_| "config.toml".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.simulation.tick_interval_ms, 2000);
        assert_eq!(config.simulation.history_window, 50);
        assert_eq!(config.simulation.seed_history_len, 50);
        assert_eq!(config.analysis.backend, BackendKind::Local);
        assert_eq!(config.analysis.latency_ms, 1500);
        assert!(config.monitoring.auto_analyze_secs.is_none());
    }

    #[test]
    fn test_parse_gemini_backend() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            backend = "gemini"
            temperature = 0.2

            [monitoring]
            auto_analyze_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.backend, BackendKind::Gemini);
        assert!((config.analysis.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.analysis.model, "gemini-3-flash-preview");
        assert_eq!(config.monitoring.auto_analyze_secs, Some(30));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config: Config = toml::from_str("[simulation]\ntick_interval_ms = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_seed_longer_than_window() {
        let config: Config =
            toml::from_str("[simulation]\nhistory_window = 50\nseed_history_len = 60").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("seed_history_len"));

        let config: Config =
            toml::from_str("[simulation]\nhistory_window = 60\nseed_history_len = 60").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_seed_step() {
        let config: Config = toml::from_str("[simulation]\nseed_step_secs = 86400").unwrap();
        assert!(config.validate().is_ok());

        let config: Config =
            toml::from_str("[simulation]\nseed_step_secs = 9223372036854775807").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_backend_fails_to_parse() {
        let parsed: Result<Config, _> = toml::from_str("[analysis]\nbackend = \"openai\"");
        assert!(parsed.is_err());
    }
}
