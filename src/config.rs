use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SynapticConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
    pub tracer: TracerConfig,
    pub scheduler: SchedulerConfig,
    pub sequencer: SequencerConfig,
    pub graph: GraphConfig,
    pub promotion: PromotionConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub graph_file: String,
    pub analytics_file: String,
    pub reports_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub provider: String,
    pub model: String,
    pub api_endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TracerConfig {
    pub p_init: f64,
    pub p_learn: f64,
    pub p_guess: f64,
    pub p_slip: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    pub min_ease: f64,
    /// Ease factor given to concepts when a build creates them.
    pub default_ease: f64,
    pub max_interval_days: f64,
    pub due_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SequencerConfig {
    pub interleave_ratio: f64,
    pub prereq_threshold: f64,
    pub default_session_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphConfig {
    pub max_initial_bloom: u8,
    pub reject_cycles: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PromotionConfig {
    pub p_know_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub study_minutes: u32,
    pub min_sessions_for_insights: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_synaptic_dir().to_string_lossy().into_owned(),
            graph_file: "knowledge_graph.json".into(),
            analytics_file: "analytics.jsonl".into(),
            reports_dir: "reports".into(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            api_endpoint: "https://api.openai.com/v1".into(),
            api_key: None,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            p_init: 0.1,
            p_learn: 0.15,
            p_guess: 0.25,
            p_slip: 0.1,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_ease: 1.3,
            default_ease: 2.5,
            max_interval_days: 365.0,
            due_limit: 10,
        }
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            interleave_ratio: 0.3,
            prereq_threshold: 0.6,
            default_session_length: 5,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_initial_bloom: 3,
            reject_cycles: false,
        }
    }
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            p_know_threshold: 0.7,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            study_minutes: 5,
            min_sessions_for_insights: 3,
        }
    }
}

/// Returns `~/.synaptic/`, or `./.synaptic` when no home directory is known.
pub fn default_synaptic_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".synaptic")
}

/// Returns the default config file path: `~/.synaptic/config.toml`
pub fn default_config_path() -> PathBuf {
    default_synaptic_dir().join("config.toml")
}

impl SynapticConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SynapticConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (SYNAPTIC_DATA_DIR, SYNAPTIC_LOG_LEVEL, SYNAPTIC_API_KEY, SYNAPTIC_MODEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SYNAPTIC_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("SYNAPTIC_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("SYNAPTIC_API_KEY") {
            self.generator.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("SYNAPTIC_MODEL") {
            self.generator.model = val;
        }
    }

    /// Resolve the data directory, expanding `~` if needed.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
    }

    pub fn graph_path(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.storage.graph_file)
    }

    pub fn analytics_path(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.storage.analytics_file)
    }

    pub fn reports_path(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.storage.reports_dir)
    }

    /// Point every storage path under `dir`. Used by tests and `--data-dir`.
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.storage.data_dir = dir.as_ref().to_string_lossy().into_owned();
        self
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SynapticConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.tracer.p_learn, 0.15);
        assert_eq!(config.scheduler.due_limit, 10);
        assert_eq!(config.sequencer.interleave_ratio, 0.3);
        assert_eq!(config.graph.max_initial_bloom, 3);
        assert!(config.graph_path().ends_with("knowledge_graph.json"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
data_dir = "/tmp/synaptic-test"

[sequencer]
interleave_ratio = 0.5

[graph]
reject_cycles = true
"#;
        let config: SynapticConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.sequencer.interleave_ratio, 0.5);
        assert!(config.graph.reject_cycles);
        assert_eq!(
            config.analytics_path(),
            PathBuf::from("/tmp/synaptic-test/analytics.jsonl")
        );
        // defaults still apply for unset fields
        assert_eq!(config.sequencer.default_session_length, 5);
        assert_eq!(config.storage.graph_file, "knowledge_graph.json");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = SynapticConfig::default();
        std::env::set_var("SYNAPTIC_DATA_DIR", "/tmp/override");
        std::env::set_var("SYNAPTIC_LOG_LEVEL", "trace");
        std::env::set_var("SYNAPTIC_API_KEY", "sk-test");

        config.apply_env_overrides();

        assert_eq!(config.storage.data_dir, "/tmp/override");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.generator.api_key.as_deref(), Some("sk-test"));

        // Clean up
        std::env::remove_var("SYNAPTIC_DATA_DIR");
        std::env::remove_var("SYNAPTIC_LOG_LEVEL");
        std::env::remove_var("SYNAPTIC_API_KEY");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SynapticConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.promotion.p_know_threshold, 0.7);
    }
}
