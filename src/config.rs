use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_STEM: &str = "deposit-workflow";
pub const ENV_PREFIX: &str = "DEPOSIT_WORKFLOW";

/// Main configuration structure for the deposit workflow
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DepositConfig {
    /// Where the workflow sends the browser
    pub routes: RoutesConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Orchestrator settings
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RoutesConfig {
    /// Landing page after a draft was deleted
    pub uploads_url: String,
    /// Preview page; `{id}` is replaced by the draft identifier
    pub preview_url_template: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON formatted logs
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Buffered actions per subscriber before slow subscribers lag
    pub event_capacity: usize,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            uploads_url: "/me/uploads".to_string(),
            preview_url_template: "/records/{id}?preview=1".to_string(),
        }
    }
}

impl RoutesConfig {
    pub fn preview_url(&self, draft_id: &str) -> String {
        self.preview_url_template.replace("{id}", draft_id)
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { event_capacity: 64 }
    }
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            routes: RoutesConfig::default(),
            observability: ObservabilityConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

impl DepositConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (deposit-workflow.toml)
    /// 3. Environment variables (DEPOSIT_WORKFLOW__SECTION__KEY)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(&format!("{CONFIG_FILE_STEM}.toml")))
    }

    /// Same as [`DepositConfig::load`] with an explicit configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&DepositConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<DepositConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = DepositConfig::load_env_file();
        DepositConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static DepositConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
