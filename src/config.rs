use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Wait before reloading the waybill list after a bulk save
    pub refresh_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            backend: BackendConfig {
                base_url: "http://localhost:3000/api".to_string(),
                timeout_secs: 30,
                api_token: None,
            },
            workflow: WorkflowConfig {
                refresh_delay_ms: 1500,
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then `obra-guias.{toml,yaml,json}` if present, then
    /// `OBRA_GUIAS__SECTION__KEY` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("backend.base_url", defaults.backend.base_url)?
            .set_default("backend.timeout_secs", defaults.backend.timeout_secs as i64)?
            .set_default("workflow.refresh_delay_ms", defaults.workflow.refresh_delay_ms as i64)?
            .add_source(config::File::with_name("obra-guias").required(false))
            .add_source(
                config::Environment::with_prefix("OBRA_GUIAS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
