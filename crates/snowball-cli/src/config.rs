//! Configuration file support

use serde::{Deserialize, Serialize};
use snowball_agent::{OperationKind, OperationSpec, Operations, RouterConfig, router};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for snowball
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gateway endpoint (`POST` target for streamed responses)
    pub endpoint: Option<String>,
    /// Seconds to wait for the next chunk before a call counts as stalled
    pub idle_timeout_secs: Option<u64>,
    /// Pay-phase input longer than this is treated as a payment id
    pub transaction_threshold: Option<usize>,
    /// Checkout link offered once a scene is ready
    pub checkout_url: Option<String>,
    /// Per-operation model overrides
    #[serde(default)]
    pub models: Models,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// Model overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Models {
    pub search: Option<String>,
    pub scene: Option<String>,
    pub payment: Option<String>,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub search: Option<String>,
    pub scene: Option<String>,
    pub payment: Option<String>,
    /// Key forwarded to the payment tool server
    pub razorpay: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snowball")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SNOWBALL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from a file; a missing or broken file yields defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Write the example config if no file exists yet
    pub fn init(path: &Path) -> std::io::Result<PathBuf> {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, example_config())?;
        Ok(path.to_path_buf())
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| snowball_ai::providers::responses::DEFAULT_ENDPOINT.to_string())
    }

    /// Idle timeout; `0` disables it
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(snowball_agent::DEFAULT_IDLE_TIMEOUT),
        }
    }

    /// Get the gateway key for an operation, checking config then env
    pub fn get_api_key(&self, kind: OperationKind) -> Option<String> {
        let (from_config, env_var) = match kind {
            OperationKind::Search => (&self.api_keys.search, "SNOWBALL_SEARCH_API_KEY"),
            OperationKind::Scene => (&self.api_keys.scene, "SNOWBALL_SCENE_API_KEY"),
            OperationKind::Payment => (&self.api_keys.payment, "SNOWBALL_PAYMENT_API_KEY"),
        };
        key_or_env(from_config, env_var)
    }

    /// Key forwarded to the payment tool server
    pub fn razorpay_key(&self) -> Option<String> {
        key_or_env(&self.api_keys.razorpay, "SNOWBALL_RAZORPAY_KEY")
    }

    /// Operation catalogue with overrides applied
    pub fn operations(&self) -> Operations {
        let apply = |spec: OperationSpec, model: &Option<String>| {
            let kind = spec.kind;
            let spec = match model {
                Some(model) => spec.with_model(model.clone()),
                None => spec,
            };
            spec.with_api_key(self.get_api_key(kind))
        };

        let mut payment = apply(OperationSpec::payment(), &self.models.payment);
        if let Some(key) = self.razorpay_key() {
            payment = payment.with_tool_key(&key);
        }

        Operations {
            search: apply(OperationSpec::search(), &self.models.search),
            scene: apply(OperationSpec::scene(), &self.models.scene),
            payment,
        }
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            transaction_threshold: self
                .transaction_threshold
                .unwrap_or(router::DEFAULT_TRANSACTION_THRESHOLD),
            checkout_url: self
                .checkout_url
                .clone()
                .unwrap_or_else(|| router::DEFAULT_CHECKOUT_URL.to_string()),
        }
    }
}

fn key_or_env(from_config: &Option<String>, env_var: &str) -> Option<String> {
    from_config
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|k| !k.is_empty()))
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# snowball configuration file
# Place at ~/.config/snowball/config.toml (Linux/Mac) or %APPDATA%\snowball\config.toml (Windows)

# Gateway endpoint
endpoint = "http://localhost:8081/v1/responses"

# Seconds without data before a call is abandoned (0 disables)
idle_timeout_secs = 90

# In the pay phase, input longer than this is sent for payment lookup
transaction_threshold = 20

# Checkout link offered after the scene is generated
checkout_url = "https://checkout.razorpay.com/demo"

# Model overrides (optional)
[models]
# search = "togetherai@meta-llama/Llama-4-Maverick-17B-128E-Instruct-FP8"
# scene = "openai@gpt-4.1-mini"
# payment = "claude@claude-sonnet-4-20250514"

# API keys (optional - can also use environment variables
# SNOWBALL_SEARCH_API_KEY, SNOWBALL_SCENE_API_KEY, SNOWBALL_PAYMENT_API_KEY,
# SNOWBALL_RAZORPAY_KEY)
[api_keys]
# search = "..."
# scene = "..."
# payment = "..."
# razorpay = "..."
"#
}
