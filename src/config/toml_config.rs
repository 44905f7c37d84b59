use crate::core::classifier::Precedence;
use crate::utils::error::{ConsoleError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CANISTER_ID: &str = "bkyz2-fmaaa-aaaaa-qaaaq-cai";
pub const DEFAULT_HOST: &str = "127.0.0.1:8000";
pub const DEFAULT_PROGRAM: &str = "dfx";
pub const DEFAULT_HEALTH_PATH: &str = "/api/v2/status";
/// 啟動後等待後端就緒的上限（秒），沿用原本固定的等待時間
pub const DEFAULT_SETTLING_SECONDS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub backend: BackendConfig,
    pub lifecycle: LifecycleConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub canister_id: String,
    /// `host:port` the service binds to.
    pub host: String,
    /// Overrides the `http://<canister_id>.localhost:<port>` default.
    pub base_url: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            canister_id: DEFAULT_CANISTER_ID.to_string(),
            host: DEFAULT_HOST.to_string(),
            base_url: None,
            request_timeout_seconds: 30,
        }
    }
}

impl BackendConfig {
    pub fn port(&self) -> &str {
        self.host
            .rsplit_once(':')
            .map(|(_, port)| port)
            .unwrap_or("8000")
    }

    pub fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}.localhost:{}", self.canister_id, self.port()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub program: String,
    pub auto_start: bool,
    pub clean_start: bool,
    pub auto_deploy: bool,
    pub readiness_timeout_seconds: u64,
    pub poll_interval_millis: u64,
    pub health_path: String,
    /// 成功回應後立即停止後端（舊行為）
    pub stop_on_success: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            auto_start: true,
            clean_start: true,
            auto_deploy: true,
            readiness_timeout_seconds: DEFAULT_SETTLING_SECONDS,
            poll_interval_millis: 500,
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            stop_on_success: false,
        }
    }
}

impl LifecycleConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub precedence: Precedence,
}

impl ConsoleConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConsoleError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConsoleError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CANISTER_ID})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConsoleError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::{
            validate_host_binding, validate_non_empty_string, validate_positive_number,
            validate_url,
        };

        validate_non_empty_string("backend.canister_id", &self.backend.canister_id)?;
        validate_host_binding("backend.host", &self.backend.host)?;
        validate_url("backend.base_url", &self.backend.resolved_base_url())?;
        validate_positive_number(
            "backend.request_timeout_seconds",
            self.backend.request_timeout_seconds,
            1,
        )?;

        validate_non_empty_string("lifecycle.program", &self.lifecycle.program)?;
        validate_positive_number(
            "lifecycle.readiness_timeout_seconds",
            self.lifecycle.readiness_timeout_seconds,
            1,
        )?;
        validate_positive_number(
            "lifecycle.poll_interval_millis",
            self.lifecycle.poll_interval_millis,
            1,
        )?;

        if !self.lifecycle.health_path.starts_with('/') {
            return Err(ConsoleError::InvalidConfigValueError {
                field: "lifecycle.health_path".to_string(),
                value: self.lifecycle.health_path.clone(),
                reason: "Path must start with '/'".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for ConsoleConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
