use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_phone_number, validate_positive_number,
    validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "blast-bot.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub bot: BotSection,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSection {
    #[serde(default = "default_bot_name")]
    pub name: String,
    /// 管理員號碼，與 `users.json` 的 `admin` 清單合併
    #[serde(default)]
    pub admins: Vec<String>,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            admins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Per-request timeout; unset means no timeout.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            uploads_dir: default_uploads_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            delay_seconds: default_delay_seconds(),
            max_retries: 0,
        }
    }
}

fn default_bot_name() -> String {
    "blast-bot".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_uploads_dir() -> String {
    "./uploads".to_string()
}

fn default_delay_seconds() -> u64 {
    5
}

impl BotConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| BotError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BotError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GATEWAY_TOKEN})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| BotError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("bot.name", &self.bot.name)?;
        for admin in &self.bot.admins {
            validate_phone_number("bot.admins", admin)?;
        }

        validate_url("gateway.base_url", &self.gateway.base_url)?;
        if let Some(token) = &self.gateway.token {
            if token.contains("${") {
                return Err(BotError::MissingConfigError {
                    field: "gateway.token".to_string(),
                });
            }
        }
        if let Some(timeout) = self.gateway.timeout_seconds {
            validate_positive_number("gateway.timeout_seconds", timeout, 1)?;
        }

        validate_path("storage.data_dir", &self.storage.data_dir)?;
        validate_path("storage.uploads_dir", &self.storage.uploads_dir)?;

        validate_range("broadcast.max_retries", self.broadcast.max_retries, 0, 10)?;

        Ok(())
    }

    pub fn gateway_timeout(&self) -> Option<Duration> {
        self.gateway.timeout_seconds.map(Duration::from_secs)
    }
}

impl ConfigProvider for BotConfig {
    fn broadcast_delay(&self) -> Duration {
        Duration::from_secs(self.broadcast.delay_seconds)
    }

    fn max_retries(&self) -> u32 {
        self.broadcast.max_retries
    }

    fn admins(&self) -> &[String] {
        &self.bot.admins
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
