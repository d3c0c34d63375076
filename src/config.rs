use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub timeout_seconds: u64,
    /// 指示文の上書き（未指定なら組み込みの指示文）
    pub prompt: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeout_seconds: 60,
            prompt: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ScanError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("receipt-scan").join("config.json"))
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(ScanError::Config("timeout_seconds は1以上にしてください".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ScanError::Config("model が空です".into()));
        }
        Ok(())
    }

    /// APIキーを取得（環境変数を優先）
    ///
    /// 未設定はエラーではなく `None`。セッション側で画面上のエラーとして扱う。
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key.trim().to_string());
        self.save()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// 空白だけの値は未設定として扱い、次の候補へ回す
fn resolve_api_key(env_key: Option<String>, stored_key: Option<&str>) -> Option<String> {
    env_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| stored_key.filter(|key| !key.trim().is_empty()).map(String::from))
}
