use crate::error::{CropCareError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/predict";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 予測サービスのURL（POST multipart）
    pub endpoint: String,
    /// スナップショットカメラのURL（未設定ならカメラ撮影不可）
    pub camera_url: Option<String>,
    pub timeout_seconds: u64,
    /// 予測サービスの代わりにカタログからシミュレーションする
    pub simulate: bool,
    pub simulate_delay_ms: u64,
    /// 引き継ぎレコードの保存先（未設定ならキャッシュディレクトリ）
    pub session_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            camera_url: None,
            timeout_seconds: 30,
            simulate: false,
            simulate_delay_ms: 0,
            session_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        Ok(config.with_env_overrides())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CropCareError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("cropcare").join("config.json"))
    }

    /// 環境変数を優先
    fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("CROPCARE_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(url) = std::env::var("CROPCARE_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera_url = Some(url);
            }
        }
        self
    }

    /// 引き継ぎレコードのディレクトリ
    pub fn session_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.session_dir {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join("cropcare"))
            .ok_or_else(|| CropCareError::Config("キャッシュディレクトリが見つかりません".into()))
    }

    pub fn set_endpoint(&mut self, endpoint: String) -> Result<()> {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(CropCareError::Config(format!("URLが不正です: {}", endpoint)));
        }
        self.endpoint = endpoint;
        self.save()
    }

    pub fn set_camera_url(&mut self, url: String) -> Result<()> {
        self.camera_url = Some(url);
        self.save()
    }

    pub fn set_simulate(&mut self, simulate: bool) -> Result<()> {
        self.simulate = simulate;
        self.save()
    }
}
