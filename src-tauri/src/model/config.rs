//! アプリケーション設定管理モジュール
//!
//! 計算デバイスや同梱アセット名、推論タイムアウトをJSON形式で保存・読み込みします。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = "config.json";

/// 計算デバイスの種類
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DeviceType {
    /// WGPU (GPU) バックエンド
    Wgpu,
    /// NdArray (CPU) バックエンド
    #[default]
    Cpu,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Wgpu => write!(f, "WGPU (GPU)"),
            DeviceType::Cpu => write!(f, "CPU (NdArray)"),
        }
    }
}

/// 同梱アセットの設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// リソースディレクトリ内のモデルバンドル名
    pub bundle_file: String,
    /// リソースディレクトリ内のラベルファイル名
    pub labels_file: String,
    /// モデルのコピー先（キャッシュディレクトリ内のサブディレクトリ）
    pub cache_subdir: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            bundle_file: "nf_classifier.tar.gz".to_string(),
            labels_file: "labels.txt".to_string(),
            cache_subdir: "models".to_string(),
        }
    }
}

/// 推論設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSettings {
    /// 1回の推論のタイムアウト（秒）
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl InferenceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 計算デバイスの種類
    #[serde(default)]
    pub device_type: DeviceType,
    /// モデル設定
    #[serde(default)]
    pub model: ModelSettings,
    /// 推論設定
    #[serde(default)]
    pub inference: InferenceSettings,
}

impl AppConfig {
    /// 設定ディレクトリ内の設定ファイルパス
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// 設定を読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 設定を読み込む。存在しない・壊れている場合はデフォルト設定を返す
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "config loaded");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// 設定を保存する
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 計算デバイスを設定
    pub fn set_device_type(&mut self, device_type: DeviceType) {
        self.device_type = device_type;
    }

    /// 設定ディレクトリ内の設定の計算デバイスだけを書き換えて保存する
    ///
    /// 変更は次回起動時のモデル読み込みから反映される。
    pub fn update_device_type(config_dir: &Path, device_type: DeviceType) -> anyhow::Result<Self> {
        let path = Self::path_in(config_dir);
        let mut config = Self::load_or_default(&path);
        config.set_device_type(device_type);
        config.save(&path)?;
        tracing::info!(path = %path.display(), device = %device_type, "device type saved");
        Ok(config)
    }
}
