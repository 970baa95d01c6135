//! モデルメタデータの定義
//!
//! tar.gz形式のモデルバンドルに同梱され、推論時のネットワーク構成の復元に使います。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// モデルメタデータ
///
/// tar.gz形式で保存される情報：
/// - metadata.json: このメタデータ（JSON形式）
/// - model.bin: モデルの重み（バイナリ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// 全クラスラベル（出力インデックス順）
    /// 例: ["NF", "nonNF", "other"]
    pub class_labels: Vec<String>,

    /// モデル入力サイズ（正方形、通常320）
    pub model_input_size: u32,

    /// 分類クラス数
    pub num_classes: u32,

    /// バンドルの作成時刻（ISO8601形式）
    pub created_at: String,
}

impl ModelMetadata {
    /// 新しいメタデータを作成
    pub fn new(class_labels: Vec<String>, model_input_size: u32) -> Self {
        let created_at = chrono::Local::now().to_rfc3339();
        let num_classes = class_labels.len() as u32;

        Self {
            class_labels,
            model_input_size,
            num_classes,
            created_at,
        }
    }

    /// メタデータをJSON文字列に変換
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize metadata to JSON")
    }

    /// JSON文字列からメタデータを生成
    pub fn from_json_string(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize metadata from JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_fields() {
        let metadata = ModelMetadata::new(vec!["NF".into(), "nonNF".into(), "other".into()], 320);
        let json = metadata.to_json_string().unwrap();
        let parsed = ModelMetadata::from_json_string(&json).unwrap();
        assert_eq!(parsed.num_classes, 3);
        assert_eq!(parsed.model_input_size, 320);
        assert_eq!(parsed.class_labels[2], "other");
    }

    #[test]
    fn test_invalid_json() {
        assert!(ModelMetadata::from_json_string("{\"class_labels\": 3}").is_err());
    }
}
