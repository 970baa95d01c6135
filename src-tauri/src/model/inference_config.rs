//! モデルメタデータを使用した推論設定
//!
//! バンドルのメタデータを検証し、ネットワーク構成の復元に必要な情報を取り出します。

use anyhow::Result;
use std::path::Path;

use crate::model::model_metadata::ModelMetadata;
use crate::model::model_storage;
use crate::types::IMAGE_SIZE;

/// モデルメタデータから推論用情報を取得
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// 全クラスラベル（出力インデックス順）
    pub class_labels: Vec<String>,

    /// 出力クラス数
    pub num_classes: usize,
}

impl InferenceConfig {
    /// メタデータからInferenceConfigを作成
    ///
    /// 入力サイズが前処理の出力（320）と異なるモデルは受け付けない
    pub fn from_metadata(metadata: &ModelMetadata) -> Result<Self> {
        if metadata.model_input_size as usize != IMAGE_SIZE {
            anyhow::bail!(
                "モデル入力サイズが不正です: {} (期待: {})",
                metadata.model_input_size,
                IMAGE_SIZE
            );
        }
        if metadata.num_classes == 0 {
            anyhow::bail!("クラス数が0のモデルは使用できません");
        }
        if !metadata.class_labels.is_empty()
            && metadata.class_labels.len() != metadata.num_classes as usize
        {
            anyhow::bail!(
                "クラスラベル数 {} とクラス数 {} が一致しません",
                metadata.class_labels.len(),
                metadata.num_classes
            );
        }

        Ok(Self {
            class_labels: metadata.class_labels.clone(),
            num_classes: metadata.num_classes as usize,
        })
    }

    /// モデルファイルから推論設定を読み込む
    pub fn load_from_model(model_path: &Path) -> Result<Self> {
        let metadata = model_storage::load_metadata(model_path)?;
        Self::from_metadata(&metadata)
    }
}
