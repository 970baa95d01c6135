//! 分類パイプラインのエラー定義
//!
//! すべてのエラーはオーケストレータ境界で回収され、ユーザー向けメッセージに変換されます。

use std::path::PathBuf;

/// 分類パイプラインで発生するエラー
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// ラベルファイル・モデルアセットが読み込めない
    #[error("resource missing: {path:?}: {message}")]
    ResourceMissing { path: PathBuf, message: String },

    /// モデルのコピーまたはエンジンによる読み込みに失敗
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// 入力画像をデコードできない
    #[error("image decode failed: {0}")]
    Decode(String),

    /// 推論の実行に失敗（モデル未ロード・タイムアウトを含む）
    #[error("inference failed: {0}")]
    Inference(String),

    /// エンジン出力をロジット列に変換できない
    #[error("unrecognized engine output: {0}")]
    OutputShape(String),
}

impl ClassifierError {
    pub fn resource_missing(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::ResourceMissing {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// 画面に表示するメッセージ
    pub fn user_message(&self) -> String {
        match self {
            ClassifierError::ResourceMissing { .. } => {
                "アプリに同梱されたモデルまたはラベルが見つかりません。判定機能は利用できません。".to_string()
            }
            ClassifierError::ModelLoad(_) => {
                "モデルの読み込みに失敗しました。判定機能は利用できません。".to_string()
            }
            ClassifierError::Decode(_) => {
                "画像を読み込めませんでした。別の写真を選択してください。".to_string()
            }
            ClassifierError::Inference(msg) => format!("判定中にエラーが発生しました: {}", msg),
            ClassifierError::OutputShape(_) => {
                "モデルの出力形式が想定と異なります。判定結果を表示できません。".to_string()
            }
        }
    }
}
