//! 同梱モデルの展開と読み込み
//!
//! 推論エンジンはファイルパスを要求するため、リソース内のモデルを
//! アプリ専用の書き込み可能ディレクトリにコピーしてから読み込みます。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ClassifierError;
use crate::ml::engine::{InferenceBackend, LoadedModel};

/// 読み込み済みモデルへのハンドル
#[derive(Clone)]
pub enum ModelHandle {
    Ready(Arc<dyn LoadedModel>),
    Unavailable { reason: String },
}

impl ModelHandle {
    pub fn is_available(&self) -> bool {
        matches!(self, ModelHandle::Ready(_))
    }

    /// 推論用のモデル。利用不可なら InferenceError
    pub fn model(&self) -> Result<Arc<dyn LoadedModel>, ClassifierError> {
        match self {
            ModelHandle::Ready(model) => Ok(model.clone()),
            ModelHandle::Unavailable { reason } => Err(ClassifierError::Inference(format!(
                "モデルが利用できません: {}",
                reason
            ))),
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelHandle::Ready(_) => write!(f, "ModelHandle::Ready"),
            ModelHandle::Unavailable { reason } => write!(f, "ModelHandle::Unavailable({})", reason),
        }
    }
}

/// モデルアセットをキャッシュディレクトリにコピーする
///
/// 同じファイル名で上書きするため、何度呼んでも結果は同じ。
pub fn materialize_model(asset_path: &Path, cache_dir: &Path) -> Result<PathBuf, ClassifierError> {
    let bytes = fs::read(asset_path).map_err(|e| ClassifierError::resource_missing(asset_path, e))?;

    let file_name = asset_path.file_name().ok_or_else(|| {
        ClassifierError::ModelLoad(format!("モデルのファイル名が不正です: {:?}", asset_path))
    })?;

    fs::create_dir_all(cache_dir).map_err(|e| {
        ClassifierError::ModelLoad(format!("キャッシュディレクトリを作成できません {:?}: {}", cache_dir, e))
    })?;

    let target = cache_dir.join(file_name);
    fs::write(&target, &bytes).map_err(|e| {
        ClassifierError::ModelLoad(format!("モデルをコピーできません {:?}: {}", target, e))
    })?;

    tracing::info!(
        asset = %asset_path.display(),
        target = %target.display(),
        bytes = bytes.len(),
        "model materialized"
    );
    Ok(target)
}

/// モデルを展開してエンジンに読み込ませる
pub async fn load_model(
    backend: Arc<dyn InferenceBackend>,
    asset_path: PathBuf,
    cache_dir: PathBuf,
) -> Result<Arc<dyn LoadedModel>, ClassifierError> {
    tokio::task::spawn_blocking(move || {
        let model_path = materialize_model(&asset_path, &cache_dir)?;
        backend.load(&model_path).map_err(|e| {
            ClassifierError::ModelLoad(format!("{} rejected {:?}: {:#}", backend.name(), model_path, e))
        })
    })
    .await
    .map_err(|e| ClassifierError::ModelLoad(format!("読み込みスレッドエラー: {}", e)))?
}

/// 読み込み結果をハンドルに変換する。失敗時は Unavailable
pub async fn load_model_handle(
    backend: Arc<dyn InferenceBackend>,
    asset_path: PathBuf,
    cache_dir: PathBuf,
) -> ModelHandle {
    match load_model(backend, asset_path, cache_dir).await {
        Ok(model) => ModelHandle::Ready(model),
        Err(e) => {
            tracing::error!(error = %e, "model unavailable");
            ModelHandle::Unavailable {
                reason: e.user_message(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::engine::EngineOutput;
    use crate::types::NormalizedTensor;

    struct EchoModel;

    impl LoadedModel for EchoModel {
        fn forward(&self, _input: &NormalizedTensor) -> anyhow::Result<EngineOutput> {
            Ok(EngineOutput::float32(vec![1, 2], vec![0.0, 1.0]))
        }
    }

    /// 先頭が "ok" のファイルだけ受け付けるエンジン
    struct PickyBackend;

    impl InferenceBackend for PickyBackend {
        fn name(&self) -> &str {
            "picky"
        }

        fn load(&self, model_path: &Path) -> anyhow::Result<Arc<dyn LoadedModel>> {
            let bytes = fs::read(model_path)?;
            if bytes.starts_with(b"ok") {
                Ok(Arc::new(EchoModel))
            } else {
                anyhow::bail!("unsupported model format")
            }
        }
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("assets").join("model.bin");
        fs::create_dir_all(asset.parent().unwrap()).unwrap();
        fs::write(&asset, b"ok-v1").unwrap();
        let cache = dir.path().join("cache");

        let first = materialize_model(&asset, &cache).unwrap();
        fs::write(&asset, b"ok-v2").unwrap();
        let second = materialize_model(&asset, &cache).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&second).unwrap(), b"ok-v2");
    }

    #[test]
    fn test_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let err = materialize_model(&dir.path().join("nope.bin"), dir.path()).unwrap_err();
        assert!(matches!(err, ClassifierError::ResourceMissing { .. }));
    }

    #[tokio::test]
    async fn test_load_ready() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("model.bin");
        fs::write(&asset, b"ok").unwrap();

        let handle = load_model_handle(Arc::new(PickyBackend), asset, dir.path().join("cache")).await;
        assert!(handle.is_available());
        assert!(handle.model().is_ok());
    }

    #[tokio::test]
    async fn test_engine_rejection_marks_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("model.bin");
        fs::write(&asset, b"garbage").unwrap();

        let err = load_model(Arc::new(PickyBackend), asset.clone(), dir.path().join("cache"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ClassifierError::ModelLoad(_)));

        let handle = load_model_handle(Arc::new(PickyBackend), asset, dir.path().join("cache")).await;
        assert!(!handle.is_available());
        assert!(matches!(handle.model(), Err(ClassifierError::Inference(_))));
    }
}
