//! 判定処理の流れをまとめるオーケストレータ
//!
//! 起動時に一度だけ `AppContext`（ラベル・モデル）を作り、以降の各リクエストで
//! 前処理 → 推論 → 後処理 → アドバイス選択 を順に実行します。
//! 表示中の結果は `PredictionBoard` が世代番号付きで保持し、古いリクエストの
//! 応答が新しい結果を上書きしないようにします。

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::advisory::advisory_for;
use crate::error::ClassifierError;
use crate::labels::load_labels;
use crate::ml::engine::{infer, InferenceBackend};
use crate::ml::postprocess::classify;
use crate::ml::preprocess::preprocess;
use crate::model::{load_model_handle, InferenceSettings, ModelHandle, ModelSettings};
use crate::types::{ClassificationOutcome, LabelSet, RawImage};

/// 同梱アセットとキャッシュの場所
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub labels: PathBuf,
    pub model_bundle: PathBuf,
    pub cache_dir: PathBuf,
}

impl AssetPaths {
    pub fn from_settings(resource_dir: &Path, cache_root: &Path, settings: &ModelSettings) -> Self {
        Self {
            labels: resource_dir.join(&settings.labels_file),
            model_bundle: resource_dir.join(&settings.bundle_file),
            cache_dir: cache_root.join(&settings.cache_subdir),
        }
    }
}

/// モデルの利用状態（UIでボタンの有効・無効を切り替えるため）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    /// 起動処理中
    Loading,
    Ready { labels: Vec<String> },
    Unavailable { reason: String },
}

/// 起動時に作られ、全リクエストで共有される状態
#[derive(Debug)]
pub struct AppContext {
    labels: LabelSet,
    model: ModelHandle,
    settings: InferenceSettings,
}

impl AppContext {
    pub fn new(labels: LabelSet, model: ModelHandle, settings: InferenceSettings) -> Self {
        Self {
            labels,
            model,
            settings,
        }
    }

    /// ラベルとモデルを読み込む
    ///
    /// 失敗してもエラーにはせず、モデルを Unavailable にして返す。
    pub async fn initialize(
        backend: Arc<dyn InferenceBackend>,
        paths: &AssetPaths,
        settings: InferenceSettings,
    ) -> Self {
        let labels = match load_labels(&paths.labels) {
            Ok(labels) => labels,
            Err(e) => {
                tracing::error!(error = %e, "labels unavailable");
                return Self::new(
                    LabelSet::new(Vec::new()),
                    ModelHandle::Unavailable {
                        reason: e.user_message(),
                    },
                    settings,
                );
            }
        };

        let model = load_model_handle(
            backend,
            paths.model_bundle.clone(),
            paths.cache_dir.clone(),
        )
        .await;

        if let ModelHandle::Ready(loaded) = &model {
            match loaded.num_classes() {
                Some(n) if n != labels.len() => tracing::warn!(
                    model_classes = n,
                    labels = labels.len(),
                    "model output size and label count differ"
                ),
                _ => {}
            }
        }

        Self::new(labels, model, settings)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn status(&self) -> ModelStatus {
        match &self.model {
            ModelHandle::Ready(_) => ModelStatus::Ready {
                labels: self.labels.as_slice().to_vec(),
            },
            ModelHandle::Unavailable { reason } => ModelStatus::Unavailable {
                reason: reason.clone(),
            },
        }
    }
}

/// 画面に表示中の判定状態
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DisplayState {
    Idle,
    Pending {
        request_id: u64,
    },
    Ready {
        request_id: u64,
        outcome: ClassificationOutcome,
    },
    Failed {
        request_id: u64,
        message: String,
    },
}

/// リクエストの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct BoardInner {
    generation: u64,
    state: DisplayState,
}

/// 表示状態の保持（最新リクエストの結果だけを反映する）
pub struct PredictionBoard {
    inner: Mutex<BoardInner>,
}

impl Default for PredictionBoard {
    fn default() -> Self {
        Self {
            inner: Mutex::new(BoardInner {
                generation: 0,
                state: DisplayState::Idle,
            }),
        }
    }
}

impl PredictionBoard {
    fn lock(&self) -> std::sync::MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 新しいリクエストを開始する。前回の結果はここで消える
    pub fn begin(&self) -> RequestToken {
        let mut inner = self.lock();
        inner.generation += 1;
        let request_id = inner.generation;
        inner.state = DisplayState::Pending { request_id };
        RequestToken(request_id)
    }

    /// 結果を反映する。より新しいリクエストが始まっていれば捨てて false を返す
    pub fn finish(
        &self,
        token: RequestToken,
        result: &Result<ClassificationOutcome, ClassifierError>,
    ) -> bool {
        let mut inner = self.lock();
        if inner.generation != token.0 {
            tracing::debug!(
                request_id = token.0,
                latest = inner.generation,
                "dropping stale prediction"
            );
            return false;
        }

        inner.state = match result {
            Ok(outcome) => DisplayState::Ready {
                request_id: token.0,
                outcome: outcome.clone(),
            },
            Err(e) => DisplayState::Failed {
                request_id: token.0,
                message: e.user_message(),
            },
        };
        true
    }

    pub fn snapshot(&self) -> DisplayState {
        self.lock().state.clone()
    }
}

/// 判定処理の実行役
pub struct Orchestrator {
    context: Arc<AppContext>,
    board: PredictionBoard,
}

impl Orchestrator {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            board: PredictionBoard::default(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn board(&self) -> &PredictionBoard {
        &self.board
    }

    /// 1枚の画像を判定する（表示状態は変更しない）
    pub async fn predict(&self, raw: RawImage) -> Result<ClassificationOutcome, ClassifierError> {
        // モデルが無ければ前処理もしない
        let model = self.context.model.model()?;

        let tensor = tokio::task::spawn_blocking(move || preprocess(&raw))
            .await
            .map_err(|e| ClassifierError::Decode(format!("前処理スレッドエラー: {}", e)))??;

        let logits = infer(model, tensor, self.context.settings.timeout()).await?;
        let (prediction, probabilities) = classify(&logits, &self.context.labels)?;
        let advisory = advisory_for(&prediction.label, prediction.confidence);

        tracing::info!(
            label = %prediction.label,
            confidence = prediction.confidence,
            band = ?advisory.band,
            "prediction complete"
        );

        Ok(ClassificationOutcome {
            prediction,
            probabilities,
            advisory,
        })
    }

    /// 判定して表示状態に反映する
    ///
    /// 実行中に新しいリクエストが始まった場合、この結果は表示に反映されない。
    pub async fn submit(&self, raw: RawImage) -> Result<ClassificationOutcome, ClassifierError> {
        let token = self.board.begin();
        tracing::info!(request_id = token.id(), bytes = raw.bytes().len(), "prediction requested");

        let result = self.predict(raw).await;
        if let Err(e) = &result {
            tracing::warn!(request_id = token.id(), error = %e, "prediction failed");
        }
        self.board.finish(token, &result);
        result
    }
}
