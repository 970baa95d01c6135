//! 推論エンジンとの境界
//!
//! エンジン本体（重みの読み込み・順伝播）は外部に任せ、このクレートは
//! `load` と `forward` の2操作だけを要求します。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClassifierError;
use crate::types::{LogitVector, NormalizedTensor};

/// モデルファイルを読み込んで推論可能な状態にするエンジン
pub trait InferenceBackend: Send + Sync {
    /// エンジン名（ログ用）
    fn name(&self) -> &str;

    /// ファイルシステム上のモデルを読み込む
    fn load(&self, model_path: &Path) -> anyhow::Result<Arc<dyn LoadedModel>>;
}

/// 読み込み済みモデル
pub trait LoadedModel: Send + Sync {
    /// [1, 3, 320, 320] のテンソルを入力して生の出力を返す
    fn forward(&self, input: &NormalizedTensor) -> anyhow::Result<EngineOutput>;

    /// モデルが申告する出力クラス数（分からなければ None）
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

/// エンジンが返しうる出力の形
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    /// f32テンソル
    Float32 { shape: Vec<usize>, data: Vec<f32> },
    /// f64テンソル（f32に丸める）
    Float64 { shape: Vec<usize>, data: Vec<f64> },
    /// 整数テンソル（クラススコアとしては扱えない）
    Int64 { shape: Vec<usize>, data: Vec<i64> },
    /// 複数出力。先頭がクラススコア、残りは補助出力
    Sequence(Vec<EngineOutput>),
}

impl EngineOutput {
    pub fn float32(shape: Vec<usize>, data: Vec<f32>) -> Self {
        EngineOutput::Float32 { shape, data }
    }

    /// 出力を平坦なロジット列に変換する
    ///
    /// 受け付ける形状は `[n]` と `[1, n]`（および先頭以外が1の形状）のみ。
    pub fn into_logits(self) -> Result<LogitVector, ClassifierError> {
        match self {
            EngineOutput::Float32 { shape, data } => {
                check_shape(&shape, data.len())?;
                Ok(data)
            }
            EngineOutput::Float64 { shape, data } => {
                check_shape(&shape, data.len())?;
                Ok(data.into_iter().map(|v| v as f32).collect())
            }
            EngineOutput::Int64 { shape, .. } => Err(ClassifierError::OutputShape(format!(
                "integer tensor {:?} cannot be used as class scores",
                shape
            ))),
            EngineOutput::Sequence(items) => match items.into_iter().next() {
                Some(first) => first.into_logits(),
                None => Err(ClassifierError::OutputShape("empty output sequence".to_string())),
            },
        }
    }
}

/// モデルに入力を渡してロジット列を得る
///
/// 順伝播はブロッキングスレッドで実行し、`timeout` を超えたら打ち切って
/// InferenceError を返す（エンジン側の処理は止められないので結果は捨てる）。
pub async fn infer(
    model: Arc<dyn LoadedModel>,
    tensor: NormalizedTensor,
    timeout: Duration,
) -> Result<LogitVector, ClassifierError> {
    let task = tokio::task::spawn_blocking(move || model.forward(&tensor));

    let output = match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            return Err(ClassifierError::Inference(format!(
                "推論がタイムアウトしました ({}ms)",
                timeout.as_millis()
            )))
        }
        Ok(Err(e)) => return Err(ClassifierError::Inference(format!("推論スレッドエラー: {}", e))),
        Ok(Ok(Err(e))) => return Err(ClassifierError::Inference(format!("{:#}", e))),
        Ok(Ok(Ok(output))) => output,
    };

    output.into_logits()
}

fn check_shape(shape: &[usize], len: usize) -> Result<(), ClassifierError> {
    let expected: usize = shape.iter().product();
    if shape.is_empty() || expected != len {
        return Err(ClassifierError::OutputShape(format!(
            "shape {:?} does not match {} elements",
            shape, len
        )));
    }
    if len == 0 {
        return Err(ClassifierError::OutputShape("empty tensor".to_string()));
    }
    // クラス軸以外はすべて1であること（バッチ1のみ）
    let non_unit = shape.iter().filter(|&&d| d != 1).count();
    if non_unit > 1 {
        return Err(ClassifierError::OutputShape(format!(
            "expected a single batch of class scores, got shape {:?}",
            shape
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedModel {
        delay: Duration,
        result: fn() -> anyhow::Result<EngineOutput>,
    }

    impl LoadedModel for ScriptedModel {
        fn forward(&self, _input: &NormalizedTensor) -> anyhow::Result<EngineOutput> {
            std::thread::sleep(self.delay);
            (self.result)()
        }
    }

    fn zeros() -> NormalizedTensor {
        NormalizedTensor::from_planar(vec![0.0; NormalizedTensor::len_expected()]).unwrap()
    }

    #[tokio::test]
    async fn test_infer_returns_logits() {
        let model = Arc::new(ScriptedModel {
            delay: Duration::ZERO,
            result: || Ok(EngineOutput::float32(vec![1, 3], vec![2.0, 0.5, 0.1])),
        });
        let logits = infer(model, zeros(), Duration::from_secs(5)).await.unwrap();
        assert_eq!(logits, vec![2.0, 0.5, 0.1]);
    }

    #[tokio::test]
    async fn test_infer_surfaces_engine_error() {
        let model = Arc::new(ScriptedModel {
            delay: Duration::ZERO,
            result: || Err(anyhow::anyhow!("native failure")),
        });
        let err = infer(model, zeros(), Duration::from_secs(5)).await.unwrap_err();
        match err {
            ClassifierError::Inference(msg) => assert!(msg.contains("native failure")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_infer_times_out() {
        let model = Arc::new(ScriptedModel {
            delay: Duration::from_millis(300),
            result: || Ok(EngineOutput::float32(vec![1], vec![1.0])),
        });
        let err = infer(model, zeros(), Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
    }

    #[test]
    fn test_flat_and_batched_tensors() {
        let flat = EngineOutput::float32(vec![3], vec![1.0, 2.0, 3.0]);
        assert_eq!(flat.into_logits().unwrap(), vec![1.0, 2.0, 3.0]);

        let batched = EngineOutput::float32(vec![1, 3], vec![1.0, 2.0, 3.0]);
        assert_eq!(batched.into_logits().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_single_class_output() {
        let out = EngineOutput::float32(vec![1, 1], vec![0.5]);
        assert_eq!(out.into_logits().unwrap(), vec![0.5]);
    }

    #[test]
    fn test_f64_is_narrowed() {
        let out = EngineOutput::Float64 {
            shape: vec![1, 2],
            data: vec![0.25, -1.5],
        };
        assert_eq!(out.into_logits().unwrap(), vec![0.25f32, -1.5f32]);
    }

    #[test]
    fn test_sequence_uses_first_output() {
        let out = EngineOutput::Sequence(vec![
            EngineOutput::float32(vec![1, 2], vec![0.1, 0.9]),
            EngineOutput::float32(vec![1, 4], vec![9.0; 4]),
        ]);
        assert_eq!(out.into_logits().unwrap(), vec![0.1, 0.9]);
    }

    #[test]
    fn test_unrecognized_outputs() {
        let cases = vec![
            EngineOutput::Sequence(vec![]),
            EngineOutput::Int64 { shape: vec![1, 2], data: vec![0, 1] },
            EngineOutput::float32(vec![2, 3], vec![0.0; 6]),
            EngineOutput::float32(vec![1, 4], vec![0.0; 3]),
            EngineOutput::float32(vec![], vec![]),
            EngineOutput::float32(vec![1, 0], vec![]),
        ];
        for case in cases {
            assert!(matches!(case.into_logits(), Err(ClassifierError::OutputShape(_))));
        }
    }
}
