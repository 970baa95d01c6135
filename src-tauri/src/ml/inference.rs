//! Burnランタイムによる推論エンジン

use anyhow::Result;
use std::path::Path;
use std::sync::{Arc, Mutex};

use burn_ndarray::{NdArray, NdArrayDevice};
use burn_wgpu::WgpuDevice;

use burn::{
    backend::Wgpu,
    module::Module,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::{backend::Backend, Tensor},
};

use crate::ml::engine::{EngineOutput, InferenceBackend, LoadedModel};
use crate::ml::ml_model::{ModelConfig, SkinClassifier};
use crate::model::{load_model_bundle, DeviceType, InferenceConfig};
use crate::types::{NormalizedTensor, INPUT_SHAPE};

/// 重みファイルのレコーダ（f32精度）
pub type WeightRecorder = BinBytesRecorder<FullPrecisionSettings>;

/// Burnバックエンド上で tar.gz バンドルを読み込むエンジン
pub struct BurnBackend<B: Backend> {
    device: B::Device,
}

impl<B: Backend> BurnBackend<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// バンドルからモデルを復元する
    pub fn load_bundle(&self, model_path: &Path) -> Result<BurnModel<B>> {
        let (metadata, model_binary) = load_model_bundle(model_path)?;
        let config = InferenceConfig::from_metadata(&metadata)?;

        let model = ModelConfig::new(config.num_classes).init::<B>(&self.device);

        // モデルの重みを復元
        let recorder = WeightRecorder::default();
        let record = Recorder::<B>::load(&recorder, model_binary, &self.device)
            .map_err(|e| anyhow::anyhow!("モデル重みの読み込みエラー: {:?}", e))?;
        let model = model.load_record(record);

        tracing::info!(
            path = %model_path.display(),
            classes = config.num_classes,
            created_at = %metadata.created_at,
            "burn model loaded"
        );

        Ok(BurnModel {
            model: Mutex::new(model),
            num_classes: config.num_classes,
            device: self.device.clone(),
        })
    }
}

impl<B: Backend> InferenceBackend for BurnBackend<B> {
    fn name(&self) -> &str {
        "burn"
    }

    fn load(&self, model_path: &Path) -> Result<Arc<dyn LoadedModel>> {
        Ok(Arc::new(self.load_bundle(model_path)?))
    }
}

/// 設定されたデバイスのエンジンを作る
pub fn backend_for(device_type: DeviceType) -> Arc<dyn InferenceBackend> {
    tracing::info!(device = %device_type, "creating inference backend");
    match device_type {
        DeviceType::Wgpu => Arc::new(BurnBackend::<Wgpu>::new(WgpuDevice::default())),
        DeviceType::Cpu => Arc::new(BurnBackend::<NdArray<f32>>::new(NdArrayDevice::Cpu)),
    }
}

/// 読み込み済みのBurnモデル
pub struct BurnModel<B: Backend> {
    model: Mutex<SkinClassifier<B>>,
    num_classes: usize,
    device: B::Device,
}

impl<B: Backend> LoadedModel for BurnModel<B> {
    fn forward(&self, input: &NormalizedTensor) -> Result<EngineOutput> {
        // Tensorに変換 [1, 3, 320, 320]
        let tensor =
            Tensor::<B, 1>::from_floats(input.as_slice(), &self.device).reshape(INPUT_SHAPE);

        let output = {
            let model = self
                .model
                .lock()
                .map_err(|_| anyhow::anyhow!("model lock poisoned"))?;
            model.forward(tensor)
        };

        let shape = output.dims().to_vec();
        let data = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("推論結果の取得エラー: {:?}", e))?;

        Ok(EngineOutput::float32(shape, data))
    }

    fn num_classes(&self) -> Option<usize> {
        Some(self.num_classes)
    }
}

/// モデルの重みをバイト列に変換する（バンドル作成用）
pub fn record_bytes<B: Backend>(model: SkinClassifier<B>) -> Result<Vec<u8>> {
    Recorder::<B>::record(&WeightRecorder::default(), model.into_record(), ())
        .map_err(|e| anyhow::anyhow!("モデル重みの書き出しエラー: {:?}", e))
}
