//! 動作確認用: バンドルとラベルを指定して画像1枚を判定する簡易バイナリ
//!
//! ```text
//! predict_image <bundle.tar.gz> <labels.txt> <image> [cpu|wgpu]
//! predict_image --init-bundle <out.tar.gz> <labels.txt>
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nf_checker_lib::labels::load_labels;
use nf_checker_lib::ml::{backend_for, record_bytes, ModelConfig};
use nf_checker_lib::model::{
    save_model_bundle, DeviceType, InferenceConfig, InferenceSettings, ModelMetadata,
};
use nf_checker_lib::types::IMAGE_SIZE;
use nf_checker_lib::{AppContext, AssetPaths, Orchestrator, RawImage};

fn main() {
    nf_checker_lib::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("--init-bundle") if args.len() >= 4 => init_bundle(Path::new(&args[2]), Path::new(&args[3])),
        _ if args.len() >= 4 => {
            let device = match args.get(4).map(String::as_str) {
                Some("wgpu") => DeviceType::Wgpu,
                _ => DeviceType::Cpu,
            };
            predict(
                PathBuf::from(&args[1]),
                PathBuf::from(&args[2]),
                Path::new(&args[3]),
                device,
            )
        }
        _ => {
            eprintln!("Usage: predict_image <bundle.tar.gz> <labels.txt> <image> [cpu|wgpu]");
            eprintln!("       predict_image --init-bundle <out.tar.gz> <labels.txt>");
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("エラー: {:#}", e);
        std::process::exit(1);
    }
}

fn predict(bundle: PathBuf, labels: PathBuf, image: &Path, device: DeviceType) -> anyhow::Result<()> {
    println!("Predict:\n  bundle: {}\n  labels: {}\n  image: {}\n  device: {}",
        bundle.display(), labels.display(), image.display(), device);

    let config = InferenceConfig::load_from_model(&bundle)?;
    println!("Model classes: {:?}", config.class_labels);

    let bytes = std::fs::read(image)?;
    let paths = AssetPaths {
        labels,
        model_bundle: bundle,
        cache_dir: std::env::temp_dir().join("nf_checker_predict"),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(async {
        let context = AppContext::initialize(backend_for(device), &paths, InferenceSettings::default()).await;
        let orchestrator = Orchestrator::new(Arc::new(context));
        orchestrator.predict(RawImage(bytes)).await
    })?;

    println!("\n{} ({:.1}%)", outcome.prediction.label, outcome.prediction.confidence * 100.0);
    for (label, p) in config.class_labels.iter().zip(&outcome.probabilities) {
        println!("  {:<10} {:.4}", label, p);
    }
    println!("\n{}\n{}", outcome.advisory.title, outcome.advisory.interpretation);
    for r in outcome.advisory.recommendations {
        println!("  - {}", r);
    }
    Ok(())
}

/// 未学習の重みでバンドルを作る（組み込み確認用）
fn init_bundle(out: &Path, labels: &Path) -> anyhow::Result<()> {
    let labels = load_labels(labels)?;
    let device = burn_ndarray::NdArrayDevice::Cpu;
    let model = ModelConfig::new(labels.len()).init::<burn_ndarray::NdArray<f32>>(&device);

    let metadata = ModelMetadata::new(labels.as_slice().to_vec(), IMAGE_SIZE as u32);
    let path = save_model_bundle(out, &metadata, &record_bytes(model)?)?;
    println!("バンドルを作成しました: {}", path.display());
    Ok(())
}
