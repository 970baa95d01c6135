pub mod advisory;
pub mod error;
pub mod labels;
pub mod logging;
pub mod ml;
pub mod model;
pub mod orchestrator;
pub mod types;

#[cfg(feature = "app")]
mod ml_commands;

pub use error::ClassifierError;
pub use orchestrator::{AppContext, AssetPaths, DisplayState, ModelStatus, Orchestrator};
pub use types::{ClassificationOutcome, LabelSet, Prediction, RawImage};

#[cfg(feature = "app")]
use std::sync::Arc;
#[cfg(feature = "app")]
use tauri::{Emitter, Manager};

/// 同梱アセットを置くリソース内のディレクトリ
#[cfg(feature = "app")]
const RESOURCE_SUBDIR: &str = "resources";

#[cfg(feature = "app")]
#[derive(Default)]
pub struct AppState {
    /// 起動処理が終わるまでは空
    orchestrator: tokio::sync::OnceCell<Arc<Orchestrator>>,
    /// 設定ファイルを置くディレクトリ
    config_dir: std::sync::OnceLock<std::path::PathBuf>,
}

#[cfg(feature = "app")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .manage(AppState::default())
        .setup(|app| {
            let resource_dir = app.path().resource_dir()?.join(RESOURCE_SUBDIR);
            let cache_root = app.path().app_cache_dir()?;
            let config_dir = app.path().app_config_dir()?;

            let config = model::AppConfig::load_or_default(&model::AppConfig::path_in(&config_dir));
            if app.state::<AppState>().config_dir.set(config_dir).is_err() {
                tracing::warn!("config dir already set");
            }
            let paths = AssetPaths::from_settings(&resource_dir, &cache_root, &config.model);
            let backend = ml::backend_for(config.device_type);
            tracing::info!(?paths, device = %config.device_type, "starting model initialization");

            // 読み込み中もUIは表示する
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let context = AppContext::initialize(backend, &paths, config.inference).await;
                let status = context.status();
                let orchestrator = Arc::new(Orchestrator::new(Arc::new(context)));

                let state = handle.state::<AppState>();
                if state.orchestrator.set(orchestrator).is_err() {
                    tracing::warn!("orchestrator already initialized");
                }
                if let Err(e) = handle.emit("model-status-changed", status) {
                    tracing::warn!(error = %e, "failed to emit model status");
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            ml_commands::model_status,
            ml_commands::predict_image_bytes,
            ml_commands::pick_and_predict,
            ml_commands::current_prediction,
            ml_commands::set_device_type,
        ])
        .run(tauri::generate_context!())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "error while running tauri application");
            std::process::exit(1);
        });
}
