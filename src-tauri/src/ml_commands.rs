//! 判定機能のTauriコマンド

use std::sync::Arc;

use tauri::{AppHandle, State};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_fs::FsExt;

use crate::model::{AppConfig, DeviceType};
use crate::orchestrator::{DisplayState, ModelStatus, Orchestrator};
use crate::types::{ClassificationOutcome, RawImage};
use crate::AppState;

/// 選択ダイアログで受け付ける画像の拡張子
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tiff"];

fn orchestrator(state: &AppState) -> Result<Arc<Orchestrator>, String> {
    state
        .orchestrator
        .get()
        .cloned()
        .ok_or_else(|| "モデルを準備中です。しばらくしてから再度お試しください。".to_string())
}

/// モデルの利用状態を取得
#[tauri::command]
pub fn model_status(state: State<'_, AppState>) -> ModelStatus {
    match state.orchestrator.get() {
        Some(orch) => orch.context().status(),
        None => ModelStatus::Loading,
    }
}

/// フロントエンドから渡された画像バイト列を判定
#[tauri::command]
pub async fn predict_image_bytes(
    bytes: Vec<u8>,
    state: State<'_, AppState>,
) -> Result<ClassificationOutcome, String> {
    let orch = orchestrator(&state)?;
    orch.submit(RawImage(bytes)).await.map_err(|e| e.user_message())
}

/// ギャラリーから写真を選んで判定
///
/// キャンセルされた場合は `None` を返し、表示中の結果はそのまま残す。
#[tauri::command]
pub async fn pick_and_predict(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<Option<ClassificationOutcome>, String> {
    let orch = orchestrator(&state)?;

    let (tx, rx) = tokio::sync::oneshot::channel();
    app.dialog()
        .file()
        .add_filter("画像", IMAGE_EXTENSIONS)
        .pick_file(move |path| {
            let _ = tx.send(path);
        });

    let Some(path) = rx.await.map_err(|e| format!("ファイル選択エラー: {}", e))? else {
        tracing::info!("image selection cancelled");
        return Ok(None);
    };

    tracing::info!(path = %path, "image selected");
    let bytes = app
        .fs()
        .read(path)
        .map_err(|e| format!("画像ファイルの読み込みエラー: {}", e))?;

    orch.submit(RawImage(bytes))
        .await
        .map(Some)
        .map_err(|e| e.user_message())
}

/// 画面に表示すべき最新の判定状態
#[tauri::command]
pub fn current_prediction(state: State<'_, AppState>) -> DisplayState {
    match state.orchestrator.get() {
        Some(orch) => orch.board().snapshot(),
        None => DisplayState::Idle,
    }
}

/// 計算デバイスを保存する（次回起動時から有効）
#[tauri::command]
pub fn set_device_type(device_type: DeviceType, state: State<'_, AppState>) -> Result<AppConfig, String> {
    let config_dir = state
        .config_dir
        .get()
        .ok_or_else(|| "設定ディレクトリが初期化されていません".to_string())?;
    AppConfig::update_device_type(config_dir, device_type).map_err(|e| format!("設定の保存エラー: {:#}", e))
}
