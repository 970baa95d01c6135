fn main() {
    // Tauriアプリとしてビルドする時だけ設定ファイルを処理する
    #[cfg(feature = "app")]
    tauri_build::build();
}
