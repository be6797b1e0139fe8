//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    Settings,
};

/// 設定ファイル名
pub const SETTINGS_FILE_NAME: &str = ".tag-translation.json";

/// ディレクトリから設定を読み込む
///
/// `.tag-translation.json` ファイルを探して読み込む
///
/// # Arguments
/// * `root` - 設定ファイルを探すディレクトリ
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub(super) fn load_from_dir(root: &Path) -> Result<Option<Settings>, ConfigError> {
    let config_path = root.join(SETTINGS_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let mut settings: Settings = serde_json::from_str(&content)?;

    // 相対パスは設定ファイルの場所から解決する
    let data_dir = &settings.tag_translation.data_dir;
    if data_dir.is_relative() {
        settings.tag_translation.data_dir = root.join(data_dir);
    }

    Ok(Some(settings))
}
