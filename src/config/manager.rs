//! 設定管理を行うモジュール

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{
    CacheSettings,
    ConfigError,
    MetadataSource,
    loader,
};

/// 設定管理を行う
///
/// 設定は `ArcSwap` で保持するので、キャッシュのバックグラウンド処理から
/// ロックなしで読みつつ、`&self` で差し替えられる。
#[derive(Default, Debug)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: ArcSwap<CacheSettings>,

    /// 設定ファイルを探したディレクトリ
    root: ArcSwap<Option<PathBuf>>,
}

impl ConfigManager {
    /// 新しい設定マネージャーを作成
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定の設定で作成
    ///
    /// # Errors
    /// - バリデーションエラー
    pub fn with_settings(settings: CacheSettings) -> Result<Self, ConfigError> {
        let manager = Self::new();
        manager.update_settings(settings)?;
        Ok(manager)
    }

    /// 設定を読み込む
    ///
    /// # Arguments
    /// * `root` - 設定ファイルを探すディレクトリ
    ///
    /// # Returns
    /// - `Ok(())`: 設定の読み込みとバリデーション成功
    /// - `Err(ConfigError)`: エラー
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&self, root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings from: {:?}", root);

        let settings = if let Some(root) = &root {
            loader::load_from_dir(root)?.map_or_else(CacheSettings::default, |loaded| {
                tracing::debug!("Loaded settings: {:?}", loaded);
                loaded.tag_translation
            })
        } else {
            CacheSettings::default()
        };

        // バリデーション
        settings.validate().map_err(ConfigError::ValidationErrors)?;

        // 設定を保存
        self.current_settings.store(Arc::new(settings));
        self.root.store(Arc::new(root));
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings.load());

        Ok(())
    }

    /// 設定を更新する
    ///
    /// # Errors
    /// - バリデーションエラー
    pub fn update_settings(&self, new_settings: CacheSettings) -> Result<(), ConfigError> {
        tracing::debug!("Updating settings...");

        // バリデーション
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        // 設定を更新
        self.current_settings.store(Arc::new(new_settings));
        tracing::debug!("Settings updated successfully");

        Ok(())
    }

    /// 現在の設定を取得
    #[must_use]
    pub fn get_settings(&self) -> Arc<CacheSettings> {
        self.current_settings.load_full()
    }

    /// 設定ファイルを探したディレクトリを取得
    #[must_use]
    pub fn root(&self) -> Option<PathBuf> {
        Option::clone(&self.root.load())
    }
}

impl MetadataSource for ConfigManager {
    fn metadata(&self) -> Vec<String> {
        self.current_settings.load().metadata.clone()
    }

    fn data_dir(&self) -> Option<PathBuf> {
        Some(self.current_settings.load().data_dir.clone())
    }
}
