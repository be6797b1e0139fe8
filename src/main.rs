//! Entry point: refreshes the tag translation cache and translates `NAMESPACE:TAG` arguments.
//!
//! ```text
//! tag-translation-cache [ROOT] [NAMESPACE:TAG ...]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{
    Duration,
    SystemTime,
    UNIX_EPOCH,
};

use tag_translation_cache::cache::RefreshOutcome;
use tag_translation_cache::config::{
    ConfigManager,
    Configurations,
    JsonFileConfiguration,
};
use tag_translation_cache::{
    Snapshot,
    TagTranslationCache,
};
use tracing_subscriber::EnvFilter;

/// 状態ファイル名（データディレクトリ直下）
const STATE_FILE_NAME: &str = "tag-translation-state.json";

/// 最後に `update` が成功した時刻（UNIX 秒）
const LAST_UPDATE_KEY: &str = "tag_translation_last_update";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let root = args.next().map_or_else(|| PathBuf::from("."), PathBuf::from);
    let queries: Vec<String> = args.collect();

    let config = Arc::new(ConfigManager::new());
    if let Err(error) = config.load_settings(Some(root)) {
        tracing::error!("Configuration error: {}", error);
        return ExitCode::FAILURE;
    }
    let settings = config.get_settings();

    let cache = match TagTranslationCache::from_config(Arc::clone(&config)) {
        Ok(cache) => Arc::new(cache),
        Err(error) => {
            tracing::error!("Failed to create tag translation cache: {}", error);
            return ExitCode::FAILURE;
        }
    };
    if !cache.is_possible() {
        tracing::warn!("Tag translation is disabled: set tagTranslation.metadata to [file, url]");
    }

    let store = match JsonFileConfiguration::open(settings.data_dir.join(STATE_FILE_NAME)) {
        Ok(store) => store,
        Err(error) => {
            tracing::error!("Failed to open state file: {}", error);
            return ExitCode::FAILURE;
        }
    };

    if let Some(handle) = cache.load() {
        let outcome = handle.wait().await;
        tracing::debug!(?outcome, "Load finished");
    }

    if update_due(&store, settings.update_interval())
        && let Some(handle) = cache.update()
    {
        let outcome = handle.wait().await;
        tracing::info!(?outcome, "Update finished");
        if matches!(outcome, RefreshOutcome::Published { .. }) {
            store.put_int(LAST_UPDATE_KEY, now_secs());
        } else if let Some(handle) = cache.load() {
            // 更新に失敗しても、残っているデータファイルがあれば使う
            handle.wait().await;
        }
    }

    print_translations(cache.get_instance().as_deref(), &queries);
    ExitCode::SUCCESS
}

/// `RUST_LOG` の値からログフィルタを作る。未設定・空・不正な場合は `info`
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// 前回の更新から `interval` 以上経過しているか
fn update_due(store: &dyn Configurations, interval: Duration) -> bool {
    let last_update = store.get_int(LAST_UPDATE_KEY, 0);
    let interval = i64::try_from(interval.as_secs()).unwrap_or(i64::MAX);
    now_secs().saturating_sub(last_update) >= interval
}

/// 現在時刻（UNIX 秒）
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// `NAMESPACE:TAG` ごとに翻訳を出力する
#[allow(clippy::print_stdout)]
fn print_translations(snapshot: Option<&Snapshot>, queries: &[String]) {
    for query in queries {
        let Some((namespace, tag)) = query.split_once(':') else {
            tracing::warn!("Expected NAMESPACE:TAG, got {:?}", query);
            continue;
        };
        let translation = snapshot.map_or(Some(tag), |snapshot| snapshot.get_translation(namespace, tag));
        println!("{query}\t{}", translation.unwrap_or("-"));
    }
}
