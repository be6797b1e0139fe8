//! 型付きキー・バリューストア
//!
//! 値はすべて文字列として保存する。真偽値は大文字小文字を区別しない
//! `"true"` / `"false"`、整数は 10 進表記。
//! 値が無い場合や解釈できない場合は、デフォルト値を書き戻してから返す。

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Mutex,
    MutexGuard,
    PoisonError,
};

use thiserror::Error;

/// ストアの読み書きエラー
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read or write the backing file
    #[error("Failed to access configuration store: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a flat JSON object of strings
    #[error("Failed to parse configuration store: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 型付きキー・バリューストア
///
/// 実装するのは文字列の読み書きだけで、型変換はデフォルト実装が行う
pub trait Configurations: Send + Sync {
    /// 保存されている文字列を取得
    fn get_raw(&self, key: &str) -> Option<String>;

    /// 文字列を保存
    fn put_raw(&self, key: &str, value: String);

    /// キーが存在するか
    fn contains(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    /// 真偽値を取得
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get_raw(key) {
            Some(value) if value.eq_ignore_ascii_case("true") => true,
            Some(value) if value.eq_ignore_ascii_case("false") => false,
            _ => {
                self.put_bool(key, default);
                default
            }
        }
    }

    /// 真偽値を保存
    fn put_bool(&self, key: &str, value: bool) {
        self.put_raw(key, value.to_string());
    }

    /// 整数を取得
    fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get_raw(key).map(|value| value.parse::<i64>()) {
            Some(Ok(value)) => value,
            _ => {
                self.put_int(key, default);
                default
            }
        }
    }

    /// 整数を保存
    fn put_int(&self, key: &str, value: i64) {
        self.put_raw(key, value.to_string());
    }

    /// 文字列を取得
    fn get_string(&self, key: &str, default: &str) -> String {
        self.get_raw(key).unwrap_or_else(|| {
            self.put_string(key, default);
            default.to_string()
        })
    }

    /// 文字列を保存
    fn put_string(&self, key: &str, value: &str) {
        self.put_raw(key, value.to_string());
    }
}

/// ロックを取得する（ポイズンは無視する）
fn lock(entries: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// メモリ上のストア
#[derive(Debug, Default)]
pub struct MemoryConfiguration {
    /// 保存された値
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryConfiguration {
    /// 空のストアを作成
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Configurations for MemoryConfiguration {
    fn get_raw(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn put_raw(&self, key: &str, value: String) {
        lock(&self.entries).insert(key.to_string(), value);
    }
}

/// JSON ファイルに永続化するストア
///
/// 書き込みのたびにファイル全体を書き直す
#[derive(Debug)]
pub struct JsonFileConfiguration {
    /// 保存先
    path: PathBuf,
    /// 保存された値
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileConfiguration {
    /// ファイルを開く（存在しない場合は空のストア）
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            tracing::debug!("Configuration store not found, starting empty: {:?}", path);
            BTreeMap::new()
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    /// 保存先のパス
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイルに書き出す
    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Configurations for JsonFileConfiguration {
    fn get_raw(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn put_raw(&self, key: &str, value: String) {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value);
        if let Err(error) = self.persist(&entries) {
            tracing::warn!(%error, path = %self.path.display(), "Failed to persist configuration");
        }
    }
}
