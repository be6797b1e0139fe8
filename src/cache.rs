//! 自己更新するタグ翻訳キャッシュ
/// Remote data download
mod download;
/// Cache manager
mod manager;
/// On-disk layout of the translation data
pub mod storage;
/// Refresh outcome and error types
mod types;

pub use download::DownloadError;
pub use manager::TagTranslationCache;
pub use storage::StorageLayout;
pub use types::{
    CacheError,
    RefreshHandle,
    RefreshOutcome,
};
