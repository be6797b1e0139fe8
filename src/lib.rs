//! tag-translation-cache
//!
//! リモートから定期的に取得する翻訳データを元にした、自己更新型のタグ翻訳キャッシュ

pub mod cache;
pub mod config;
pub mod snapshot;

#[cfg(test)]
mod test_utils;

pub use cache::TagTranslationCache;
pub use snapshot::Snapshot;
