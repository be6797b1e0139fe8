//! 設定
/// Settings file loader
mod loader;
/// Configuration manager
mod manager;
/// Translation metadata source
mod metadata;
/// Typed key/value store
pub mod store;
/// Configuration types and settings
mod types;

pub use loader::SETTINGS_FILE_NAME;
pub use manager::ConfigManager;
pub use metadata::{
    MetadataSource,
    TranslationMetadata,
};
pub use store::{
    Configurations,
    JsonFileConfiguration,
    MemoryConfiguration,
    StoreError,
};
pub use types::{
    CacheSettings,
    ConfigError,
    Settings,
    ValidationError,
};
