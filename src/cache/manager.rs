//! 自己更新するタグ翻訳キャッシュ

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use super::download;
use super::storage::{
    self,
    StorageLayout,
};
use super::types::{
    CacheError,
    RefreshHandle,
    RefreshOutcome,
};
use crate::config::{
    ConfigManager,
    MetadataSource,
    TranslationMetadata,
};
use crate::snapshot::{
    Snapshot,
    SnapshotError,
};

/// タグ翻訳キャッシュ
///
/// 公開中のスナップショットを `ArcSwapOption` で保持し、読み込み側は
/// ロックを取らずに参照する。`load` / `update` はバックグラウンドで実行され、
/// 更新用ロックを `try_lock` で取れなかった場合は何もせずに終了する。
///
/// # ライフサイクル
///
/// 1. `load` / `update` の開始時に公開中のスナップショットを破棄する
/// 2. スナップショットの構築に成功した場合のみ公開する
pub struct TagTranslationCache {
    /// 公開中のスナップショット
    published: ArcSwapOption<Snapshot>,
    /// `load` と `update` を排他する
    refresh_lock: Mutex<()>,
    /// `[ローカルファイル名, リモート URL]` の供給元
    metadata: Arc<dyn MetadataSource>,
    /// メタデータの供給元がデータディレクトリを持たない場合の保存先
    default_storage: StorageLayout,
    /// ダウンロード用クライアント
    client: reqwest::Client,
    /// バックグラウンド処理の実行先
    runtime: Handle,
}

impl TagTranslationCache {
    /// 新しいキャッシュを作成
    ///
    /// 現在の tokio ランタイム上でバックグラウンド処理を実行する。
    ///
    /// # Errors
    /// - tokio ランタイム外で呼び出された
    /// - HTTP クライアントの作成に失敗した
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        storage: StorageLayout,
        request_timeout: Duration,
    ) -> Result<Self, CacheError> {
        let runtime = Handle::try_current()?;
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            published: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
            metadata,
            default_storage: storage,
            client,
            runtime,
        })
    }

    /// 設定マネージャーの現在の設定から作成
    ///
    /// メタデータと `dataDir` は呼び出しのたびに設定マネージャーから読み直す。
    /// `requestTimeoutSecs` は HTTP クライアントに組み込むので、作成時の値で固定される。
    ///
    /// # Errors
    /// - [`Self::new`] と同じ
    pub fn from_config(config: Arc<ConfigManager>) -> Result<Self, CacheError> {
        let settings = config.get_settings();
        Self::new(config, StorageLayout::new(&settings.data_dir), settings.request_timeout())
    }

    /// 現在の保存先
    #[must_use]
    pub fn storage(&self) -> StorageLayout {
        self.metadata
            .data_dir()
            .map_or_else(|| self.default_storage.clone(), |dir| StorageLayout::new(&dir))
    }

    /// タグ翻訳が利用可能な設定か
    #[must_use]
    pub fn is_possible(&self) -> bool {
        self.resolve_metadata().is_some()
    }

    /// 公開中のスナップショットを取得
    ///
    /// 設定が利用不可になっていた場合は公開中のスナップショットを破棄して `None` を返す。
    #[must_use]
    pub fn get_instance(&self) -> Option<Arc<Snapshot>> {
        if !self.is_possible() {
            self.clear();
        }
        self.published.load_full()
    }

    /// 公開中のスナップショットを取得（設定は確認しない）
    #[must_use]
    pub fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.published.load_full()
    }

    /// スナップショットを公開する
    pub fn publish(&self, snapshot: Snapshot) {
        self.published.store(Some(Arc::new(snapshot)));
    }

    /// 公開中のスナップショットを破棄する
    pub fn clear(&self) {
        self.published.store(None);
    }

    /// ローカルのデータファイルからスナップショットを読み込む（通信しない）
    ///
    /// 設定が利用不可の場合は何もスケジュールせず `None` を返す。
    pub fn load(self: &Arc<Self>) -> Option<RefreshHandle> {
        self.clear();
        let metadata = self.resolve_metadata()?;

        let cache = Arc::clone(self);
        let task = self.runtime.spawn(async move { cache.run_load(&metadata).await });
        Some(RefreshHandle::new(task))
    }

    /// リモートからデータファイルを取得して置き換え、スナップショットを読み込む
    ///
    /// 設定が利用不可の場合は何もスケジュールせず `None` を返す。
    pub fn update(self: &Arc<Self>) -> Option<RefreshHandle> {
        self.clear();
        let metadata = self.resolve_metadata()?;

        let cache = Arc::clone(self);
        let task = self.runtime.spawn(async move { cache.run_update(&metadata).await });
        Some(RefreshHandle::new(task))
    }

    /// メタデータを解決する
    fn resolve_metadata(&self) -> Option<TranslationMetadata> {
        let metadata = TranslationMetadata::resolve(self.metadata.as_ref());
        if metadata.is_none() {
            tracing::debug!("Tag translation metadata is unavailable");
        }
        metadata
    }

    /// `load` の本体
    async fn run_load(&self, metadata: &TranslationMetadata) -> RefreshOutcome {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            tracing::debug!("Another tag translation refresh is running, skipping load");
            return RefreshOutcome::Contended;
        };

        let storage = self.storage();
        if !storage.dir_exists().await {
            tracing::debug!("Tag translation directory not found: {:?}", storage.dir());
            return RefreshOutcome::StorageMissing;
        }

        let data_file = storage.data_file(&metadata.local_file_name);
        if !storage::is_regular_file(&data_file).await {
            tracing::debug!("Tag translation data not found: {:?}", data_file);
            return RefreshOutcome::DataMissing;
        }

        self.read_and_publish(&data_file).await
    }

    /// `update` の本体
    async fn run_update(&self, metadata: &TranslationMetadata) -> RefreshOutcome {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            tracing::debug!("Another tag translation refresh is running, skipping update");
            return RefreshOutcome::Contended;
        };

        let storage = self.storage();
        if let Err(error) = storage.ensure_dir().await {
            tracing::warn!(%error, "Failed to create {:?}", storage.dir());
            return RefreshOutcome::StorageMissing;
        }

        // 一時ファイルにダウンロードする。失敗しても既存のデータファイルはそのまま
        let temp_file = storage.temp_file(&metadata.local_file_name);
        if let Err(error) = download::save(&self.client, &metadata.remote_url, &temp_file).await {
            tracing::warn!(%error, url = %metadata.remote_url, "Failed to download tag translations");
            storage::remove_quietly(&temp_file).await;
            return RefreshOutcome::DownloadFailed;
        }

        let data_file = storage.data_file(&metadata.local_file_name);
        if let Err(error) = storage::replace_data_file(&temp_file, &data_file).await {
            tracing::warn!(%error, "Failed to replace {:?}", data_file);
            storage::remove_quietly(&temp_file).await;
            return RefreshOutcome::ReplaceFailed;
        }

        self.read_and_publish(&data_file).await
    }

    /// データファイルを読み込んで公開する。読めない場合はデータファイルを削除する
    async fn read_and_publish(&self, data_file: &Path) -> RefreshOutcome {
        match read_snapshot(data_file.to_path_buf()).await {
            Ok(snapshot) => {
                let namespaces = snapshot.len();
                self.publish(snapshot);
                tracing::info!(namespaces, "Published tag translations from {:?}", data_file);
                RefreshOutcome::Published { namespaces }
            }
            Err(error) => {
                tracing::warn!(%error, "Tag translation data is corrupt, removing {:?}", data_file);
                storage::remove_quietly(data_file).await;
                RefreshOutcome::Corrupt
            }
        }
    }
}

/// データファイルを読み込む
///
/// パースは CPU を使うのでブロッキングスレッドで行う
async fn read_snapshot(data_file: PathBuf) -> Result<Snapshot, SnapshotError> {
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&data_file)?;
        Snapshot::read_persisted(std::io::BufReader::new(file))
    })
    .await
    .map_err(|error| SnapshotError::Io(std::io::Error::other(error)))?
}

impl std::fmt::Debug for TagTranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagTranslationCache")
            .field("published", &self.current_snapshot().as_deref().map(Snapshot::len))
            .field("refresh_lock", &self.refresh_lock)
            .field("metadata", &"<dyn MetadataSource>")
            .field("storage", &self.storage())
            .finish_non_exhaustive()
    }
}
