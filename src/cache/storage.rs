//! 翻訳データの保存先

use std::io;
use std::path::{
    Path,
    PathBuf,
};

/// データディレクトリ内の保存先ディレクトリ名
pub const STORAGE_DIR_NAME: &str = "tag-translations";

/// ダウンロード中の一時ファイルの接尾辞
pub const TEMP_SUFFIX: &str = ".tmp";

/// 翻訳データの保存先
///
/// `<data_dir>/tag-translations/<name>` に正式なデータファイルを、
/// 更新中のみ `<name>.tmp` に一時ファイルを置く。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    /// `tag-translations` ディレクトリ
    dir: PathBuf,
}

impl StorageLayout {
    /// データディレクトリから作成
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self { dir: data_dir.join(STORAGE_DIR_NAME) }
    }

    /// 保存先ディレクトリ
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 正式なデータファイルのパス
    #[must_use]
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// 一時ファイルのパス
    #[must_use]
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{TEMP_SUFFIX}"))
    }

    /// 保存先ディレクトリが存在するか
    pub async fn dir_exists(&self) -> bool {
        tokio::fs::metadata(&self.dir).await.is_ok_and(|metadata| metadata.is_dir())
    }

    /// 保存先ディレクトリを作成する（既にあれば何もしない）
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }
}

/// 通常のファイルとして存在するか
pub async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|metadata| metadata.is_file())
}

/// ファイルを削除する。存在しない場合は何もしない
pub async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed {:?}", path),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => tracing::warn!(%error, "Failed to remove {:?}", path),
    }
}

/// ダウンロード済みの一時ファイルを正式なデータファイルに置き換える
///
/// Unix では `rename` が既存ファイルをアトミックに置き換えるので、
/// データファイルが存在しない瞬間は無い。それ以外のプラットフォームでは
/// 先に既存ファイルを削除してから `rename` する。
pub async fn replace_data_file(temp_file: &Path, data_file: &Path) -> io::Result<()> {
    #[cfg(not(unix))]
    remove_quietly(data_file).await;

    tokio::fs::rename(temp_file, data_file).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn layout_paths() {
        let layout = StorageLayout::new(Path::new("/data"));

        assert_eq!(layout.dir(), Path::new("/data/tag-translations"));
        assert_eq!(layout.data_file("db.json"), Path::new("/data/tag-translations/db.json"));
        assert_eq!(layout.temp_file("db.json"), Path::new("/data/tag-translations/db.json.tmp"));
    }

    #[tokio::test]
    async fn dir_exists_requires_directory() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        assert_that!(layout.dir_exists().await, eq(false));

        std::fs::write(layout.dir(), "not a directory").unwrap();
        assert_that!(layout.dir_exists().await, eq(false));

        std::fs::remove_file(layout.dir()).unwrap();
        layout.ensure_dir().await.unwrap();
        assert_that!(layout.dir_exists().await, eq(true));
    }

    #[tokio::test]
    async fn is_regular_file_rejects_directory() {
        let temp_dir = TempDir::new().unwrap();

        assert_that!(is_regular_file(temp_dir.path()).await, eq(false));
        assert_that!(is_regular_file(&temp_dir.path().join("missing")).await, eq(false));
    }

    #[tokio::test]
    async fn remove_quietly_ignores_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");

        remove_quietly(&path).await;
        std::fs::write(&path, "{}").unwrap();
        remove_quietly(&path).await;

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn replace_data_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        layout.ensure_dir().await.unwrap();
        let data_file = layout.data_file("db.json");
        let temp_file = layout.temp_file("db.json");
        std::fs::write(&data_file, "old").unwrap();
        std::fs::write(&temp_file, "new").unwrap();

        replace_data_file(&temp_file, &data_file).await.unwrap();

        assert_eq!(std::fs::read_to_string(&data_file).unwrap(), "new");
        assert!(!temp_file.exists());
    }
}
