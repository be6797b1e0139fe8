//! タグ翻訳のメタデータ（ローカルファイル名とリモート URL）

use std::path::PathBuf;

/// メタデータの供給元
///
/// 有効な場合は `[ローカルファイル名, リモート URL]` の 2 要素を返す。
/// それ以外の形はタグ翻訳が無効であることを意味する。
pub trait MetadataSource: Send + Sync {
    /// 現在のメタデータを取得
    fn metadata(&self) -> Vec<String>;

    /// 現在のデータディレクトリ
    ///
    /// `None` の場合、キャッシュは作成時の保存先を使い続ける。
    fn data_dir(&self) -> Option<PathBuf> {
        None
    }
}

impl MetadataSource for Vec<String> {
    fn metadata(&self) -> Vec<String> {
        self.clone()
    }
}

/// 解決済みのメタデータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationMetadata {
    /// 保存先ディレクトリ内のデータファイル名
    pub local_file_name: String,
    /// データファイルのダウンロード元
    pub remote_url: String,
}

impl TranslationMetadata {
    /// 供給元からメタデータを解決する
    ///
    /// 空でない文字列がちょうど 2 つある場合のみ `Some` を返す
    #[must_use]
    pub fn resolve(source: &dyn MetadataSource) -> Option<Self> {
        let [local_file_name, remote_url]: [String; 2] = source.metadata().try_into().ok()?;
        if local_file_name.is_empty() || remote_url.is_empty() {
            return None;
        }
        Some(Self { local_file_name, remote_url })
    }
}
