//! タグ翻訳テーブルのスナップショット
//!
//! 翻訳データ文書（UTF-8 の JSON）を一度だけ読み込み、
//! `namespace → (tag → 翻訳名)` の 2 段のマップとして保持する。
//! 構築後は不変。

use std::collections::HashMap;
use std::io::Read;

use serde_json::Value;
use thiserror::Error;

/// `namespace → (tag → 翻訳名)` のテーブル
pub type TagTable = HashMap<String, HashMap<String, String>>;

/// 翻訳データ文書の読み込みエラー
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Failed to read the underlying stream
    #[error("Failed to read translation data: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not a JSON document
    #[error("Translation data is not a valid document: {0}")]
    Syntax(#[from] serde_json::Error),

    /// A field is missing or has the wrong type
    #[error("Unexpected document shape at '{path}': expected {expected}")]
    Shape {
        /// JSON path to the offending field (e.g. "data[0].namespace")
        path: String,
        /// What was expected at that path
        expected: &'static str,
    },
}

impl SnapshotError {
    /// 何も組み立てられなかった（ファイルとして壊れている）エラーかどうか
    ///
    /// `Shape` は文書として読めているので該当しない。
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        !matches!(self, Self::Shape { .. })
    }

    /// `Shape` エラーを作成
    fn shape(path: impl Into<String>, expected: &'static str) -> Self {
        Self::Shape { path: path.into(), expected }
    }
}

/// パース結果
///
/// 途中で失敗しても、それまでに組み立てたテーブルを保持する。
#[derive(Debug, Default)]
struct ParseOutcome {
    /// 組み立て済みのテーブル
    tags: TagTable,
    /// 途中で発生したエラー
    error: Option<SnapshotError>,
}

/// 不変の翻訳テーブル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// `namespace → (tag → 翻訳名)`
    tags: TagTable,
}

impl Snapshot {
    /// バイトストリームからスナップショットを構築する
    ///
    /// 失敗は一切返さない。不正な文書の場合は、失敗するまでに組み立てた
    /// 分だけを持つスナップショット（空の場合もある）になる。
    #[must_use]
    pub fn from_reader(reader: impl Read) -> Self {
        let outcome = parse(reader);
        if let Some(error) = outcome.error {
            tracing::debug!(%error, "Discarding translation data error, keeping partial table");
        }
        Self { tags: outcome.tags }
    }

    /// 文字列からスナップショットを構築する（`from_reader` と同じ挙動）
    #[must_use]
    pub fn from_json_str(text: &str) -> Self {
        Self::from_reader(text.as_bytes())
    }

    /// 永続化されたデータファイルからスナップショットを構築する
    ///
    /// ストリームの読み込み・JSON パースに失敗した場合のみ `Err` を返す。
    /// フィールド欠落などの内容の不備は `from_reader` と同様に部分的なテーブルになる。
    ///
    /// # Errors
    /// - 読み込みエラー
    /// - JSON 構文エラー
    pub fn read_persisted(reader: impl Read) -> Result<Self, SnapshotError> {
        let outcome = parse(reader);
        match outcome.error {
            Some(error) if error.is_corrupt() => Err(error),
            Some(error) => {
                tracing::debug!(%error, "Persisted translation data is incomplete");
                Ok(Self { tags: outcome.tags })
            }
            None => Ok(Self { tags: outcome.tags }),
        }
    }

    /// タグの翻訳を取得する
    ///
    /// - namespace が存在しない: `Some(tag)`（元のタグをそのまま返す）
    /// - namespace は存在するがタグが存在しない: `None`
    /// - 両方存在する: `Some(翻訳名)`
    #[must_use]
    pub fn get_translation<'a>(&'a self, namespace: &str, tag: &'a str) -> Option<&'a str> {
        match self.tags.get(namespace) {
            Some(names) => names.get(tag).map(String::as_str),
            None => Some(tag),
        }
    }

    /// namespace が存在するか
    #[must_use]
    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.tags.contains_key(namespace)
    }

    /// 含まれる namespace の一覧（順序不定）
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// namespace の数
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// 翻訳データが空か
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// ストリームを読み込んでテーブルを組み立てる
fn parse(mut reader: impl Read) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    if let Err(error) = read_into(&mut reader, &mut outcome.tags) {
        outcome.error = Some(error);
    }
    outcome
}

/// ストリームを一度だけ UTF-8 としてデコードし、文書を `tags` に展開する
fn read_into(reader: &mut impl Read, tags: &mut TagTable) -> Result<(), SnapshotError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    // 不正なバイトは U+FFFD に置き換え、文書全体は捨てない
    let text = String::from_utf8_lossy(&bytes);
    let document: Value = serde_json::from_str(&text)?;

    let entries = document
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| SnapshotError::shape("data", "an array"))?;

    for (index, entry) in entries.iter().enumerate() {
        let namespace = entry
            .get("namespace")
            .and_then(Value::as_str)
            .ok_or_else(|| SnapshotError::shape(format!("data[{index}].namespace"), "a string"))?;

        // 同名の namespace は後勝ち。中身を読む前に登録するので、途中で失敗しても残る
        let names = tags.entry(namespace.to_string()).insert_entry(HashMap::new()).into_mut();

        let data = entry
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| SnapshotError::shape(format!("data[{index}].data"), "an object"))?;

        for (tag, value) in data {
            let name = value.get("name").and_then(Value::as_str).ok_or_else(|| {
                SnapshotError::shape(format!("data[{index}].data.{tag}.name"), "a string")
            })?;
            names.insert(tag.clone(), name.to_string());
        }
    }

    Ok(())
}
