//! 翻訳データのダウンロード

use std::path::Path;

use futures::StreamExt;
use reqwest::{
    Client,
    StatusCode,
};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// ダウンロードエラー
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Connection, timeout or body stream failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("Server responded with {0}")]
    Status(StatusCode),

    /// 2xx response without any content
    #[error("Response body is empty")]
    EmptyBody,

    /// Failed to write the destination file
    #[error("Failed to write downloaded data: {0}")]
    Io(#[from] std::io::Error),
}

/// `url` を GET し、レスポンスボディをそのまま `file` に書き込む
///
/// 失敗時に `file` が途中まで書かれている可能性がある。後始末は呼び出し側で行う。
///
/// # Returns
/// 書き込んだバイト数
///
/// # Errors
/// - 通信エラー（タイムアウトを含む）
/// - 2xx 以外のステータス
/// - 空のボディ
/// - ファイル書き込みエラー
pub async fn save(client: &Client, url: &str, file: &Path) -> Result<u64, DownloadError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status(status));
    }

    let mut output = tokio::fs::File::create(file).await?;
    let mut body = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        output.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    output.flush().await?;
    output.sync_all().await?;

    if written == 0 {
        return Err(DownloadError::EmptyBody);
    }

    tracing::debug!(bytes = written, "Downloaded {} to {:?}", url, file);
    Ok(written)
}
