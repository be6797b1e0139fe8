//! テスト用ユーティリティ
//!
//! 複数のテストモジュールで使用される翻訳データと HTTP サーバーを提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::sync::mpsc;

use tokio::sync::mpsc as async_mpsc;

/// `rows` namespace のみの翻訳データ
pub(crate) const ROWS_DOCUMENT: &str = r#"{"head":{"sha":"0"},"data":[{"namespace":"rows","data":{"female":{"name":"♀","intro":""},"large":{"name":"L"}}}]}"#;

/// `rows` と `cols` を含む翻訳データ
pub(crate) const COLS_DOCUMENT: &str = r#"{"data":[{"namespace":"rows","data":{"large":{"name":"L"}}},{"namespace":"cols","data":{"wide":{"name":"W"}}}]}"#;

/// 固定のレスポンスを返すローカル HTTP サーバー
///
/// リクエストごとに同じステータスとボディを返す。`serve_gated` で作成した場合は
/// `release` が呼ばれるまでレスポンスを保留する。
pub(crate) struct TestServer {
    /// データファイルの URL
    url: String,
    /// 受け付けたリクエスト数
    hits: Arc<AtomicUsize>,
    /// リクエスト到着の通知
    arrived: async_mpsc::UnboundedReceiver<()>,
    /// 保留中のレスポンスを解放する
    gate: Option<mpsc::Sender<()>>,
}

impl TestServer {
    /// すぐにレスポンスを返すサーバーを起動
    pub(crate) fn serve(status: u16, body: &'static [u8]) -> Self {
        Self::start(status, body, false)
    }

    /// `release` までレスポンスを保留するサーバーを起動
    pub(crate) fn serve_gated(status: u16, body: &'static [u8]) -> Self {
        Self::start(status, body, true)
    }

    /// サーバースレッドを起動
    fn start(status: u16, body: &'static [u8], gated: bool) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().expect("TCP listener");
        let hits = Arc::new(AtomicUsize::new(0));
        let (arrived_tx, arrived) = async_mpsc::unbounded_channel();
        let (gate, gate_rx) = if gated {
            let (tx, rx) = mpsc::channel::<()>();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let counter = Arc::clone(&hits);
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = arrived_tx.send(());
                if let Some(gate_rx) = &gate_rx {
                    // 送信側が drop された場合もレスポンスを返す
                    let _ = gate_rx.recv();
                }
                let response = tiny_http::Response::from_data(body).with_status_code(status);
                let _ = request.respond(response);
            }
        });

        Self { url: format!("http://{addr}/db.text.json"), hits, arrived, gate }
    }

    /// データファイルの URL
    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// 受け付けたリクエスト数
    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// 次のリクエストが到着するまで待つ
    pub(crate) async fn request_arrived(&mut self) {
        self.arrived.recv().await.expect("server thread stopped");
    }

    /// 保留中のレスポンスを 1 つ返す
    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.send(()).unwrap();
        }
    }
}
