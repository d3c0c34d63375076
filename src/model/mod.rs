//! 外部モデル連携
//!
//! セッションからは `ReceiptModel` トレイト越しに呼び出す。
//! 本番実装は Gemini API（`GeminiClient`）。

mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use async_trait::async_trait;
use receipt_scan_common::ExtractionRequest;

/// 指示文と画像/PDFを受け取り、自由文のレスポンスを返すモデル
#[async_trait]
pub trait ReceiptModel: Send + Sync {
    async fn generate(&self, api_key: &str, request: &ExtractionRequest) -> Result<String>;
}

#[async_trait]
impl<M: ReceiptModel + ?Sized> ReceiptModel for Box<M> {
    async fn generate(&self, api_key: &str, request: &ExtractionRequest) -> Result<String> {
        (**self).generate(api_key, request).await
    }
}
