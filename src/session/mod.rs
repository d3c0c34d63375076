//! 読み取りセッション
//!
//! ドロップ → プレビュー → 読み取り（エンコード → リクエスト → パース）の状態を管理する。
//!
//! - 操作はすべて `&mut self` なので、1セッションで同時に2件は処理できない
//! - 処理中の `process` を破棄（drop）すれば進行中のAPI呼び出しも中断される。
//!   その後に新しいファイルをドロップすれば置き換えになる
//! - プレビューは置き換え・クリア・セッション破棄のいずれかで1回だけ解放される

mod preview;

pub use preview::{PreviewHandle, PreviewStore, TempDirPreviews};

use crate::encoder::{self, ReceiptFile};
use crate::error::{Result, ScanError};
use crate::model::ReceiptModel;
use receipt_scan_common::{build_request_with, is_accepted, parse_receipt_response, ReceiptData, RECEIPT_PROMPT};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// 読み取り結果のコールバック（成功1回につき1回呼ばれる）
pub type ReceiptCallback = Box<dyn FnMut(ReceiptData) + Send>;

/// セッションの段階（エラー表示はこれと独立）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Previewing,
    Loading,
}

struct Preview {
    handle: PreviewHandle,
    file: ReceiptFile,
}

#[derive(Default)]
struct SessionState {
    is_loading: bool,
    error: Option<String>,
    preview: Option<Preview>,
}

/// 処理中フラグを戻すガード（`process` が途中で破棄されても戻る）
struct LoadingGuard<'a> {
    is_loading: &'a mut bool,
}

impl<'a> LoadingGuard<'a> {
    fn begin(is_loading: &'a mut bool) -> Self {
        *is_loading = true;
        Self { is_loading }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.is_loading = false;
    }
}

pub struct ScanSession<M, P>
where
    M: ReceiptModel,
    P: PreviewStore,
{
    model: M,
    previews: P,
    api_key: Option<String>,
    instruction: String,
    timeout: Duration,
    on_receipt: Option<ReceiptCallback>,
    state: SessionState,
}

impl<M, P> ScanSession<M, P>
where
    M: ReceiptModel,
    P: PreviewStore,
{
    pub fn new(model: M, previews: P, api_key: Option<String>) -> Self {
        Self {
            model,
            previews,
            api_key,
            instruction: RECEIPT_PROMPT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            on_receipt: None,
            state: SessionState::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// 読み取り成功時のコールバックを登録
    pub fn on_receipt_data<F>(mut self, callback: F) -> Self
    where
        F: FnMut(ReceiptData) + Send + 'static,
    {
        self.on_receipt = Some(Box::new(callback));
        self
    }

    /// モデルに送る指示文
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn phase(&self) -> Phase {
        if self.state.is_loading {
            Phase::Loading
        } else if self.state.preview.is_some() {
            Phase::Previewing
        } else {
            Phase::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.state.preview.as_ref().map(|p| p.handle.url())
    }

    pub fn file_type(&self) -> Option<&str> {
        self.state.preview.as_ref().map(|p| p.file.mime_type())
    }

    pub fn previews(&self) -> &P {
        &self.previews
    }

    /// ファイルをドロップ
    ///
    /// 既存のプレビューを解放してから、受付可能な形式ならプレビューを作る。
    /// 未対応形式はプレビューを作らず Idle + エラーになる。
    pub fn drop_file(&mut self, file: ReceiptFile) -> Result<()> {
        self.reset();

        if !is_accepted(file.mime_type()) {
            tracing::info!(file = file.name(), mime_type = file.mime_type(), "unsupported file dropped");
            let err = ScanError::UnsupportedFileType(file.mime_type().to_string());
            self.state.error = Some(err.user_message().to_string());
            return Err(err);
        }

        let handle = match self.previews.create(&file) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::error!(file = file.name(), kind = err.kind(), error = %err, "failed to create preview");
                self.state.error = Some(err.user_message().to_string());
                return Err(err);
            }
        };

        tracing::info!(file = file.name(), url = handle.url(), "preview created");
        self.state.preview = Some(Preview { handle, file });
        Ok(())
    }

    /// プレビュー中のファイルを読み取る
    ///
    /// 成功時はコールバックを1回呼び、結果も返す。失敗時はプレビューを残したまま
    /// ユーザー向けメッセージをエラーに設定する（詳細はログのみ）。
    pub async fn process(&mut self) -> Result<ReceiptData> {
        let Some(preview) = self.state.preview.as_ref() else {
            let err = ScanError::NoFileSelected;
            self.state.error = Some(err.user_message().to_string());
            return Err(err);
        };

        let Some(api_key) = self.api_key.as_deref().filter(|key| !key.trim().is_empty()) else {
            let err = ScanError::MissingApiKey;
            tracing::warn!("API key is not configured; skipping model call");
            self.state.error = Some(err.user_message().to_string());
            return Err(err);
        };

        self.state.error = None;
        let loading = LoadingGuard::begin(&mut self.state.is_loading);
        let outcome = extract(&self.model, api_key, &preview.file, &self.instruction, self.timeout).await;
        drop(loading);

        match outcome {
            Ok(data) => {
                tracing::info!(
                    merchant = data.merchant.as_deref().unwrap_or("-"),
                    amount = data.amount,
                    "receipt processed"
                );
                if let Some(callback) = self.on_receipt.as_mut() {
                    callback(data.clone());
                }
                Ok(data)
            }
            Err(err) => {
                tracing::error!(kind = err.kind(), error = %err, "failed to process receipt");
                self.state.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    /// ドロップして読み取る（ドロップゾーンの操作）
    pub async fn handle_file(&mut self, file: ReceiptFile) -> Result<ReceiptData> {
        self.drop_file(file)?;
        self.process().await
    }

    /// プレビューを解放して Idle に戻す
    pub fn clear(&mut self) {
        self.reset();
        tracing::debug!("session cleared");
    }

    fn reset(&mut self) {
        self.release_preview();
        self.state.is_loading = false;
        self.state.error = None;
    }

    fn release_preview(&mut self) {
        if let Some(preview) = self.state.preview.take() {
            tracing::debug!(url = preview.handle.url(), "releasing preview");
            self.previews.release(preview.handle);
        }
    }
}

impl<M, P> Drop for ScanSession<M, P>
where
    M: ReceiptModel,
    P: PreviewStore,
{
    fn drop(&mut self) {
        self.release_preview();
    }
}

/// エンコード → リクエスト組み立て → モデル呼び出し → パース
async fn extract<M: ReceiptModel>(
    model: &M,
    api_key: &str,
    file: &ReceiptFile,
    instruction: &str,
    timeout: Duration,
) -> Result<ReceiptData> {
    let payload = encoder::encode(file)?;
    let request = build_request_with(instruction, payload);

    let response = tokio::time::timeout(timeout, model.generate(api_key, &request))
        .await
        .map_err(|_| ScanError::Timeout(timeout.as_secs()))??;

    let data = parse_receipt_response(&response)?;
    if data.is_blank() {
        tracing::warn!(file = file.name(), "model returned no receipt fields");
    }
    Ok(data)
}
