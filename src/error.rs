use thiserror::Error;

/// 画面/CLIに表示する汎用メッセージ（内部エラーの詳細は出さない）
pub const PROCESS_FAILED_MESSAGE: &str = "Failed to process receipt. Please try again.";
pub const MISSING_API_KEY_MESSAGE: &str =
    "API key is not configured. Please set your Gemini API key with `receipt-scan config --set-api-key YOUR_KEY`.";
pub const UNSUPPORTED_FILE_MESSAGE: &str =
    "Unsupported file type. Please upload an image (JPEG, PNG, HEIC) or a PDF file.";
pub const TIMEOUT_MESSAGE: &str = "Receipt processing timed out. Please try again.";
pub const NO_FILE_MESSAGE: &str = "Please select a receipt file first.";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`receipt-scan config --set-api-key YOUR_KEY` で設定してください")]
    MissingApiKey,

    #[error("未対応のファイル形式: {0}")]
    UnsupportedFileType(String),

    #[error("ファイルが選択されていません")]
    NoFileSelected,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("ファイル読み込みエラー: {0}")]
    Encoding(String),

    #[error("PDFにページがありません")]
    EmptyDocument,

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIのレート制限に達しました")]
    RateLimited,

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("API呼び出しがタイムアウトしました（{0}秒）")]
    Timeout(u64),

    #[error("レスポンスにJSONが見つかりません")]
    NoJsonFound,

    #[error("レスポンスのJSONが不正: {0}")]
    MalformedJson(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("レシートが見つかりません: {0}")]
    NoReceiptsFound(String),
}

impl ScanError {
    /// ユーザー向けメッセージ
    ///
    /// 読み込み・API・パースの失敗はすべて同じ汎用メッセージにまとめる。
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::UnsupportedFileType(_) => UNSUPPORTED_FILE_MESSAGE,
            ScanError::MissingApiKey => MISSING_API_KEY_MESSAGE,
            ScanError::NoFileSelected => NO_FILE_MESSAGE,
            ScanError::Timeout(_) => TIMEOUT_MESSAGE,
            _ => PROCESS_FAILED_MESSAGE,
        }
    }

    /// ログ用の分類名
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Config(_) => "config",
            ScanError::MissingApiKey => "missing_credential",
            ScanError::UnsupportedFileType(_) => "unsupported_file_type",
            ScanError::NoFileSelected => "no_file_selected",
            ScanError::FileNotFound(_) | ScanError::FolderNotFound(_) => "not_found",
            ScanError::Encoding(_) => "encoding",
            ScanError::EmptyDocument => "empty_document",
            ScanError::ApiCall(_) => "api_call",
            ScanError::RateLimited => "rate_limited",
            ScanError::ApiParse(_) => "api_parse",
            ScanError::Timeout(_) => "timeout",
            ScanError::NoJsonFound => "no_json_found",
            ScanError::MalformedJson(_) => "malformed_json",
            ScanError::JsonParse(_) => "json",
            ScanError::Io(_) => "io",
            ScanError::ExcelGeneration(_) => "excel",
            ScanError::NoReceiptsFound(_) => "no_receipts",
        }
    }
}

impl From<receipt_scan_common::Error> for ScanError {
    fn from(err: receipt_scan_common::Error) -> Self {
        use receipt_scan_common::Error as CommonError;
        match err {
            CommonError::NoJsonFound => ScanError::NoJsonFound,
            CommonError::MalformedJson(msg) => ScanError::MalformedJson(msg),
            CommonError::Json(e) => ScanError::JsonParse(e),
            CommonError::Io(e) => ScanError::Io(e),
            CommonError::Config(msg) => ScanError::Config(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
