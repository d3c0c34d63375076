//! プロンプト生成モジュール
//!
//! - RECEIPT_PROMPT: レシート読み取り指示（モデルとの契約なので文言を変えない）
//! - PROMPT_VERSION: 指示文のバージョン（キャッシュ無効化に使用）
//! - build_request: 指示文 + ペイロードからリクエストを組み立てる

use crate::types::{EncodedPayload, ExtractionRequest};

/// 指示文のバージョン。文言を変更したら上げる
pub const PROMPT_VERSION: u32 = 1;

/// レシート読み取り指示
pub const RECEIPT_PROMPT: &str = r#"Analyze this receipt and extract the following information in JSON format:
- amount: the total amount as a number (no currency symbols)
- date: the date of purchase in YYYY-MM-DD format
- merchant: the name of the store or vendor
- items: an array of purchased item names as strings

Return ONLY a valid JSON object with these fields. If a field cannot be determined, omit it from the response.

Example:
{
  "amount": 42.99,
  "date": "2024-01-15",
  "merchant": "Example Store",
  "items": ["Item 1", "Item 2"]
}"#;

/// 既定の指示文でリクエストを組み立てる
pub fn build_request(payload: EncodedPayload) -> ExtractionRequest {
    build_request_with(RECEIPT_PROMPT, payload)
}

/// 指示文を指定してリクエストを組み立てる（設定で上書きする場合）
pub fn build_request_with(instruction: &str, payload: EncodedPayload) -> ExtractionRequest {
    ExtractionRequest {
        instruction: instruction.to_string(),
        payload,
    }
}
