//! モデルレスポンスパーサー
//!
//! モデルの自由文レスポンスからJSONオブジェクトを抽出し、
//! ReceiptDataへ変換して description を導出する

use crate::error::{Error, Result};
use crate::types::ReceiptData;

/// description に使う品目数
const DESCRIPTION_ITEM_COUNT: usize = 3;

/// レスポンスからJSONオブジェクト部分を抽出
///
/// 最初の `{` から最後の `}` までを返す。前後の説明文や
/// ```json ... ``` のコードフェンスは無視される。
///
/// # Examples
/// ```
/// use receipt_scan_common::extract_json_object;
///
/// let response = "Here you go: {\"merchant\": \"Acme\"} Thanks!";
/// assert_eq!(extract_json_object(response).unwrap(), "{\"merchant\": \"Acme\"}");
/// ```
pub fn extract_json_object(response: &str) -> Result<&str> {
    let start = response.find('{').ok_or(Error::NoJsonFound)?;
    let end = response.rfind('}').ok_or(Error::NoJsonFound)?;
    if end < start {
        return Err(Error::NoJsonFound);
    }
    Ok(&response[start..=end])
}

/// レスポンスをパースして ReceiptData を返す
///
/// # Returns
/// * `Err(Error::NoJsonFound)` - `{...}` が見つからない
/// * `Err(Error::MalformedJson)` - 見つかった範囲がJSONオブジェクトとして不正
pub fn parse_receipt_response(response: &str) -> Result<ReceiptData> {
    let json_str = extract_json_object(response)?;
    let mut data: ReceiptData =
        serde_json::from_str(json_str).map_err(|e| Error::MalformedJson(e.to_string()))?;
    data.description = derive_description(&data);
    Ok(data)
}

/// description を導出
///
/// 1. 品目があれば先頭3件を ", " で連結（4件以上なら末尾に "..."）
/// 2. 品目がなければ店舗名
/// 3. どちらもなければ None
pub fn derive_description(data: &ReceiptData) -> Option<String> {
    if let Some(items) = data.items.as_ref().filter(|items| !items.is_empty()) {
        let mut description = items
            .iter()
            .take(DESCRIPTION_ITEM_COUNT)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if items.len() > DESCRIPTION_ITEM_COUNT {
            description.push_str("...");
        }
        return Some(description);
    }

    data.merchant
        .as_ref()
        .filter(|merchant| !merchant.is_empty())
        .cloned()
}
