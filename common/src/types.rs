//! レシート読み取りの型定義
//!
//! CLIとセッションで共有される型:
//! - ReceiptData: 読み取り結果（呼び出し元へ渡すレコード）
//! - EncodedPayload: 送信用にBase64化したファイル
//! - ExtractionRequest: プロンプト + ペイロード

use serde::{Deserialize, Serialize};

/// レシート読み取り結果
///
/// モデルが返さなかった項目は `None` のまま保持する（0や空文字で埋めない）。
/// `description` はモデルに要求せず、パーサーが `items` / `merchant` から導出する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptData {
    #[serde(
        default,
        deserialize_with = "lenient::amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>, // 合計金額（通貨記号なし）

    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>, // YYYY-MM-DD

    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub merchant: Option<String>, // 店舗名

    #[serde(
        default,
        deserialize_with = "lenient::items",
        skip_serializing_if = "Option::is_none"
    )]
    pub items: Option<Vec<String>>, // 購入品目（モデルの返却順）

    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>, // 導出項目
}

impl ReceiptData {
    /// モデル由来の項目が一つもないか
    pub fn is_blank(&self) -> bool {
        self.amount.is_none()
            && self.date.is_none()
            && self.merchant.is_none()
            && self.items.as_ref().map_or(true, |items| items.is_empty())
    }
}

/// 送信用ペイロード（アップロードごとに生成し、送信後は破棄）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedPayload {
    pub data: String,
    pub mime_type: String,
}

/// モデルへのリクエスト（指示文 + ペイロード）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub instruction: String,
    pub payload: EncodedPayload,
}

/// モデル出力の型揺れを吸収するデシリアライザ
mod lenient {
    use lazy_static::lazy_static;
    use regex::Regex;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    lazy_static! {
        static ref NUMBER_RE: Regex = Regex::new(r"-?\d[\d,]*(?:\.\d+)?").unwrap();
    }

    /// 数値または "$12.50" のような文字列を受け付ける
    pub fn amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => parse_amount_text(&s),
            _ => None,
        })
    }

    /// 配列の要素は文字列化して null を捨てる。単独の値は1要素のリストにする
    pub fn items<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Array(values)) => Some(values.into_iter().filter_map(scalar_text).collect()),
            Some(other) => scalar_text(other).map(|item| vec![item]),
            None => None,
        })
    }

    /// 文字列はそのまま、数値・真偽値は文字列化、それ以外は未設定
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(scalar_text))
    }

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub(crate) fn parse_amount_text(text: &str) -> Option<f64> {
        let m = NUMBER_RE.find(text)?;
        m.as_str().replace(',', "").parse().ok()
    }
}
