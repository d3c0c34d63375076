//! PDFのページ数検証

use crate::error::{Result, ScanError};
use lopdf::Document;

/// PDFのページ数を数える
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    let document = Document::load_mem(bytes)
        .map_err(|e| ScanError::Encoding(format!("PDF読み込みエラー: {}", e)))?;
    Ok(document.get_pages().len())
}
