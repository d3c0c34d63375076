//! Excel生成（CLI版）
//!
//! 共通ライブラリでバッファを作り、ファイルに書き出す

use crate::batch::ScannedReceipt;
use crate::error::{Result, ScanError};
use chrono::NaiveDate;
use receipt_scan_common::export::excel_core::generate_receipt_workbook;
use std::path::Path;

const SHEET_NAME: &str = "Receipts";

pub fn generate_excel(results: &[ScannedReceipt], output_path: &Path) -> Result<()> {
    for result in results {
        if let Some(date) = result.receipt.date.as_deref() {
            if !is_iso_date(date) {
                tracing::warn!(file = %result.file_name, date, "date is not YYYY-MM-DD; written as text");
            }
        }
    }

    let buffer = generate_receipt_workbook(results, SHEET_NAME).map_err(ScanError::ExcelGeneration)?;
    std::fs::write(output_path, buffer)?;
    Ok(())
}

/// `YYYY-MM-DD` として正しい日付か
pub fn is_iso_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
