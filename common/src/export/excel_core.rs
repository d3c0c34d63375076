//! Excel生成（共通ライブラリ）
//!
//! 読み取り結果を1行1レシートの一覧表にする

use crate::types::ReceiptData;
use rust_xlsxwriter::*;

/// 見出し行
const HEADERS: &[(&str, f64)] = &[
    ("File", 28.0),
    ("Date", 12.0),
    ("Merchant", 24.0),
    ("Amount", 12.0),
    ("Items", 48.0),
    ("Description", 36.0),
];

const AMOUNT_COL: u16 = 3;

/// 一覧に載せるデータのトレイト（CLIの結果型などに対応）
pub trait ReceiptRow {
    fn file_name(&self) -> &str;
    fn receipt(&self) -> &ReceiptData;
}

/// Excelをバッファに生成
///
/// 日付が `YYYY-MM-DD` として解釈できれば日付セル、できなければ文字列で書く。
/// 最終行に金額の合計（SUM式）を置く。
pub fn generate_receipt_workbook<T: ReceiptRow>(rows: &[T], sheet_name: &str) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let amount_format = Format::new().set_num_format("#,##0.00");
    let total_format = Format::new().set_bold().set_num_format("#,##0.00");
    let wrap_format = Format::new().set_text_wrap();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    for (col, (label, width)) in HEADERS.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, *width)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
        worksheet.write_string_with_format(0, col, *label, &header_format)
            .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
    }
    worksheet.set_freeze_panes(1, 0)
        .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;

    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        let receipt = row.receipt();

        worksheet.write_string(r, 0, row.file_name())
            .map_err(|e| format!("ファイル名書き込みエラー: {}", e))?;

        if let Some(date) = receipt.date.as_deref() {
            match ExcelDateTime::parse_from_str(date) {
                Ok(datetime) => worksheet.write_datetime_with_format(r, 1, &datetime, &date_format),
                Err(_) => worksheet.write_string(r, 1, date),
            }
            .map_err(|e| format!("日付書き込みエラー: {}", e))?;
        }

        if let Some(merchant) = receipt.merchant.as_deref() {
            worksheet.write_string(r, 2, merchant)
                .map_err(|e| format!("店舗名書き込みエラー: {}", e))?;
        }

        if let Some(amount) = receipt.amount {
            worksheet.write_number_with_format(r, AMOUNT_COL, amount, &amount_format)
                .map_err(|e| format!("金額書き込みエラー: {}", e))?;
        }

        if let Some(items) = receipt.items.as_ref().filter(|items| !items.is_empty()) {
            worksheet.write_string_with_format(r, 4, items.join("\n"), &wrap_format)
                .map_err(|e| format!("品目書き込みエラー: {}", e))?;
        }

        if let Some(description) = receipt.description.as_deref() {
            worksheet.write_string(r, 5, description)
                .map_err(|e| format!("説明書き込みエラー: {}", e))?;
        }
    }

    // 合計行
    let total_row = rows.len() as u32 + 1;
    worksheet.write_string_with_format(total_row, 2, "Total", &header_format)
        .map_err(|e| format!("合計ラベル書き込みエラー: {}", e))?;
    let formula = if rows.is_empty() {
        "=0".to_string()
    } else {
        format!("=SUM(D2:D{})", total_row)
    };
    worksheet.write_formula_with_format(total_row, AMOUNT_COL, formula.as_str(), &total_format)
        .map_err(|e| format!("合計式書き込みエラー: {}", e))?;

    // バッファに書き出し
    workbook.save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        file_name: String,
        receipt: ReceiptData,
    }

    impl ReceiptRow for Row {
        fn file_name(&self) -> &str { &self.file_name }
        fn receipt(&self) -> &ReceiptData { &self.receipt }
    }

    #[test]
    fn test_generate_workbook() {
        let rows = vec![
            Row {
                file_name: "a.jpg".to_string(),
                receipt: ReceiptData {
                    amount: Some(12.5),
                    date: Some("2024-01-15".to_string()),
                    merchant: Some("Acme".to_string()),
                    items: Some(vec!["milk".to_string(), "eggs".to_string()]),
                    description: Some("milk, eggs".to_string()),
                },
            },
            Row {
                file_name: "b.pdf".to_string(),
                receipt: ReceiptData {
                    date: Some("15/01/2024".to_string()), // 文字列として書かれる
                    ..Default::default()
                },
            },
        ];

        let buffer = generate_receipt_workbook(&rows, "Receipts").unwrap();
        // xlsxはZIP形式
        assert!(buffer.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_workbook_empty() {
        let rows: Vec<Row> = vec![];
        let buffer = generate_receipt_workbook(&rows, "Receipts").unwrap();
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_invalid_sheet_name() {
        let rows: Vec<Row> = vec![];
        let result = generate_receipt_workbook(&rows, "bad/name");
        assert!(result.is_err());
    }
}
