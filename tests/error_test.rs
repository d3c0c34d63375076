//! エラーケーステスト
//!
//! 内部エラーとユーザー向けメッセージの対応を検証

use receipt_scan::encoder::{self, ReceiptFile};
use receipt_scan::error::{
    ScanError, MISSING_API_KEY_MESSAGE, PROCESS_FAILED_MESSAGE, TIMEOUT_MESSAGE, UNSUPPORTED_FILE_MESSAGE,
};
use receipt_scan::scanner;
use std::path::Path;
use tempfile::tempdir;

/// 処理中の失敗はすべて同じ汎用メッセージ
#[test]
fn test_processing_failures_share_generic_message() {
    let errors = [
        ScanError::Encoding("x".into()),
        ScanError::EmptyDocument,
        ScanError::ApiCall("500".into()),
        ScanError::RateLimited,
        ScanError::ApiParse("empty".into()),
        ScanError::NoJsonFound,
        ScanError::MalformedJson("eof".into()),
    ];
    for err in errors {
        assert_eq!(err.user_message(), PROCESS_FAILED_MESSAGE, "{}", err.kind());
    }
}

#[test]
fn test_specific_messages() {
    assert_eq!(ScanError::MissingApiKey.user_message(), MISSING_API_KEY_MESSAGE);
    assert_eq!(ScanError::Timeout(60).user_message(), TIMEOUT_MESSAGE);
    assert_eq!(
        ScanError::UnsupportedFileType("text/plain".into()).user_message(),
        UNSUPPORTED_FILE_MESSAGE
    );
}

#[test]
fn test_parser_errors_convert() {
    let err: ScanError = receipt_scan_common::parse_receipt_response("no braces at all")
        .unwrap_err()
        .into();
    assert!(matches!(err, ScanError::NoJsonFound));
    assert_eq!(err.kind(), "no_json_found");
}

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"), true);
    assert!(matches!(result, Err(ScanError::FolderNotFound(_))));
}

/// レシートのないフォルダは空のVec
#[test]
fn test_scan_folder_without_receipts() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path(), false).unwrap();
    assert!(result.is_empty());
}

/// 存在しないファイル
#[test]
fn test_missing_file() {
    let result = ReceiptFile::from_path(Path::new("/nonexistent/receipt.jpg"));
    assert!(matches!(result, Err(ScanError::FileNotFound(_))));
}

/// 拡張子のないファイルは先頭バイトで判定
#[test]
fn test_extensionless_file_is_sniffed() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("scan");
    std::fs::write(&path, b"%PDF-1.4\n").unwrap();

    let file = ReceiptFile::from_path(&path).unwrap();
    assert_eq!(file.mime_type(), "application/pdf");

    // ページ構造がないのでエンコードで失敗
    assert!(matches!(encoder::encode(&file), Err(ScanError::Encoding(_))));
}
