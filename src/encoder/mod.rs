//! ファイルエンコード
//!
//! ドロップされたファイルを送信用ペイロード（Base64 + MIMEタイプ）に変換する。
//! PDFはページ数だけ検証し、ファイル全体をそのまま送る（ラスタライズしない）。

mod pdf;

use crate::error::{Result, ScanError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use receipt_scan_common::{is_pdf, mime, EncodedPayload};
use std::borrow::Cow;
use std::io::Read;
use std::path::{Path, PathBuf};

pub use pdf::page_count;

/// MIMEタイプが判定できない場合
const UNKNOWN_MIME: &str = "application/octet-stream";

/// 判定に読む先頭バイト数
const SNIFF_LEN: u64 = 32;

/// ドロップされたファイル
///
/// パスから作る場合は中身を遅延読み込みする（読めない場合はエンコード時に失敗）。
#[derive(Debug, Clone)]
pub struct ReceiptFile {
    name: String,
    mime_type: String,
    source: FileSource,
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

impl ReceiptFile {
    /// パスから作成（MIMEタイプは拡張子、なければ先頭バイトで判定）
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ScanError::FileNotFound(path.display().to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mime_type = match path
            .extension()
            .and_then(|ext| mime::mime_from_extension(&ext.to_string_lossy()))
        {
            Some(mime_type) => mime_type,
            None => sniff_file(path)?,
        };

        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// メモリ上のバイト列から作成（MIMEタイプは呼び出し元の申告どおり）
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: FileSource::Memory(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(path) => Some(path),
            FileSource::Memory(_) => None,
        }
    }

    /// 中身を読む
    pub fn read_bytes(&self) -> std::io::Result<Cow<'_, [u8]>> {
        match &self.source {
            FileSource::Path(path) => std::fs::read(path).map(Cow::Owned),
            FileSource::Memory(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

/// 先頭バイトからMIMEタイプを推定
pub fn sniff_mime(header: &[u8]) -> &'static str {
    if let Some(mime_type) = mime::sniff_document(header) {
        return mime_type;
    }
    match image::guess_format(header) {
        Ok(format) => format.to_mime_type(),
        Err(_) => UNKNOWN_MIME,
    }
}

fn sniff_file(path: &Path) -> Result<&'static str> {
    let mut header = Vec::with_capacity(SNIFF_LEN as usize);
    std::fs::File::open(path)?
        .take(SNIFF_LEN)
        .read_to_end(&mut header)?;
    Ok(sniff_mime(&header))
}

/// ファイルを送信用ペイロードに変換
///
/// # Returns
/// * `Err(ScanError::Encoding)` - 読み込めない、またはPDFとして解釈できない
/// * `Err(ScanError::EmptyDocument)` - PDFのページ数が0
pub fn encode(file: &ReceiptFile) -> Result<EncodedPayload> {
    let bytes = file
        .read_bytes()
        .map_err(|e| ScanError::Encoding(format!("{}: {}", file.name(), e)))?;

    if is_pdf(file.mime_type()) {
        let pages = page_count(&bytes)?;
        if pages == 0 {
            return Err(ScanError::EmptyDocument);
        }
        tracing::debug!(file = file.name(), pages, "PDF validated");
    }

    Ok(EncodedPayload {
        data: STANDARD.encode(&bytes),
        mime_type: file.mime_type().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_encode_image_round_trip() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4, 5];
        let file = ReceiptFile::from_bytes("receipt.jpg", "image/jpeg", bytes.clone());

        let payload = encode(&file).unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&payload.data).unwrap(), bytes);
    }

    #[test]
    fn test_encode_preserves_declared_mime() {
        let file = ReceiptFile::from_bytes("photo.heic", "image/heic", vec![1, 2, 3]);
        let payload = encode(&file).unwrap();
        assert_eq!(payload.mime_type, "image/heic");
    }

    #[test]
    fn test_encode_missing_file_is_encoding_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.png");
        std::fs::write(&path, PNG_HEADER).unwrap();
        let file = ReceiptFile::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let result = encode(&file);
        assert!(matches!(result, Err(ScanError::Encoding(_))));
    }

    #[test]
    fn test_from_path_uses_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("receipt.PNG");
        std::fs::write(&path, b"not really a png").unwrap();

        let file = ReceiptFile::from_path(&path).unwrap();
        assert_eq!(file.name(), "receipt.PNG");
        assert_eq!(file.mime_type(), "image/png");
        assert_eq!(file.path(), Some(path.as_path()));
    }

    #[test]
    fn test_from_path_sniffs_without_extension() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("scan");
        std::fs::write(&png, PNG_HEADER).unwrap();
        assert_eq!(ReceiptFile::from_path(&png).unwrap().mime_type(), "image/png");

        let pdf = dir.path().join("scan2");
        std::fs::write(&pdf, b"%PDF-1.4\n%...").unwrap();
        assert_eq!(ReceiptFile::from_path(&pdf).unwrap().mime_type(), "application/pdf");

        let other = dir.path().join("notes");
        std::fs::write(&other, b"hello world").unwrap();
        assert_eq!(ReceiptFile::from_path(&other).unwrap().mime_type(), UNKNOWN_MIME);
    }

    #[test]
    fn test_from_path_not_found() {
        let result = ReceiptFile::from_path(Path::new("/nonexistent/receipt.jpg"));
        assert!(matches!(result, Err(ScanError::FileNotFound(_))));
    }

    #[test]
    fn test_sniff_mime_jpeg() {
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
    }
}
