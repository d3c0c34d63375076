//! 受付ファイル形式
//!
//! ドロップされたファイルのMIMEタイプ判定（拡張子・先頭バイト）

/// PDFのMIMEタイプ
pub const PDF_MIME: &str = "application/pdf";

/// 受け付けるMIMEタイプ
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/heic",
    "image/heif",
    PDF_MIME,
];

/// 受け付ける拡張子（小文字）
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "heif", "pdf"];

/// 受付可能なMIMEタイプか
pub fn is_accepted(mime_type: &str) -> bool {
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(mime_type.trim()))
}

/// PDFか
pub fn is_pdf(mime_type: &str) -> bool {
    mime_type.trim().eq_ignore_ascii_case(PDF_MIME)
}

/// 拡張子からMIMEタイプを推定
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "pdf" => Some(PDF_MIME),
        "txt" => Some("text/plain"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// 先頭バイトからPDF/HEIFを判定（JPEG/PNGは image クレート側で判定）
pub fn sniff_document(header: &[u8]) -> Option<&'static str> {
    if header.starts_with(b"%PDF-") {
        return Some(PDF_MIME);
    }
    // ISO-BMFF: [size:4]["ftyp"][brand:4]
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        return match &header[8..12] {
            b"heic" | b"heix" | b"heim" | b"heis" => Some("image/heic"),
            b"mif1" | b"msf1" | b"heif" => Some("image/heif"),
            _ => None,
        };
    }
    None
}
