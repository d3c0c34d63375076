use crate::error::{Result, ScanError};
use receipt_scan_common::mime::ACCEPTED_EXTENSIONS;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ReceiptEntry {
    pub path: PathBuf,
    pub file_name: String,
}

/// フォルダ内のレシート（画像/PDF）を列挙
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ReceiptEntry>> {
    if !folder.is_dir() {
        return Err(ScanError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut receipts = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || !is_receipt_extension(path) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // キャッシュやプレビューのコピーなど隠しファイルは対象外
        if file_name.starts_with('.') {
            continue;
        }

        receipts.push(ReceiptEntry {
            path: path.to_path_buf(),
            file_name,
        });
    }

    // ファイル名でソート
    receipts.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(receipts)
}

fn is_receipt_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_is_receipt_extension() {
        assert!(is_receipt_extension(Path::new("a.jpg")));
        assert!(is_receipt_extension(Path::new("a.JPG")));
        assert!(is_receipt_extension(Path::new("a.heic")));
        assert!(is_receipt_extension(Path::new("a.pdf")));
        assert!(!is_receipt_extension(Path::new("a.txt")));
        assert!(!is_receipt_extension(Path::new("a.gif")));
        assert!(!is_receipt_extension(Path::new("noext")));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"), false);
        assert!(matches!(result, Err(ScanError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("c.pdf")).unwrap();
        File::create(dir.path().join("a.jpg")).unwrap();
        File::create(dir.path().join("b.PNG")).unwrap();
        File::create(dir.path().join("readme.txt")).unwrap();
        File::create(dir.path().join(".hidden.jpg")).unwrap();

        let result = scan_folder(dir.path(), false).unwrap();
        let names: Vec<_> = result.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.pdf"]);
    }

    #[test]
    fn test_scan_folder_recursive() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("2024").join("01");
        fs::create_dir_all(&sub).unwrap();
        File::create(dir.path().join("top.jpg")).unwrap();
        File::create(sub.join("nested.pdf")).unwrap();

        assert_eq!(scan_folder(dir.path(), false).unwrap().len(), 1);
        assert_eq!(scan_folder(dir.path(), true).unwrap().len(), 2);
    }
}
