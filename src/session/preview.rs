//! プレビュー資源
//!
//! プレビューは解放が必要な資源（ブラウザのオブジェクトURLに相当）。
//! `PreviewHandle` は複製できず、`release` が所有権を受け取るので二重解放できない。

use crate::encoder::ReceiptFile;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static STORE_SEQ: AtomicU64 = AtomicU64::new(0);

/// 生成済みプレビューへのハンドル
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    url: String,
}

impl PreviewHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// プレビューの生成と解放
pub trait PreviewStore {
    fn create(&mut self, file: &ReceiptFile) -> Result<PreviewHandle>;
    fn release(&mut self, handle: PreviewHandle);
}

/// 一時ディレクトリにコピーを置き、`file://` URLで参照するプレビュー
///
/// 解放時にコピーを削除する。`in_system_temp` で作った場合はディレクトリごと破棄時に削除する。
#[derive(Debug)]
pub struct TempDirPreviews {
    dir: PathBuf,
    next_id: u64,
    live: usize,
    owns_dir: bool,
}

impl TempDirPreviews {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_id: 0,
            live: 0,
            owns_dir: false,
        }
    }

    /// システムの一時ディレクトリ配下（プロセス・ストアごとに分ける）
    pub fn in_system_temp() -> Self {
        let dir = std::env::temp_dir()
            .join("receipt-scan-previews")
            .join(format!("{}-{}", std::process::id(), STORE_SEQ.fetch_add(1, Ordering::Relaxed)));
        let mut previews = Self::new(dir);
        previews.owns_dir = true;
        previews
    }

    /// 未解放のプレビュー数
    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl PreviewStore for TempDirPreviews {
    fn create(&mut self, file: &ReceiptFile) -> Result<PreviewHandle> {
        std::fs::create_dir_all(&self.dir)?;

        // ディレクトリ部分は捨て、プレビュー用ディレクトリの外に出さない
        let name = Path::new(file.name())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "preview".to_string());

        self.next_id += 1;
        let dest = self.dir.join(format!("{}-{}", self.next_id, name));
        std::fs::write(&dest, file.read_bytes()?)?;
        self.live += 1;

        Ok(PreviewHandle::new(format!("file://{}", dest.display())))
    }

    fn release(&mut self, handle: PreviewHandle) {
        let path = handle.url().trim_start_matches("file://");
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(url = handle.url(), error = %e, "failed to remove preview copy");
        }
        self.live = self.live.saturating_sub(1);
    }
}

impl Drop for TempDirPreviews {
    fn drop(&mut self) {
        if !self.owns_dir {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(dir = %self.dir.display(), error = %e, "failed to remove preview dir"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_release() {
        let dir = tempdir().unwrap();
        let mut previews = TempDirPreviews::new(dir.path().join("previews"));
        let file = ReceiptFile::from_bytes("receipt.png", "image/png", vec![1, 2, 3]);

        let handle = previews.create(&file).unwrap();
        assert!(handle.url().starts_with("file://"));
        assert!(handle.url().ends_with("1-receipt.png"));
        let path = PathBuf::from(handle.url().trim_start_matches("file://"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert_eq!(previews.live_count(), 1);

        previews.release(handle);
        assert!(!path.exists());
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn test_handles_are_unique() {
        let dir = tempdir().unwrap();
        let mut previews = TempDirPreviews::new(dir.path());
        let file = ReceiptFile::from_bytes("a.jpg", "image/jpeg", vec![0]);

        let first = previews.create(&file).unwrap();
        let second = previews.create(&file).unwrap();
        assert_ne!(first, second);
        assert_eq!(previews.live_count(), 2);

        previews.release(first);
        previews.release(second);
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn test_name_cannot_escape_dir() {
        let dir = tempdir().unwrap();
        let previews_dir = dir.path().join("previews");
        let mut previews = TempDirPreviews::new(&previews_dir);

        let file = ReceiptFile::from_bytes("../../evil.jpg", "image/jpeg", vec![7]);
        let handle = previews.create(&file).unwrap();
        let path = PathBuf::from(handle.url().trim_start_matches("file://"));
        assert_eq!(path, previews_dir.join("1-evil.jpg"));

        let file = ReceiptFile::from_bytes("..", "image/jpeg", vec![8]);
        let other = previews.create(&file).unwrap();
        assert!(other.url().ends_with("2-preview"));

        previews.release(handle);
        previews.release(other);
        assert!(!dir.path().join("evil.jpg").exists());
    }

    #[test]
    fn test_system_temp_dir_removed_on_drop() {
        let mut previews = TempDirPreviews::in_system_temp();
        let file = ReceiptFile::from_bytes("a.jpg", "image/jpeg", vec![0]);
        let handle = previews.create(&file).unwrap();
        let path = PathBuf::from(handle.url().trim_start_matches("file://"));
        let store_dir = path.parent().unwrap().to_path_buf();
        assert!(store_dir.is_dir());

        // 解放漏れのコピーもディレクトリごと消える
        drop(handle);
        drop(previews);
        assert!(!store_dir.exists());
    }

    #[test]
    fn test_caller_dir_is_kept_on_drop() {
        let dir = tempdir().unwrap();
        let mut previews = TempDirPreviews::new(dir.path().join("previews"));
        let file = ReceiptFile::from_bytes("a.jpg", "image/jpeg", vec![0]);
        let handle = previews.create(&file).unwrap();
        previews.release(handle);
        drop(previews);
        assert!(dir.path().join("previews").is_dir());
    }
}
