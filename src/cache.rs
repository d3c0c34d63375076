//! 読み取り結果キャッシュモジュール
//!
//! ファイル内容のSHA-256をキーにして読み取り結果をキャッシュし、
//! 同じレシートの再送信をスキップする。指示文（バージョンまたは本文）が変わったエントリは使わない。

use crate::error::Result;
use receipt_scan_common::{ReceiptData, PROMPT_VERSION};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".receipt-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// ファイルハッシュ → 読み取り結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub file_name: String,
    pub prompt_version: u32,
    /// 読み取りに使った指示文のハッシュ（設定で上書きした指示文も区別する）
    pub instruction_hash: String,
    pub receipt: ReceiptData,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 2;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（壊れている・バージョン違いなら空）
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        match serde_json::from_reader::<_, CacheFile>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(_) => {
                tracing::warn!(path = %cache_path.display(), "cache version mismatch, rebuilding");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %cache_path.display(), error = %e, "unreadable cache, rebuilding");
                Self::default()
            }
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在しなければ false）
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// キャッシュをルックアップ（同じ指示文で得た結果のみ）
    pub fn get(&self, hash: &str, instruction: &str) -> Option<&ReceiptData> {
        let instruction_hash = compute_text_hash(instruction);
        self.entries
            .get(hash)
            .filter(|e| e.prompt_version == PROMPT_VERSION && e.instruction_hash == instruction_hash)
            .map(|e| &e.receipt)
    }

    /// キャッシュに追加
    pub fn insert(&mut self, hash: String, file_name: String, instruction: &str, receipt: ReceiptData) {
        self.entries.insert(hash, CacheEntry {
            file_name,
            prompt_version: PROMPT_VERSION,
            instruction_hash: compute_text_hash(instruction),
            receipt,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// ファイル内容のハッシュを計算（SHA-256, hex）
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn compute_text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
