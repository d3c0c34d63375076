//! フォルダ一括読み取り
//!
//! 1つのセッションを使い回し、レシートを1件ずつ順番に読み取る。

use crate::cache::{compute_file_hash, CacheFile};
use crate::encoder::ReceiptFile;
use crate::error::{Result, ScanError};
use crate::model::ReceiptModel;
use crate::scanner::ReceiptEntry;
use crate::session::{PreviewStore, ScanSession};
use indicatif::{ProgressBar, ProgressStyle};
use receipt_scan_common::export::excel_core::ReceiptRow;
use receipt_scan_common::ReceiptData;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 一括読み取りの1件分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedReceipt {
    pub file_name: String,

    #[serde(default)]
    pub file_path: String,

    #[serde(flatten)]
    pub receipt: ReceiptData,

    /// 失敗時のユーザー向けメッセージ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReceiptRow for ScannedReceipt {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn receipt(&self) -> &ReceiptData {
        &self.receipt
    }
}

pub struct BatchOptions<'a> {
    /// キャッシュを置くフォルダ（None ならキャッシュを使わない）
    pub cache_dir: Option<&'a Path>,
    pub show_progress: bool,
}

/// レシートを順番に読み取る
///
/// 1件の失敗で全体は止めず、その件は `error` に理由を入れて返す。
/// APIキー未設定だけは全件同じ結果になるので即座に返す。
pub async fn scan_receipts<M, P>(
    session: &mut ScanSession<M, P>,
    entries: &[ReceiptEntry],
    options: BatchOptions<'_>,
) -> Result<Vec<ScannedReceipt>>
where
    M: ReceiptModel,
    P: PreviewStore,
{
    let mut cache = options.cache_dir.map(CacheFile::load);
    let mut results = Vec::with_capacity(entries.len());

    let progress = if options.show_progress {
        let pb = ProgressBar::new(entries.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    for entry in entries {
        progress.set_message(entry.file_name.clone());

        let hash = if cache.is_some() {
            match compute_file_hash(&entry.path) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    // ハッシュ計算失敗時は未キャッシュとして扱う
                    tracing::warn!(file = %entry.file_name, error = %e, "hash failed");
                    None
                }
            }
        } else {
            None
        };

        if let (Some(cache), Some(hash)) = (cache.as_ref(), hash.as_deref()) {
            if let Some(receipt) = cache.get(hash, session.instruction()) {
                tracing::debug!(file = %entry.file_name, "cache hit");
                results.push(scanned(entry, receipt.clone(), None));
                progress.inc(1);
                continue;
            }
        }

        let outcome = match ReceiptFile::from_path(&entry.path) {
            Ok(file) => session.handle_file(file).await,
            Err(err) => Err(err),
        };
        session.clear();

        match outcome {
            Ok(receipt) => {
                if let (Some(cache), Some(hash)) = (cache.as_mut(), hash) {
                    cache.insert(hash, entry.file_name.clone(), session.instruction(), receipt.clone());
                }
                results.push(scanned(entry, receipt, None));
            }
            Err(ScanError::MissingApiKey) => {
                progress.abandon();
                return Err(ScanError::MissingApiKey);
            }
            Err(err) => {
                tracing::warn!(file = %entry.file_name, kind = err.kind(), error = %err, "receipt failed");
                results.push(scanned(entry, ReceiptData::default(), Some(err.user_message().to_string())));
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if let (Some(cache), Some(dir)) = (cache.as_ref(), options.cache_dir) {
        cache.save(dir)?;
    }

    Ok(results)
}

fn scanned(entry: &ReceiptEntry, receipt: ReceiptData, error: Option<String>) -> ScannedReceipt {
    ScannedReceipt {
        file_name: entry.file_name.clone(),
        file_path: entry.path.display().to_string(),
        receipt,
        error,
    }
}
