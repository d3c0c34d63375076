pub mod excel;

use crate::batch::ScannedReceipt;
use crate::cli::ExportFormat;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// 出力先がフォルダなら `<folder>/<stem>.<ext>`、ファイルなら拡張子を差し替える
fn output_path_for(output: &Path, stem: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", stem, extension))
    } else {
        output.with_extension(extension)
    }
}

/// 既定のファイル名（receipts-YYYYMMDD）
pub fn default_stem() -> String {
    format!("receipts-{}", chrono::Local::now().format("%Y%m%d"))
}

pub fn write_json(results: &[ScannedReceipt], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// 結果を出力し、書き出したパスを返す
pub fn export_results(
    results: &[ScannedReceipt],
    format: &ExportFormat,
    output: &Path,
) -> Result<Vec<PathBuf>> {
    let stem = default_stem();
    let mut written = Vec::new();

    if matches!(format, ExportFormat::Json | ExportFormat::Both) {
        let path = output_path_for(output, &stem, "json");
        write_json(results, &path)?;
        written.push(path);
    }

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let path = output_path_for(output, &stem, "xlsx");
        excel::generate_excel(results, &path)?;
        written.push(path);
    }

    Ok(written)
}
