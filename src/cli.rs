use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "receipt-scan")]
#[command(about = "レシート画像/PDFのAI読み取りツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// レシート1枚を読み取ってJSONを出力
    Scan {
        /// レシート画像/PDFのパス
        #[arg(required = true)]
        file: PathBuf,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// フォルダ内のレシートを一括で読み取る
    Batch {
        /// レシートフォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 出力ファイル/ディレクトリ（デフォルト: 入力フォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (json/excel/both)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// キャッシュを使用（読み取り済みをスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// APIキーを対話的に入力
        #[arg(long)]
        enter_api_key: bool,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Excel,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use json, excel, or both", s)),
        }
    }
}
