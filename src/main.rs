use clap::Parser;
use receipt_scan::{batch, cache, cli, config, encoder, error, export, model, scanner, session};
use cli::{Cli, Commands};
use config::Config;
use error::{Result, ScanError};
use model::GeminiClient;
use session::{ScanSession, TempDirPreviews};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;

    match cli.command {
        Commands::Scan { file, output } => {
            let mut session = build_session(&config).on_receipt_data(|data| {
                eprintln!(
                    "✔ 読み取り完了: {} {}",
                    data.merchant.as_deref().unwrap_or("-"),
                    data.amount.map(|a| format!("{:.2}", a)).unwrap_or_else(|| "-".into()),
                );
            });

            let receipt_file = encoder::ReceiptFile::from_path(&file)?;
            let data = match session.handle_file(receipt_file).await {
                Ok(data) => data,
                Err(err) => {
                    eprintln!("✖ {}", session.error().unwrap_or(err.user_message()));
                    return Err(err);
                }
            };

            let json = serde_json::to_string_pretty(&data)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✔ 結果を保存: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Batch { folder, recursive, output, format, use_cache } => {
            println!("🧾 receipt-scan - 一括読み取り\n");

            println!("[1/3] レシートをスキャン中...");
            let entries = scanner::scan_folder(&folder, recursive)?;
            if entries.is_empty() {
                return Err(ScanError::NoReceiptsFound(folder.display().to_string()));
            }
            println!("✔ {}件のレシートを検出\n", entries.len());

            println!("[2/3] AI読み取り中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let mut session = build_session(&config);
            let options = batch::BatchOptions {
                cache_dir: use_cache.then_some(folder.as_path()),
                show_progress: true,
            };
            let results = batch::scan_receipts(&mut session, &entries, options).await?;
            let failed = results.iter().filter(|r| r.error.is_some()).count();
            if failed > 0 {
                println!("✔ 読み取り完了（{}件失敗）\n", failed);
            } else {
                println!("✔ 読み取り完了\n");
            }

            println!("[3/3] 結果を保存中...");
            let output = output.unwrap_or_else(|| folder.clone());
            for path in export::export_results(&results, &format, &output)? {
                println!("✔ 結果を保存: {}", path.display());
            }

            println!("\n✅ 完了");
        }

        Commands::Config { set_api_key, enter_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if enter_api_key {
                let key: String = dialoguer::Password::new()
                    .with_prompt("Gemini APIキー")
                    .interact()
                    .map_err(|e| ScanError::Config(format!("APIキーの入力に失敗しました: {}", e)))?;
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  APIエンドポイント: {}", config.api_base_url);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  指示文: {}", if config.prompt.is_some() { "カスタム" } else { "標準" });
                println!("  APIキー: {}", if config.api_key().is_some() { "設定済み" } else { "未設定" });
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = cache::CacheFile::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache = cache::CacheFile::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match cache::CacheFile::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "receipt_scan=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn build_session(config: &Config) -> ScanSession<GeminiClient, TempDirPreviews> {
    let mut session = ScanSession::new(
        GeminiClient::from_config(config),
        TempDirPreviews::in_system_temp(),
        config.api_key(),
    )
    .with_timeout(config.timeout());

    if let Some(prompt) = config.prompt.as_deref() {
        session = session.with_instruction(prompt);
    }
    session
}
