use clap::Parser;
use ted_search::config::{Command, LogFormat};
use ted_search::utils::{logger, validation::Validate};
use ted_search::{
    count_matches, CliConfig, DocumentDownloader, LocalStorage, NoticePipeline, SearchEngine,
    Settings, TedClient, TedError,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    match config.log_format {
        LogFormat::Text => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(config.verbose),
    }

    tracing::info!("Starting ted-search");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    let settings = match config.settings().and_then(|settings| {
        settings.validate()?;
        Ok(settings)
    }) {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };

    let outcome = match config.command {
        Some(Command::Health { .. }) => run_health(&settings).await,
        Some(Command::Count(_)) => run_count(&settings).await,
        _ => run_search(&settings, config.monitor).await,
    };

    if let Err(e) = outcome {
        fail(&e);
    }
}

async fn run_search(settings: &Settings, monitor_enabled: bool) -> ted_search::Result<()> {
    let client = TedClient::from_config(settings)?;
    let storage = LocalStorage::from_config(settings);
    let base_name = settings.base_name(chrono::Local::now());

    tracing::info!("🔎 Query: {}", settings.search.query);
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = NoticePipeline::new(
        client.clone(),
        storage.clone(),
        settings.search.clone(),
        base_name.clone(),
    );
    let engine = SearchEngine::new_with_monitoring(pipeline, monitor_enabled);
    let report = engine.run().await?;

    println!("✅ Exported {} notices", report.artifacts.record_count);
    println!("📁 {}", report.artifacts.spreadsheet_path);
    println!("📁 {}", report.artifacts.json_path);

    if !settings.documents.kinds.is_empty() {
        let downloader = DocumentDownloader::new(
            client.http_client(),
            storage,
            settings.documents.language.clone(),
        );
        let downloads = downloader
            .download(&report.result.records, &settings.documents.kinds, &base_name)
            .await?;
        println!(
            "📥 Documents: {} saved, {} skipped, {} failed",
            downloads.saved.len(),
            downloads.skipped,
            downloads.failed.len()
        );
        for (number, reason) in &downloads.failed {
            eprintln!("⚠️ {}: {}", number, reason);
        }
    }

    Ok(())
}

async fn run_count(settings: &Settings) -> ted_search::Result<()> {
    let client = TedClient::from_config(settings)?;
    tracing::info!("🔎 Query: {}", settings.search.query);

    match count_matches(&client, &settings.search).await? {
        Some(count) => println!("🔢 {} matching notices", count),
        None => println!("🔢 The API did not report a total for this query"),
    }
    Ok(())
}

async fn run_health(settings: &Settings) -> ted_search::Result<()> {
    let client = TedClient::from_config(settings)?;
    let status = client.check_health().await?;

    println!("✅ TED API reachable at {}", status.endpoint);
    match &status.latest_supported_version {
        Some(version) => println!("📌 Latest supported API version: {}", version),
        None => println!("📌 The API did not advertise a supported version"),
    }
    tracing::debug!("Health metadata: {}", status.metadata);
    Ok(())
}

fn fail(e: &TedError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1))
}
