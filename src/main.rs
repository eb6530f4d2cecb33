use blast_bot::app::access::AccessControl;
use blast_bot::app::serve;
use blast_bot::domain::ports::{ConfigProvider, GroupDirectory, Transport};
use blast_bot::utils::error::{BotError, ErrorSeverity};
use blast_bot::utils::{logger, validation::Validate};
use blast_bot::{
    Bot, BotConfig, BroadcastPolicy, CliArgs, HttpGateway, JsonFileStore, LocalStorage,
    LogTransport,
};
use clap::Parser;
use std::sync::Arc;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting blast-bot");

    let mut config = BotConfig::from_file(&args.config).unwrap_or_else(|e| exit_with(&e));
    args.apply_overrides(&mut config);
    if args.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let bot = Arc::new(build_bot(&args, &config).await.unwrap_or_else(|e| exit_with(&e)));
    tracing::info!(
        "🤖 {} ready (delay: {:?}, retries: {}, dry-run: {})",
        config.bot.name,
        config.broadcast_delay(),
        config.max_retries(),
        args.dry_run
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("⚠️ Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let input = BufReader::new(tokio::io::stdin());
    if let Err(e) = serve(input, &args.sender, bot, shutdown).await {
        tracing::error!("❌ Reading input failed: {}", e);
        exit_with(&e);
    }

    tracing::info!("✅ blast-bot stopped");
    Ok(())
}

async fn build_bot(args: &CliArgs, config: &BotConfig) -> blast_bot::Result<Bot<LocalStorage>> {
    let store = Arc::new(JsonFileStore::open(&config.storage.data_dir).await?);
    tokio::fs::create_dir_all(&config.storage.uploads_dir).await?;
    let uploads = LocalStorage::new(&config.storage.uploads_dir);

    let gateway = Arc::new(HttpGateway::new(
        &config.gateway.base_url,
        config.gateway.token.clone(),
        config.gateway_timeout(),
    )?);

    // dry-run 仍透過閘道查詢群組，只是不實際發送
    let transport: Arc<dyn Transport> = if args.dry_run {
        Arc::new(LogTransport)
    } else {
        gateway.clone()
    };
    let directory: Arc<dyn GroupDirectory> = gateway;

    let access = AccessControl::new(store.clone(), config.admins().to_vec());

    Ok(Bot::new(
        transport,
        directory,
        access,
        store,
        uploads,
        BroadcastPolicy::from_config(config),
    ))
}

fn exit_with(e: &BotError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
