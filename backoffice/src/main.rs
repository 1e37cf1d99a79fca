//! Backoffice Server Entry Point

use anyhow::Context;
use backoffice::cli::{serve::ServeArgs, Cli, Commands};
use backoffice::config::AppConfig;
use backoffice::scheduler::Scheduler;
use backoffice::{auth, cache, db, logging, server, AppState};
use clap::Parser;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init()?;

    match cli.command {
        Some(Commands::Migrate(args)) => run_migrate(config_from(&args)).await,
        Some(Commands::Serve(args)) => run_server(config_from(&args)).await,
        // No subcommand - default to serve
        None => run_server(config_from(&ServeArgs::default())).await,
    }
}

fn config_from(args: &ServeArgs) -> AppConfig {
    let mut config = AppConfig::from_env();
    args.apply(&mut config);
    config
}

async fn run_migrate(config: AppConfig) -> anyhow::Result<()> {
    let pool = db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    db::migrate(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations applied");
    Ok(())
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("Backoffice v{}", env!("CARGO_PKG_VERSION"));

    // データベース接続プールを最初に作成（他コンポーネントが依存）
    let db_pool = db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    db::migrate(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    let cache = cache::connect(&config.cache).await;
    let bind_addr = config.server.bind_addr();

    let state = AppState::new(config, db_pool, cache).context("Invalid configuration")?;

    // 管理者が存在しない場合は作成
    if let Err(e) = auth::bootstrap::ensure_admin(&state.users, &state.config.bootstrap).await {
        warn!(error = %e, "Failed to bootstrap admin user");
    }

    let scheduler = Scheduler::start(&state);
    let shutdown = state.shutdown.clone();

    let result = server::run(state, &bind_addr).await;

    // サーバーがエラーで止まった場合も定期タスクを止める
    shutdown.request_shutdown();
    scheduler.join().await;

    result
}
