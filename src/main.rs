use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use torob_pricer::{
    request::StrategyField,
    utils::logging::init_tracing,
    web::{create_router, AppState},
    AppConfig, BatchOrchestrator, ChromeSessionFactory, HttpWebhook, PricingService, UploadRequest,
};

#[derive(Debug, Parser)]
#[command(name = "torob-pricer")]
#[command(about = "Prices product batches from torob.com listings and forwards them to a webhook")]
#[command(version)]
struct Cli {
    /// Directory holding default/<RUN_MODE>/local config files.
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP ingress (default).
    Serve,
    /// Price a single batch from a JSON file and print the results.
    Run {
        #[arg(long)]
        input: PathBuf,
        /// Overrides the strategy in the input file.
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long)]
        no_forward: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config_dir)
        .with_context(|| format!("Failed to load configuration from {}", cli.config_dir.display()))?;
    let _log_guard = init_tracing(&config.logging)?;

    let service = build_service(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, service).await,
        Commands::Run { input, strategy, no_forward } => {
            run_once(service, input, strategy, no_forward).await
        }
    }
}

fn build_service(config: &AppConfig) -> Result<PricingService> {
    let sessions = Arc::new(ChromeSessionFactory::new(config.scraper.clone()));
    let orchestrator = BatchOrchestrator::new(sessions, &config.scraper, config.site.clone());
    let webhook = HttpWebhook::new(&config.webhook)?;
    info!(webhook = %webhook.url(), "Webhook client ready");

    Ok(PricingService::new(orchestrator, Arc::new(webhook)))
}

async fn serve(config: AppConfig, service: PricingService) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        service: Arc::new(service),
        config: Arc::new(config),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting torob-pricer on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down cleanly");
    Ok(())
}

async fn run_once(
    service: PricingService,
    input: PathBuf,
    strategy: Option<String>,
    no_forward: bool,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut request: UploadRequest = serde_json::from_str(&raw)?;
    if let Some(tag) = strategy {
        request.strategy = Some(StrategyField::Tag(tag));
    }
    let batch = request.into_batch()?;

    let report = if no_forward {
        service.price(&batch).await
    } else {
        service.process(&batch).await?
    };

    for (product, failure) in &report.failures {
        eprintln!("{} ({}): {} failed: {}", product.name, product.id, failure.stage, failure.error);
    }
    println!("{}", serde_json::to_string_pretty(&report.results)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Received shutdown signal, draining in-flight batches");
}
