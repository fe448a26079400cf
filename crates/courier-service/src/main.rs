use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;

use courier_core::Store;
use courier_service::config::ServiceConfig;
use courier_service::frontend::{FrontEnd, StdioFrontEnd};
use courier_service::gateway::HttpGateway;
use courier_service::session::SessionController;
use courier_service::validator::HttpAuthority;

#[derive(Parser, Debug)]
#[command(author, version, about = "Courier relay service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the relay on the local line-oriented front-end
    Run {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Re-encrypt legacy plaintext credentials under the active key
    MigrateCredentials {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { db_path } => run_command(db_path).await,
        Commands::MigrateCredentials { db_path } => migrate_command(db_path).await,
    }
}

async fn open_store(db_path_override: Option<PathBuf>) -> Result<(ServiceConfig, Store)> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(path) = db_path_override {
        config.db_path = path;
    }
    let store = Store::open(&config.db_path, config.cipher.clone()).await?;
    Ok((config, store))
}

async fn run_command(db_path_override: Option<PathBuf>) -> Result<()> {
    let (config, store) = open_store(db_path_override).await?;

    let authority = HttpAuthority::new(config.validate_url.clone(), config.http_timeout)?;
    let gateway = HttpGateway::new(config.gateway_url.clone(), config.http_timeout)?;
    let controller = SessionController::new(store, Arc::new(authority), Arc::new(gateway));

    let mut frontend = StdioFrontEnd::new();
    info!("service started");
    tokio::select! {
        res = relay_loop(&mut frontend, &controller) => res?,
        _ = signal::ctrl_c() => info!("service stopping"),
    }
    Ok(())
}

async fn relay_loop(frontend: &mut impl FrontEnd, controller: &SessionController) -> Result<()> {
    while let Some(inbound) = frontend.next().await? {
        let reply = controller.handle(inbound.chat_id, &inbound.text).await;
        frontend.reply(inbound.chat_id, &reply).await?;
    }
    info!("front-end closed");
    Ok(())
}

async fn migrate_command(db_path_override: Option<PathBuf>) -> Result<()> {
    let (_config, store) = open_store(db_path_override).await?;
    let summary = store.migrate_plaintext_credentials().await?;
    println!(
        "Migration finished. Users processed: {}, updated: {}",
        summary.processed, summary.updated
    );
    Ok(())
}
