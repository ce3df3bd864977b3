use accord_server::admin_api::{AdminApiServer, AdminState};
use accord_server::config::Config;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "accord", author, version, about = "Contract-based HTTP mocking and contract testing")]
struct Args {
    /// Admin API port
    #[arg(short, long, env = "ACCORD_PORT")]
    port: Option<u16>,

    /// Admin API bind address
    #[arg(long, env = "ACCORD_HOST")]
    host: Option<String>,

    /// Path to YAML configuration file
    #[arg(short, long, env = "ACCORD_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. `info`, `accord_server=debug`)
    #[arg(long, env = "ACCORD_LOG")]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> Result<Config, anyhow::Error> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.admin.port = port;
    }
    if let Some(host) = &args.host {
        config.admin.host = host.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level())),
        )
        .init();

    let addr: SocketAddr = match format!("{}:{}", config.admin.host, config.admin.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid admin address {}:{}: {}", config.admin.host, config.admin.port, e);
            std::process::exit(1);
        }
    };

    let state = match AdminState::from_config(&config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };
    let wirestubs = Arc::clone(&state.wirestubs);

    info!("Starting Accord v{}", env!("CARGO_PKG_VERSION"));
    let server = AdminApiServer::new(addr, state);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Admin API error: {}", e);
                wirestubs.shutdown_all().await;
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    wirestubs.shutdown_all().await;
}
