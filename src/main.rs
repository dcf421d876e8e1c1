use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use clap::Parser;

mod api;
mod config;
mod handler;
mod http;
mod logger;
mod routing;
mod server;
mod store;

/// Config file looked up when `--config` is not given (extension optional)
const DEFAULT_CONFIG_PATH: &str = "config";

/// College admission REST API server
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Config file path; the extension may be left off
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let cfg = config::Config::load_from(&args.config)?;
    logger::init(&cfg).map_err(|e| e.to_string())?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let store = store::connect(&cfg.database).await?;
    if let Err(e) = store.ping().await {
        logger::log_warning(&format!("Database ping failed, serving anyway: {e}"));
    }

    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg, Arc::clone(&store)));
    let active_connections = Arc::new(AtomicUsize::new(0));

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    logger::log_server_start(&addr, &cfg);

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(
            listener,
            state,
            active_connections,
            signals,
        ))
        .await;

    store.shutdown().await;
    logger::log_shutdown_complete();
    Ok(())
}
