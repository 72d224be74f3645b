//! graft site server.
//!
//! ```text
//!   request ─▶ http ─▶ routing (composite) ─▶ dispatch ─▶ response
//!                          │                     │
//!                          ▼                     ▼
//!                      apphooks               content
//!                          ▲                     ▲
//!                          └──── lifecycle ──────┘
//!                                    ▲
//!                                 config
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use graft::apphooks::ApphookRegistry;
use graft::config::{load_config, ConfigWatcher};
use graft::lifecycle::ShutdownSignal;
use graft::observability::{logging, metrics};
use graft::HttpServer;

#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Serve a page tree with attached applications", long_about = None)]
struct Cli {
    /// Site configuration file
    #[arg(short, long, default_value = "graft.toml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    if cli.check {
        println!(
            "{}: ok ({} pages, {} languages)",
            cli.config.display(),
            config.pages.len(),
            config.i18n.languages.len()
        );
        return Ok(());
    }

    logging::init(&config.observability.log_level, &config.observability.log_format);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "graft starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let (watcher, config_updates) = ConfigWatcher::new(&cli.config);
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };

    let server = HttpServer::new(config, ApphookRegistry::new())?;

    let shutdown = ShutdownSignal::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(shutdown.listen());

    server.run(listener, config_updates, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
