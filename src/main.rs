//! Asynchronous forwarding HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  FORWARD PROXY                    │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!   ─────────────────┼─▶│  http   │───▶│  router  │───▶│    proxy    │──┼──▶ Origin
//!                    │  │ server  │    │ (/stats?)│    │ range→fwd   │  │
//!                    │  └─────────┘    └────┬─────┘    └──────┬──────┘  │
//!                    │                      │                 │         │
//!                    │                      ▼                 ▼         │
//!   Client Response  │               ┌────────────┐    ┌─────────────┐  │
//!   ◀────────────────┼───────────────│   stats    │◀───│    relay    │◀─┼─── Origin
//!                    │               │  (uptime,  │    │ Via, 1 KiB  │  │
//!                    │               │   bytes)   │    │   chunks    │  │
//!                    │               └────────────┘    └─────────────┘  │
//!                    └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use async_http_proxy::config::resolve_config;
use async_http_proxy::lifecycle::startup;
use async_http_proxy::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "async-http-proxy")]
#[command(about = "Asynchronous forwarding HTTP proxy", long_about = None)]
struct Args {
    /// Port to listen on (all interfaces).
    #[arg(short, long, env = "HTTP_PROXY_PORT")]
    port: u16,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(args.config.as_deref(), args.port)?;

    init_logging(&config.observability);
    tracing::info!("async-http-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
