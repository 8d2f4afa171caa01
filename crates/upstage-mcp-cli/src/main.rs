//! Command-line entry point for the Upstage MCP server.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use upstage_mcp::ServerConfig;
use upstage_mcp::mcp::{Dispatcher, http, stdio};

#[derive(Debug, Parser)]
#[command(
    name = "upstage-mcp",
    version,
    about = "Upstage document intelligence MCP server",
    long_about = "Exposes Upstage document parsing, information extraction, schema generation, \
                  and document classification as MCP tools. Requires the UPSTAGE_API_KEY \
                  environment variable."
)]
struct Cli {
    /// Serve MCP over HTTP with SSE instead of stdio
    #[arg(long)]
    http: bool,

    /// Port for the HTTP transport
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Stdout carries the protocol in stdio mode, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{}", err);
            std::process::exit(1);
        }
    };

    let dispatcher = Dispatcher::new(Arc::new(config))?;

    if cli.http {
        http::serve(dispatcher, cli.port).await?;
    } else {
        stdio::run(&dispatcher).await?;
    }

    Ok(())
}
