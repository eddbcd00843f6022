//! Doctoc MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for the Doctoc practice-management
//! platform and Telegram messaging.

use std::sync::Arc;

use clap::Parser;

use doctoc_mcp_server::config::{Config, Transport};
use doctoc_mcp_server::error::Result;
use doctoc_mcp_server::mcp::http;
use doctoc_mcp_server::mcp::server::McpServer;
use doctoc_mcp_server::mcp::tools::ToolHandler;

/// Doctoc MCP Server
#[derive(Parser)]
#[command(name = "doctoc-mcp-server")]
#[command(author, version, about = "Doctoc MCP Server - A Model Context Protocol server for Doctoc and Telegram")]
struct Cli {
    /// Transport to serve on (overrides TRANSPORT)
    #[arg(long, value_enum)]
    transport: Option<Transport>,

    /// Port for the HTTP transport (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(transport) = cli.transport {
        config.transport = transport;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    for name in config.missing_credentials() {
        tracing::warn!("{} is not set; calls that need it will be rejected", name);
    }

    let tool_handler = Arc::new(ToolHandler::from_config(&config)?);
    tracing::info!(
        "Server created with {} tools registered",
        tool_handler.list_tools().len()
    );

    match config.transport {
        Transport::Stdio => {
            let mut server = McpServer::new(tool_handler);
            server.run_stdio().await?;
        }
        Transport::Http => http::serve(tool_handler, config.port).await?,
    }

    Ok(())
}
