//! Cat Classifier Stub Server
//!
//! Serves the placeholder HTTP endpoints.

use std::net::SocketAddr;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Cat Classifier Stub Server
#[derive(Parser, Debug)]
#[command(name = "cat_classifier_server")]
#[command(version)]
#[command(about = "Placeholder HTTP endpoints for the cat classifier")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "CAT_CLASSIFIER_PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "CAT_CLASSIFIER_HOST")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    info!("Cat Classifier Stub Server v{}", env!("CARGO_PKG_VERSION"));

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, cat_classifier_server::app()).await?;

    Ok(())
}
