mod config;
mod export;
mod pipeline;

use clap::Parser;

use crate::config::Cli;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatgraph=info,chatgraph_store=info,chatgraph_graph=info".into()),
        )
        .init();

    let cli = Cli::parse();
    pipeline::run(cli)
}
