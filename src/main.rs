mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use streamgate::{config, server, token};

async fn start_server(host: String, port: u16, config_path: Option<&std::path::Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting streamgate server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "streamgate=trace,tower_http=debug".to_string()
        } else {
            "streamgate=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate { config: path } => {
            let path = path.or(cli.config);
            match config::load_config_or_default(path.as_deref()) {
                Ok(_) => {
                    println!("Configuration is valid");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Configuration error: {e:#}");
                    std::process::exit(1);
                }
            }
        }
        Commands::GenerateSecret => {
            println!("{}", token::generate_secret());
            Ok(())
        }
        Commands::Version => {
            println!("streamgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
