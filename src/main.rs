mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use saachi::{config, server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "saachi", version, about = "Saachi wellness companion service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server (HTTP by default, or MCP over stdio)
    Serve {
        /// Override the configured transport
        #[arg(long, value_enum)]
        transport: Option<Transport>,
    },
    /// Chat with Saachi in the terminal
    Chat,
    /// Print the effective configuration and backend readiness
    Doctor,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Http,
    Stdio,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::SaachiConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC and chat output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = match transport {
                Some(t) => t,
                None if config.server.transport == "stdio" => Transport::Stdio,
                None => Transport::Http,
            };
            match transport {
                Transport::Http => server::serve_http(config).await?,
                Transport::Stdio => server::serve_stdio(config).await?,
            }
        }
        Command::Chat => cli::chat(&config).await?,
        Command::Doctor => cli::doctor(&config)?,
    }

    Ok(())
}
