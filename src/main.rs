use std::net::IpAddr;

use anyhow::Context;
use clap::Parser;
use highscore_function::{logging, server, HandlerConfig, ServerConfig};

#[derive(Parser)]
#[command(name = "highscore-function")]
#[command(version, about = "Records scores in a GitHub-hosted top-10 leaderboard")]
struct Cli {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    let config = HandlerConfig::from_env().context("invalid handler configuration")?;
    let server_config = ServerConfig {
        host: cli.host,
        port: cli.port,
    };
    server::run(server_config, config).await
}
