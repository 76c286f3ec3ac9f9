use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixela_core::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use pixela_mcp_runtime::{McpCommands, run as run_mcp};

#[derive(Parser)]
#[command(
    name = "pixela-mcp",
    version,
    about = "Pixela MCP server: user, graph, pixel and webhook tools over stdio"
)]
struct Cli {
    /// Pixela API base URL
    #[arg(long, env = "PIXELA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Deadline for each outbound Pixela call, in seconds
    #[arg(
        long,
        env = "PIXELA_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,

    #[command(subcommand)]
    command: McpCommands,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // stdout carries protocol frames, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pixela_mcp_runtime=info,pixela_core=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig {
        timeout: Duration::from_secs(cli.timeout_secs),
        ..ClientConfig::with_base_url(cli.base_url)
    };

    let code = run_mcp(&config, cli.command).await;
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Cli::try_parse_from(["pixela-mcp", "--timeout-secs", "0", "tools"])
            .err()
            .expect("zero timeout should not parse");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli::try_parse_from(["pixela-mcp", "--timeout-secs", "5", "tools"])
            .expect("positive timeout should parse");
        assert_eq!(cli.timeout_secs, 5);
    }
}
