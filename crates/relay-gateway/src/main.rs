//! chat-relay: Chat Relay Main Binary
//!
//! Usage:
//!   chat-relay                   - Start the relay server
//!   chat-relay --config <path>   - Start with an explicit TOML config file
//!   chat-relay --help            - Show help

mod server;

use std::sync::Arc;

use relay_core::{Config, LlmClient, RelayHandler, SessionStore};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// Serve, optionally from an explicit config file
    Server { config_path: Option<String> },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = match parse_args(std::env::args().skip(1))? {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("chat-relay {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server { config_path } => config_path,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match config_path {
        Some(path) => {
            dotenvy::dotenv().ok();
            Config::from_toml_file(&path)
        }
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting chat-relay...");
    tracing::info!(
        "Model: {} ({:?}), temperature {}, max tokens {}",
        config.llm.model,
        config.llm.provider,
        config.llm.temperature,
        config.llm.max_tokens
    );

    let client = LlmClient::new(&config)
        .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?;
    let relay = RelayHandler::new(Arc::new(SessionStore::new()), Arc::new(client));

    server::serve(&config.server, relay).await
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<RunMode> {
    let mut args = args.into_iter();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config_path = Some(path);
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(RunMode::Server { config_path })
}

/// Print help message
fn print_help() {
    println!("chat-relay - real-time chat relay for LLM completion APIs");
    println!();
    println!("Usage:");
    println!("  chat-relay                   Start the relay server");
    println!("  chat-relay --config <path>   Load settings from a TOML file");
    println!("  chat-relay --help            Show this help message");
    println!("  chat-relay --version         Show version");
    println!();
    println!("Environment Variables:");
    println!("  LLM_API_KEY / OPENAI_API_KEY  Provider credential (required)");
    println!("  MODEL_NAME           Model name (default: gpt-3.5-turbo)");
    println!("  TEMPERATURE          Sampling temperature (default: 0.7)");
    println!("  MAX_TOKENS           Maximum output tokens (default: 1000)");
    println!("  LLM_PROVIDER         Provider: openai or claude (default: openai)");
    println!("  LLM_BASE_URL         Custom API endpoint");
    println!("  HOST / PORT          Listen address (default: 0.0.0.0:8000)");
    println!("  ALLOWED_ORIGINS      Comma-separated CORS origins (default: any)");
    println!("  RUST_LOG             Log filter (default: info)");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(
            parse_args(args(&[])).unwrap(),
            RunMode::Server { config_path: None }
        ));
        assert!(matches!(parse_args(args(&["--help"])).unwrap(), RunMode::Help));
        assert!(matches!(parse_args(args(&["-v"])).unwrap(), RunMode::Version));

        match parse_args(args(&["--config", "relay.toml"])).unwrap() {
            RunMode::Server { config_path } => assert_eq!(config_path.as_deref(), Some("relay.toml")),
            _ => panic!("expected server mode"),
        }
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }
}
