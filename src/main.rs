mod ai;
mod config;
mod constants;
mod error;
mod mail;
mod server;
mod text;

use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::{ChatClient, DEFAULT_SUMMARY_PROMPT, SummaryGateway};
use crate::config::Config;
use crate::constants::LOG_FILE_ENV;
use crate::mail::{MessageFormat, RawMessage};
use crate::server::AppState;
use crate::text::Scrubber;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mailbrief=debug"));

    let log_file = env::var_os(LOG_FILE_ENV).and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
    });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"mailbrief - Extract, clean and summarize email files

Usage: mailbrief [command]

Commands:
    (none), serve             Start the HTTP service
    extract <file>            Print sender, subject and cleaned body as JSON
    summarize <file> [prompt] Extract a file and summarize its body
    help                      Show this help message

Environment:
    OPENAI_API_KEY            API key for the summarization service (required to serve)
    MAILBRIEF_CONFIG          Path to a config.toml (default: ~/.config/mailbrief/config.toml)
    MAILBRIEF_LOG_FILE        Write logs to this file instead of stderr
"#
    );
}

fn read_message(path: &str) -> Result<RawMessage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
    let filename = Path::new(path).file_name().and_then(|n| n.to_str());
    Ok(RawMessage::new(bytes, MessageFormat::from_filename(filename)))
}

fn run_extract(config: &Config, path: &str) -> Result<()> {
    let scrubber = Scrubber::new(&config.scrub)?;
    let parsed = mail::extract(&read_message(path)?, &scrubber)?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

async fn run_summarize(config: &Config, path: &str, prompt: Option<&str>) -> Result<()> {
    let scrubber = Scrubber::new(&config.scrub)?;
    let parsed = mail::extract(&read_message(path)?, &scrubber)?;

    let api_key = config.ai.require_api_key()?;
    let client = ChatClient::new(&config.ai, api_key)?;
    let gateway = SummaryGateway::new(Arc::new(client), &config.ai);

    let summary = gateway
        .summarize(&parsed.body, prompt.unwrap_or(DEFAULT_SUMMARY_PROMPT))
        .await?;
    println!("{}", summary);
    Ok(())
}

async fn run_server(config: &Config) -> Result<()> {
    // Fails fast on a missing API key before anything is bound
    let state = AppState::new(config)?;
    server::serve(config, state).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if matches!(
        args.get(1).map(|s| s.as_str()),
        Some("help") | Some("--help") | Some("-h")
    ) {
        print_usage();
        return Ok(());
    }

    // A missing .env file is not an error
    dotenvy::dotenv().ok();
    setup_logging();

    let config = Config::load()?;

    match args.get(1).map(|s| s.as_str()) {
        None | Some("serve") => run_server(&config).await,
        Some("extract") => match args.get(2) {
            Some(path) => run_extract(&config, path),
            None => {
                print_usage();
                std::process::exit(2);
            }
        },
        Some("summarize") => match args.get(2) {
            Some(path) => run_summarize(&config, path, args.get(3).map(|s| s.as_str())).await,
            None => {
                print_usage();
                std::process::exit(2);
            }
        },
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
    }
}
