//! StudyBuddy CLI - study assistant on the terminal or on Telegram.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use studybuddy_bot::config::{
    ENV_API_KEY, ENV_BASE_URL, ENV_MODEL, ENV_TELEGRAM_TOKEN, config_path as default_config_path,
};
use studybuddy_bot::prelude::*;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// StudyBuddy - a study assistant for university students
#[derive(Parser)]
#[command(name = "studybuddy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "STUDYBUDDY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Model to use (overrides config)
    #[arg(short, long, env = "STUDYBUDDY_MODEL", global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat(ChatArgs),

    /// Run the Telegram bot
    Telegram,

    /// Show configuration and environment status
    Status,
}

/// Arguments for the chat command
#[derive(Args)]
struct ChatArgs {
    /// Custom prompt prefix
    #[arg(short, long, default_value = "You: ")]
    prompt: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging on stderr with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "studybuddy_bot={level},studybuddy={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let config_file = cli.config.as_deref();
    match cli.command {
        Commands::Chat(args) => cmd_chat(args, config_file, cli.model).await,
        Commands::Telegram => cmd_telegram(config_file, cli.model).await,
        Commands::Status => cmd_status(config_file, cli.model).await,
    }
}

/// Load the file, then apply environment and flag overrides.
async fn resolve_config(path: Option<&Path>, model: Option<String>) -> Result<BotConfig> {
    let mut config = load_config(path).await?;
    config.apply_env_overrides();
    if let Some(model) = model {
        config.provider.model = model;
    }
    config.validate()?;
    Ok(config)
}

/// Interactive chat on the terminal.
async fn cmd_chat(args: ChatArgs, path: Option<&Path>, model: Option<String>) -> Result<()> {
    let config = resolve_config(path, model).await?;
    let model = build_model(&config)?;

    let mut session = ChatbotSession::with_max_steps(model, config.agent.max_steps);
    let channel = CliChannel::with_config(CliChannelConfig::new().prompt(args.prompt));
    channel.run_interactive(&mut session).await
}

/// Run the Telegram bot until interrupted.
#[cfg(feature = "telegram")]
async fn cmd_telegram(path: Option<&Path>, model: Option<String>) -> Result<()> {
    use std::sync::Arc;

    let config = resolve_config(path, model).await?;
    let telegram = TelegramChannelConfig::from_bot_config(&config)?;
    let model = build_model(&config)?;

    let manager = Arc::new(ChatbotManager::new(model).with_max_steps(config.agent.max_steps));
    TelegramChannel::new(telegram, manager).run().await?;
    Ok(())
}

#[cfg(not(feature = "telegram"))]
async fn cmd_telegram(_path: Option<&Path>, _model: Option<String>) -> Result<()> {
    Err(ConfigError::invalid("built without the `telegram` feature").into())
}

/// Show status.
async fn cmd_status(path: Option<&Path>, model: Option<String>) -> Result<()> {
    let config_file = path.map_or_else(default_config_path, Path::to_path_buf);

    println!("StudyBuddy Status\n");

    println!("Configuration:");
    println!("  Path:   {}", config_file.display());
    println!(
        "  Exists: {}",
        if config_file.exists() { "yes" } else { "no" }
    );

    match resolve_config(path, model).await {
        Ok(config) => {
            println!("  Valid:  yes");
            println!();
            println!("Provider:");
            println!("  Model:    {}", config.provider.model);
            println!(
                "  Base URL: {}",
                config.provider.base_url.as_deref().unwrap_or("(default)")
            );
            println!(
                "  API key:  {}",
                config
                    .provider
                    .api_key
                    .as_deref()
                    .map_or_else(|| "-".to_string(), mask_secret)
            );
            println!();
            println!("Telegram:");
            println!(
                "  Token:    {}",
                config
                    .telegram
                    .token
                    .as_deref()
                    .map_or_else(|| "-".to_string(), mask_secret)
            );
            println!();
            println!("Agent:");
            println!("  Max steps: {}", config.agent.max_steps);
        }
        Err(e) => {
            println!("  Valid:  no ({e})");
        }
    }

    println!();
    println!("Environment:");
    for name in [ENV_API_KEY, ENV_BASE_URL, ENV_MODEL, ENV_TELEGRAM_TOKEN] {
        print_env_status(name);
    }

    Ok(())
}

fn print_env_status(name: &str) {
    let status = if std::env::var(name).is_ok() {
        "set"
    } else {
        "-"
    };
    println!("  {name}: {status}");
}
