//! zakup-crawler CLI
//!
//! Watches the procurement portal and forwards new announcements to Telegram chats.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use zakup_crawler::{
    error::Result,
    models::Config,
    notify::{FanOut, Recipients, TelegramBot, listener},
    pipeline,
    services::AnnounceCrawler,
    storage,
    utils::http::PageFetcher,
};

/// zakup-crawler - Procurement Announcement Watcher
#[derive(Parser, Debug)]
#[command(
    name = "zakup-crawler",
    version,
    about = "Watches goszakup.gov.kz for new announcements"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll forever and forward new announcements to registered chats
    Run,

    /// Run a single cycle and print what it found
    Once {
        /// Print announcements as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Write the default configuration to the config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build the crawler from configuration.
async fn build_crawler(config: &Config) -> Result<AnnounceCrawler> {
    let pages = Arc::new(PageFetcher::new(&config.crawler)?);
    let ledger = storage::open_ledger(&config.ledger).await?;
    AnnounceCrawler::new(config.source.clone(), pages, ledger)
}

/// Set up the chat transport, or `None` if its credential is missing.
fn build_fan_out(config: &Config, recipients: &Recipients) -> Option<(Arc<TelegramBot>, FanOut)> {
    match TelegramBot::from_env(&config.notify) {
        Ok(bot) => {
            let bot = Arc::new(bot);
            let fan_out = FanOut::new(
                bot.clone(),
                recipients.clone(),
                Duration::from_secs(config.notify.send_timeout_secs),
            );
            Some((bot, fan_out))
        }
        Err(e) => {
            log::error!("Telegram disabled: {}", e);
            None
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Init { force } = cli.command {
        if cli.config.exists() && !force {
            log::warn!(
                "{} already exists. Use --force to overwrite.",
                cli.config.display()
            );
            return Ok(());
        }
        Config::default().save(&cli.config)?;
        log::info!("Default configuration written to {}", cli.config.display());
        return Ok(());
    }

    log::info!("zakup-crawler starting...");
    let config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run => {
            config.validate()?;
            let crawler = build_crawler(&config).await?;
            let recipients = Recipients::new();
            let transport = build_fan_out(&config, &recipients);

            let fan_out = match transport {
                Some((bot, fan_out)) => {
                    tokio::spawn(listener::run_registrations(
                        bot,
                        recipients.clone(),
                        config.notify.clone(),
                    ));
                    Some(fan_out)
                }
                None => None,
            };

            let interval = Duration::from_secs(config.schedule.interval_secs);
            pipeline::run_scheduler(&crawler, fan_out.as_ref(), interval).await;
        }

        Command::Once { json } => {
            config.validate()?;
            let crawler = build_crawler(&config).await?;
            let (announces, stats) = pipeline::run_cycle(&crawler, None).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&announces)?);
            } else {
                for announce in &announces {
                    println!("{announce}\n");
                }
            }
            log::info!("{} announcement(s) found", stats.announcement_count);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Search URL: {}", config.source.search_url()?);
            log::info!("✓ Link pattern: {}", config.source.detail_pattern);
            match &config.ledger.path {
                Some(path) => log::info!("✓ Ledger file: {}", path),
                None => log::info!("✓ Ledger: in-memory"),
            }
            if std::env::var(&config.notify.token_env).is_err() {
                log::warn!(
                    "{} is not set; chat notifications will be disabled",
                    config.notify.token_env
                );
            }

            log::info!("All validations passed!");
        }

        Command::Init { .. } => {}
    }

    Ok(())
}
