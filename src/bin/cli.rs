//! Catalog Monitor CLI
//!
//! Long-running entry point plus one-shot maintenance commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use catalog_monitor::{
    error::{AppError, Result},
    models::Config,
    pipeline::{
        CommandHandler, CommandListener, Monitor, NotificationDispatcher, RetryPolicy, messages,
        send_product, serve,
    },
    services::{CatalogFetcher, HttpPageFetcher, HttpWebhook, PageFetcher, TelegramNotifier},
};
use clap::{Parser, Subcommand};

/// Catalog Monitor - detects real additions and removals in a paginated catalog
#[derive(Parser, Debug)]
#[command(
    name = "catalog-monitor",
    version,
    about = "Catalog change monitor with chat alerts"
)]
struct Cli {
    /// Path to the TOML configuration file
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
    /// Start the monitor loop and the command listener
    Run,

    /// Fetch page 0 once and print the first products
    Check {
        /// Also send the products to the configured chat
        #[arg(long)]
        notify: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging from the verbosity flag or the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn page_fetcher(config: &Config) -> Result<Arc<dyn PageFetcher>> {
    Ok(Arc::new(HttpPageFetcher::new(&config.catalog)?))
}

async fn run(config: Config) -> Result<()> {
    let fetcher = page_fetcher(&config)?;
    let telegram = Arc::new(TelegramNotifier::new(&config.notify)?);

    if config.notify.chat_id.is_none() {
        log::warn!("notify.chat_id is not set; alerts will only be logged");
    }

    let mut dispatcher = NotificationDispatcher::new(
        telegram.clone(),
        config.notify.chat_id.clone(),
        config.catalog.base_origin.clone(),
    );
    if let Some(url) = &config.notify.webhook_url {
        let webhook = HttpWebhook::new(
            url.clone(),
            Duration::from_secs(config.notify.webhook_timeout_secs),
        )?;
        dispatcher = dispatcher.with_webhook(Arc::new(webhook), config.notify.webhook_threshold);
    }

    let mut monitor = Monitor::new(
        CatalogFetcher::new(fetcher.clone(), &config.catalog),
        dispatcher,
        config.monitor.clone(),
    );

    let handler = CommandHandler::new(
        CatalogFetcher::new(fetcher, &config.catalog),
        telegram.clone(),
        config.catalog.base_origin.clone(),
        config.catalog.endpoint.clone(),
        config.monitor.poll_interval(),
        config.notify.manual_check_limit,
    );
    let listener = CommandListener::new(telegram, handler);
    let policy = RetryPolicy::from_config(&config.supervisor);

    log::info!(
        "Monitoring {} every {:?}",
        config.catalog.endpoint,
        config.monitor.poll_interval()
    );

    serve(&mut monitor, &listener, &policy, shutdown_signal()).await;
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn check(config: &Config, notify: bool) -> Result<()> {
    let catalog = CatalogFetcher::new(page_fetcher(config)?, &config.catalog);
    let page = catalog
        .fetch_metadata()
        .await
        .ok_or(AppError::MetadataUnavailable)?;

    println!(
        "Total results: {}",
        page.total_results()
            .map_or_else(|| "unknown".to_string(), |t| t.to_string())
    );
    println!("Pages: {}", page.total_pages());

    let products: Vec<_> = page
        .products
        .into_iter()
        .take(config.notify.manual_check_limit)
        .collect();
    for product in &products {
        println!(
            "- {} | {} | {}",
            product.code().unwrap_or("N/A"),
            product.name().unwrap_or("Unknown Product"),
            product.display_price().unwrap_or("N/A")
        );
    }

    if notify {
        let chat = config
            .notify
            .chat_id
            .as_ref()
            .ok_or_else(|| AppError::config("notify.chat_id is not set"))?;
        let telegram = TelegramNotifier::new(&config.notify)?;
        for product in &products {
            let caption = messages::product_card(product);
            send_product(
                &telegram,
                chat,
                &config.catalog.base_origin,
                product,
                &caption,
            )
            .await?;
        }
        log::info!("Sent {} products to {}", products.len(), chat);
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(cli.verbose, &level);

    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
        Config::default()
    });
    config.apply_env();

    match cli.command {
        Command::Run => {
            config.validate()?;
            log::info!("Catalog monitor starting...");
            run(config).await?;
        }

        Command::Check { notify } => {
            config.validate()?;
            check(&config, notify).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({})", cli.config.display());
            if config.notify.bot_token.is_none() {
                log::warn!("notify.bot_token is not set; `run` will refuse to start");
            }
        }
    }

    Ok(())
}
