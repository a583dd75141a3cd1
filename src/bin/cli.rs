//! card-scraper CLI
//!
//! Scrapes listings for one or more years and writes one CSV per year.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use card_scraper::{
    error::{AppError, Result},
    models::{Config, YearSpec},
    pipeline::{BatchReport, BatchRunner},
    services::FindingClient,
    storage::{ImageStore, LocalStorage},
    utils::{Shutdown, http},
};
use clap::Parser;

/// Sports trading card listing scraper
#[derive(Parser, Debug)]
#[command(
    name = "card-scraper",
    version,
    about = "Scrape graded sports card listings by year"
)]
struct Cli {
    /// Years to scrape: `1986`, `1980-1985` or `1989,1993,1997`
    years: YearSpec,

    /// Page cap per year; 0 fetches every page
    #[arg(long, conflicts_with = "all_pages")]
    pages: Option<u32>,

    /// Fetch every page the upstream returns
    #[arg(long)]
    all_pages: bool,

    /// Seconds to wait between requests
    #[arg(long)]
    delay: Option<f64>,

    /// Also write cards_all.csv spanning every completed year
    #[arg(long)]
    combined: bool,

    /// Download gallery images
    #[arg(long)]
    images: bool,

    /// Directory for CSV output
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Fold command line overrides into the file configuration.
    fn apply(&self, config: &mut Config) -> Result<()> {
        match self.pages {
            Some(0) => config.scrape.all_pages = true,
            Some(pages) => {
                config.scrape.max_pages = pages;
                config.scrape.all_pages = false;
            }
            None => {}
        }
        if self.all_pages {
            config.scrape.all_pages = true;
        }
        if let Some(delay) = self.delay {
            if !delay.is_finite() || delay < 0.0 {
                return Err(AppError::config("--delay must be a non-negative number"));
            }
            config.scrape.request_delay_ms = (delay * 1000.0).round() as u64;
        }
        if self.combined {
            config.output.combined = true;
        }
        if self.images {
            config.output.download_images = true;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        config.validate()
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn run(cli: Cli) -> Result<BatchReport> {
    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply(&mut config)?;

    let app_id = config.api.app_id()?;
    let years = cli.years.years();
    log::info!(
        "Scraping {} ({} years) into {}",
        cli.years,
        years.len(),
        config.output.dir.display()
    );

    let client = http::create_client(&config.api)?;
    let api = FindingClient::new(client.clone(), &config.api, app_id)?;
    let storage = LocalStorage::new(&config.output.dir);

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    let mut runner = BatchRunner::new(&config, Arc::new(api), Arc::new(storage), shutdown)?;
    if config.output.download_images {
        let images_dir = config.output.dir.join(&config.output.images_dir);
        runner = runner.with_images(ImageStore::new(client, images_dir));
    }

    runner.run(&years).await
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(report) if report.is_success() => {
            if let Some(path) = &report.combined_path {
                log::info!("Combined output: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Ok(_) => {
            log::error!("Interrupted before any year completed");
            ExitCode::from(130)
        }
        Err(e) if e.is_configuration() => {
            log::error!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
