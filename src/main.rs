use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use grab::alert;
use grab::captcha::{CaptchaGuard, RetryPolicy};
use grab::config::{GrabConfig, DEFAULT_STORE_PATH};
use grab::parser::{process_listing, Extractor};
use grab::record::CompanyRecord;
use grab::session::{Session, StaticSession, WebDriverSession};
use grab::store::{RecordStore, StoreMode};

#[derive(Parser)]
#[command(name = "grab", about = "Extract business listings from map-search pages")]
struct Cli {
    /// JSON file overriding the built-in selectors and timings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON array file the record is appended to
    #[arg(short, long, global = true, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a listing from a saved HTML page
    Parse {
        /// Saved page source
        html: PathBuf,
        /// Site origin for relative links (overrides config)
        #[arg(long)]
        origin: Option<String>,
    },
    /// Extract the listing open in a running WebDriver session
    Listing {
        /// WebDriver endpoint, e.g. http://localhost:4444
        #[arg(long)]
        webdriver: String,
        /// Existing session id to attach to
        #[arg(long)]
        session: String,
    },
}

fn main() -> Result<()> {
    grab::init_tracing();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut config = GrabConfig::load(cli.config.as_deref())?;
    let store = RecordStore::new(&cli.store, StoreMode::AppendOne);

    match cli.command {
        Commands::Parse { html, origin } => {
            if let Some(origin) = origin {
                config.origin = origin;
            }
            let page = std::fs::read_to_string(&html)
                .with_context(|| format!("Failed to read {}", html.display()))?;
            let mut session = StaticSession::new(page);
            // A saved challenge page never clears, so don't wait on it.
            let guard = build_guard(&config)?
                .with_wait(Duration::ZERO)
                .with_policy(RetryPolicy::Attempts(0));
            let record = grab_one(&config, &guard, &mut session)?;
            save(&store, &record)?;
        }
        Commands::Listing { webdriver, session } => {
            let mut session = WebDriverSession::attach(&webdriver, &session)?;
            let guard = build_guard(&config)?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
            spinner.set_message("grabbing listing...");
            spinner.enable_steady_tick(Duration::from_millis(120));
            let record = grab_one(&config, &guard, &mut session);
            spinner.finish_and_clear();

            save(&store, &record?)?;
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("Done in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

fn build_guard(config: &GrabConfig) -> Result<CaptchaGuard> {
    let alert = alert::from_config(config.alert_command.as_deref())?;
    CaptchaGuard::new(&config.captcha, alert)
}

fn grab_one(
    config: &GrabConfig,
    guard: &CaptchaGuard,
    session: &mut dyn Session,
) -> Result<CompanyRecord> {
    let extractor = Extractor::new(config)?;
    process_listing(&extractor, guard, session)
}

fn save(store: &RecordStore, record: &CompanyRecord) -> Result<()> {
    store.save(record)?;
    print_summary(record, store.path());
    Ok(())
}

fn print_summary(record: &CompanyRecord, store: &Path) {
    let name = if record.name.is_empty() { "(no name)" } else { record.name.as_str() };
    println!("Saved '{}' to {}", name, store.display());
    println!(
        "  {} phones, {} categories, {} goods, {} hours, {} reviews",
        record.phones.len(),
        record.categories.len(),
        record.goods.len(),
        record.opening_hours.len(),
        record.reviews.len(),
    );
}
