use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logo_cache::{config::Config, logo_cache::LogoCache};

#[derive(Parser)]
#[command(name = "logo-cache")]
#[command(version)]
#[command(about = "Look up company logos through a local on-disk cache")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Cache directory (overrides config file)
    #[arg(short = 'd', long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the cached logo path without fetching
    Get { company: String },
    /// Print the logo path, fetching it on a cache miss
    Download { company: String },
    /// Fetch the logo again and replace the cached copy
    Refresh { company: String },
    /// Delete the cached logo
    Remove { company: String },
    /// List cached logos
    List {
        #[arg(long)]
        json: bool,
    },
    /// Report which companies already have a cached logo
    Report {
        #[arg(required = true)]
        companies: Vec<String>,
        #[arg(long)]
        json: bool,
    },
}

fn print_path(company: &str, path: Option<PathBuf>) {
    match path {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("No logo available for '{company}'"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("logo_cache={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(cache_dir) = cli.cache_dir {
        config.storage.logo_cache_path = cache_dir;
    }

    let fetcher = config.fetcher.build_fetcher()?;
    let cache = LogoCache::initialize(Some(config.storage.logo_cache_path.clone()), fetcher).await?;

    match cli.command {
        Command::Get { company } => {
            let path = cache.get_cached_logo(&company).await;
            print_path(&company, path);
        }
        Command::Download { company } => {
            let path = cache.download_logo(&company).await?;
            print_path(&company, path);
        }
        Command::Refresh { company } => {
            let path = cache.refresh_logo(&company).await?;
            print_path(&company, path);
        }
        Command::Remove { company } => {
            if cache.remove_cached_logo(&company).await? {
                println!("Removed cached logo for '{company}'");
            } else {
                eprintln!("No cached logo for '{company}'");
            }
        }
        Command::List { json } => {
            let entries = cache.list_cached_logos().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    // Over-long keys are stored under a prefix and a digest
                    let marker = if entry.key_truncated { "..." } else { "" };
                    println!(
                        "{}{}\t{}\t{}",
                        entry.company_key,
                        marker,
                        entry.file_size,
                        entry.path.display()
                    );
                }
            }
        }
        Command::Report { companies, json } => {
            let report = cache.coverage_report(&companies).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (company, cached) in report {
                    println!("{}\t{}", if cached { "yes" } else { "no" }, company);
                }
            }
        }
    }

    Ok(())
}
