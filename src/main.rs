use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use craigslist_jobs::browser::ChromeFetcher;
use craigslist_jobs::cli::{check_output_dir, Cli, USAGE};
use craigslist_jobs::config::{FetcherKind, Settings};
use craigslist_jobs::report::{ReportWriter, WritePolicy};
use craigslist_jobs::{Fetcher, HttpFetcher, HttpFetcherConfig, Orchestrator};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(msg) = check_output_dir(&cli.output_dir) {
        eprintln!("{}", msg);
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("🔥 {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::from_env()?;
    if let Some(kind) = cli.fetcher {
        settings.fetcher = kind;
    }
    settings.strict_writes |= cli.strict_writes;

    let fetcher: Arc<dyn Fetcher> = match settings.fetcher {
        FetcherKind::Http => Arc::new(HttpFetcher::new(HttpFetcherConfig {
            timeout: settings.timeout,
            user_agent: settings.user_agent.clone(),
            ..Default::default()
        })?),
        FetcherKind::Chrome => Arc::new(ChromeFetcher::launch(
            settings.timeout,
            settings.user_agent.clone(),
        )?),
    };

    let policy = if settings.strict_writes {
        WritePolicy::Surface
    } else {
        WritePolicy::Swallow
    };
    let terms = cli.search_terms();
    let telecommute = !cli.no_telecommute;

    info!(
        "🚀 Searching {} region(s) for {:?} in {} (telecommute: {})",
        settings.regions.len(),
        terms,
        cli.category,
        telecommute
    );

    let orchestrator = Orchestrator::new(
        fetcher,
        settings.regions,
        ReportWriter::new(&cli.output_dir, policy),
    )
    .with_hub_base(settings.hub_url)
    .with_max_concurrent_cities(settings.max_concurrent_cities);

    let summary = orchestrator.run(&terms, cli.category, telecommute).await;

    for report in &summary.reports {
        match &report.write_error {
            None => println!("{} ({})", report.path.display(), report.stats),
            Some(e) => println!("{} ({}) incomplete: {}", report.path.display(), report.stats, e),
        }
    }
    summary.into_result()?;
    Ok(())
}
