use clap::Parser;
use roster_recon::core::aggregate::{search_affiliations, top_by_total};
use roster_recon::domain::ports::ConfigProvider;
use roster_recon::utils::{logger, validation::Validate};
use roster_recon::{
    CliConfig, GitLabClient, LocalStorage, ReconEngine, ReconReport, ResolvedConfig, Session,
    TabularApiClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting roster-recon CLI");

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration resolution failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if config.verbose {
        tracing::debug!(
            "Resolved config: cohort={}, track={}, output={}",
            config.cohort,
            config.track,
            config.output_path
        );
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let engine = build_engine(&config);
    let mut session = Session::new(config.cohort.clone(), config.track);

    match engine.run(&mut session).await {
        Ok(report) => {
            tracing::info!("✅ Reconciliation completed successfully");
            render_report(&report, &config);
            println!("📁 Reports saved to: {}", config.output_path);
        }
        Err(e) => {
            tracing::error!("❌ Reconciliation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn build_engine(
    config: &ResolvedConfig,
) -> ReconEngine<TabularApiClient, GitLabClient, LocalStorage> {
    let contributor_source =
        TabularApiClient::new(config.roster_endpoint(), config.roster_token());
    let lead_source = TabularApiClient::new(config.lead_endpoint(), config.roster_token());
    let directory_source = GitLabClient::new(config.directory_endpoint(), config.directory_token())
        .with_concurrency(config.concurrent_requests());
    let storage = LocalStorage::new(config.output_path().to_string());

    ReconEngine::new(contributor_source, lead_source, directory_source, storage)
}

fn render_report(report: &ReconReport, config: &ResolvedConfig) {
    println!(
        "✅ Fetched {} directory users ({}, {})",
        report.directory_user_count,
        report.cohort,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    let track_report = report.for_track(config.track);
    println!("\n📊 Account status for {}", track_report.track);
    println!("   registrations:    {}", track_report.reconciled.len());
    println!("   accounts created: {}", track_report.created_count());
    println!("   accounts needed:  {}", track_report.needed_count());

    let summaries: Vec<_> = match &config.affiliation {
        Some(term) => search_affiliations(&track_report.summary, term)
            .into_iter()
            .cloned()
            .collect(),
        None => track_report.summary.clone(),
    };

    if summaries.is_empty() {
        println!("\nNo matching affiliations.");
        return;
    }

    let top = top_by_total(&summaries, config.top);
    println!("\nTop {} affiliations:", top.len());
    println!(
        "{:<50} {:>8} {:>8} {:>8}",
        "Affiliation", "Total", "Created", "Needed"
    );
    for summary in &top {
        println!(
            "{:<50} {:>8} {:>8} {:>8}",
            summary.affiliation, summary.total, summary.created, summary.needed
        );
    }
}
