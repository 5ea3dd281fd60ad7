use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use workload_monitor::{
    CollectionOrchestrator, MonitorSettings, SystemClock,
    config::read_config_file,
    storage::{MonitorStore, sqlite::SqliteStore},
    workload::HttpWorkloadApi,
};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); defaults apply when omitted
    #[arg(short)]
    file: Option<String>,

    /// Only collect this application
    #[arg(long)]
    app: Option<String>,

    /// Keep collecting every `interval_secs` until Ctrl-C
    #[arg(long)]
    watch: bool,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("workload_monitor", LevelFilter::TRACE),
        ("sqlx", LevelFilter::WARN),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let settings = match &args.file {
        Some(file) => read_config_file(file)?,
        None => MonitorSettings::default(),
    }
    .with_env_overrides();

    let store = Arc::new(SqliteStore::new(&settings.storage.path).await?);
    let workload = Arc::new(HttpWorkloadApi::new(&settings.workload)?);

    let orchestrator = CollectionOrchestrator::new(
        store.clone(),
        workload,
        Arc::new(SystemClock),
        &settings,
    );

    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            return;
        }
        info!("Ctrl-C received, stopping after the current application");
        cancel.cancel();
    });

    let filter = args.app.as_deref();
    if args.watch {
        orchestrator.run_periodic(filter, settings.interval()).await;
    } else {
        let report = orchestrator.run(filter).await?;
        for failure in &report.failures {
            warn!("{}: {} stage failed: {}", failure.app, failure.stage, failure.message);
        }
        info!(
            "collected {} applications, {} active alerts",
            report.apps.len(),
            store.count_active_alerts(None).await?
        );
    }

    store.close().await?;
    Ok(())
}
