//! Tollgate admission daemon.
//!
//! Wires the admission engine over the in-memory stores: `check` runs
//! one-shot admission decisions for exercising a configuration, `serve`
//! runs the janitor, usage recorder, and maintenance passes until
//! interrupted. Real deployments embed the library behind their own
//! store implementations; this binary stands in for that host process.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tollgate::{
    AdmissionPipeline, AdmissionRequest, Janitor, Maintenance, MaintenanceRunner,
    MemoryNotificationStore, MemoryTenantStore, PricingTable, QuotaGate, StoreTimeouts, TenantId,
    TenantRecord, TenantStore, TokenUsage, TollgateConfig, UsageNotifier, UsageRecorder,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the tollgate daemon.
#[derive(Parser, Debug)]
#[command(name = "tollgated")]
#[command(about = "Tollgate admission control daemon")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "tollgate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one-shot admission checks against a seeded tenant
    Check {
        /// Tenant to check
        #[arg(long)]
        tenant: String,
        /// Client key (e.g. an IP address)
        #[arg(long, default_value = "127.0.0.1")]
        key: String,
        /// Traffic class
        #[arg(long, default_value = "chat")]
        class: String,
        /// Number of consecutive checks to run
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Report each admitted check as a completed generation of this
        /// many tokens
        #[arg(long)]
        tokens: Option<u64>,
    },
    /// Run the maintenance and janitor loops until interrupted
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = if args.config.exists() {
        TollgateConfig::from_file(&args.config)?
    } else {
        warn!(config_file = ?args.config, "Config file not found, using defaults");
        TollgateConfig::default()
    };
    config.maintenance.validate()?;

    let registry = Arc::new(config.build_registry()?);
    let tenant_store = Arc::new(MemoryTenantStore::new());
    let notification_store = Arc::new(MemoryNotificationStore::new());
    let notifier = UsageNotifier::new(notification_store);
    let defaults = config.quota_defaults();
    let (recorder_handle, recorder) = UsageRecorder::channel(
        tenant_store.clone(),
        notifier.clone(),
        config.recorder_capacity,
    );
    let recorder_task = recorder.spawn();

    let pipeline = AdmissionPipeline::new(
        Arc::clone(&registry),
        tenant_store.clone(),
        QuotaGate::new(defaults),
        PricingTable::default(),
        recorder_handle.clone(),
        StoreTimeouts::from(config.timeouts),
    );

    match args.command {
        Command::Check {
            tenant,
            key,
            class,
            count,
            tokens,
        } => {
            let tenant = TenantId::new(tenant)?;
            tenant_store
                .insert(TenantRecord::provision(
                    tenant.clone(),
                    *defaults.daily_limit(),
                    *defaults.monthly_limit(),
                    *defaults.monthly_token_limit(),
                    chrono::Utc::now(),
                ))
                .await?;

            let request = AdmissionRequest::new(tenant.clone(), key, class);
            for i in 1..=count {
                let decision = pipeline.admit(&request).await?;
                println!("{}", serde_json::to_string_pretty(&decision)?);
                if *decision.allowed()
                    && let Some(tokens) = tokens
                {
                    pipeline.report_success(
                        &tenant,
                        "gemini-1.5-flash",
                        TokenUsage::new(tokens / 2, tokens - tokens / 2),
                    );
                }
                info!(check = i, allowed = decision.allowed(), "Check complete");
            }
        }
        Command::Serve => {
            let janitor = Janitor::new(
                Arc::clone(&registry),
                config.janitor.sweep_interval_secs,
                config.janitor.retention_secs,
            )?;
            let janitor_shutdown = janitor.shutdown_handle();
            let janitor_task = janitor.spawn();

            let maintenance = Maintenance::new(tenant_store.clone(), notifier, defaults);
            let runner = MaintenanceRunner::new(maintenance, config.maintenance.clone())?;
            let runner_shutdown = runner.shutdown_handle();
            let runner_task = runner.spawn();

            info!("tollgated running, press ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
            info!("Shutting down");

            runner_shutdown.notify_one();
            janitor_shutdown.notify_one();
            runner_task.await?;
            janitor_task.await?;
        }
    }

    recorder_handle.shutdown().await;
    recorder_task.await?;
    Ok(())
}
