//! snooze: defer tabs now, restore them later.
//! Runs the scheduling engine against a file-backed store and a simulated tab host.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use snooze_core::app::{AppBuilder, SchedulingService, Zone};
use snooze_core::domain::DeferralOption;
use snooze_core::impls::{FileKvStore, InMemoryTabs, TokioAlarms};
use snooze_core::ports::{Clock, SystemClock, TabHost};
use tokio::sync::mpsc;

mod cli;
mod serve;
mod tabs;

fn init_tracing() {
    let filter = std::env::var("SNOOZE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    // stdout carries protocol responses only
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

fn build(
    args: &cli::Cli,
    zone: Zone,
    tabs: Arc<dyn TabHost>,
) -> anyhow::Result<(SchedulingService, mpsc::UnboundedReceiver<String>)> {
    let store_dir = args.store_dir.clone().unwrap_or_else(cli::default_store_dir);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (alarms, fired) = TokioAlarms::new(clock.clone());

    tracing::debug!(store_dir = %store_dir.display(), %zone, "opening store");

    let service = AppBuilder::new()
        .kv_store(Arc::new(FileKvStore::new(store_dir)))
        .alarm_host(Arc::new(alarms))
        .tab_host(tabs)
        .clock(clock)
        .zone(zone)
        .build()?;
    Ok((service, fired))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing();

    let zone: Zone = args.zone.parse()?;

    match &args.command {
        cli::Command::Serve(opts) => {
            let tabs = match &opts.tabs {
                Some(path) => tabs::ConsoleTabs::load(path)?,
                None => tabs::ConsoleTabs::new(Vec::new()),
            };
            let (service, fired) = build(&args, zone, Arc::new(tabs))?;
            tracing::info!("snooze starting");
            serve::run(service, fired).await?;
        }
        cli::Command::Resolve(opts) => {
            let now: DateTime<Utc> = match &opts.now {
                Some(raw) => DateTime::parse_from_rfc3339(raw)
                    .with_context(|| format!("invalid --now {raw:?}"))?
                    .with_timezone(&Utc),
                None => SystemClock.now(),
            };
            let option = DeferralOption::parse(&opts.option);
            let deferral = zone.resolve(option, now);
            let out = serde_json::json!({
                "option": option,
                "label": option.label(),
                "wakeAt": deferral.wake_at().map(|at| at.to_rfc3339()),
                "wakeLabel": zone.wake_label(deferral, now),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        cli::Command::List => {
            let (service, _fired) = build(&args, zone, Arc::new(InMemoryTabs::new()))?;
            let views = service.views().await?;
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        cli::Command::Export => {
            let (service, _fired) = build(&args, zone, Arc::new(InMemoryTabs::new()))?;
            println!("{}", service.export().await?);
        }
    }

    Ok(())
}
