//! GoldFeed poller
//!
//! Publishes one reconciled gold price snapshot per interval until Ctrl-C.

use anyhow::Result;
use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use goldfeed::config::{AppConfig, LoggingConfig};
use goldfeed::monitor::{AlertMonitor, TrendTracker, VisibilityBand};
use goldfeed::oracle::PriceEngine;
use goldfeed::types::format_price;

fn init_logging(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if cfg.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    info!("🚀 Starting GoldFeed v{}", env!("CARGO_PKG_VERSION"));
    info!(config = %config, "Configuration loaded");

    let mut engine = PriceEngine::from_config(&config.sources)?;
    let mut alerts = AlertMonitor::from_config(&config.alerts);
    let mut trends = TrendTracker::new();
    let visibility = VisibilityBand::from_config(&config.visibility);

    // Cycles run inline, so a slow cycle delays the next tick instead of overlapping it
    let mut ticker = interval(config.poller.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }

        let snapshot = engine.tick().await;

        for alert in alerts.evaluate(&snapshot, Utc::now()) {
            warn!(kind = ?alert.kind, price = alert.price, threshold = alert.threshold, "🔔 {}", alert);
        }

        if !visibility.should_show(snapshot.domestic, snapshot.international) {
            debug!(
                domestic = %format_price(snapshot.domestic),
                international = %format_price(snapshot.international),
                "Snapshot hidden by visibility band"
            );
            continue;
        }

        let trend = trends.observe(&snapshot);

        info!(
            domestic = %format_price(snapshot.domestic),
            international = %format_price(snapshot.international),
            rate = snapshot.rate,
            market_closed = snapshot.market_closed,
            domestic_trend = ?trend.domestic,
            international_trend = ?trend.international,
            "Price snapshot"
        );
    }

    Ok(())
}
