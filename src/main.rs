use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use papertrade::adapter::PaperVenue;
use papertrade::config::AppConfig;
use papertrade::engine::{Engine, Ledger, OrderRegistry, PriceStore};
use papertrade::feeds::{MarketDataClient, TickerFeed};
use papertrade::types::Symbol;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,papertrade=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    tracing::info!("papertrade engine starting");

    let config = AppConfig::load_default();
    let seed = config.seed_balance();

    let prices = Arc::new(PriceStore::new());
    let registry = Arc::new(OrderRegistry::new());
    let ledger = Arc::new(match &config.ledger.persist_path {
        Some(path) => Ledger::load(path, seed)?,
        None => Ledger::new(seed),
    });
    let venue = Arc::new(PaperVenue::new(config.fill_delay()));
    let engine = Engine::new(prices.clone(), registry, ledger.clone(), venue);

    let (feed, feed_handle) = TickerFeed::new(config.ws_feed_config(), prices);
    let feed_task = tokio::spawn(async move {
        if let Err(e) = feed.run().await {
            tracing::error!("price feed terminated: {e}");
        }
    });

    // Warm up one chart's worth of history so a consumer has something to
    // render before the stream settles.
    let rest = MarketDataClient::new(config.feed.rest_url.clone());
    if let Some(symbol) = config.feed.symbols.first() {
        let symbol = Symbol::new(symbol.as_str());
        match rest
            .fetch_klines(&symbol, "1m", config.trading.kline_limit)
            .await
        {
            Ok(klines) => tracing::info!(%symbol, candles = klines.len(), "history loaded"),
            Err(e) => tracing::warn!(%symbol, "history fetch failed: {e}"),
        }
    }

    tracing::info!(balance = %engine.ledger().balance(), "engine running, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    feed_handle.shutdown();
    let _ = feed_task.await;

    if let Some(path) = &config.ledger.persist_path {
        ledger.save(path)?;
    }

    Ok(())
}
