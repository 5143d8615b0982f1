mod cli;
mod wiring;

use std::time::{Duration, Instant};

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use hcache_config::HcacheConfig;
use hcache_core::{CacheStatus, X_CACHE_ORIGIN};
use http::Request;
use tracing::warn;
use utils::init_tracing;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = HcacheConfig::from_file_or_default(&cli.config);
    init_tracing(Some(cfg.global().log_level()));
    if cli.print_config {
        cfg.print();
    }

    let handler = wiring::build_handler(&cfg);
    if cli.flush {
        handler.flush().await.context("flushing cache store")?;
    }

    for attempt in 1..=cli.repeat {
        let req = Request::get(cli.url.as_str())
            .body(Bytes::new())
            .with_context(|| format!("invalid url '{}'", cli.url))?;

        let started = Instant::now();
        let res = handler
            .execute(req)
            .await
            .with_context(|| format!("GET {} failed", cli.url))?;
        let elapsed = started.elapsed();

        let status = match res.extensions().get::<CacheStatus>() {
            Some(CacheStatus::Hit) => "HIT",
            Some(CacheStatus::Bypass) => "BYPASS",
            Some(CacheStatus::Miss) | None => "MISS",
        };
        let origin = res
            .headers()
            .get(X_CACHE_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        println!(
            "#{attempt} {} {} bytes {:?} {status} origin={origin}",
            res.status().as_u16(),
            res.body().len(),
            elapsed
        );

        if attempt < cli.repeat && cli.interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(cli.interval_ms)).await;
        }
    }

    if cli.repeat == 0 {
        warn!(target: "hcache::cache", "Nothing to do, --repeat is 0");
    }

    Ok(())
}
