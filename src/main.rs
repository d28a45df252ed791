use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod cli;
mod config;
mod fetch;
mod output;
mod proxy;
mod youtube;

use cli::Cli;
use config::Config;
use fetch::{ExtractionResult, FetchOrchestrator};
use youtube::InnertubeClient;

const METHOD_DIRECT: &str = "direct";
const METHOD_TOR: &str = "tor-proxy";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout carries only the result document.
    let default_filter = if cli.verbose {
        "transcript_fetcher=debug"
    } else {
        "transcript_fetcher=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load()?;
    apply_overrides(&mut config, &cli);

    let proxy = cli.tor.then(|| config.proxy.clone());
    let method = if proxy.is_some() {
        METHOD_TOR
    } else {
        METHOD_DIRECT
    };

    let client = proxy::build_client(proxy.as_ref())?;

    if proxy.is_some() {
        match proxy::verify_connectivity(&client).await {
            Ok(ip) => tracing::info!(exit_ip = %ip, "proxy connectivity verified"),
            Err(e) => {
                tracing::error!(error = %e, "proxy probe failed, aborting");
                let result = ExtractionResult::failure(&cli.video_id, e.to_string(), method);
                output::print_result(&result, cli.pretty)?;
                std::process::exit(1);
            }
        }
    }

    tracing::info!(video_id = %cli.video_id, method, "starting extraction");

    let source = InnertubeClient::new(client);
    let orchestrator = FetchOrchestrator::new(source, config.languages.clone(), method);
    let result = orchestrator.run(&cli.video_id).await;

    if config.cache.enabled {
        let suffix = cli.tor.then_some("tor");
        match cache::store(&config.cache.dir, &result, suffix) {
            Ok(path) => tracing::info!(path = %path.display(), "result cached"),
            Err(e) => tracing::warn!(error = %e, "could not write cache file"),
        }
    }

    output::print_result(&result, cli.pretty)?;

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(host) = &cli.proxy_host {
        config.proxy.host = host.clone();
    }
    if let Some(port) = cli.proxy_port {
        config.proxy.port = port;
    }
    if let Some(languages) = &cli.languages {
        config.languages = languages.clone();
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache.dir = dir.clone();
    }
}
