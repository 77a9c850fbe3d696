use autoplay_2048::config::{AutoplayConfig, OracleConfig};
use autoplay_2048::error::Result;
use autoplay_2048::host::browser::{BrowserSession, PageOracle};
use autoplay_2048::input::dispatcher::Dispatcher;
use autoplay_2048::input::event::KeyCode;
use autoplay_2048::kernel::driver::{Autoplay, DriverConfig};
use autoplay_2048::planner::oracle::MoveOracle;
use autoplay_2048::services::oracle::HttpOracle;
use autoplay_2048::state::extractor::Extractor;
use autoplay_2048::state::snapshot::Grid;
use std::future::Future;
use tracing_subscriber::EnvFilter;

// Oracle picked at startup from config
enum ConfiguredOracle {
    Page(PageOracle),
    Http(HttpOracle),
}

impl MoveOracle for ConfiguredOracle {
    fn decide(&mut self, grid: &Grid) -> impl Future<Output = Result<KeyCode>> + Send {
        async move {
            match self {
                ConfiguredOracle::Page(oracle) => oracle.decide(grid).await,
                ConfiguredOracle::Http(oracle) => oracle.decide(grid).await,
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AutoplayConfig::from_env()?;
    tracing::info!("Connecting to browser at {}", config.browser.ws_url);

    let session = BrowserSession::connect(&config.browser).await?;

    let oracle = match &config.oracle {
        OracleConfig::Page { expression } => ConfiguredOracle::Page(session.oracle(expression)),
        OracleConfig::Http { url } => ConfiguredOracle::Http(HttpOracle::new(url.clone())),
    };

    let autoplay = Autoplay::with_parts(
        Extractor::new(session.state_source(&config.storage_key)),
        oracle,
        Dispatcher::with_target_tag(session.event_host(), &config.target_tag),
        DriverConfig::from(&config),
    );

    let mut handle = autoplay.start()?;
    tracing::info!("Autoplay running. Press Ctrl+C to stop.");

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        _ = handle.stopped() => false,
    };
    if interrupted {
        tracing::info!("Interrupted");
        handle.stop();
    }

    let (autoplay, reason) = handle.join().await?;
    let stats = autoplay.stats();
    tracing::info!(
        "Finished ({:?}): {} moves, best tile {:?}, score {:?}",
        reason,
        stats.moves,
        stats.max_tile,
        stats.last_score
    );

    Ok(())
}
