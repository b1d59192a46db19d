use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing_subscriber::EnvFilter;

use vigil_judge::engine::{JudgeConfig, JudgeEngine};
use vigil_judge::events::LastEventIndex;
use vigil_judge::history::HistoryStore;
use vigil_judge::index::RuleIndex;
use vigil_judge::EventSink;
use vigil_server::config::ServerConfig;
use vigil_server::state::AppState;
use vigil_server::sync::RuleSyncer;
use vigil_server::{api, VERSION};
use vigil_sink::{DiscardSink, RedisSink};

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  vigil-server [-c <cfg.json>]    Start the judge (default config: cfg.json)");
    eprintln!("  vigil-server -v                 Print version and exit");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config_path = "cfg.json".to_string();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-v" | "--version" => {
                println!("{VERSION}");
                return Ok(());
            }
            "-c" => {
                config_path = args.get(i + 1).cloned().ok_or_else(|| {
                    print_usage();
                    anyhow::anyhow!("-c requires a config file path")
                })?;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => {
                print_usage();
                return Err(anyhow::anyhow!("unknown argument '{other}'"));
            }
        }
        i += 1;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vigil=info".parse()?))
        .init();

    let config = ServerConfig::load(&config_path)?;
    tracing::info!(
        listen = %config.listen,
        hbs = %config.hbs.addr,
        "vigil-server starting"
    );

    let history = Arc::new(HistoryStore::new(
        config.history.shard_count,
        config.history.max_history,
    ));
    let rules = Arc::new(RuleIndex::new());
    let last_events = Arc::new(LastEventIndex::new());

    let sink: Arc<dyn EventSink> = if config.alarm.enabled {
        Arc::new(RedisSink::connect(&config.alarm.redis, config.alarm.queue_pattern.clone()).await?)
    } else {
        tracing::info!("alarm disabled, judged events will be discarded");
        Arc::new(DiscardSink)
    };

    let engine = Arc::new(JudgeEngine::new(
        history.clone(),
        rules.clone(),
        last_events.clone(),
        sink,
        JudgeConfig {
            min_interval: config.alarm.min_interval,
            epsilon: config.epsilon,
        },
    ));

    // Periodic rule refresh from the heartbeat server
    let syncer = RuleSyncer::new(config.hbs.addr.clone(), config.hbs.interval_secs, rules.clone());
    let sync_handle = tokio::spawn(async move {
        syncer.run().await;
    });

    // Periodic stale-series sweep
    let sweep_history = history.clone();
    let stale_timeout = config.history.stale_timeout;
    let clean_interval = config.history.clean_interval.max(1);
    let sweep_handle = tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(clean_interval));
        loop {
            tick.tick().await;
            let now = chrono::Utc::now().timestamp();
            let removed = sweep_history.sweep_stale(now, stale_timeout);
            if removed > 0 {
                tracing::info!(removed, "swept stale series");
            }
        }
    });

    let state = AppState {
        engine,
        history,
        rules,
        last_events,
    };
    let app = api::build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!(addr = %config.listen, "http listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
        })
        .await?;

    sync_handle.abort();
    sweep_handle.abort();
    tracing::info!("vigil-server stopped");

    Ok(())
}
