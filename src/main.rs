use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use text_relay::channels::mail::{SpoolFetcher, spawn_mail_poller};
use text_relay::channels::{file::spawn_file_poller, web};
use text_relay::config::{LogConfig, RelayConfig};
use text_relay::error::{ChannelError, ConfigError, Error};
use text_relay::pipeline::{GraphSources, MessageLogger, Pipeline, PipelineGraph, WireTapLogger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::from_env()?;
    let _log_guard = init_tracing(&config.log)?;

    eprintln!("📨 Text Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Files: {} (every {:?})", config.file.dir.display(), config.file.poll_interval);
    eprintln!("   HTTP: POST http://{}{}", config.web.bind_addr, config.web.ingest_path);
    match &config.mail {
        Some(mail) => eprintln!(
            "   Mail: {} (every {:?})",
            mail.spool_dir.display(),
            mail.poll_interval
        ),
        None => eprintln!("   Mail: disabled"),
    }
    if let Some(dir) = &config.log.log_dir {
        eprintln!("   Log file: {}", dir.display());
    }
    eprintln!("   Press Ctrl-C to stop.\n");

    run(config).await?;
    Ok(())
}

/// Stderr logging, plus a daily-rolling file when `RELAY_LOG_DIR` is set.
fn init_tracing(log: &LogConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &log.log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("text-relay")
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| ConfigError::Logging(format!("{}: {e}", dir.display())))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    Ok(guard)
}

async fn run(config: RelayConfig) -> Result<(), Error> {
    let (ingress, pipeline) = Pipeline::spawn(
        &config.pipeline,
        Arc::new(MessageLogger),
        Arc::new(WireTapLogger),
    );

    // ── Sources ─────────────────────────────────────────────────────────
    let mut pollers = vec![spawn_file_poller(config.file.clone(), ingress.clone())];

    if let Some(mail) = &config.mail {
        let fetcher = SpoolFetcher::new(mail.spool_dir.clone());
        fetcher.ensure_dir().await?;
        pollers.push(spawn_mail_poller(
            Arc::new(fetcher),
            mail.poll_interval,
            ingress.clone(),
        ));
    }

    let graph = Arc::new(PipelineGraph::describe(&GraphSources {
        file_dir: Some(config.file.dir.display().to_string()),
        web_route: Some(format!("POST {}", config.web.ingest_path)),
        mail_spool: config
            .mail
            .as_ref()
            .map(|mail| mail.spool_dir.display().to_string()),
    }));

    // ── HTTP ────────────────────────────────────────────────────────────
    let listener = web::bind(&config.web).await?;
    info!(addr = %config.web.bind_addr, "HTTP server started");

    let app = web::routes(ingress.clone(), graph, &config.web);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // ── Drain ───────────────────────────────────────────────────────────
    for (_, shutdown) in &pollers {
        shutdown.store(true, Ordering::Relaxed);
    }
    for (handle, _) in pollers {
        if let Err(e) = handle.await {
            error!("Poller task panicked: {e}");
        }
    }

    drop(ingress);
    pipeline.join().await;

    served.map_err(|source| ChannelError::Io {
        name: "web".into(),
        source,
    })?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested, draining pipeline"),
        Err(e) => {
            error!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
