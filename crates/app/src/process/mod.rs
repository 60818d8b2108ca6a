mod signals;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::channel::Channel;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server::{self, Config, ProviderState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Install the global subscriber, writing compact logs to stderr.
///
/// `RUST_LOG` overrides `log_level`. The returned guard must be kept alive for
/// the duration of the program so buffered lines are flushed.
pub fn init_logging(log_level: tracing::Level) -> tracing_appender::non_blocking::WorkerGuard {
    let (stderr_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stderr_writer)
        .with_filter(env_filter);

    // a second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();

    guard
}

/// Run the HTTP provider over `channel` until SIGINT or SIGTERM.
pub async fn spawn_provider(port: u16, channel: Arc<dyn Channel>) -> anyhow::Result<()> {
    signals::log_panics();
    crate::version::build_info().log();

    let (shutdown_task, shutdown_rx) =
        signals::shutdown_watch().context("failed to install signal handlers")?;

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let config = Config::new(listen_addr);
    let state = ProviderState::new(channel);

    let mut server = tokio::spawn(http_server::run(config, state, shutdown_rx));
    tracing::info!(port, "running provider");

    tokio::select! {
        joined = &mut server => {
            // bind failure or a crash before any signal
            joined.context("provider task panicked")??;
            return Ok(());
        }
        received = shutdown_task => {
            let received = received.context("signal task panicked")?;
            tracing::debug!(signal = %received, "waiting for provider to drain");
        }
    }

    timeout(FINAL_SHUTDOWN_TIMEOUT, server)
        .await
        .with_context(|| {
            format!(
                "failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            )
        })?
        .context("provider task panicked")??;

    Ok(())
}
