use std::fmt;
use std::io;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Time in-flight publishes get to land after SIGTERM
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    /// Delay between receiving the signal and telling the server to stop
    pub fn grace(self) -> Duration {
        match self {
            ShutdownSignal::Interrupt => Duration::ZERO,
            ShutdownSignal::Terminate => TERMINATE_GRACE,
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Watch SIGINT and SIGTERM; the receiver fires once the grace period of the
/// first signal has passed, and the task finishes at the same moment.
pub fn shutdown_watch() -> io::Result<(JoinHandle<ShutdownSignal>, watch::Receiver<()>)> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let (tx, rx) = watch::channel(());

    let task = tokio::spawn(async move {
        let received = tokio::select! {
            _ = interrupt.recv() => ShutdownSignal::Interrupt,
            _ = terminate.recv() => ShutdownSignal::Terminate,
        };
        let grace = received.grace();
        tracing::info!(signal = %received, grace_secs = grace.as_secs(), "shutting down provider");
        tokio::time::sleep(grace).await;

        let _ = tx.send(());
        received
    });

    Ok((task, rx))
}

/// Route panics through `tracing` so they land in the same log stream
pub fn log_panics() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location();
        tracing::error!(
            panic = %info,
            file = location.map(|l| l.file()),
            line = location.map(|l| l.line()),
            "provider panicked"
        );
    }));
}
