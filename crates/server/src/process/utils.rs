use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const SIGTERM_GRACE: Duration = Duration::from_secs(10);

/// Watch for SIGINT and SIGTERM and broadcast shutdown over a watch
/// channel. SIGINT stops the listeners at once; SIGTERM waits out a
/// grace period first so in-flight transfers can drain.
pub fn signal_listener() -> (JoinHandle<()>, watch::Sender<()>, watch::Receiver<()>) {
    let mut sigint = signal(SignalKind::interrupt()).unwrap();
    let mut sigterm = signal(SignalKind::terminate()).unwrap();

    let (tx, rx) = watch::channel(());
    let signal_tx = tx.clone();

    let task = tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {
                tracing::debug!("SIGINT, shutting down now");
            }
            _ = sigterm.recv() => {
                tokio::time::sleep(SIGTERM_GRACE).await;
                tracing::debug!("SIGTERM grace period over, shutting down");
            }
        }

        let _ = signal_tx.send(());
    });

    (task, tx, rx)
}

/// Route panics through tracing so they land in the same sinks as
/// everything else.
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| {
        if let Some(loc) = panic.location() {
            tracing::error!(
                message = %panic,
                panic.file = loc.file(),
                panic.line = loc.line(),
                panic.column = loc.column(),
            );
        } else {
            tracing::error!(message = %panic);
        }
    }));
}

pub fn report_build_info() {
    let build = crate::version::build_info();

    tracing::info!(
        version = build.version,
        build_profile = build.build_profile,
        build_timestamp = build.build_timestamp,
        "service starting up"
    );
}
