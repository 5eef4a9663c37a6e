pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);

/// Handle for winding down a running catalog service.
pub struct ShutdownHandle {
    signal_task: tokio::task::JoinHandle<()>,
    servers: Vec<tokio::task::JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Block until the service has shut down, by signal or by `shutdown()`.
    pub async fn wait(self) {
        drain_and_join(self.signal_task, self.servers).await;
    }

    /// Trigger shutdown without a signal.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn env_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Wire up tracing (stdout always, a daily-rolling file when `log_dir`
/// is set), the panic hook, and the startup build-info line.
///
/// The returned guards flush buffered log lines on drop; hold them for
/// the life of the process.
fn init_logging(config: &ServiceConfig) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    let level = config.log_level();
    let mut guards = Vec::new();

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(env_filter(level));

    match &config.log_dir {
        Some(log_dir) => {
            if let Err(e) = std::fs::create_dir_all(log_dir) {
                eprintln!(
                    "Warning: failed to create log directory {:?}: {}",
                    log_dir, e
                );
            }

            let appender = tracing_appender::rolling::daily(log_dir, "granary.log");
            let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
            guards.push(file_guard);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter(level));

            tracing_subscriber::registry()
                .with(stdout_layer)
                .with(file_layer)
                .init();
        }
        None => tracing_subscriber::registry().with(stdout_layer).init(),
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Build `ServiceState` from config. Startup cannot continue without
/// it, so failure exits the process.
async fn state_or_exit(config: &ServiceConfig) -> ServiceState {
    match ServiceState::from_config(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("error creating service state: {}", e);
            std::process::exit(3);
        }
    }
}

fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], port))
}

/// Wait out the shutdown signal, then give the servers a bounded window
/// to finish draining. A hung listener gets the process killed instead.
async fn drain_and_join(
    signal_task: tokio::task::JoinHandle<()>,
    servers: Vec<tokio::task::JoinHandle<()>>,
) {
    let _ = signal_task.await;

    if timeout(SHUTDOWN_DEADLINE, join_all(servers)).await.is_err() {
        tracing::error!(
            "servers still running {} seconds after shutdown, exiting",
            SHUTDOWN_DEADLINE.as_secs()
        );
        std::process::exit(4);
    }
}

/// Start the API server and the transfer gateway, returning the state
/// handle alongside the running service.
///
/// The returned `ShutdownHandle` must be kept alive; dropping it does
/// not stop the service.
pub async fn start_service(config: &ServiceConfig) -> (ServiceState, ShutdownHandle) {
    let (signal_task, shutdown_tx, shutdown_rx) = utils::signal_listener();
    let state = state_or_exit(config).await;
    let log_level = config.log_level();

    let api_config = http_server::Config::new(listen_addr(config.api_port), log_level);
    let api_state = state.clone();
    let api_rx = shutdown_rx.clone();
    let api = tokio::spawn(async move {
        if let Err(e) = http_server::run_api(api_config, api_state, api_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });

    let gw_config = http_server::Config::new(listen_addr(config.gateway_port), log_level);
    let gw_state = state.clone();
    let gw_rx = shutdown_rx.clone();
    let gateway = tokio::spawn(async move {
        if let Err(e) = http_server::run_gateway(gw_config, gw_state, gw_rx).await {
            tracing::error!("gateway server error: {}", e);
        }
    });

    tracing::info!(
        api_port = config.api_port,
        gateway_port = config.gateway_port,
        "catalog service running"
    );

    let handle = ShutdownHandle {
        signal_task,
        servers: vec![api, gateway],
        shutdown_tx,
    };

    (state, handle)
}

/// Run the full catalog service and block until a shutdown signal.
/// This is what `granary serve` calls.
pub async fn spawn_service(config: &ServiceConfig) {
    let _guards = init_logging(config);
    let (_, handle) = start_service(config).await;
    handle.wait().await;
}
