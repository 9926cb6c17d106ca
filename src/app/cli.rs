use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use super::error::AppError;

const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Reusable CLI application runner that handles:
/// - Signal handling (SIGINT, SIGTERM, SIGHUP)
/// - Stdout buffering
/// - Exit codes (0 = success, 1 = error, 130 = SIGINT, 143 = SIGTERM)
/// - Graceful shutdown through a cancellation token
pub struct CliApp {
    name: String,
    shutdown: CancellationToken,
    grace: Duration,
}

impl CliApp {
    /// Create a new CLI application runner
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shutdown: CancellationToken::new(),
            grace: DEFAULT_GRACE_PERIOD,
        }
    }

    /// How long the main function may keep running after a signal
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run the CLI application with signal handling and exit codes.
    ///
    /// The main function receives a buffered stdout writer and a token that is
    /// cancelled on SIGINT/SIGTERM/SIGHUP. After a signal it gets the grace
    /// period to wind down before the process exits.
    ///
    /// This function never returns - it calls std::process::exit with the appropriate code
    pub async fn run<F, Fut>(self, main_fn: F) -> !
    where
        F: FnOnce(tokio::io::BufWriter<tokio::io::Stdout>, CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), AppError>>,
    {
        let writer = tokio::io::BufWriter::new(tokio::io::stdout());
        let main_fut = main_fn(writer, self.shutdown.clone());
        tokio::pin!(main_fut);

        tokio::select! {
            result = &mut main_fut => {
                std::process::exit(exit_code(&self.name, result));
            }
            signal_code = wait_for_signal() => {
                self.shutdown.cancel();
                if tokio::time::timeout(self.grace, &mut main_fut).await.is_err() {
                    warn!(app = %self.name, "Shutdown grace period elapsed");
                }
                std::process::exit(signal_code);
            }
        }
    }
}

/// Exit code for a finished main function
fn exit_code(name: &str, result: Result<(), AppError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}: error: {}", name, e);
            1
        }
    }
}

/// Wait for any Unix signal (SIGINT, SIGTERM, SIGHUP) or Ctrl+C
/// Returns the exit code to use (130 for SIGINT, 143 for SIGTERM, etc.)
async fn wait_for_signal() -> i32 {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::hangup()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint), Ok(mut sighup)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM");
                        143 // 128 + 15
                    }
                    _ = sigint.recv() => {
                        info!("Received SIGINT");
                        130 // 128 + 2
                    }
                    _ = sighup.recv() => {
                        info!("Received SIGHUP");
                        129 // 128 + 1
                    }
                }
            }
            _ => {
                warn!("Could not install Unix signal handlers, falling back to Ctrl+C");
                wait_for_ctrl_c().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await
    }
}

async fn wait_for_ctrl_c() -> i32 {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C");
            130
        }
        Err(e) => {
            error!(error = %e, "Could not listen for Ctrl+C");
            std::future::pending::<i32>().await
        }
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout stays clean for CSV output. `RUST_LOG`
/// overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
