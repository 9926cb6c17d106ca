use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

use biller::config::{
    DEFAULT_MAX_IN_FLIGHT, DEFAULT_PAGE_SIZE, DEFAULT_QUEUE_CAPACITY, DEFAULT_RETRY_MAX_ATTEMPTS,
};
use biller::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Charges pending invoices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run billing once and print the invoice snapshot as CSV
    Run(RunArgs),
    /// Keep billing on a schedule until interrupted
    Daemon(DaemonArgs),
}

#[derive(Args)]
struct SeedArgs {
    /// Customers CSV (`id,currency`)
    #[arg(long, env = "BILLER_CUSTOMERS")]
    customers: PathBuf,

    /// Invoices CSV (`id,customer_id,amount,currency[,status]`)
    #[arg(long, env = "BILLER_INVOICES")]
    invoices: PathBuf,
}

#[derive(Args)]
struct TuningArgs {
    #[arg(long, env = "BILLER_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    #[arg(long, env = "BILLER_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    #[arg(long, env = "BILLER_MAX_IN_FLIGHT", default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    max_in_flight: usize,

    #[arg(long, env = "BILLER_RETRY_BASE_MS", default_value_t = 10)]
    retry_base_ms: u64,

    #[arg(long, env = "BILLER_RETRY_MAX_MS", default_value_t = 10_000)]
    retry_max_ms: u64,

    /// Total charge attempts per invoice, 0 for no ceiling
    #[arg(long, env = "BILLER_RETRY_MAX_ATTEMPTS", default_value_t = DEFAULT_RETRY_MAX_ATTEMPTS)]
    retry_max_attempts: u32,

    /// Simulated provider declines every n-th invoice
    #[arg(long, env = "BILLER_DECLINE_EVERY")]
    decline_every: Option<u32>,

    /// Simulated provider fails the first attempt of every n-th invoice
    #[arg(long, env = "BILLER_FLAKY_EVERY")]
    flaky_every: Option<u32>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "BILLER_LOG", default_value = "info")]
    log: String,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    seed: SeedArgs,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Args)]
struct DaemonArgs {
    #[command(flatten)]
    seed: SeedArgs,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Skip the run shortly after start-up
    #[arg(long, env = "BILLER_NO_BOOT_RUN")]
    no_boot_run: bool,

    #[arg(long, env = "BILLER_BOOT_DELAY_SECS", default_value_t = 20)]
    boot_delay_secs: u64,

    /// Run every N seconds instead of monthly
    #[arg(long, env = "BILLER_EVERY_SECS")]
    every_secs: Option<u64>,
}

impl TuningArgs {
    fn billing_config(&self) -> BillingConfig {
        let max_attempts = match self.retry_max_attempts {
            0 => None,
            n => Some(n),
        };

        BillingConfig::new()
            .with_page_size(self.page_size)
            .with_queue_capacity(self.queue_capacity)
            .with_max_in_flight(self.max_in_flight)
            .with_retry_backoff(
                Duration::from_millis(self.retry_base_ms),
                Duration::from_millis(self.retry_max_ms),
            )
            .with_max_attempts(max_attempts)
    }

    fn provider(
        &self,
        store: Arc<ConcurrentBillingStore>,
    ) -> SimulatedPaymentProvider<Arc<ConcurrentBillingStore>> {
        let mut provider = SimulatedPaymentProvider::new(store);
        if let Some(n) = self.decline_every {
            provider = provider.with_decline_every(n);
        }
        if let Some(n) = self.flaky_every {
            provider = provider.with_flaky_every(n);
        }
        provider
    }
}

impl DaemonArgs {
    fn schedule_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            run_on_boot: !self.no_boot_run,
            boot_delay: Duration::from_secs(self.boot_delay_secs),
            schedule: match self.every_secs {
                Some(secs) => Schedule::Every(Duration::from_secs(secs.max(1))),
                None => Schedule::Monthly,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log = match &cli.command {
        Command::Run(args) => &args.tuning.log,
        Command::Daemon(args) => &args.tuning.log,
    };
    init_tracing(log);

    CliApp::new("biller")
        .run(|stdout, shutdown| async move {
            match cli.command {
                Command::Run(args) => run_once(stdout, args).await,
                Command::Daemon(args) => run_daemon(args, shutdown).await,
            }
        })
        .await
}

/// Bill every customer once, then print the invoice snapshot
async fn run_once<W>(mut stdout: W, args: RunArgs) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin + Send,
{
    let (store, _) = load_store(&args.seed.customers, &args.seed.invoices).await?;
    let store = Arc::new(store);
    let config = args.tuning.billing_config();

    let (events, delivery) = QueuedEventSink::spawn(TracingEventSink);
    let orchestrator = BillingOrchestrator::from_shared(
        store.clone(),
        Arc::new(args.tuning.provider(store.clone())),
        Arc::new(events),
        &config,
    );

    let summary = orchestrator.run().await?;
    info!(
        pages = summary.pages,
        charged = summary.charged,
        declined = summary.declined,
        clean = summary.is_clean(),
        "Run complete"
    );

    // Last sender gone: the delivery task drains and exits
    drop(orchestrator);
    delivery.await?;

    write_invoice_snapshot(&*store, &mut stdout).await?;
    stdout.flush().await?;
    Ok(())
}

/// Bill on schedule until shutdown is requested
async fn run_daemon(args: DaemonArgs, shutdown: CancellationToken) -> Result<(), AppError> {
    let (store, _) = load_store(&args.seed.customers, &args.seed.invoices).await?;
    let store = Arc::new(store);
    let config = args
        .tuning
        .billing_config()
        .with_schedule(args.schedule_config());

    let (events, _delivery) = QueuedEventSink::spawn(TracingEventSink);
    let orchestrator = BillingOrchestrator::from_shared(
        store.clone(),
        Arc::new(args.tuning.provider(store.clone())),
        Arc::new(events),
        &config,
    );

    info!(schedule = ?config.schedule.schedule, "Billing daemon started");
    BillingScheduler::new(orchestrator, config.schedule)
        .spawn(shutdown)
        .await?;
    Ok(())
}
