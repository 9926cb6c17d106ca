use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::cursor::CustomerPageFetcher;
use super::error::BillingError;
use super::processor::InvoiceProcessor;
use super::report::{CustomerReport, RunSummary};
use super::retry::{ExponentialBackoff, RetryPolicy};
use super::run_guard::{RunGuard, RunPermit};
use crate::config::BillingConfig;
use crate::domain::{Customer, Invoice};
use crate::events::{BillingEvent, EventKind, EventSink};
use crate::gateway::PaymentProvider;
use crate::storage::{BillingStore, StorageError};

/// Runs billing over every customer.
///
/// A run pages through customers into a bounded queue while a dispatcher
/// hands each customer to its own worker task, keeping at most
/// `max_in_flight` workers alive. Clones share the same run guard, so only
/// one run (or manual payment) is active per orchestrator at any time.
pub struct BillingOrchestrator<S, P, E, R = ExponentialBackoff> {
    processor: InvoiceProcessor<S, P, E, R>,
    guard: Arc<RunGuard>,
    page_size: usize,
    queue_capacity: usize,
    max_in_flight: usize,
}

impl<S, P, E, R> Clone for BillingOrchestrator<S, P, E, R> {
    fn clone(&self) -> Self {
        Self {
            processor: self.processor.clone(),
            guard: Arc::clone(&self.guard),
            page_size: self.page_size,
            queue_capacity: self.queue_capacity,
            max_in_flight: self.max_in_flight,
        }
    }
}

impl<S, P, E> BillingOrchestrator<S, P, E, ExponentialBackoff>
where
    S: BillingStore + 'static,
    P: PaymentProvider + 'static,
    E: EventSink + 'static,
{
    pub fn new(store: S, provider: P, events: E, config: &BillingConfig) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(provider), Arc::new(events), config)
    }

    /// Build from handles the caller keeps a copy of
    pub fn from_shared(store: Arc<S>, provider: Arc<P>, events: Arc<E>, config: &BillingConfig) -> Self {
        let retry = Arc::new(ExponentialBackoff::from(&config.retry));
        Self {
            processor: InvoiceProcessor::new(store, provider, events, retry),
            guard: Arc::new(RunGuard::new()),
            page_size: config.page_size.max(1),
            queue_capacity: config.queue_capacity.max(1),
            max_in_flight: config.max_in_flight.max(1),
        }
    }
}

/// A billing run executing in the background
#[derive(Debug)]
pub struct RunHandle {
    handle: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Wait for the run to finish; the run guard is released by then
    pub async fn wait(self) -> Result<RunSummary, BillingError> {
        self.handle
            .await
            .map_err(|e| BillingError::RunAborted(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<S, P, E, R> BillingOrchestrator<S, P, E, R>
where
    S: BillingStore + 'static,
    P: PaymentProvider + 'static,
    E: EventSink + 'static,
    R: RetryPolicy + 'static,
{
    /// Replace the retry policy; the new orchestrator gets its own run guard
    pub fn with_retry_policy<R2: RetryPolicy + 'static>(self, policy: R2) -> BillingOrchestrator<S, P, E, R2> {
        BillingOrchestrator {
            processor: self.processor.with_retry(policy),
            guard: Arc::new(RunGuard::new()),
            page_size: self.page_size,
            queue_capacity: self.queue_capacity,
            max_in_flight: self.max_in_flight,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        self.processor.store()
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Launch a run in the background.
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// `AlreadyRunning` without side effects other than the matching event.
    pub fn start_run(&self) -> Result<RunHandle, BillingError> {
        let permit = self.acquire()?;

        info!("Billing process started");
        self.processor
            .emit(BillingEvent::run(EventKind::BillingStarted));

        let this = self.clone();
        let handle = tokio::spawn(async move { this.execute(permit).await });
        Ok(RunHandle { handle })
    }

    /// Run billing to completion
    pub async fn run(&self) -> Result<RunSummary, BillingError> {
        self.start_run()?.wait().await
    }

    /// Charge one invoice on operator request.
    ///
    /// Holds the run guard for the duration, so it never overlaps a run.
    pub async fn process_single_invoice(
        &self,
        customer: &Customer,
        invoice: &Invoice,
    ) -> Result<bool, BillingError> {
        let _permit = self.acquire()?;
        self.processor.process_single(customer, invoice).await
    }

    fn acquire(&self) -> Result<RunPermit, BillingError> {
        self.guard.try_acquire().ok_or_else(|| {
            warn!("Billing process already running");
            self.processor
                .emit(BillingEvent::run(EventKind::BillingAlreadyRunning));
            BillingError::AlreadyRunning
        })
    }

    async fn execute(self, permit: RunPermit) -> RunSummary {
        let started = Instant::now();
        let (sender, mut receiver) = mpsc::channel::<Customer>(self.queue_capacity);

        let fetcher = CustomerPageFetcher::new(Arc::clone(self.processor.store()), self.page_size);
        let producer = tokio::spawn(produce_customers(
            fetcher,
            sender,
            Arc::clone(self.processor.events()),
        ));

        let slots = Arc::new(Semaphore::new(self.max_in_flight));
        let mut workers = JoinSet::new();
        let mut summary = RunSummary::default();

        loop {
            // Take a worker slot before pulling the next customer off the queue
            let Ok(slot) = Arc::clone(&slots).acquire_owned().await else {
                break;
            };
            let Some(customer) = receiver.recv().await else {
                break;
            };
            summary.customers += 1;

            let processor = self.processor.clone();
            workers.spawn(async move {
                let _slot = slot;
                processor.process_customer(&customer).await
            });

            while let Some(done) = workers.try_join_next() {
                absorb(&mut summary, done);
            }
        }
        drop(receiver);

        while let Some(done) = workers.join_next().await {
            absorb(&mut summary, done);
        }

        match producer.await {
            Ok(Ok(pages)) => summary.pages = pages,
            Ok(Err(e)) => summary.paging_error = Some(e.to_string()),
            Err(e) => {
                error!(error = %e, "Customer paging task failed");
                summary.paging_error = Some(e.to_string());
            }
        }
        summary.elapsed = started.elapsed();

        info!(
            customers = summary.customers,
            invoices = summary.invoices,
            charged = summary.charged,
            declined = summary.declined,
            unresolved = summary.unresolved,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Billing process finished"
        );
        self.processor
            .emit(BillingEvent::run(EventKind::BillingFinished));

        drop(permit);
        summary
    }
}

/// Page through all customers into the queue, returning the pages fetched
async fn produce_customers<S, E>(
    mut fetcher: CustomerPageFetcher<Arc<S>>,
    sender: mpsc::Sender<Customer>,
    events: Arc<E>,
) -> Result<usize, StorageError>
where
    S: BillingStore,
    E: EventSink,
{
    let mut pages = 0;

    while fetcher.has_next() {
        let page = match fetcher.next_page().await {
            Ok(page) => page,
            Err(e) => {
                error!(cursor = ?fetcher.cursor(), error = %e, "Could not fetch customer page");
                events.notify(BillingEvent::run(EventKind::CustomerPageFailed));
                return Err(e);
            }
        };
        pages += 1;
        debug!(page = pages, customers = page.len(), "Fetched customer page");

        for customer in page {
            if sender.send(customer).await.is_err() {
                debug!("Customer queue closed, stopping paging");
                return Ok(pages);
            }
        }
    }

    Ok(pages)
}

fn absorb(summary: &mut RunSummary, done: Result<CustomerReport, JoinError>) {
    match done {
        Ok(report) => summary.absorb(report),
        Err(e) => {
            error!(error = %e, "Customer worker failed");
            summary.worker_panics += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, InvoiceStatus, Money};
    use crate::engine::retry::ConstantBackoff;
    use crate::events::RecordingEventSink;
    use crate::gateway::{PaymentError, ScriptedPaymentProvider};
    use crate::storage::{ConcurrentBillingStore, InvoiceStore};
    use std::time::Duration;

    fn seeded_store(customers: usize, invoices_each: usize) -> Arc<ConcurrentBillingStore> {
        let store = Arc::new(ConcurrentBillingStore::new());
        for _ in 0..customers {
            let customer = store.create_customer(Currency::DKK);
            for _ in 0..invoices_each {
                store.create_invoice(
                    customer.id,
                    Money::parse("100", Currency::DKK).unwrap(),
                    InvoiceStatus::Pending,
                );
            }
        }
        store
    }

    #[tokio::test]
    async fn run_charges_every_pending_invoice() {
        let store = seeded_store(5, 3);
        let events = Arc::new(RecordingEventSink::new());
        let orchestrator = BillingOrchestrator::from_shared(
            store.clone(),
            Arc::new(ScriptedPaymentProvider::always_charge()),
            events.clone(),
            &BillingConfig::new().with_page_size(2).with_max_in_flight(2),
        );

        let summary = orchestrator.run().await.unwrap();

        assert_eq!(summary.customers, 5);
        assert_eq!(summary.invoices, 15);
        assert_eq!(summary.charged, 15);
        assert_eq!(summary.pages, 4);
        assert!(summary.is_clean());
        assert!(!orchestrator.is_running());
        assert_eq!(
            store.fetch_invoices_by_status(InvoiceStatus::Paid).await.unwrap().len(),
            15
        );

        let kinds = events.kinds();
        assert_eq!(kinds.first(), Some(&EventKind::BillingStarted));
        assert_eq!(kinds.last(), Some(&EventKind::BillingFinished));
    }

    #[tokio::test]
    async fn empty_store_finishes_cleanly() {
        let events = Arc::new(RecordingEventSink::new());
        let orchestrator = BillingOrchestrator::from_shared(
            Arc::new(ConcurrentBillingStore::new()),
            Arc::new(ScriptedPaymentProvider::always_charge()),
            events.clone(),
            &BillingConfig::default(),
        );

        let summary = orchestrator.run().await.unwrap();

        assert_eq!(summary.customers, 0);
        assert_eq!(summary.pages, 1);
        assert_eq!(
            events.kinds(),
            vec![EventKind::BillingStarted, EventKind::BillingFinished]
        );
    }

    #[tokio::test]
    async fn second_run_rejected_while_first_active() {
        let store = seeded_store(1, 1);
        let events = Arc::new(RecordingEventSink::new());
        let orchestrator = BillingOrchestrator::from_shared(
            store,
            Arc::new(ScriptedPaymentProvider::new(Err(PaymentError::Network("slow".into())))),
            events.clone(),
            &BillingConfig::default(),
        )
        .with_retry_policy(ConstantBackoff::new(Duration::from_millis(20)).with_max_attempts(5));

        let first = orchestrator.start_run().unwrap();
        let second = orchestrator.start_run();

        assert_eq!(second.unwrap_err(), BillingError::AlreadyRunning);
        assert_eq!(events.count(EventKind::BillingAlreadyRunning), 1);

        let summary = first.wait().await.unwrap();
        assert_eq!(summary.unresolved, 1);
        assert!(orchestrator.start_run().is_ok());
    }

    #[tokio::test]
    async fn manual_payment_rejected_during_run() {
        let store = seeded_store(1, 1);
        let orchestrator = BillingOrchestrator::from_shared(
            store.clone(),
            Arc::new(ScriptedPaymentProvider::new(Err(PaymentError::Network("slow".into())))),
            Arc::new(RecordingEventSink::new()),
            &BillingConfig::default(),
        )
        .with_retry_policy(ConstantBackoff::new(Duration::from_millis(20)).with_max_attempts(5));
        let customer = Customer::new(1, Currency::DKK);
        let invoice = store.fetch_invoice(1).await.unwrap().unwrap();

        let run = orchestrator.start_run().unwrap();
        let manual = orchestrator.process_single_invoice(&customer, &invoice).await;

        assert_eq!(manual, Err(BillingError::AlreadyRunning));
        run.wait().await.unwrap();
    }
}
