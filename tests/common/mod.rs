#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use biller::prelude::*;
use dashmap::DashSet;
use tokio::sync::Semaphore;

/// Store wrapper counting calls and injecting failures
#[derive(Default)]
pub struct CountingStore {
    pub inner: ConcurrentBillingStore,
    page_fetches: AtomicUsize,
    pending_lookups: AtomicUsize,
    paid_writes: AtomicUsize,
    failing_lookups: DashSet<CustomerId>,
    zero_row_invoices: DashSet<InvoiceId>,
    /// 1-based page fetch that fails, 0 for none
    failing_page: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_lookup_for(&self, customer_id: CustomerId) {
        self.failing_lookups.insert(customer_id);
    }

    pub fn zero_rows_for(&self, invoice_id: InvoiceId) {
        self.zero_row_invoices.insert(invoice_id);
    }

    pub fn fail_page(&self, fetch: usize) {
        self.failing_page.store(fetch, Ordering::SeqCst);
    }

    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    pub fn pending_lookups(&self) -> usize {
        self.pending_lookups.load(Ordering::SeqCst)
    }

    pub fn paid_writes(&self) -> usize {
        self.paid_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CustomerStore for CountingStore {
    async fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>, StorageError> {
        self.inner.fetch_customer(id).await
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, StorageError> {
        self.inner.fetch_customers().await
    }

    async fn fetch_customers_page(
        &self,
        after: CustomerId,
        limit: usize,
    ) -> Result<Vec<Customer>, StorageError> {
        let fetch = self.page_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if fetch == self.failing_page.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("customer page".to_string()));
        }
        self.inner.fetch_customers_page(after, limit).await
    }
}

#[async_trait]
impl InvoiceStore for CountingStore {
    async fn fetch_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError> {
        self.inner.fetch_invoice(id).await
    }

    async fn fetch_invoices(&self) -> Result<Vec<Invoice>, StorageError> {
        self.inner.fetch_invoices().await
    }

    async fn fetch_invoices_by_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, StorageError> {
        self.inner.fetch_invoices_by_status(status).await
    }

    async fn fetch_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, StorageError> {
        self.inner.fetch_invoices_by_customer_id(customer_id).await
    }

    async fn fetch_pending_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, StorageError> {
        self.pending_lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing_lookups.contains(&customer_id) {
            return Err(StorageError::Unavailable("invoice lookup".to_string()));
        }
        self.inner
            .fetch_pending_invoices_by_customer_id(customer_id)
            .await
    }

    async fn update_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<u64, StorageError> {
        if status == InvoiceStatus::Paid {
            self.paid_writes.fetch_add(1, Ordering::SeqCst);
        }
        if self.zero_row_invoices.contains(&id) {
            return Ok(0);
        }
        self.inner.update_invoice_status(id, status).await
    }
}

/// Provider that holds every charge until the gate is opened
pub struct GatedPaymentProvider<P> {
    inner: P,
    gate: Semaphore,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl<P: PaymentProvider> GatedPaymentProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Let every waiting and future charge through
    pub fn open(&self) {
        self.gate.close();
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Wait until `n` charges are blocked at the gate
    pub async fn wait_for_blocked(&self, n: usize) {
        for _ in 0..200 {
            if self.in_flight() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} blocked charges, saw {}", self.in_flight());
    }
}

#[async_trait]
impl<P: PaymentProvider> PaymentProvider for GatedPaymentProvider<P> {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, PaymentError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        // Closed semaphore means the gate is open
        let _ = self.gate.acquire().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.charge(invoice).await
    }
}

/// Create one customer per entry with `invoices` pending invoices each
pub fn seed(store: &ConcurrentBillingStore, customers: &[(Currency, usize)]) -> Vec<Customer> {
    customers
        .iter()
        .map(|&(currency, invoices)| {
            let customer = store.create_customer(currency);
            for _ in 0..invoices {
                store.create_invoice(customer.id, money("10.00", currency), InvoiceStatus::Pending);
            }
            customer
        })
        .collect()
}

pub fn money(value: &str, currency: Currency) -> Money {
    Money::parse(value, currency).expect("valid test amount")
}

pub fn network_error() -> PaymentError {
    PaymentError::Network("connection reset".to_string())
}

/// Config with instant retries, for fast tests
pub fn fast_config() -> BillingConfig {
    BillingConfig::new().with_retry_backoff(Duration::ZERO, Duration::ZERO)
}

pub type Orchestrator<S, P> = BillingOrchestrator<S, P, RecordingEventSink>;

pub fn orchestrator<S, P>(
    store: Arc<S>,
    provider: Arc<P>,
    config: &BillingConfig,
) -> (Orchestrator<S, P>, Arc<RecordingEventSink>)
where
    S: BillingStore + 'static,
    P: PaymentProvider + 'static,
{
    let events = Arc::new(RecordingEventSink::new());
    let orchestrator = BillingOrchestrator::from_shared(store, provider, events.clone(), config);
    (orchestrator, events)
}
