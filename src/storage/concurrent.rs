use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StorageError;
use super::traits::{CustomerStore, InvoiceStore};
use crate::domain::{Currency, Customer, CustomerId, Invoice, InvoiceId, InvoiceStatus, Money};

/// Concurrent in-memory customer and invoice store using DashMap
pub struct ConcurrentBillingStore {
    customers: DashMap<CustomerId, Customer>,
    invoices: DashMap<InvoiceId, Invoice>,
    next_customer_id: AtomicU32,
    next_invoice_id: AtomicU32,
}

impl ConcurrentBillingStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            invoices: DashMap::new(),
            next_customer_id: AtomicU32::new(1),
            next_invoice_id: AtomicU32::new(1),
        }
    }

    /// Create a customer with the next free id
    pub fn create_customer(&self, currency: Currency) -> Customer {
        let id = self.next_customer_id.fetch_add(1, Ordering::SeqCst);
        let customer = Customer::new(id, currency);
        self.customers.insert(id, customer.clone());
        customer
    }

    /// Create an invoice with the next free id.
    ///
    /// The owning customer is not checked, mirroring a persistence layer
    /// without foreign keys; billing reports such orphans as not found.
    pub fn create_invoice(
        &self,
        customer_id: CustomerId,
        amount: Money,
        status: InvoiceStatus,
    ) -> Invoice {
        let id = self.next_invoice_id.fetch_add(1, Ordering::SeqCst);
        let invoice = Invoice::new(id, customer_id, amount, status);
        self.invoices.insert(id, invoice.clone());
        invoice
    }

    /// Insert a customer with an explicit id (seed data)
    pub fn insert_customer(&self, customer: Customer) {
        self.next_customer_id
            .fetch_max(customer.id.saturating_add(1), Ordering::SeqCst);
        self.customers.insert(customer.id, customer);
    }

    /// Insert an invoice with an explicit id (seed data)
    pub fn insert_invoice(&self, invoice: Invoice) {
        self.next_invoice_id
            .fetch_max(invoice.id.saturating_add(1), Ordering::SeqCst);
        self.invoices.insert(invoice.id, invoice);
    }

    // DashMap iteration order is arbitrary; callers expect ascending ids
    fn sorted_invoices<F>(&self, filter: F) -> Vec<Invoice>
    where
        F: Fn(&Invoice) -> bool,
    {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        invoices.sort_by_key(|invoice| invoice.id);
        invoices
    }
}

impl Default for ConcurrentBillingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerStore for ConcurrentBillingStore {
    async fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>, StorageError> {
        Ok(self.customers.get(&id).map(|r| r.value().clone()))
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, StorageError> {
        let mut customers: Vec<Customer> =
            self.customers.iter().map(|r| r.value().clone()).collect();
        customers.sort_by_key(|customer| customer.id);
        Ok(customers)
    }

    async fn fetch_customers_page(
        &self,
        after: CustomerId,
        limit: usize,
    ) -> Result<Vec<Customer>, StorageError> {
        let mut customers: Vec<Customer> = self
            .customers
            .iter()
            .filter(|r| *r.key() > after)
            .map(|r| r.value().clone())
            .collect();
        customers.sort_by_key(|customer| customer.id);
        customers.truncate(limit);
        Ok(customers)
    }
}

#[async_trait]
impl InvoiceStore for ConcurrentBillingStore {
    async fn fetch_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError> {
        Ok(self.invoices.get(&id).map(|r| r.value().clone()))
    }

    async fn fetch_invoices(&self) -> Result<Vec<Invoice>, StorageError> {
        Ok(self.sorted_invoices(|_| true))
    }

    async fn fetch_invoices_by_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, StorageError> {
        Ok(self.sorted_invoices(|invoice| invoice.status == status))
    }

    async fn fetch_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, StorageError> {
        Ok(self.sorted_invoices(|invoice| invoice.customer_id == customer_id))
    }

    async fn fetch_pending_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, StorageError> {
        Ok(self.sorted_invoices(|invoice| {
            invoice.customer_id == customer_id && invoice.is_pending()
        }))
    }

    async fn update_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<u64, StorageError> {
        match self.invoices.get_mut(&id) {
            Some(mut entry) => {
                entry.status = status;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
