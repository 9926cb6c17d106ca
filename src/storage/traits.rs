use std::sync::Arc;

use async_trait::async_trait;

use super::error::StorageError;
use crate::domain::{Customer, CustomerId, Invoice, InvoiceId, InvoiceStatus};

/// Read access to customers
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Look up a single customer
    async fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>, StorageError>;

    /// All customers, ascending by id
    async fn fetch_customers(&self) -> Result<Vec<Customer>, StorageError>;

    /// Up to `limit` customers with id strictly greater than `after`, ascending by id
    async fn fetch_customers_page(
        &self,
        after: CustomerId,
        limit: usize,
    ) -> Result<Vec<Customer>, StorageError>;
}

/// Invoice lookups and the single status transition the billing run performs
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn fetch_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError>;

    async fn fetch_invoices(&self) -> Result<Vec<Invoice>, StorageError>;

    async fn fetch_invoices_by_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, StorageError>;

    async fn fetch_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, StorageError>;

    /// Pending invoices of one customer, ascending by id
    async fn fetch_pending_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, StorageError>;

    /// Set the status of an invoice, returning the number of rows affected
    async fn update_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<u64, StorageError>;
}

/// Everything the billing run needs from persistence
pub trait BillingStore: CustomerStore + InvoiceStore {}

impl<T: CustomerStore + InvoiceStore + ?Sized> BillingStore for T {}

// Shared handles delegate to the inner store
#[async_trait]
impl<T: CustomerStore + ?Sized> CustomerStore for Arc<T> {
    async fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>, StorageError> {
        (**self).fetch_customer(id).await
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, StorageError> {
        (**self).fetch_customers().await
    }

    async fn fetch_customers_page(
        &self,
        after: CustomerId,
        limit: usize,
    ) -> Result<Vec<Customer>, StorageError> {
        (**self).fetch_customers_page(after, limit).await
    }
}

#[async_trait]
impl<T: InvoiceStore + ?Sized> InvoiceStore for Arc<T> {
    async fn fetch_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError> {
        (**self).fetch_invoice(id).await
    }

    async fn fetch_invoices(&self) -> Result<Vec<Invoice>, StorageError> {
        (**self).fetch_invoices().await
    }

    async fn fetch_invoices_by_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, StorageError> {
        (**self).fetch_invoices_by_status(status).await
    }

    async fn fetch_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, StorageError> {
        (**self).fetch_invoices_by_customer_id(customer_id).await
    }

    async fn fetch_pending_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, StorageError> {
        (**self).fetch_pending_invoices_by_customer_id(customer_id).await
    }

    async fn update_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<u64, StorageError> {
        (**self).update_invoice_status(id, status).await
    }
}
