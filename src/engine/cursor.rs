use tracing::warn;

use crate::domain::{Customer, CustomerId};
use crate::storage::{CustomerStore, StorageError};

/// Position of a keyset walk over customers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    /// Next page holds customers with id strictly greater than this
    After(CustomerId),
    /// An empty page was returned
    Exhausted,
}

impl PageCursor {
    pub const START: Self = Self::After(0);
}

/// Walks all customers in ascending id order, one page at a time.
///
/// The walk ends after the first empty page. A failed fetch leaves the cursor
/// where it was.
pub struct CustomerPageFetcher<S> {
    store: S,
    page_size: usize,
    cursor: PageCursor,
}

impl<S: CustomerStore> CustomerPageFetcher<S> {
    pub fn new(store: S, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            cursor: PageCursor::START,
        }
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn has_next(&self) -> bool {
        !matches!(self.cursor, PageCursor::Exhausted)
    }

    /// Fetch the next page and advance past its last customer
    pub async fn next_page(&mut self) -> Result<Vec<Customer>, StorageError> {
        let after = match self.cursor {
            PageCursor::After(id) => id,
            PageCursor::Exhausted => return Ok(Vec::new()),
        };

        let page = self.store.fetch_customers_page(after, self.page_size).await?;

        self.cursor = match page.last() {
            None => PageCursor::Exhausted,
            Some(last) if last.id > after => PageCursor::After(last.id),
            Some(last) => {
                // A store that hands back ids at or below the cursor would loop forever
                warn!(after, last_id = last.id, "Customer page did not advance, stopping walk");
                PageCursor::Exhausted
            }
        };

        Ok(page)
    }

    /// Rewind to the first page
    pub fn reset(&mut self) {
        self.cursor = PageCursor::START;
    }
}
