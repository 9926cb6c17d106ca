use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio_util::compat::TokioAsyncReadCompatExt;

use super::error::IoError;
use super::parse::CsvRecord;
use crate::domain::{Customer, Invoice};

/// Async stream of typed records from CSV input
pub struct CsvRecordStream<T> {
    inner: Pin<Box<dyn Stream<Item = Result<T, IoError>> + Send>>,
}

pub type CustomerCsvStream = CsvRecordStream<Customer>;
pub type InvoiceCsvStream = CsvRecordStream<Invoice>;

impl<T: CsvRecord> CsvRecordStream<T> {
    /// Create a new record stream from an async reader
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let csv_reader = AsyncReaderBuilder::new()
            .trim(csv_async::Trim::All)
            .flexible(true)
            .create_deserializer(reader);

        let stream = csv_reader
            .into_deserialize::<T::Raw>()
            .map(|result| result.map_err(IoError::from).and_then(T::from_raw));

        Self {
            inner: Box::pin(stream),
        }
    }

    /// Open a CSV file and stream its records
    ///
    /// # Example
    /// ```rust,ignore
    /// let customers = CustomerCsvStream::from_file("customers.csv").await?;
    /// ```
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file = File::open(path.as_ref()).await?;
        Ok(Self::new(file.compat()))
    }
}

impl<T> Stream for CsvRecordStream<T> {
    type Item = Result<T, IoError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
