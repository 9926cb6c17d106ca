pub mod csv_reader;
pub mod csv_writer;
pub mod error;
pub mod parse;
pub mod seed;

// Re-export commonly used types
pub use csv_reader::{CsvRecordStream, CustomerCsvStream, InvoiceCsvStream};
pub use csv_writer::{INVOICE_SNAPSHOT_HEADER, write_invoice_snapshot};
pub use error::IoError;
pub use parse::{CsvRecord, RawCustomerRecord, RawInvoiceRecord};
pub use seed::{SeedReport, load_store, seed_store};
