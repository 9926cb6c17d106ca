pub mod admin;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use admin::{AdminResponse, AdminService};
pub use cli::{CliApp, init_tracing};
pub use error::AppError;
