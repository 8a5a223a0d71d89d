// Transaction Report - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod config;
pub mod parser;
pub mod report;

#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod error;

// Re-export commonly used types
pub use config::{CategoryMatching, MatchingArgs, ServerConfig};
pub use parser::{
    parse_transactions, validate_row, Category, CategoryMatcher, CsvParser, LogRejections,
    ParsedBatch, RejectionObserver, TransactionRecord, ValidationError,
};
pub use report::{process_upload, AggregateReport, IngestSummary, ReportStore};

#[cfg(feature = "server")]
pub use api::{router, AppState, UploadResponse};
#[cfg(feature = "server")]
pub use error::{ApiError, ErrorResponse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
