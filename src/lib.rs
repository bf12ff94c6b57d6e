pub mod core;
pub mod error;
pub mod financial;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod taxonomy;
pub mod utils;
pub mod xbrl;

// Re-exports
pub use error::{ConfigurationError, DocumentParseError, FilingError, FilingRejected};
pub use financial::FinancialRecord;
pub use pipeline::{process_batch, process_filing, FilingOutcome};
pub use taxonomy::Taxonomy;
