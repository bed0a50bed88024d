//! Content readiness services

pub mod content_strategy;
pub mod coverage_evaluator;
pub mod coverage_reporter;
pub mod gap_filler;
pub mod paginated_fetcher;
pub mod threshold_policy;

pub use content_strategy::{ItemContentStrategy, PlaceholderContent};
pub use coverage_evaluator::evaluate_cell;
pub use coverage_reporter::CoverageReporter;
pub use gap_filler::{GapFillReport, GapFiller, GapFillerConfig};
pub use paginated_fetcher::{fetch_all_pages, FetchOptions};
