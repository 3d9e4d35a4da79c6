mod matcher;
mod scan;

pub use matcher::{MatchOutcome, MatchingPipeline};
pub use scan::{CancelToken, ScanSummary, Scanner};
