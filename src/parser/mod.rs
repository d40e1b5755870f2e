mod outcome;
pub mod record;

pub use outcome::{parse_outcome, StageOutcome};
#[cfg(test)]
pub use outcome::MALFORMED_VOTE;
pub use record::FeedbackRecord;
