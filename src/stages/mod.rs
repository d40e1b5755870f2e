//! Pipeline stages. Each stage wraps the model invoker, the response parser
//! and (for voting stages) the majority resolver behind one named operation.

mod cleaner;
mod graded;
mod quality;
mod refiner;
mod sanity;
mod validity;

#[cfg(test)]
pub(crate) mod testing;

pub use cleaner::CleanerStage;
pub use graded::GradedFeedback;
pub use quality::QualityStage;
pub use refiner::RefinerStage;
pub use sanity::{SanityStage, SanityVerdict};
pub use validity::ValidityStage;

use crate::config::StagePrompt;
use crate::error::ProviderError;
use crate::parser::{parse_outcome, StageOutcome};
use crate::provider::{ModelInvoker, Turn};
use crate::vote::{resolve_majority, Majority};
use futures::stream::{self, StreamExt};
use tracing::debug;

/// Outcomes of one vote round together with the votes they cast
#[derive(Debug, Clone)]
pub struct VoteTally {
    pub outcomes: Vec<StageOutcome>,
    pub votes: Vec<String>,
    pub majority: Option<Majority>,
}

impl VoteTally {
    pub fn new(outcomes: Vec<StageOutcome>, key: &str) -> Self {
        let votes: Vec<String> = outcomes.iter().map(|o| o.discriminant(key)).collect();
        let majority = resolve_majority(&votes);
        Self {
            outcomes,
            votes,
            majority,
        }
    }

    /// The winning vote value and the outcome that first cast it
    pub fn winner(&self) -> Option<(&str, &StageOutcome)> {
        self.majority
            .map(|m| (self.votes[m.index].as_str(), &self.outcomes[m.index]))
    }
}

/// Issue `reruns` identical structured calls and parse each response.
///
/// Up to `concurrency` calls are in flight at once; outcomes are returned in
/// issuance order regardless of completion order. Every issued call runs to
/// completion before the first transport error (if any) is returned.
pub async fn run_vote_round(
    invoker: &dyn ModelInvoker,
    prompt: &StagePrompt,
    user_prompt: &str,
    reruns: usize,
    concurrency: usize,
) -> Result<Vec<StageOutcome>, ProviderError> {
    let turns = [Turn::user(user_prompt)];

    let responses: Vec<Result<String, ProviderError>> = stream::iter(0..reruns)
        .map(|_| invoker.invoke(&prompt.model, &prompt.instructions, &turns, true))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let raw = responses.into_iter().collect::<Result<Vec<_>, _>>()?;
    debug!("Vote round on {} returned {} responses", prompt.model, raw.len());
    Ok(raw.iter().map(|r| parse_outcome(r)).collect())
}
