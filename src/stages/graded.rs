use super::{run_vote_round, VoteTally};
use crate::config::StagePrompt;
use crate::error::ProviderError;
use crate::parser::{FeedbackRecord, StageOutcome};
use crate::provider::ModelInvoker;
use crate::vote::Confidence;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const NO_AGREEMENT_MESSAGE: &str = "The model could not agree on the final grade.";

/// Field names one graded stage reads and writes
#[derive(Debug, Clone, Copy)]
pub struct GradeKeys {
    pub label: &'static str,
    pub grade: &'static str,
    pub feedback: &'static str,
    pub confidence: &'static str,
    pub grades: &'static str,
    pub raw: &'static str,
}

/// Voted feedback of a graded stage, before any downgrade or scrubbing
#[derive(Debug, Clone, PartialEq)]
pub struct GradedFeedback {
    pub record: FeedbackRecord,
    pub votes: Vec<String>,
    /// Confidence after the vote; `None` when there was no majority
    pub confidence: Option<Confidence>,
}

/// Shared voting machinery behind the validity and quality stages
pub(super) struct GradedStage<'a> {
    pub invoker: &'a dyn ModelInvoker,
    pub prompt: &'a StagePrompt,
    pub concurrency: usize,
    pub keys: GradeKeys,
}

impl GradedStage<'_> {
    pub async fn run_voted(
        &self,
        user_prompt: &str,
        reruns: usize,
        start: Confidence,
    ) -> Result<GradedFeedback, ProviderError> {
        let outcomes =
            run_vote_round(self.invoker, self.prompt, user_prompt, reruns, self.concurrency)
                .await?;
        let tally = VoteTally::new(outcomes, self.keys.grade);
        debug!("{} votes: {:?}", self.keys.label, tally.votes);

        let Some((majority, (grade, outcome))) = tally.majority.zip(tally.winner()) else {
            warn!("No majority {} grade among {:?}", self.keys.label, tally.votes);
            let votes: Vec<Value> = tally.votes.iter().cloned().map(Value::String).collect();
            let record = FeedbackRecord::new()
                .with(self.keys.grade, "-")
                .with(self.keys.feedback, NO_AGREEMENT_MESSAGE)
                .with(self.keys.grades, votes);
            return Ok(GradedFeedback {
                record,
                votes: tally.votes.clone(),
                confidence: None,
            });
        };

        let confidence = start.decay(majority.count, reruns);
        info!(
            "{} grade {} by {}/{} votes, confidence {}",
            self.keys.label, grade, majority.count, reruns, confidence
        );

        let record = match outcome {
            StageOutcome::Structured(record) => record
                .clone()
                .with(self.keys.confidence, confidence.to_string()),
            // The malformed sentinel won; keep the text but carry no grade
            StageOutcome::Malformed(raw) => FeedbackRecord::new().with(self.keys.raw, raw.as_str()),
        };

        Ok(GradedFeedback {
            record,
            votes: tally.votes.clone(),
            confidence: Some(confidence),
        })
    }
}
