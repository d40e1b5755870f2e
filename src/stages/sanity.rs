use super::{run_vote_round, VoteTally};
use crate::config::StagePrompt;
use crate::error::ProviderError;
use crate::parser::record::{
    CHAIN_OF_THOUGHT, OVERALL_GRADE, SANITY_CHAIN_OF_THOUGHT, SANITY_CONFIDENCE,
    SANITY_JUSTIFICATION, SANITY_STATUS,
};
use crate::parser::FeedbackRecord;
use crate::problem::Problem;
use crate::provider::ModelInvoker;
use crate::vote::Confidence;
use serde_json::Value;
use tracing::{debug, info};

pub const UNDECIDED_MESSAGE: &str = "Most probably the model could not decide what to say";

/// Resolved outcome of the sanity gate
#[derive(Debug, Clone, PartialEq)]
pub enum SanityVerdict {
    /// Submission is worth grading; carries the confidence validity starts from
    Pass { confidence: Confidence },
    Fail {
        confidence: Confidence,
        justification: Option<Value>,
        chain_of_thought: Option<Value>,
    },
    /// No strict majority, or the majority was neither Pass nor Fail
    Undecided { votes: Vec<String> },
}

impl SanityVerdict {
    /// The record returned to the caller when this verdict ends the pipeline
    pub fn terminal_record(&self) -> Option<FeedbackRecord> {
        match self {
            SanityVerdict::Pass { .. } => None,
            SanityVerdict::Fail {
                confidence,
                justification,
                chain_of_thought,
            } => {
                let mut record = FeedbackRecord::new()
                    .with(OVERALL_GRADE, "FF")
                    .with(SANITY_STATUS, "Fail");
                if let Some(justification) = justification {
                    record.insert(SANITY_JUSTIFICATION, justification.clone());
                }
                if let Some(cot) = chain_of_thought {
                    record.insert(SANITY_CHAIN_OF_THOUGHT, cot.clone());
                }
                record.insert(SANITY_CONFIDENCE, confidence.to_string());
                Some(record)
            }
            SanityVerdict::Undecided { .. } => Some(
                FeedbackRecord::new()
                    .with(OVERALL_GRADE, "-")
                    .with(SANITY_STATUS, "Error")
                    .with(SANITY_JUSTIFICATION, UNDECIDED_MESSAGE),
            ),
        }
    }
}

pub struct SanityStage<'a> {
    invoker: &'a dyn ModelInvoker,
    prompt: &'a StagePrompt,
    concurrency: usize,
}

impl<'a> SanityStage<'a> {
    pub fn new(invoker: &'a dyn ModelInvoker, prompt: &'a StagePrompt, concurrency: usize) -> Self {
        Self {
            invoker,
            prompt,
            concurrency,
        }
    }

    fn build_prompt(&self, problem: &Problem, candidate: &str) -> String {
        format!(
            "# Problem statement:\n{}\n\
            # Correct solution(s):\n{}\n\
            # Input Solution to sanity-check:\n{}\n\n{}",
            problem.statement, problem.solutions, candidate, self.prompt.examples
        )
    }

    /// Run `reruns` sanity checks and resolve them by majority vote
    pub async fn run_voted(
        &self,
        problem: &Problem,
        candidate: &str,
        reruns: usize,
    ) -> Result<SanityVerdict, ProviderError> {
        let user_prompt = self.build_prompt(problem, candidate);
        let outcomes =
            run_vote_round(self.invoker, self.prompt, &user_prompt, reruns, self.concurrency)
                .await?;
        let tally = VoteTally::new(outcomes, SANITY_STATUS);
        debug!("Sanity votes: {:?}", tally.votes);

        let verdict = match (tally.majority, tally.winner()) {
            (Some(majority), Some((status, outcome))) if status == "Pass" || status == "Fail" => {
                let confidence = Confidence::INITIAL.decay(majority.count, reruns);
                if status == "Pass" {
                    SanityVerdict::Pass { confidence }
                } else {
                    let record = outcome.record();
                    SanityVerdict::Fail {
                        confidence,
                        justification: record.and_then(|r| r.get(SANITY_JUSTIFICATION)).cloned(),
                        chain_of_thought: record.and_then(|r| r.get(CHAIN_OF_THOUGHT)).cloned(),
                    }
                }
            }
            _ => SanityVerdict::Undecided {
                votes: tally.votes.clone(),
            },
        };

        info!("Sanity resolved: {}", verdict_label(&verdict));
        Ok(verdict)
    }
}

fn verdict_label(verdict: &SanityVerdict) -> String {
    match verdict {
        SanityVerdict::Pass { confidence } => format!("Pass ({})", confidence),
        SanityVerdict::Fail { confidence, .. } => format!("Fail ({})", confidence),
        SanityVerdict::Undecided { votes } => format!("undecided {:?}", votes),
    }
}
