use super::graded::{GradeKeys, GradedFeedback, GradedStage};
use crate::config::StagePrompt;
use crate::error::ProviderError;
use crate::parser::record::{
    VALIDITY_CONFIDENCE, VALIDITY_FEEDBACK, VALIDITY_GRADE, VALIDITY_GRADES, VALIDITY_RAW,
};
use crate::problem::Problem;
use crate::provider::ModelInvoker;
use crate::vote::Confidence;

pub const VALIDITY_KEYS: GradeKeys = GradeKeys {
    label: "validity",
    grade: VALIDITY_GRADE,
    feedback: VALIDITY_FEEDBACK,
    confidence: VALIDITY_CONFIDENCE,
    grades: VALIDITY_GRADES,
    raw: VALIDITY_RAW,
};

/// Grades whether the candidate is correct, with the refined rewrite as
/// extra context
pub struct ValidityStage<'a> {
    inner: GradedStage<'a>,
}

impl<'a> ValidityStage<'a> {
    pub fn new(invoker: &'a dyn ModelInvoker, prompt: &'a StagePrompt, concurrency: usize) -> Self {
        Self {
            inner: GradedStage {
                invoker,
                prompt,
                concurrency,
                keys: VALIDITY_KEYS,
            },
        }
    }

    fn build_prompt(&self, problem: &Problem, candidate: &str, refined: &str) -> String {
        format!(
            "# Problem statement:\n{}\n\
            # Correct solution(s):\n{}\n\
            # Optional extra requirements for validation:\n{}\n\
            # Input Solution to give feedback on:\n{}\n\
            # Proofread, possibly clearer version of the Input Solution:\n{}\n\n{}",
            problem.statement,
            problem.solutions,
            problem.validity_requirements(),
            candidate,
            refined,
            self.inner.prompt.examples
        )
    }

    /// Vote on the validity grade. Confidence continues from `start`, which is
    /// the confidence the sanity stage ended with.
    pub async fn run_voted(
        &self,
        problem: &Problem,
        candidate: &str,
        refined: &str,
        reruns: usize,
        start: Confidence,
    ) -> Result<GradedFeedback, ProviderError> {
        let user_prompt = self.build_prompt(problem, candidate, refined);
        self.inner.run_voted(&user_prompt, reruns, start).await
    }
}
