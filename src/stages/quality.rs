use super::graded::{GradeKeys, GradedFeedback, GradedStage};
use crate::config::StagePrompt;
use crate::error::ProviderError;
use crate::parser::record::{
    QUALITY_CONFIDENCE, QUALITY_FEEDBACK, QUALITY_GRADE, QUALITY_GRADES, QUALITY_RAW,
};
use crate::problem::Problem;
use crate::provider::ModelInvoker;
use crate::vote::Confidence;

pub const QUALITY_KEYS: GradeKeys = GradeKeys {
    label: "quality",
    grade: QUALITY_GRADE,
    feedback: QUALITY_FEEDBACK,
    confidence: QUALITY_CONFIDENCE,
    grades: QUALITY_GRADES,
    raw: QUALITY_RAW,
};

/// Grades presentation quality of the candidate. Runs on its own confidence
/// track, independent of sanity.
pub struct QualityStage<'a> {
    inner: GradedStage<'a>,
}

impl<'a> QualityStage<'a> {
    pub fn new(invoker: &'a dyn ModelInvoker, prompt: &'a StagePrompt, concurrency: usize) -> Self {
        Self {
            inner: GradedStage {
                invoker,
                prompt,
                concurrency,
                keys: QUALITY_KEYS,
            },
        }
    }

    fn build_prompt(&self, problem: &Problem, candidate: &str) -> String {
        format!(
            "# Problem statement:\n{}\n\
            # Correct solution(s):\n{}\n\
            # Optional extra requirements for quality review:\n{}\n\
            # Input Solution to give feedback on:\n{}\n\n{}",
            problem.statement,
            problem.solutions,
            problem.quality_requirements(),
            candidate,
            self.inner.prompt.examples
        )
    }

    pub async fn run_voted(
        &self,
        problem: &Problem,
        candidate: &str,
        reruns: usize,
    ) -> Result<GradedFeedback, ProviderError> {
        let user_prompt = self.build_prompt(problem, candidate);
        self.inner
            .run_voted(&user_prompt, reruns, Confidence::INITIAL)
            .await
    }
}
