use crate::config::StagePrompt;
use crate::error::ProviderError;
use crate::problem::Problem;
use crate::provider::{ModelInvoker, Turn};
use tracing::{debug, info, warn};

/// First-pass output longer than this multiple of the input triggers a
/// corrective second call
pub const EXPANSION_LIMIT: f64 = 2.0;

/// Corrective output longer than this multiple of the input is discarded
pub const FALLBACK_LIMIT: f64 = 2.5;

const LENGTH_CORRECTION: &str = "\
The length of your output is more than twice the length of the Input Solution, \
which violates the instructions you need to follow.

Please go through the instructions and the original Input Solution again. In particular:
- The refined solution must NOT exceed twice the length of the original solution, \
but it must be at least as long as the original.
- Do NOT fill in gaps in the explanations or elaborate on any claims.
- Only improve readability, fix grammar and, for longer solutions, break them into clear steps.
- Do NOT fix the solution or correct the final answer. Keep any errors it has.

Now output (in Markdown) the refined version of the Input Solution, without any \
markers or the problem statement.";

/// Length of `output` relative to `input`, in characters
pub fn length_ratio(output: &str, input: &str) -> f64 {
    output.chars().count() as f64 / input.chars().count() as f64
}

/// Proofreads a candidate solution for use as extra context by the validity
/// stage. The rewrite is never graded on its own.
pub struct RefinerStage<'a> {
    invoker: &'a dyn ModelInvoker,
    prompt: &'a StagePrompt,
}

impl<'a> RefinerStage<'a> {
    pub fn new(invoker: &'a dyn ModelInvoker, prompt: &'a StagePrompt) -> Self {
        Self { invoker, prompt }
    }

    fn build_prompt(&self, problem: &Problem, candidate: &str) -> String {
        format!(
            "# Problem statement:\n{}\n\
            # Input Solution to proofread and refine:\n{}\n",
            problem.statement, candidate
        )
    }

    /// Refine `candidate`, with at most one corrective retry on length.
    ///
    /// - first pass within 2x: returned as-is
    /// - otherwise a second call in the same conversation asks for a shorter
    ///   rewrite; if that is still above 2.5x the original is returned verbatim
    pub async fn refine(
        &self,
        problem: &Problem,
        candidate: &str,
    ) -> Result<String, ProviderError> {
        let first_turn = Turn::user(self.build_prompt(problem, candidate));
        let first = self
            .invoker
            .invoke(
                &self.prompt.model,
                &self.prompt.instructions,
                std::slice::from_ref(&first_turn),
                false,
            )
            .await?;

        let ratio = length_ratio(&first, candidate);
        // an empty candidate with empty output gives NaN, which is accepted
        if ratio <= EXPANSION_LIMIT || ratio.is_nan() {
            debug!("Refined solution accepted on first pass (ratio {:.2})", ratio);
            return Ok(first);
        }

        info!(
            "Refined solution is {:.2}x the original, asking for a shorter rewrite",
            ratio
        );
        let turns = [
            first_turn,
            Turn::assistant(first),
            Turn::user(LENGTH_CORRECTION),
        ];
        let second = self
            .invoker
            .invoke(&self.prompt.model, &self.prompt.instructions, &turns, false)
            .await?;

        let ratio = length_ratio(&second, candidate);
        if ratio > FALLBACK_LIMIT {
            warn!(
                "Corrected refinement still {:.2}x the original, using the original solution",
                ratio
            );
            Ok(candidate.to_string())
        } else {
            Ok(second)
        }
    }
}
