//! Feedback orchestrator.
//!
//! One evaluation runs strictly in order:
//!
//! ```text
//! SANITY -> FAIL | ERROR                      (terminal)
//!        -> PASS -> REFINE -> VALIDITY (+ QUALITY) -> MERGE -> DONE
//! ```
//!
//! Only transport failures abort an evaluation. Disagreement between model
//! runs always ends in a well-formed record, at worst graded `"-"`.

mod merge;

pub use merge::{apply_downgrades, combine, fallback};

use crate::config::{Config, PromptSet};
use crate::error::PipelineError;
use crate::parser::record::{QUALITY_GRADE, QUALITY_RESERVED, VALIDITY_GRADE, VALIDITY_RESERVED};
use crate::parser::FeedbackRecord;
use crate::problem::Problem;
use crate::provider::ModelInvoker;
use crate::stages::{
    CleanerStage, GradedFeedback, QualityStage, RefinerStage, SanityStage, SanityVerdict,
    ValidityStage,
};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Read-only knobs of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub reruns: usize,
    pub vote_concurrency: usize,
    pub quality_stage_enabled: bool,
    pub hint_free_feedback: bool,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            reruns: config.reruns,
            vote_concurrency: config.vote_concurrency,
            quality_stage_enabled: config.quality_stage_enabled,
            hint_free_feedback: config.hint_free_feedback,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            reruns: 5,
            vote_concurrency: 5,
            quality_stage_enabled: true,
            hint_free_feedback: true,
        }
    }
}

pub struct FeedbackPipeline {
    invoker: Arc<dyn ModelInvoker>,
    prompts: PromptSet,
    settings: PipelineSettings,
}

impl FeedbackPipeline {
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        prompts: PromptSet,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            invoker,
            prompts,
            settings,
        }
    }

    /// Grade `candidate` against `problem` and return the feedback record
    #[allow(dead_code)]
    pub async fn evaluate(
        &self,
        problem: &Problem,
        candidate: &str,
    ) -> Result<FeedbackRecord, PipelineError> {
        self.evaluate_with_id(Uuid::new_v4(), problem, candidate).await
    }

    pub async fn evaluate_with_id(
        &self,
        evaluation_id: Uuid,
        problem: &Problem,
        candidate: &str,
    ) -> Result<FeedbackRecord, PipelineError> {
        let span = tracing::info_span!("evaluate", %evaluation_id);
        async {
            let start = std::time::Instant::now();
            let record = self.run(problem, candidate).await?;
            info!(
                "Evaluation finished with overall grade {} in {:.1}s",
                record.overall_grade().unwrap_or("-"),
                start.elapsed().as_secs_f64()
            );
            Ok::<_, PipelineError>(record)
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        problem: &Problem,
        candidate: &str,
    ) -> Result<FeedbackRecord, PipelineError> {
        let invoker = self.invoker.as_ref();
        let settings = &self.settings;

        let verdict = SanityStage::new(invoker, &self.prompts.sanity, settings.vote_concurrency)
            .run_voted(problem, candidate, settings.reruns)
            .await?;

        let sanity_confidence = match &verdict {
            SanityVerdict::Pass { confidence } => *confidence,
            SanityVerdict::Fail { .. } | SanityVerdict::Undecided { .. } => {
                info!("Sanity gate ended the evaluation");
                return Ok(verdict.terminal_record().unwrap_or_default());
            }
        };

        let refined = RefinerStage::new(invoker, &self.prompts.refiner)
            .refine(problem, candidate)
            .await?;

        let validity =
            ValidityStage::new(invoker, &self.prompts.validity, settings.vote_concurrency)
                .run_voted(problem, candidate, &refined, settings.reruns, sanity_confidence)
                .await?;

        let quality = if settings.quality_stage_enabled {
            Some(
                QualityStage::new(invoker, &self.prompts.quality, settings.vote_concurrency)
                    .run_voted(problem, candidate, settings.reruns)
                    .await?,
            )
        } else {
            None
        };

        self.finish(validity, quality).await
    }

    /// Downgrade, scrub and merge the voted feedback
    async fn finish(
        &self,
        validity: GradedFeedback,
        quality: Option<GradedFeedback>,
    ) -> Result<FeedbackRecord, PipelineError> {
        let mut validity = validity.record;
        let mut quality = quality.map(|q| q.record);

        let voted = match apply_downgrades(&mut validity, quality.as_mut()) {
            Ok(voted) => voted,
            Err(e) => {
                warn!("Could not resolve grades, returning fallback record: {}", e);
                return Ok(fallback(validity, quality));
            }
        };
        debug!(
            "Voted grades: validity {}, quality {}",
            voted.validity,
            voted.quality.as_deref().unwrap_or("-")
        );

        let cleaner = CleanerStage::new(
            self.invoker.as_ref(),
            &self.prompts.cleaner,
            self.settings.vote_concurrency,
        );

        // Validity graded A as voted is never scrubbed, even after a downgrade
        let final_validity = if self.settings.hint_free_feedback && voted.validity != "A" {
            let grade = validity.get_str(VALIDITY_GRADE).unwrap_or("-").to_string();
            cleaner
                .scrub(&validity, VALIDITY_RESERVED, VALIDITY_GRADE, &grade)
                .await?
        } else {
            validity
        };

        // Quality feedback is scrubbed whatever its grade
        let final_quality = match quality {
            Some(quality) => {
                let grade = quality.get_str(QUALITY_GRADE).unwrap_or("-").to_string();
                Some(
                    cleaner
                        .scrub(&quality, QUALITY_RESERVED, QUALITY_GRADE, &grade)
                        .await?,
                )
            }
            None => None,
        };

        Ok(combine(final_validity, final_quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::parser::record::{
        OVERALL_GRADE, SANITY_CONFIDENCE, SANITY_STATUS, VALIDITY_CONFIDENCE,
    };
    use crate::stages::testing::{prompt_set, ScriptedInvoker};
    use serde_json::json;

    const PASS: &str = r#"{"Sanity_Status": "Pass", "Chain_of_Thought": "ok"}"#;
    const FAIL: &str = concat!(
        r#"{"Sanity_Status": "Fail", "Sanity_Status_Justification": "blank", "#,
        r#""Chain_of_Thought": "no work"}"#,
    );

    fn validity(grade: &str) -> String {
        format!(
            r#"{{"Answer_Status": "x", "Validity_Grade": "{}", "Validity_Feedback": "it is 4"}}"#,
            grade
        )
    }

    fn quality(grade: &str) -> String {
        format!(
            r#"{{"Quality_Grade": "{}", "Quality_Feedback": "tidy"}}"#,
            grade
        )
    }

    fn problem() -> Problem {
        Problem {
            statement: "Compute 2+2.".into(),
            solutions: "4".into(),
            ..Default::default()
        }
    }

    fn pipeline(invoker: Arc<ScriptedInvoker>, settings: PipelineSettings) -> FeedbackPipeline {
        FeedbackPipeline::new(invoker, prompt_set(), settings)
    }

    fn sequential() -> PipelineSettings {
        PipelineSettings {
            vote_concurrency: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sanity_fail_short_circuits() {
        let invoker = Arc::new(
            ScriptedInvoker::new().with_responses("sanity", [FAIL, FAIL, FAIL, PASS, PASS]),
        );
        let record = pipeline(invoker.clone(), sequential())
            .evaluate(&problem(), "")
            .await
            .unwrap();

        assert_eq!(record.overall_grade(), Some("FF"));
        assert_eq!(record.get_str(SANITY_STATUS), Some("Fail"));
        assert_eq!(record.get_str(SANITY_CONFIDENCE), Some("56%"));
        assert_eq!(invoker.calls("refiner"), 0);
        assert_eq!(invoker.calls("validity"), 0);
    }

    #[tokio::test]
    async fn test_sanity_undecided_short_circuits() {
        let invoker = Arc::new(
            ScriptedInvoker::new().with_responses("sanity", [PASS, FAIL, PASS, FAIL, "??"]),
        );
        let record = pipeline(invoker.clone(), sequential())
            .evaluate(&problem(), "4")
            .await
            .unwrap();

        assert_eq!(record.overall_grade(), Some("-"));
        assert_eq!(record.get_str(SANITY_STATUS), Some("Error"));
        assert_eq!(invoker.calls("refiner"), 0);
    }

    #[tokio::test]
    async fn test_full_run_merges_validity_and_quality() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_fallback("sanity", PASS)
                .with_responses("refiner", ["2 + 2 = 4"])
                .with_fallback("validity", validity("B"))
                .with_fallback("quality", quality("A"))
                .with_fallback("cleaner", "clean"),
        );
        let record = pipeline(invoker.clone(), PipelineSettings::default())
            .evaluate(&problem(), "4")
            .await
            .unwrap();

        assert_eq!(record.overall_grade(), Some("BA"));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "Validity_Feedback": "clean",
                "Confidence_In_Validify_Feedback": "clean",
                "Validity_Grade": "B",
                "Quality_Feedback": "clean",
                "Confidence_In_Quality_Feedback": "clean",
                "Quality_Grade": "A",
                "Overall_Grade": "BA"
            })
        );
        assert_eq!(invoker.calls("sanity"), 5);
        assert_eq!(invoker.calls("refiner"), 1);
        assert_eq!(invoker.calls("validity"), 5);
        assert_eq!(invoker.calls("quality"), 5);
        // 2 validity fields + 2 quality fields
        assert_eq!(invoker.calls("cleaner"), 4);
        assert!(invoker.recorded("validity")[0].turns[0]
            .content
            .contains("2 + 2 = 4"));
    }

    #[tokio::test]
    async fn test_grade_a_validity_is_not_scrubbed_but_quality_is() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_fallback("sanity", PASS)
                .with_responses("refiner", ["4"])
                .with_fallback("validity", validity("A"))
                .with_fallback("quality", quality("A"))
                .with_fallback("cleaner", "clean"),
        );
        let record = pipeline(invoker.clone(), PipelineSettings::default())
            .evaluate(&problem(), "4")
            .await
            .unwrap();

        assert_eq!(record.overall_grade(), Some("AA"));
        assert_eq!(record.get_str("Answer_Status"), Some("x"));
        assert_eq!(record.get_str("Validity_Feedback"), Some("it is 4"));
        assert_eq!(record.get_str(VALIDITY_CONFIDENCE), Some("95%"));
        assert_eq!(record.get_str("Quality_Feedback"), Some("clean"));
        assert_eq!(invoker.calls("cleaner"), 2);
    }

    #[tokio::test]
    async fn test_hint_scrubbing_can_be_disabled() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_fallback("sanity", PASS)
                .with_responses("refiner", ["4"])
                .with_fallback("validity", validity("E"))
                .with_fallback("quality", quality("B"))
                .with_fallback("cleaner", "clean"),
        );
        let settings = PipelineSettings {
            hint_free_feedback: false,
            ..Default::default()
        };
        let record = pipeline(invoker.clone(), settings)
            .evaluate(&problem(), "5")
            .await
            .unwrap();

        assert_eq!(record.overall_grade(), Some("EB"));
        assert_eq!(record.get_str("Validity_Feedback"), Some("it is 4"));
        // quality is still scrubbed
        assert_eq!(invoker.calls("cleaner"), 2);
    }

    #[tokio::test]
    async fn test_low_confidence_a_downgraded_and_not_scrubbed() {
        // sanity 5/5 -> 0.95, validity 3/5 -> 0.57 (56%)
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_fallback("sanity", PASS)
                .with_responses("refiner", ["4"])
                .with_responses(
                    "validity",
                    [validity("A"), validity("A"), validity("A"), validity("B"), validity("E")],
                )
                .with_fallback("quality", quality("B"))
                .with_fallback("cleaner", "clean"),
        );
        let record = pipeline(invoker.clone(), sequential())
            .evaluate(&problem(), "4")
            .await
            .unwrap();

        assert_eq!(record.get_str(VALIDITY_GRADE), Some("B"));
        assert_eq!(record.get_str("Validity_Feedback"), Some("it is 4"));
        assert_eq!(record.overall_grade(), Some("BB"));
    }

    #[tokio::test]
    async fn test_all_malformed_validity_falls_back() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_fallback("sanity", PASS)
                .with_responses("refiner", ["4"])
                .with_fallback("validity", "Grade A")
                .with_fallback("quality", quality("A"))
                .with_fallback("cleaner", "clean"),
        );
        let record = pipeline(invoker.clone(), PipelineSettings::default())
            .evaluate(&problem(), "4")
            .await
            .unwrap();

        assert_eq!(record.overall_grade(), Some("-"));
        assert_eq!(record.get_str(VALIDITY_GRADE), Some("-"));
        assert_eq!(record.get_str(QUALITY_GRADE), Some("-"));
        assert_eq!(record.get_str("Validity_Raw_Response"), Some("Grade A"));
        // fallback records are not scrubbed
        assert_eq!(record.get_str("Quality_Feedback"), Some("tidy"));
        assert_eq!(invoker.calls("cleaner"), 0);
    }

    #[tokio::test]
    async fn test_validity_without_majority_falls_back() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_fallback("sanity", PASS)
                .with_responses("refiner", ["4"])
                .with_responses(
                    "validity",
                    [validity("A"), validity("B"), validity("E"), validity("F"), validity("A")],
                )
                .with_fallback("quality", quality("A")),
        );
        let record = pipeline(invoker.clone(), sequential())
            .evaluate(&problem(), "4")
            .await
            .unwrap();

        assert_eq!(record.overall_grade(), Some("-"));
        assert_eq!(
            record.get("Model_Validity_Grades"),
            Some(&json!(["A", "B", "E", "F", "A"]))
        );
    }

    #[tokio::test]
    async fn test_validity_only_variant() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_fallback("sanity", PASS)
                .with_responses("refiner", ["4"])
                .with_fallback("validity", validity("F"))
                .with_fallback("cleaner", "clean"),
        );
        let settings = PipelineSettings {
            quality_stage_enabled: false,
            ..Default::default()
        };
        let record = pipeline(invoker.clone(), settings)
            .evaluate(&problem(), "5")
            .await
            .unwrap();

        assert_eq!(record.overall_grade(), Some("F"));
        assert_eq!(invoker.calls("quality"), 0);
        assert!(!record.contains_key(QUALITY_GRADE));
        assert_eq!(record.keys().last().map(String::as_str), Some(OVERALL_GRADE));
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_evaluation() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .with_fallback("sanity", PASS)
                .with_failure("refiner"),
        );
        let err = pipeline(invoker, PipelineSettings::default())
            .evaluate(&problem(), "4")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Provider(ProviderError::Status { status: 503, .. })
        ));
    }
}
