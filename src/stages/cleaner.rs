use crate::config::StagePrompt;
use crate::error::ProviderError;
use crate::parser::record::value_as_text;
use crate::parser::FeedbackRecord;
use crate::provider::{ModelInvoker, Turn};
use futures::stream::{self, StreamExt};
use tracing::debug;

/// Removes references to the correct answer from feedback text
pub struct CleanerStage<'a> {
    invoker: &'a dyn ModelInvoker,
    prompt: &'a StagePrompt,
    concurrency: usize,
}

impl<'a> CleanerStage<'a> {
    pub fn new(invoker: &'a dyn ModelInvoker, prompt: &'a StagePrompt, concurrency: usize) -> Self {
        Self {
            invoker,
            prompt,
            concurrency,
        }
    }

    /// Clean a single feedback text with one unstructured call
    pub async fn clean(&self, feedback: &str) -> Result<String, ProviderError> {
        let turn = Turn::user(format!(
            "Here is the feedback that you need to potentially refine \
             as per the given instructions:\n{}\n",
            feedback
        ));
        self.invoker
            .invoke(
                &self.prompt.model,
                &self.prompt.instructions,
                std::slice::from_ref(&turn),
                false,
            )
            .await
    }

    /// Scrub every field of `record` except `reserved` ones.
    ///
    /// Reserved fields are dropped; `grade` is then written back under
    /// `grade_key` unscrubbed. Field order of the input is preserved.
    pub async fn scrub(
        &self,
        record: &FeedbackRecord,
        reserved: &[&str],
        grade_key: &str,
        grade: &str,
    ) -> Result<FeedbackRecord, ProviderError> {
        let fields: Vec<(String, String)> = record
            .iter()
            .filter(|(key, _)| !reserved.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value_as_text(value)))
            .collect();
        debug!("Scrubbing {} feedback fields", fields.len());

        let cleaned: Vec<Result<(String, String), ProviderError>> = stream::iter(fields)
            .map(|(key, text)| async move {
                let cleaned = self.clean(&text).await?;
                Ok::<_, ProviderError>((key, cleaned))
            })
            .buffered(self.concurrency.max(1))
            .collect()
            .await;

        let mut scrubbed = FeedbackRecord::new();
        for entry in cleaned {
            let (key, text) = entry?;
            scrubbed.insert(key, text);
        }
        scrubbed.insert(grade_key, grade);
        Ok(scrubbed)
    }
}
