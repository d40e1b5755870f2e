//! Scripted in-memory model invoker for stage and pipeline tests.

use crate::config::{PromptSet, StagePrompt};
use crate::error::ProviderError;
use crate::provider::{ModelInvoker, Turn};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A recorded call
#[derive(Debug, Clone)]
pub struct Call {
    pub turns: Vec<Turn>,
    pub structured: bool,
}

#[derive(Default)]
struct Script {
    queue: VecDeque<String>,
    fallback: Option<String>,
    fail_when_empty: bool,
    calls: Vec<Call>,
}

/// Answers calls from per-stage queues. A stage is identified by its
/// instruction text, which `stage_prompt` sets to the stage name.
#[derive(Default)]
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<String, Script>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<I, S>(self, stage: &str, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.entry(stage.to_string()).or_default();
            script.queue.extend(responses.into_iter().map(Into::into));
        }
        self
    }

    /// Answer with `response` once the queue for `stage` is empty
    pub fn with_fallback(self, stage: &str, response: impl Into<String>) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap();
            scripts.entry(stage.to_string()).or_default().fallback = Some(response.into());
        }
        self
    }

    /// Fail with a 503 once the queue for `stage` is empty
    pub fn with_failure(self, stage: &str) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap();
            scripts.entry(stage.to_string()).or_default().fail_when_empty = true;
        }
        self
    }

    pub fn calls(&self, stage: &str) -> usize {
        self.recorded(stage).len()
    }

    pub fn recorded(&self, stage: &str) -> Vec<Call> {
        self.scripts
            .lock()
            .unwrap()
            .get(stage)
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    pub fn all_structured(&self, stage: &str) -> bool {
        self.recorded(stage).iter().all(|c| c.structured)
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn invoke(
        &self,
        _model: &str,
        instructions: &str,
        turns: &[Turn],
        structured: bool,
    ) -> Result<String, ProviderError> {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(instructions.to_string()).or_default();
        script.calls.push(Call {
            turns: turns.to_vec(),
            structured,
        });

        if let Some(next) = script.queue.pop_front() {
            return Ok(next);
        }
        if script.fail_when_empty {
            return Err(ProviderError::Status {
                status: 503,
                body: "overloaded".to_string(),
            });
        }
        Ok(script
            .fallback
            .clone()
            .unwrap_or_else(|| panic!("no scripted response left for stage '{}'", instructions)))
    }
}

/// Answers the i-th call after `step * (calls - i)`, so calls issued early
/// finish last. Replies come from `responses` by issue index, or echo the
/// last turn when no responses are given.
pub struct StaggeredInvoker {
    responses: Vec<String>,
    calls: usize,
    step: Duration,
    issued: AtomicUsize,
    finished: Mutex<Vec<usize>>,
}

impl StaggeredInvoker {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        let responses: Vec<String> = responses.into_iter().map(Into::into).collect();
        let calls = responses.len();
        Self::build(responses, calls)
    }

    pub fn echo(calls: usize) -> Self {
        Self::build(Vec::new(), calls)
    }

    fn build(responses: Vec<String>, calls: usize) -> Self {
        Self {
            responses,
            calls,
            step: Duration::from_millis(25),
            issued: AtomicUsize::new(0),
            finished: Mutex::new(Vec::new()),
        }
    }

    /// Issue indices in the order their calls completed
    pub fn finished(&self) -> Vec<usize> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelInvoker for StaggeredInvoker {
    fn name(&self) -> &'static str {
        "staggered"
    }

    async fn invoke(
        &self,
        _model: &str,
        _instructions: &str,
        turns: &[Turn],
        _structured: bool,
    ) -> Result<String, ProviderError> {
        let index = self.issued.fetch_add(1, Ordering::SeqCst);
        let remaining = self.calls.saturating_sub(index) as u32;
        tokio::time::sleep(self.step * remaining).await;
        self.finished.lock().unwrap().push(index);

        Ok(match self.responses.get(index) {
            Some(response) => response.clone(),
            None => format!("cleaned: {}", turns.last().map_or("", |t| t.content.as_str())),
        })
    }
}

pub fn stage_prompt(stage: &str) -> StagePrompt {
    StagePrompt {
        model: format!("model-{}", stage),
        instructions: stage.to_string(),
        examples: format!("<{} examples>", stage),
    }
}

pub fn prompt_set() -> PromptSet {
    PromptSet {
        sanity: stage_prompt("sanity"),
        refiner: stage_prompt("refiner"),
        validity: stage_prompt("validity"),
        quality: stage_prompt("quality"),
        cleaner: stage_prompt("cleaner"),
    }
}
