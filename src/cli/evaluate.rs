use crate::cli::EvaluateArgs;
use crate::config::Config;
use crate::output::{write_report, EvaluationReport};
use crate::pipeline::{FeedbackPipeline, PipelineSettings};
use crate::problem::Problem;
use crate::provider::create_invoker;
use anyhow::Context;
use tracing::info;
use uuid::Uuid;

pub async fn execute(args: EvaluateArgs) -> anyhow::Result<()> {
    // Load and validate config
    info!("Loading config from {:?}", args.config);
    let mut config = Config::load(&args.config)?;

    // Apply CLI overrides
    if let Some(reruns) = args.reruns {
        config.reruns = reruns;
    }
    if args.no_quality {
        config.quality_stage_enabled = false;
    }
    if args.keep_hints {
        config.hint_free_feedback = false;
    }
    config.validate()?;

    let prompts = config.load_prompts()?;
    let problem = Problem::load(&args.problem)?;
    let candidate = match (&args.solution, &args.solution_text) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read solution file {}", path.display()))?,
        (None, Some(text)) => text.clone(),
        (None, None) => anyhow::bail!("either --solution or --solution-text is required"),
    };

    let invoker = create_invoker(&config)?;
    info!("Using provider: {}", invoker.name());
    let pipeline = FeedbackPipeline::new(invoker, prompts, PipelineSettings::from(&config));

    let evaluation_id = Uuid::new_v4();
    info!(
        "Evaluating with {} votes per stage (quality stage {})",
        config.reruns,
        if config.quality_stage_enabled { "on" } else { "off" }
    );
    let record = pipeline
        .evaluate_with_id(evaluation_id, &problem, &candidate)
        .await?;

    println!("{}", serde_json::to_string_pretty(&record)?);

    if let Some(report_dir) = args.report_dir {
        let report = EvaluationReport::new(evaluation_id, record);
        let path = write_report(&report_dir, &report)?;
        info!("Wrote report: {}", path.display());
    }

    Ok(())
}
