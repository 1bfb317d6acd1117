use crate::cli::RunArgs;
use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use harness_core::{
    DailyContext, EpisodeRecord, EpisodeRunner, HarnessConfig, RecordWriter, RunSummary,
    TestEntry, ToolExecutor, create_engine, load_entries,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Handle the run command
pub async fn handle_run_command(mut config: HarnessConfig, args: &RunArgs) -> Result<()> {
    apply_overrides(&mut config, args);
    let model = config.agent.model.clone();

    let mut entries = load_entries(&args.dataset).await?;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    let engine = create_engine(&model, &config)
        .with_context(|| format!("failed to set up provider for {model}"))?;

    println!(
        "{} {} episodes with {} ({} concurrent, DailyContext {})",
        style("Evaluating").cyan().bold(),
        entries.len(),
        style(&model).bold(),
        config.agent.concurrency,
        args.daily_context
    );

    let future_ids = args.future_ids;
    let version = args.daily_context;
    let tools = move |_: &TestEntry| -> Box<dyn ToolExecutor> {
        let env = DailyContext::new().with_version(version);
        if future_ids {
            Box::new(env.with_future_ids())
        } else {
            Box::new(env)
        }
    };

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let started_at = Utc::now();
    let records = EpisodeRunner::new(config.agent.concurrency)
        .run_with_progress(engine.as_ref(), &entries, &tools, |record| {
            pb.set_message(record.id.clone());
            if let Some(line) = failure_line(record) {
                pb.println(line);
            }
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    let writer = RecordWriter::in_directory(&args.output_dir, &model, started_at);
    writer.append(&records)?;
    info!(path = %writer.path().display(), records = records.len(), "results written");

    print_summary(&RunSummary::from_records(&records));
    println!("Results: {}", style(writer.path().display()).underlined());
    Ok(())
}

fn apply_overrides(config: &mut HarnessConfig, args: &RunArgs) {
    if let Some(model) = &args.model {
        config.agent.model = model.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.agent.concurrency = concurrency;
    }
    if let Some(max_steps) = args.max_steps {
        config.agent.max_steps = max_steps;
    }
}

fn failure_line(record: &EpisodeRecord) -> Option<String> {
    record.failure().map(|failure| {
        format!(
            "{} {} [{}] round {}: {}",
            style("failed").red().bold(),
            record.id,
            failure.kind,
            failure.round,
            failure.message
        )
    })
}

fn print_summary(summary: &RunSummary) {
    println!("{}", style("Run summary").blue().bold());
    println!("  episodes:     {}", summary.episodes);
    println!(
        "  completed:    {} ({} hit the step limit)",
        style(summary.completed).green(),
        summary.step_limited
    );
    if summary.failed > 0 {
        println!("  failed:       {}", style(summary.failed).red());
    } else {
        println!("  failed:       0");
    }
    println!(
        "  tokens:       {} in / {} out",
        summary.input_tokens, summary.output_tokens
    );
    println!("  model time:   {} ms", summary.latency_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_core::DailyContextVersion;
    use std::path::PathBuf;

    fn run_args() -> RunArgs {
        RunArgs {
            dataset: PathBuf::from("data.jsonl"),
            model: None,
            output_dir: PathBuf::from("results"),
            concurrency: None,
            max_steps: None,
            limit: None,
            future_ids: false,
            daily_context: DailyContextVersion::V1,
        }
    }

    #[test]
    fn flags_override_config_file_values() {
        let mut config = HarnessConfig::default();
        let args = RunArgs {
            model: Some("gemini-2.5-pro-FC".into()),
            max_steps: Some(5),
            ..run_args()
        };
        apply_overrides(&mut config, &args);
        assert_eq!(config.agent.model, "gemini-2.5-pro-FC");
        assert_eq!(config.agent.max_steps, 5);
        assert_eq!(config.agent.concurrency, HarnessConfig::default().agent.concurrency);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let mut config = HarnessConfig::default();
        config.agent.model = "gemini-2.5-flash-FC".into();
        apply_overrides(&mut config, &run_args());
        assert_eq!(config.agent.model, "gemini-2.5-flash-FC");
    }
}
