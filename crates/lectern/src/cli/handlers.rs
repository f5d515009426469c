//! Command handlers.

use super::OutputFormat;
use lectern::{
    ContentType, Difficulty, JsonError, JsonFileSink, Lectern, LecternResult, WorkbookRequest,
    WorksheetGenerationResult, WorksheetLength, WorksheetRequest,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;

/// Parameters of the `workbook` command.
#[derive(Debug)]
pub struct WorkbookArgs {
    pub subject: String,
    pub topic: String,
    pub grade: String,
    pub title: Option<String>,
    pub sections: u32,
    pub difficulty: Difficulty,
    pub visuals: bool,
    pub out: PathBuf,
}

/// Run the workbook pipeline and print its summary.
///
/// Returns whether the pipeline completed.
pub async fn run_workbook(
    lectern: &Lectern,
    args: WorkbookArgs,
    format: OutputFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
    let request = WorkbookRequest::builder()
        .subject(args.subject)
        .topic(args.topic)
        .grade_level(args.grade)
        .title(args.title)
        .section_count(args.sections)
        .difficulty(args.difficulty)
        .include_visuals(args.visuals)
        .build()?;

    let sink = Arc::new(JsonFileSink::new(args.out));
    let pipeline = lectern.generate_workbook(request, sink).await?;
    let summary = pipeline.summary();

    match format {
        OutputFormat::Json => println!("{}", to_json("pipeline summary", &summary)?),
        OutputFormat::Human => {
            println!("Pipeline {}", summary.id);
            println!(
                "  state: {} (step {}/{})",
                summary.state, summary.current_step_index, summary.total_steps
            );
            if let Some(stage) = &summary.failed_stage {
                println!("  failed stage: {}", stage);
            }
            if let Some(error) = &summary.error {
                println!("  error: {}", error);
            }
            println!("  artifacts: {}", summary.artifacts.join(", "));
            if let Some(location) = pipeline
                .context()
                .artifacts
                .get("export")
                .and_then(|export| export.get("location"))
                .and_then(|location| location.as_str())
            {
                println!("  written to: {}", location);
            }
            println!("  elapsed: {} ms", summary.elapsed_ms);
        }
    }
    Ok(pipeline.is_complete())
}

/// Parameters of the `worksheet` command.
#[derive(Debug)]
pub struct WorksheetArgs {
    pub subject: String,
    pub topic: String,
    pub grade: String,
    pub types: Vec<ContentType>,
    pub difficulty: Difficulty,
    pub length: WorksheetLength,
    pub visuals: bool,
}

/// Generate a worksheet and print it.
///
/// Returns whether every content type succeeded.
pub async fn run_worksheet(
    lectern: &Lectern,
    args: WorksheetArgs,
    format: OutputFormat,
) -> LecternResult<bool> {
    let request = WorksheetRequest::new(args.subject, args.topic, args.grade)
        .with_content_types(args.types)
        .with_difficulty(args.difficulty)
        .with_length(args.length)
        .with_visuals(args.visuals);

    let result = lectern.generate_worksheet(&request).await?;
    match format {
        OutputFormat::Json => println!("{}", to_json("worksheet result", &result)?),
        OutputFormat::Human => print_worksheet(&result),
    }
    Ok(!result.is_degraded())
}

fn to_json<T: Serialize>(document: &str, value: &T) -> Result<String, JsonError> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(document, e.to_string()))
}

fn print_worksheet(result: &WorksheetGenerationResult) {
    println!("Worksheet {}", result.request_id);
    for section in &result.content {
        println!(
            "  [{}] from {} (quality {:.2}{})",
            section.content_type,
            section.source_provider,
            section.quality_score,
            if section.safety_compliant { "" } else { ", flagged" }
        );
        for visual in &section.visuals {
            println!("    visual: {} {}", visual.caption, visual.description);
        }
    }
    let metrics = &result.quality_metrics;
    println!(
        "  quality {:.2}, coherence {:.2}, safe {}",
        metrics.quality_score, metrics.coherence, metrics.safety_compliance
    );
    for warning in &result.warnings {
        println!("  warning: {}", warning);
    }
    if let Some(error) = result.aggregate_error() {
        println!("  error: {}", error.kind);
    }
}

/// Print cached health of every service.
pub async fn show_health(lectern: &Lectern, format: OutputFormat) -> bool {
    let services = lectern.health().await;
    let now = Instant::now();
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = services
                .iter()
                .map(|health| {
                    json!({
                        "name": health.name(),
                        "healthy": health.healthy(),
                        "message": health.message(),
                        "age_secs": health.age(now).as_secs(),
                    })
                })
                .collect();
            println!("{}", json!(entries));
        }
        OutputFormat::Human => {
            for health in &services {
                let status = if *health.healthy() { "ok" } else { "FAIL" };
                match health.message() {
                    Some(message) => println!("{:<24} {:<4} {}", health.name(), status, message),
                    None => println!("{:<24} {}", health.name(), status),
                }
            }
        }
    }
    services.iter().all(|health| *health.healthy())
}

/// Print the model catalog.
pub fn list_models(lectern: &Lectern) {
    let gateway = lectern.gateway();
    for record in gateway.catalog().models() {
        let pricing = record.pricing();
        println!(
            "{:<32} {:<10} in {:>8} out {:>6}  ${:.3}/${:.3} per M{}",
            record.id(),
            record.family().to_string(),
            record.max_input_tokens(),
            record.max_output_tokens(),
            pricing.input_per_million,
            pricing.output_per_million,
            if gateway.is_available(record.id()) { "" } else { "  (unavailable)" }
        );
    }
}
