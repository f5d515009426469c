//! The ten workbook stages.

use super::StageServices;
use crate::{GenerationContext, Stage};
use async_trait::async_trait;
use lectern_error::PipelineError;
use lectern_interface::DocumentSink;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds a stage's prompt parameters from the context.
type ParamsFn = fn(&GenerationContext) -> Result<Value, PipelineError>;

/// Inferred grade band, falling back to the requested grade level.
fn grade_band(context: &GenerationContext) -> Value {
    context
        .state
        .get("grade_band")
        .cloned()
        .unwrap_or_else(|| json!(context.input.grade_level()))
}

/// Array under `key` in `value`, or `value` itself when it is an array.
fn list<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value.get(key).and_then(Value::as_array).or_else(|| value.as_array())
}

/// A stage that prompts once and stores the reply as one artifact.
pub struct PromptStage {
    name: &'static str,
    description: &'static str,
    artifact: &'static str,
    params: ParamsFn,
    services: StageServices,
}

impl PromptStage {
    /// Stage `name` storing its reply under `artifact`.
    pub fn new(
        name: &'static str,
        description: &'static str,
        artifact: &'static str,
        params: ParamsFn,
        services: StageServices,
    ) -> Self {
        Self {
            name,
            description,
            artifact,
            params,
            services,
        }
    }
}

#[async_trait]
impl Stage for PromptStage {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    #[instrument(skip(self, context), fields(stage = self.name))]
    async fn execute(&self, mut context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        let params = (self.params)(&context)?;
        let reply = self.services.ask(self.name, &params, &context.config).await?;
        context.artifacts.insert(self.artifact, reply)?;
        Ok(context)
    }
}

/// Infers the academic domain and grade band.
pub struct DomainInferenceStage {
    services: StageServices,
}

impl DomainInferenceStage {
    /// New stage.
    pub fn new(services: StageServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for DomainInferenceStage {
    fn name(&self) -> &str {
        "domain_inference"
    }

    fn description(&self) -> &str {
        "Infer the academic domain and grade band"
    }

    #[instrument(skip_all, fields(stage = "domain_inference"))]
    async fn execute(&self, mut context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        let input = &context.input;
        let params = json!({
            "subject": input.subject(),
            "topic": input.topic(),
            "grade_level": input.grade_level(),
            "difficulty": input.difficulty().to_string(),
        });
        let reply = self.services.ask(self.name(), &params, &context.config).await?;

        let domain = reply
            .get("domain")
            .cloned()
            .unwrap_or_else(|| json!(context.input.subject()));
        let band = reply
            .get("grade_band")
            .cloned()
            .unwrap_or_else(|| json!(context.input.grade_level()));
        context.state.insert("domain".to_string(), domain);
        context.state.insert("grade_band".to_string(), band);
        context.artifacts.insert("domain", reply)?;
        Ok(context)
    }
}

fn objectives_params(context: &GenerationContext) -> Result<Value, PipelineError> {
    Ok(json!({
        "topic": context.input.topic(),
        "domain": context.require_state("domain")?,
        "grade_band": grade_band(context),
    }))
}

fn outline_params(context: &GenerationContext) -> Result<Value, PipelineError> {
    Ok(json!({
        "topic": context.input.topic(),
        "section_count": context.input.section_count(),
        "objectives": context.artifacts.require("learning_objectives")?,
    }))
}

fn section_plan_params(context: &GenerationContext) -> Result<Value, PipelineError> {
    Ok(json!({
        "outline": context.artifacts.require("outline")?,
        "section_count": context.input.section_count(),
        "grade_band": grade_band(context),
    }))
}

fn exercises_params(context: &GenerationContext) -> Result<Value, PipelineError> {
    Ok(json!({
        "sections": context.artifacts.require("sections")?,
        "objectives": context.artifacts.require("learning_objectives")?,
        "difficulty": context.input.difficulty().to_string(),
    }))
}

fn review_params(context: &GenerationContext) -> Result<Value, PipelineError> {
    Ok(json!({
        "grade_band": grade_band(context),
        "sections": context.artifacts.require("sections")?,
        "exercises": context.artifacts.require("exercises")?,
    }))
}

/// Drafts one body per planned section, in order.
pub struct SectionDraftStage {
    services: StageServices,
}

impl SectionDraftStage {
    /// New stage.
    pub fn new(services: StageServices) -> Self {
        Self { services }
    }

    /// Exactly `section_count` plans: the planned ones first, then
    /// outline entries, then numbered placeholders.
    fn plans(context: &GenerationContext) -> Result<Vec<Value>, PipelineError> {
        let count = *context.input.section_count() as usize;
        let planned = list(context.artifacts.require("section_plan")?, "plans");
        let outlined = context
            .artifacts
            .get("outline")
            .and_then(|outline| list(outline, "sections"));

        let mut plans: Vec<Value> = planned.or(outlined).cloned().unwrap_or_default();
        plans.truncate(count);
        for index in plans.len()..count {
            plans.push(json!({ "title": format!("Section {}", index + 1) }));
        }
        Ok(plans)
    }
}

#[async_trait]
impl Stage for SectionDraftStage {
    fn name(&self) -> &str {
        "section_draft"
    }

    fn description(&self) -> &str {
        "Draft the body of every planned section"
    }

    #[instrument(skip_all, fields(stage = "section_draft"))]
    async fn execute(&self, mut context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        let plans = Self::plans(&context)?;
        let mut sections = Vec::with_capacity(plans.len());
        for (index, plan) in plans.into_iter().enumerate() {
            let params = json!({
                "topic": context.input.topic(),
                "grade_band": grade_band(&context),
                "index": index + 1,
                "plan": plan,
            });
            let draft = self.services.ask(self.name(), &params, &context.config).await?;
            debug!(section = index + 1, "Section drafted");
            sections.push(draft);
        }
        context.artifacts.insert("sections", Value::Array(sections))?;
        Ok(context)
    }
}

/// Describes illustrations when the request asks for visuals.
pub struct VisualsStage {
    services: StageServices,
}

impl VisualsStage {
    /// New stage.
    pub fn new(services: StageServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for VisualsStage {
    fn name(&self) -> &str {
        "visuals"
    }

    fn description(&self) -> &str {
        "Describe illustrations for the workbook"
    }

    #[instrument(skip_all, fields(stage = "visuals"))]
    async fn execute(&self, mut context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        if !*context.input.include_visuals() {
            context.artifacts.insert("visuals", json!([]))?;
            return Ok(context);
        }
        let titles: Vec<Value> = context
            .artifacts
            .require("sections")?
            .as_array()
            .map(|sections| {
                sections
                    .iter()
                    .map(|s| s.get("title").cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .unwrap_or_default();
        let params = json!({ "topic": context.input.topic(), "sections": titles });
        let reply = self.services.ask(self.name(), &params, &context.config).await?;
        let visuals = list(&reply, "visuals").cloned().unwrap_or_else(|| vec![reply]);
        context.artifacts.insert("visuals", Value::Array(visuals))?;
        Ok(context)
    }
}

/// Assembles the workbook document from earlier artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyStage;

#[async_trait]
impl Stage for AssemblyStage {
    fn name(&self) -> &str {
        "assembly"
    }

    fn description(&self) -> &str {
        "Assemble the workbook document"
    }

    async fn execute(&self, mut context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        let input = &context.input;
        let title = input
            .title()
            .clone()
            .unwrap_or_else(|| format!("{}: {} Workbook", input.topic(), input.subject()));
        let artifacts = &context.artifacts;
        let workbook = json!({
            "title": title,
            "subject": input.subject(),
            "topic": input.topic(),
            "grade_level": input.grade_level(),
            "difficulty": input.difficulty().to_string(),
            "domain": context.state.get("domain").cloned().unwrap_or(Value::Null),
            "objectives": artifacts.require("learning_objectives")?,
            "outline": artifacts.require("outline")?,
            "sections": artifacts.require("sections")?,
            "exercises": artifacts.require("exercises")?,
            "visuals": artifacts.require("visuals")?,
            "review": artifacts.require("review")?,
        });
        context.artifacts.insert("workbook", workbook)?;
        Ok(context)
    }
}

/// Hands the assembled workbook to a document sink.
pub struct ExportStage {
    sink: Arc<dyn DocumentSink>,
}

impl ExportStage {
    /// Stage exporting to `sink`.
    pub fn new(sink: Arc<dyn DocumentSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Stage for ExportStage {
    fn name(&self) -> &str {
        "export"
    }

    fn description(&self) -> &str {
        "Export the workbook document"
    }

    #[instrument(skip_all, fields(stage = "export"))]
    async fn execute(&self, mut context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        let location = self.sink.export(context.artifacts.require("workbook")?).await?;
        debug!(%location, "Workbook exported");
        context.artifacts.insert("export", json!({ "location": location }))?;
        Ok(context)
    }
}

/// The fixed workbook stage sequence.
pub fn workbook_stages(services: StageServices, sink: Arc<dyn DocumentSink>) -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(DomainInferenceStage::new(services.clone())),
        Arc::new(PromptStage::new(
            "learning_objectives",
            "Write measurable learning objectives",
            "learning_objectives",
            objectives_params,
            services.clone(),
        )),
        Arc::new(PromptStage::new(
            "outline",
            "Outline the workbook sections",
            "outline",
            outline_params,
            services.clone(),
        )),
        Arc::new(PromptStage::new(
            "section_plan",
            "Plan key points for each section",
            "section_plan",
            section_plan_params,
            services.clone(),
        )),
        Arc::new(SectionDraftStage::new(services.clone())),
        Arc::new(PromptStage::new(
            "exercises",
            "Write practice exercises with answers",
            "exercises",
            exercises_params,
            services.clone(),
        )),
        Arc::new(VisualsStage::new(services.clone())),
        Arc::new(PromptStage::new(
            "review",
            "Review the draft for accuracy and age appropriateness",
            "review",
            review_params,
            services,
        )),
        Arc::new(AssemblyStage),
        Arc::new(ExportStage::new(sink)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenerationConfig;
    use lectern_core::WorkbookRequest;

    fn context(section_count: u32) -> GenerationContext {
        let input = WorkbookRequest::builder()
            .subject("Science")
            .topic("Photosynthesis")
            .grade_level("5")
            .section_count(section_count)
            .build()
            .unwrap();
        GenerationContext::new(input, GenerationConfig::new("a", "b"))
    }

    #[test]
    fn plans_are_padded_to_section_count() {
        let mut context = context(3);
        context
            .artifacts
            .insert("section_plan", json!({"plans": [{"title": "Light"}]}))
            .unwrap();
        let plans = SectionDraftStage::plans(&context).unwrap();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0]["title"], "Light");
        assert_eq!(plans[2]["title"], "Section 3");
    }

    #[test]
    fn plans_fall_back_to_outline_and_truncate() {
        let mut context = context(1);
        context
            .artifacts
            .insert("outline", json!({"sections": [{"title": "Leaves"}, {"title": "Roots"}]}))
            .unwrap();
        context.artifacts.insert("section_plan", json!({"text": "n/a"})).unwrap();
        let plans = SectionDraftStage::plans(&context).unwrap();
        assert_eq!(plans, vec![json!({"title": "Leaves"})]);
    }

    #[test]
    fn missing_state_fails_params() {
        let err = objectives_params(&context(1)).unwrap_err();
        assert_eq!(
            err.kind,
            lectern_error::PipelineErrorKind::MissingState("domain".into())
        );
    }
}
