//! Generation context threaded through the stages.

use derive_getters::Getters;
use lectern_core::{CompletionOptions, WorkbookRequest};
use lectern_error::{PipelineError, PipelineErrorKind};
use lectern_rate_limit::PipelineSettings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// JSON type name used in artifact conflict messages.
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Named stage outputs.
///
/// Names are only ever added. A name may be written again only with a
/// value of the same JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifacts(BTreeMap<String, Value>);

impl Artifacts {
    /// Store `value` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineErrorKind::ArtifactConflict`] when `name` already
    /// holds a value of a different JSON type.
    #[track_caller]
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Result<(), PipelineError> {
        let name = name.into();
        if let Some(existing) = self.0.get(&name) {
            let (existing, attempted) = (json_type(existing), json_type(&value));
            if existing != attempted {
                return Err(PipelineError::new(PipelineErrorKind::ArtifactConflict {
                    name,
                    existing: existing.to_string(),
                    attempted: attempted.to_string(),
                }));
            }
        }
        self.0.insert(name, value);
        Ok(())
    }

    /// Artifact by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Artifact by name, failing when no stage produced it.
    #[track_caller]
    pub fn require(&self, name: &str) -> Result<&Value, PipelineError> {
        self.0
            .get(name)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::MissingArtifact(name.to_string())))
    }

    /// Whether `name` has been produced.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Artifact names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Number of artifacts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been produced yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fail when `self` lost any artifact of `before` or changed its JSON
    /// type.
    #[track_caller]
    pub fn ensure_superset_of(&self, before: &Artifacts, stage: &str) -> Result<(), PipelineError> {
        for (name, previous) in &before.0 {
            let Some(current) = self.0.get(name) else {
                return Err(PipelineError::new(PipelineErrorKind::ArtifactRemoved {
                    stage: stage.to_string(),
                    name: name.clone(),
                }));
            };
            let (existing, attempted) = (json_type(previous), json_type(current));
            if existing != attempted {
                return Err(PipelineError::new(PipelineErrorKind::ArtifactConflict {
                    name: name.clone(),
                    existing: existing.to_string(),
                    attempted: attempted.to_string(),
                }));
            }
        }
        Ok(())
    }

    /// All artifacts as one JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

/// Model selection and budgets for stage calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct GenerationConfig {
    primary_model: String,
    fallback_model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GenerationConfig {
    /// Config calling `primary_model`, escalating to `fallback_model`.
    pub fn new(primary_model: impl Into<String>, fallback_model: impl Into<String>) -> Self {
        Self {
            primary_model: primary_model.into(),
            fallback_model: fallback_model.into(),
            temperature: 0.7,
            max_tokens: 2_048,
        }
    }

    /// Completion options for one stage call.
    pub fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            system_message: None,
        }
    }
}

impl From<&PipelineSettings> for GenerationConfig {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            primary_model: settings.primary_model.clone(),
            fallback_model: settings.fallback_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

/// Input, config, free-form state and artifacts of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationContext {
    /// Immutable request parameters
    pub input: WorkbookRequest,
    /// Model selection and budgets
    pub config: GenerationConfig,
    /// Signals between stages, such as the inferred domain
    pub state: Map<String, Value>,
    /// Produced outputs
    pub artifacts: Artifacts,
}

impl GenerationContext {
    /// Fresh context with empty state and no artifacts.
    pub fn new(input: WorkbookRequest, config: GenerationConfig) -> Self {
        Self {
            input,
            config,
            state: Map::new(),
            artifacts: Artifacts::default(),
        }
    }

    /// State entry by key, failing when no stage set it.
    #[track_caller]
    pub fn require_state(&self, key: &str) -> Result<&Value, PipelineError> {
        self.state
            .get(key)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::MissingState(key.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_type_overwrite_is_allowed() {
        let mut artifacts = Artifacts::default();
        artifacts.insert("outline", json!({"sections": []})).unwrap();
        artifacts.insert("outline", json!({"sections": [1]})).unwrap();
        assert_eq!(artifacts.get("outline"), Some(&json!({"sections": [1]})));
    }

    #[test]
    fn type_change_is_rejected() {
        let mut artifacts = Artifacts::default();
        artifacts.insert("outline", json!({})).unwrap();
        let err = artifacts.insert("outline", json!("text")).unwrap_err();
        assert_eq!(
            err.kind,
            PipelineErrorKind::ArtifactConflict {
                name: "outline".into(),
                existing: "object".into(),
                attempted: "string".into(),
            }
        );
        assert_eq!(artifacts.get("outline"), Some(&json!({})));
    }

    #[test]
    fn superset_check_names_dropped_artifact() {
        let mut before = Artifacts::default();
        before.insert("domain", json!({})).unwrap();
        before.insert("outline", json!({})).unwrap();
        let mut after = Artifacts::default();
        after.insert("domain", json!({})).unwrap();

        let err = after.ensure_superset_of(&before, "review").unwrap_err();
        assert_eq!(
            err.kind,
            PipelineErrorKind::ArtifactRemoved {
                stage: "review".into(),
                name: "outline".into(),
            }
        );
        assert!(before.ensure_superset_of(&after, "review").is_ok());
    }

    #[test]
    fn superset_check_rejects_retyped_artifact() {
        let mut before = Artifacts::default();
        before.insert("outline", json!({"sections": []})).unwrap();
        let after: Artifacts = serde_json::from_value(json!({"outline": "now a string"})).unwrap();

        let err = after.ensure_superset_of(&before, "section_plan").unwrap_err();
        assert_eq!(
            err.kind,
            PipelineErrorKind::ArtifactConflict {
                name: "outline".into(),
                existing: "object".into(),
                attempted: "string".into(),
            }
        );
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let err = Artifacts::default().require("workbook").unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::MissingArtifact("workbook".into()));
    }
}
