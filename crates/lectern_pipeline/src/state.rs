//! Pipeline state machine.

use serde::{Deserialize, Serialize};

/// Where a pipeline is. Stage states follow the fixed stage order;
/// `Complete` and `Error` are terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineState {
    /// Created, no stage entered
    #[default]
    Init,
    /// Inferring domain and grade band
    DomainInference,
    /// Writing learning objectives
    LearningObjectives,
    /// Outlining the workbook
    Outline,
    /// Planning each section
    SectionPlan,
    /// Drafting section bodies
    SectionDraft,
    /// Writing exercises
    Exercises,
    /// Describing visuals
    Visuals,
    /// Reviewing the draft
    Review,
    /// Assembling the workbook document
    Assembly,
    /// Handing the document to the sink
    Export,
    /// Every stage succeeded
    Complete,
    /// A stage failed
    Error,
}

/// Stage name to the state entered while it runs.
const STAGE_STATES: &[(&str, PipelineState)] = &[
    ("domain_inference", PipelineState::DomainInference),
    ("learning_objectives", PipelineState::LearningObjectives),
    ("outline", PipelineState::Outline),
    ("section_plan", PipelineState::SectionPlan),
    ("section_draft", PipelineState::SectionDraft),
    ("exercises", PipelineState::Exercises),
    ("visuals", PipelineState::Visuals),
    ("review", PipelineState::Review),
    ("assembly", PipelineState::Assembly),
    ("export", PipelineState::Export),
];

impl PipelineState {
    /// State for a stage name. Unknown names map to `Init`.
    pub fn for_stage(name: &str) -> Self {
        STAGE_STATES
            .iter()
            .find(|(stage, _)| *stage == name)
            .map(|(_, state)| *state)
            .unwrap_or(PipelineState::Init)
    }

    /// Whether no further stage will run without a resume.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Complete | PipelineState::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_stage_state_is_named_after_its_stage() {
        for state in PipelineState::iter() {
            if matches!(
                state,
                PipelineState::Init | PipelineState::Complete | PipelineState::Error
            ) {
                continue;
            }
            assert_eq!(PipelineState::for_stage(state.as_ref()), state);
        }
    }

    #[test]
    fn unknown_stage_maps_to_init() {
        assert_eq!(PipelineState::for_stage("translate"), PipelineState::Init);
        assert_eq!(PipelineState::for_stage("complete"), PipelineState::Init);
    }
}
