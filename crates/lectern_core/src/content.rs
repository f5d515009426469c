//! Worksheet content vocabulary.

use serde::{Deserialize, Serialize};

/// Kind of worksheet section a provider chain is resolved for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentType {
    /// Practice problems with answers
    MathProblems,
    /// Reading passage with comprehension questions
    ReadingPassage,
    /// Vocabulary list with definitions
    Vocabulary,
    /// Multiple-choice or short-answer quiz
    Quiz,
    /// Concept explanation
    Explanation,
    /// Hands-on activity
    Activity,
}

/// Requested difficulty.
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
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Difficulty {
    /// Introductory
    Easy,
    /// Grade level
    #[default]
    Medium,
    /// Stretch
    Hard,
}

/// Requested worksheet length.
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
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorksheetLength {
    /// About one page
    Short,
    /// Two to three pages
    #[default]
    Medium,
    /// Four or more pages
    Long,
}

impl WorksheetLength {
    /// Number of items a section of this length should hold.
    pub fn item_count(&self) -> u32 {
        match self {
            WorksheetLength::Short => 5,
            WorksheetLength::Medium => 10,
            WorksheetLength::Long => 20,
        }
    }
}
