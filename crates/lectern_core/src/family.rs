//! Provider families.

use serde::{Deserialize, Serialize};

/// Wire protocol family a model is served through.
///
/// Chosen per model by explicit catalog lookup, never by sniffing the
/// model name.
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
pub enum ProviderFamily {
    /// OpenAI chat completions
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
    /// Anthropic messages
    #[serde(rename = "anthropic")]
    #[strum(serialize = "anthropic")]
    Anthropic,
    /// Google Gemini generateContent
    #[serde(rename = "gemini")]
    #[strum(serialize = "gemini")]
    Gemini,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn names_round_trip_through_config_spelling() {
        assert_eq!(ProviderFamily::OpenAi.to_string(), "openai");
        assert_eq!(
            ProviderFamily::from_str("anthropic").ok(),
            Some(ProviderFamily::Anthropic)
        );
        assert!(ProviderFamily::from_str("mistral").is_err());
    }
}
