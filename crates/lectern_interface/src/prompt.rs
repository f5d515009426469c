//! Prompt construction seam.

use lectern_core::{ContentType, WorksheetRequest};

/// Maps structured parameters to prompt text. Implementations must be pure.
pub trait PromptBuilder: Send + Sync {
    /// Prompt for one worksheet section.
    fn content_prompt(&self, request: &WorksheetRequest, content_type: ContentType) -> String;

    /// Prompt asking for visual descriptions for a worksheet.
    fn visual_prompt(&self, request: &WorksheetRequest) -> String;

    /// Prompt for one pipeline stage given its JSON parameters.
    fn stage_prompt(&self, stage: &str, params: &serde_json::Value) -> String;
}

/// Strip a surrounding Markdown code fence, if any.
pub fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply as JSON, wrapping plain text as `{"text": ...}`.
pub fn parse_reply(text: &str) -> serde_json::Value {
    serde_json::from_str(strip_fence(text))
        .unwrap_or_else(|_| serde_json::json!({ "text": text.trim() }))
}

/// Plain-text prompt templates asking for JSON replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePromptBuilder;

impl TemplatePromptBuilder {
    fn stage_instruction(stage: &str) -> &'static str {
        match stage {
            "domain_inference" => {
                "Identify the academic domain and normalized grade band. Reply with JSON {\"domain\": string, \"grade_band\": string}."
            }
            "learning_objectives" => {
                "List measurable learning objectives. Reply with JSON {\"objectives\": [string]}."
            }
            "outline" => {
                "Outline the workbook. Reply with JSON {\"sections\": [{\"title\": string, \"summary\": string}]}."
            }
            "section_plan" => {
                "Plan each section's key points. Reply with JSON {\"plans\": [{\"title\": string, \"key_points\": [string]}]}."
            }
            "section_draft" => {
                "Write the section body. Reply with JSON {\"title\": string, \"body\": string}."
            }
            "exercises" => {
                "Write practice exercises with answers. Reply with JSON {\"exercises\": [{\"prompt\": string, \"answer\": string}]}."
            }
            "visuals" => {
                "Describe illustrations for the section. Reply with JSON {\"visuals\": [{\"caption\": string, \"description\": string}]}."
            }
            "review" => {
                "Review the draft for accuracy and age appropriateness. Reply with JSON {\"approved\": bool, \"notes\": [string]}."
            }
            _ => "Reply with JSON.",
        }
    }
}

impl PromptBuilder for TemplatePromptBuilder {
    fn content_prompt(&self, request: &WorksheetRequest, content_type: ContentType) -> String {
        format!(
            "Create {} content for a grade {} {} worksheet on \"{}\".\nDifficulty: {}. Include {} items.\nReply with JSON.",
            content_type,
            request.grade_level(),
            request.subject(),
            request.topic(),
            request.difficulty(),
            request.length().item_count(),
        )
    }

    fn visual_prompt(&self, request: &WorksheetRequest) -> String {
        format!(
            "Suggest illustrations for a grade {} {} worksheet on \"{}\". Reply with JSON {{\"visuals\": [{{\"caption\": string, \"description\": string}}]}}.",
            request.grade_level(),
            request.subject(),
            request.topic(),
        )
    }

    fn stage_prompt(&self, stage: &str, params: &serde_json::Value) -> String {
        let params = serde_json::to_string_pretty(params).unwrap_or_else(|_| params.to_string());
        format!(
            "{}\n\nParameters:\n{}",
            Self::stage_instruction(stage),
            params
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_replies_parse() {
        assert_eq!(strip_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(parse_reply("```json\n{\"a\": 1}\n```"), json!({"a": 1}));
        assert_eq!(parse_reply(" Just words. "), json!({"text": "Just words."}));
    }

    #[test]
    fn content_prompt_mentions_request() {
        let request = WorksheetRequest::new("Math", "Fractions", "4");
        let prompt = TemplatePromptBuilder.content_prompt(&request, ContentType::MathProblems);
        assert!(prompt.contains("math_problems"));
        assert!(prompt.contains("Fractions"));
        assert!(prompt.contains("10 items"));
    }

    #[test]
    fn stage_prompt_is_deterministic() {
        let params = json!({"topic": "Volcanoes"});
        let a = TemplatePromptBuilder.stage_prompt("outline", &params);
        let b = TemplatePromptBuilder.stage_prompt("outline", &params);
        assert_eq!(a, b);
        assert!(a.contains("Volcanoes"));
        assert!(a.starts_with("Outline the workbook"));
    }
}
