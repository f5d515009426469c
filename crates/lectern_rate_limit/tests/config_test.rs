//! Loading and validating configuration.

use lectern_core::ProviderFamily;
use lectern_error::LecternErrorKind;
use lectern_rate_limit::{LecternConfig, RetryPolicy};
use std::io::Write;
use std::time::Duration;

const MINIMAL: &str = r#"
[providers.openai]
base_url = "https://api.openai.com/v1"
api_key_env = "LECTERN_TEST_OPENAI_KEY"

[models."gpt-4o-mini"]
family = "openai"
max_input_tokens = 128000
max_output_tokens = 16384
input_cost_per_million = 0.15
output_cost_per_million = 0.60

[pipeline]
primary_model = "gpt-4o-mini"
fallback_model = "gpt-4o-mini"
"#;

fn config_error(toml: &str) -> String {
    let err = LecternConfig::from_toml_str(toml).unwrap_err();
    match err.kind() {
        LecternErrorKind::Config(e) => e.message.clone(),
        other => panic!("expected config error, got {}", other),
    }
}

#[test]
fn test_minimal_config_fills_defaults() {
    let config = LecternConfig::from_toml_str(MINIMAL).unwrap();
    let openai = config.provider(ProviderFamily::OpenAi).unwrap();
    assert_eq!(openai.timeout_secs, 60);
    assert_eq!(openai.rate_limit.max_requests, 60);
    assert_eq!(openai.retry.max_retries, 3);
    assert_eq!(config.health.ttl_secs, 300);
    assert_eq!(config.pipeline.stage_delay_ms, 500);
    assert!(config.fallback.generic.is_empty());

    let policy = RetryPolicy::from_settings(&openai.retry);
    assert_eq!(policy.delay_for(0), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(4));
}

#[test]
fn test_zero_window_rejected() {
    let toml = format!(
        "{}\n[providers.openai.rate_limit]\nmax_requests = 5\nwindow_ms = 0\n",
        MINIMAL
    );
    assert!(config_error(&toml).contains("window_ms"));
}

#[test]
fn test_zero_quota_rejected() {
    let toml = format!(
        "{}\n[providers.openai.rate_limit]\nmax_requests = 0\nwindow_ms = 1000\n",
        MINIMAL
    );
    assert!(config_error(&toml).contains("max_requests"));
}

#[test]
fn test_unknown_family_rejected() {
    let toml = MINIMAL.replace("family = \"openai\"", "family = \"mistral\"");
    assert!(LecternConfig::from_toml_str(&toml).is_err());
}

#[test]
fn test_pipeline_model_must_be_cataloged() {
    let toml = MINIMAL.replace(
        "fallback_model = \"gpt-4o-mini\"",
        "fallback_model = \"gpt-5-ultra\"",
    );
    assert!(config_error(&toml).contains("gpt-5-ultra"));
}

#[test]
fn test_unknown_specialized_content_type_rejected() {
    let toml = format!("{}\n[fallback.specialized]\npoetry = \"generalist\"\n", MINIMAL);
    assert!(config_error(&toml).contains("poetry"));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();

    let config = LecternConfig::from_file(file.path()).unwrap();
    assert_eq!(config.pipeline.primary_model, "gpt-4o-mini");
}
