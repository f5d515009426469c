//! Configuration surface.
//!
//! Configuration is loaded once and never mutated. Sources, later ones
//! overriding earlier:
//! 1. Bundled defaults (include_str! from lectern.toml)
//! 2. User config in home directory (~/.config/lectern/lectern.toml)
//! 3. User config in current directory (./lectern.toml)

use lectern_core::{ContentType, ProviderFamily};
use lectern_error::{ConfigError, LecternError, LecternResult};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../lectern.toml");

/// Sliding-window quota for one provider.
///
/// ```toml
/// [providers.openai.rate_limit]
/// max_requests = 60
/// window_ms = 60_000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitSettings {
    /// Calls admitted per window
    pub max_requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_ms: 60_000,
        }
    }
}

/// Retry parameters for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay_ms: u64,
    /// Upper bound on any delay
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

/// Connection settings for one provider family.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// API root
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Admission quota
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// Retry parameters
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_timeout_secs() -> u64 {
    60
}

impl ProviderSettings {
    /// The API key from the environment, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Catalog entry for one model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelSettings {
    /// Provider family serving this model
    pub family: ProviderFamily,
    /// Context window
    pub max_input_tokens: u32,
    /// Output limit
    pub max_output_tokens: u32,
    /// USD per million input tokens
    pub input_cost_per_million: f64,
    /// USD per million output tokens
    pub output_cost_per_million: f64,
    /// Input size above which long-context pricing applies
    #[serde(default)]
    pub long_context_threshold: Option<u64>,
    /// Long-context price multiplier
    #[serde(default)]
    pub long_context_multiplier: Option<f64>,
}

/// Health cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthSettings {
    /// Seconds a health result stays fresh
    pub ttl_secs: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Workbook pipeline settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineSettings {
    /// Model tried first for every stage call
    pub primary_model: String,
    /// Model tried once when the primary fails
    pub fallback_model: String,
    /// Throttle between stages
    #[serde(default = "default_stage_delay_ms")]
    pub stage_delay_ms: u64,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output budget per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_stage_delay_ms() -> u64 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2_048
}

/// A named worksheet content provider backed by one model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContentProviderSettings {
    /// Model id from the catalog
    pub model: String,
    /// System instruction
    #[serde(default)]
    pub system_message: Option<String>,
    /// Scales the provider's quality scores
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,
}

fn default_quality_weight() -> f64 {
    1.0
}

/// Fallback chain configuration.
///
/// ```toml
/// [fallback]
/// generic = ["generalist", "backup"]
///
/// [fallback.specialized]
/// math_problems = "math-specialist"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct FallbackSettings {
    /// Generic providers tried after the specialized one, in order
    #[serde(default)]
    pub generic: Vec<String>,
    /// Content type (snake_case) to specialized provider
    #[serde(default)]
    pub specialized: BTreeMap<String, String>,
    /// Provider used for visual assets
    #[serde(default)]
    pub visuals: Option<String>,
}

impl FallbackSettings {
    /// Specialized provider for `content_type`, if configured.
    pub fn specialized_for(&self, content_type: ContentType) -> Option<&str> {
        self.specialized
            .get(content_type.as_ref())
            .map(String::as_str)
    }
}

/// Top-level Lectern configuration.
///
/// # Example
///
/// ```no_run
/// use lectern_rate_limit::LecternConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = LecternConfig::load()?;
/// println!("primary model: {}", config.pipeline.primary_model);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LecternConfig {
    /// Provider family name to connection settings
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
    /// Model id to catalog entry
    #[serde(default)]
    pub models: BTreeMap<String, ModelSettings>,
    /// Health cache settings
    #[serde(default)]
    pub health: HealthSettings,
    /// Pipeline settings
    pub pipeline: PipelineSettings,
    /// Named content providers
    #[serde(default)]
    pub content_providers: BTreeMap<String, ContentProviderSettings>,
    /// Fallback chains
    #[serde(default)]
    pub fallback: FallbackSettings,
}

impl LecternConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(toml: &str) -> LecternResult<Self> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    /// Load and validate a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> LecternResult<Self> {
        debug!("Loading configuration from file");
        Self::build(Config::builder().add_source(File::from(path.as_ref())))
    }

    /// Load with precedence: current dir > home dir > bundled defaults.
    #[instrument]
    pub fn load() -> LecternResult<Self> {
        Self::load_with_override(None::<&Path>)
    }

    /// Like [`LecternConfig::load`], with an explicit file layered on top.
    #[instrument(skip(path))]
    pub fn load_with_override(path: Option<impl AsRef<Path>>) -> LecternResult<Self> {
        debug!("Loading configuration with precedence: override > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/lectern/lectern.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("lectern").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        Self::build(builder)
    }

    /// The bundled defaults alone.
    pub fn bundled() -> LecternResult<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> LecternResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| {
                LecternError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                LecternError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Connection settings for a family.
    pub fn provider(&self, family: ProviderFamily) -> Option<&ProviderSettings> {
        self.providers.get(family.as_ref())
    }

    /// Reject configurations the runtime cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, provider) in &self.providers {
            if ProviderFamily::from_str(name).is_err() {
                return Err(ConfigError::new(format!(
                    "Unknown provider family '{}'",
                    name
                )));
            }
            if provider.rate_limit.max_requests == 0 {
                return Err(ConfigError::new(format!(
                    "providers.{}.rate_limit.max_requests must be positive",
                    name
                )));
            }
            if provider.rate_limit.window_ms == 0 {
                return Err(ConfigError::new(format!(
                    "providers.{}.rate_limit.window_ms must be positive",
                    name
                )));
            }
        }

        for (id, model) in &self.models {
            if self.provider(model.family).is_none() {
                return Err(ConfigError::new(format!(
                    "Model '{}' uses family '{}' which has no provider settings",
                    id, model.family
                )));
            }
        }

        for model in [&self.pipeline.primary_model, &self.pipeline.fallback_model] {
            if !self.models.contains_key(model) {
                return Err(ConfigError::new(format!(
                    "Pipeline model '{}' is not in the model catalog",
                    model
                )));
            }
        }

        for (name, provider) in &self.content_providers {
            if !self.models.contains_key(&provider.model) {
                return Err(ConfigError::new(format!(
                    "Content provider '{}' uses unknown model '{}'",
                    name, provider.model
                )));
            }
        }

        for key in self.fallback.specialized.keys() {
            if ContentType::from_str(key).is_err() {
                return Err(ConfigError::new(format!(
                    "fallback.specialized names unknown content type '{}'",
                    key
                )));
            }
        }

        Ok(())
    }
}
