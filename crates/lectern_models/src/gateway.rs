//! Completion gateway: one call shape over every provider family.

use crate::{AnthropicAdapter, GeminiAdapter, LlmMetrics, ModelCatalog, OpenAiAdapter};
use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use lectern_core::{
    CompletionOptions, CompletionRequest, CompletionResponse, ModelRecord, ProviderFamily,
};
use lectern_error::{ConfigError, ProviderError, ProviderErrorKind};
use lectern_interface::{CompletionAdapter, HealthProbe};
use lectern_rate_limit::{Clock, LecternConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Dispatches normalized completion calls to family adapters.
///
/// The adapter is chosen by looking the model up in the [`ModelCatalog`].
/// Requested output budgets are clamped to the model's limit before
/// dispatch.
///
/// # Example
///
/// ```rust,ignore
/// let gateway = CompletionGateway::from_config(&config, Arc::new(TokioClock))?;
/// let response = gateway
///     .complete_with_fallback("Outline photosynthesis", "gpt-4o-mini", "claude-3-5-haiku-20241022", &options)
///     .await?;
/// ```
#[derive(Clone)]
pub struct CompletionGateway {
    catalog: Arc<ModelCatalog>,
    adapters: HashMap<ProviderFamily, Arc<dyn CompletionAdapter>>,
}

impl std::fmt::Debug for CompletionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionGateway")
            .field("catalog", &self.catalog)
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CompletionGateway {
    /// Gateway with no adapters registered.
    pub fn new(catalog: Arc<ModelCatalog>) -> Self {
        Self {
            catalog,
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter for its family, replacing any previous one.
    pub fn with_adapter(mut self, adapter: Arc<dyn CompletionAdapter>) -> Self {
        self.adapters.insert(adapter.family(), adapter);
        self
    }

    /// Gateway with one adapter per configured provider family.
    pub fn from_config(config: &LecternConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let mut gateway = Self::new(Arc::new(ModelCatalog::from_config(config)));
        if let Some(settings) = config.provider(ProviderFamily::OpenAi) {
            gateway = gateway.with_adapter(Arc::new(OpenAiAdapter::from_settings(settings, clock.clone())?));
        }
        if let Some(settings) = config.provider(ProviderFamily::Anthropic) {
            gateway = gateway.with_adapter(Arc::new(AnthropicAdapter::from_settings(settings, clock.clone())?));
        }
        if let Some(settings) = config.provider(ProviderFamily::Gemini) {
            gateway = gateway.with_adapter(Arc::new(GeminiAdapter::from_settings(settings, clock)?));
        }
        Ok(gateway)
    }

    /// The model catalog.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Whether `model` is cataloged and its adapter is registered and configured.
    pub fn is_available(&self, model: &str) -> bool {
        self.resolve(model).is_ok()
    }

    fn resolve(&self, model: &str) -> Result<(&ModelRecord, &Arc<dyn CompletionAdapter>), ProviderError> {
        let record = self.catalog.get(model)?;
        let family = *record.family();
        let adapter = self.adapters.get(&family).ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::Unavailable(format!(
                "{}: no adapter registered",
                family
            )))
        })?;
        if !adapter.is_configured() {
            return Err(ProviderError::new(ProviderErrorKind::Unavailable(format!(
                "{}: not configured",
                family
            ))));
        }
        Ok((record, adapter))
    }

    /// Run one completion.
    #[instrument(skip(self, prompt, options), fields(prompt_len = prompt.len()))]
    pub async fn complete(
        &self,
        prompt: &str,
        model: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let (record, adapter) = self.resolve(model)?;
        let family = adapter.family();

        let mut options = options.clone();
        options.max_tokens = Some(record.clamp_output(options.max_tokens));

        let metrics = LlmMetrics::get();
        let started = Instant::now();
        match adapter.complete(record, prompt, &options).await {
            Ok(mut response) => {
                response.cost = adapter.cost(record, &response.token_usage);
                metrics.record_request(family.as_ref(), model, started.elapsed().as_secs_f64());
                metrics.record_tokens(model, response.token_usage.input, response.token_usage.output);
                debug!(
                    provider = %family,
                    input_tokens = response.token_usage.input,
                    output_tokens = response.token_usage.output,
                    cost = response.cost,
                    finish_reason = %response.finish_reason,
                    "Completion succeeded"
                );
                Ok(response)
            }
            Err(error) => {
                metrics.record_error(family.as_ref(), model, error.classification());
                Err(error)
            }
        }
    }

    /// Try `primary`; on any failure try `fallback` exactly once.
    ///
    /// When both fail the fallback's error is returned; the primary's
    /// failure is only logged.
    #[instrument(skip(self, prompt, options))]
    pub async fn complete_with_fallback(
        &self,
        prompt: &str,
        primary: &str,
        fallback: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let primary_error = match self.complete(prompt, primary, options).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        warn!(
            primary,
            fallback,
            classification = primary_error.classification(),
            error = %primary_error.kind,
            "Primary model failed, escalating to fallback"
        );
        LlmMetrics::get().record_fallback(primary, fallback);

        self.complete(prompt, fallback, options).await.inspect_err(|fallback_error| {
            warn!(
                primary,
                fallback,
                primary_error = %primary_error.kind,
                fallback_error = %fallback_error.kind,
                "Fallback model failed too"
            );
        })
    }

    /// Run every request concurrently. Any failure fails the whole batch.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn batch_complete(
        &self,
        requests: &[CompletionRequest],
    ) -> Result<Vec<CompletionResponse>, ProviderError> {
        try_join_all(
            requests
                .iter()
                .map(|request| self.complete(&request.prompt, &request.model, &request.options)),
        )
        .await
    }

    /// Run every request concurrently, returning one result per request.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn batch_complete_settled(
        &self,
        requests: &[CompletionRequest],
    ) -> Vec<Result<CompletionResponse, ProviderError>> {
        let results = join_all(
            requests
                .iter()
                .map(|request| self.complete(&request.prompt, &request.model, &request.options)),
        )
        .await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            info!(failed, total = results.len(), "Batch settled with failures");
        }
        results
    }

    /// Probe the adapter serving `model`.
    pub async fn probe_model(&self, model: &str) -> Result<(), ProviderError> {
        let (_, adapter) = self.resolve(model)?;
        adapter.probe().await
    }

    /// One health probe per registered family.
    pub fn health_probes(&self) -> Vec<Arc<dyn HealthProbe>> {
        let mut families: Vec<_> = self.adapters.keys().copied().collect();
        families.sort();
        families
            .into_iter()
            .filter_map(|family| {
                self.adapters.get(&family).map(|adapter| {
                    Arc::new(AdapterProbe::new(adapter.clone())) as Arc<dyn HealthProbe>
                })
            })
            .collect()
    }
}

/// Exposes a family adapter's probe to the health cache.
pub struct AdapterProbe {
    name: String,
    adapter: Arc<dyn CompletionAdapter>,
}

impl AdapterProbe {
    /// Probe named after the adapter's family.
    pub fn new(adapter: Arc<dyn CompletionAdapter>) -> Self {
        Self {
            name: adapter.family().to_string(),
            adapter,
        }
    }
}

#[async_trait]
impl HealthProbe for AdapterProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        if !self.adapter.is_configured() {
            return Err(ProviderError::new(ProviderErrorKind::Unavailable(format!(
                "{}: not configured",
                self.name
            ))));
        }
        self.adapter.probe().await
    }
}
