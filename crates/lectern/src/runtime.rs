//! Wiring every component from one configuration.

use lectern_cache::{HealthCache, HealthCacheConfig, ServiceHealth};
use lectern_core::{WorkbookRequest, WorksheetGenerationResult, WorksheetRequest};
use lectern_error::LecternResult;
use lectern_fallback::FallbackCoordinator;
use lectern_interface::{DocumentSink, PromptBuilder, TemplatePromptBuilder};
use lectern_models::CompletionGateway;
use lectern_pipeline::{Pipeline, PipelineEngine, StageServices, workbook_stages};
use lectern_rate_limit::{Clock, LecternConfig, TokioClock};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// A configured Lectern: gateway, fallback coordinator and health cache.
///
/// Built once from an immutable [`LecternConfig`]; every component gets
/// what it needs at construction.
///
/// # Example
///
/// ```rust,ignore
/// let lectern = Lectern::load(None)?;
/// let result = lectern.generate_worksheet(&request).await?;
/// ```
pub struct Lectern {
    config: LecternConfig,
    clock: Arc<dyn Clock>,
    gateway: Arc<CompletionGateway>,
    prompts: Arc<dyn PromptBuilder>,
    coordinator: FallbackCoordinator,
    provider_health: HealthCache,
}

impl std::fmt::Debug for Lectern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lectern")
            .field("gateway", &self.gateway)
            .field("coordinator", &self.coordinator)
            .field("provider_health", &self.provider_health)
            .finish_non_exhaustive()
    }
}

impl Lectern {
    /// Load configuration (bundled, home, current directory, then
    /// `override_path`) and wire everything.
    pub fn load(override_path: Option<&Path>) -> LecternResult<Self> {
        Self::from_config(LecternConfig::load_with_override(override_path)?)
    }

    /// Wire everything from `config` with the real clock.
    pub fn from_config(config: LecternConfig) -> LecternResult<Self> {
        let gateway = CompletionGateway::from_config(&config, Arc::new(TokioClock))?;
        Ok(Self::with_gateway(config, Arc::new(gateway), Arc::new(TokioClock)))
    }

    /// Wire everything around an existing gateway.
    pub fn with_gateway(
        config: LecternConfig,
        gateway: Arc<CompletionGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let prompts: Arc<dyn PromptBuilder> = Arc::new(TemplatePromptBuilder);
        let coordinator =
            FallbackCoordinator::from_config(&config, gateway.clone(), prompts.clone(), clock.clone());

        let mut provider_health = HealthCache::new(HealthCacheConfig::from(&config.health), clock.clone());
        for probe in gateway.health_probes() {
            provider_health.register(probe);
        }

        info!(
            models = gateway.catalog().len(),
            content_providers = coordinator.provider_names().len(),
            "Lectern ready"
        );
        Self {
            config,
            clock,
            gateway,
            prompts,
            coordinator,
            provider_health,
        }
    }

    /// The configuration everything was built from.
    pub fn config(&self) -> &LecternConfig {
        &self.config
    }

    /// The completion gateway.
    pub fn gateway(&self) -> &Arc<CompletionGateway> {
        &self.gateway
    }

    /// The worksheet fallback coordinator.
    pub fn coordinator(&self) -> &FallbackCoordinator {
        &self.coordinator
    }

    /// A workbook pipeline engine exporting to `sink`.
    pub fn engine(&self, sink: Arc<dyn DocumentSink>) -> PipelineEngine {
        let services = StageServices::new(self.gateway.clone(), self.prompts.clone());
        PipelineEngine::from_settings(
            workbook_stages(services, sink),
            &self.config.pipeline,
            self.clock.clone(),
        )
    }

    /// Run the workbook pipeline for `request`.
    ///
    /// Stage failures are recorded on the returned pipeline; only invalid
    /// input is an error.
    #[instrument(skip_all)]
    pub async fn generate_workbook(
        &self,
        request: WorkbookRequest,
        sink: Arc<dyn DocumentSink>,
    ) -> LecternResult<Pipeline> {
        Ok(self.engine(sink).start(request).await?)
    }

    /// Generate a multi-part worksheet with per-type fallback.
    #[instrument(skip_all)]
    pub async fn generate_worksheet(
        &self,
        request: &WorksheetRequest,
    ) -> LecternResult<WorksheetGenerationResult> {
        Ok(self.coordinator.generate(request).await?)
    }

    /// Cached health of every provider family and content provider.
    pub async fn health(&self) -> Vec<ServiceHealth> {
        let (mut families, providers) = tokio::join!(
            self.provider_health.check_all_services_health(),
            self.coordinator.check_all_services_health()
        );
        families.extend(providers);
        families
    }
}
