//! Fallback coordinator.

use crate::chain::resolve_chain;
use crate::provider::{ContentProbe, GatewayContentProvider, GatewayVisualProvider};
use futures::future::join_all;
use lectern_cache::{HealthCache, HealthCacheConfig, ServiceHealth};
use lectern_core::{
    ContentFailure, ContentType, GeneratedContent, VisualAsset, WorksheetGenerationResult,
    WorksheetRequest,
};
use lectern_error::{ContentErrorKind, ProviderError, ValidationError};
use lectern_interface::{ContentProvider, PromptBuilder, VisualProvider};
use lectern_models::CompletionGateway;
use lectern_rate_limit::{Clock, FallbackSettings, LecternConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Progress of one content type through its provider chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentState {
    /// Chain not entered yet
    NotStarted,
    /// Attempting the provider at `index`
    Trying {
        /// Position in the chain
        index: usize,
        /// Provider name
        provider: String,
    },
    /// A provider produced the section
    Succeeded {
        /// Provider name
        provider: String,
    },
    /// Every provider in the chain failed
    Failed,
}

/// Result of walking one content type's chain.
#[derive(Debug, Clone)]
pub struct SectionOutcome {
    /// Content type processed
    pub content_type: ContentType,
    /// The section, when a provider succeeded
    pub content: Option<GeneratedContent>,
    /// Skipped and failed providers, in order
    pub warnings: Vec<String>,
    /// Set when the whole chain failed
    pub failure: Option<ContentFailure>,
    /// Terminal state
    pub state: ContentState,
}

/// Generates multi-part worksheets with per-content-type fallback.
///
/// # Example
///
/// ```rust,ignore
/// let coordinator = FallbackCoordinator::from_config(&config, gateway, prompts, clock);
/// let result = coordinator.generate(&request).await?;
/// for warning in &result.warnings {
///     eprintln!("{warning}");
/// }
/// ```
pub struct FallbackCoordinator {
    providers: HashMap<String, Arc<dyn ContentProvider>>,
    visual_provider: Option<Arc<dyn VisualProvider>>,
    settings: FallbackSettings,
    health: HealthCache,
}

impl std::fmt::Debug for FallbackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.providers.keys().collect();
        providers.sort();
        f.debug_struct("FallbackCoordinator")
            .field("providers", &providers)
            .field("visuals", &self.visual_provider.as_ref().map(|v| v.name().to_string()))
            .field("settings", &self.settings)
            .field("health", &self.health)
            .finish()
    }
}

impl FallbackCoordinator {
    /// Coordinator with no providers registered.
    pub fn new(settings: FallbackSettings, health: HealthCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            providers: HashMap::new(),
            visual_provider: None,
            settings,
            health: HealthCache::new(health, clock),
        }
    }

    /// Register a content provider and its health probe.
    pub fn with_provider(mut self, provider: Arc<dyn ContentProvider>) -> Self {
        self.health.register(Arc::new(ContentProbe(provider.clone())));
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// Set the visual provider.
    pub fn with_visual_provider(mut self, provider: Arc<dyn VisualProvider>) -> Self {
        self.visual_provider = Some(provider);
        self
    }

    /// Coordinator with every configured content provider backed by `gateway`.
    ///
    /// The visual provider, when named, reuses that content provider's model.
    pub fn from_config(
        config: &LecternConfig,
        gateway: Arc<CompletionGateway>,
        prompts: Arc<dyn PromptBuilder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut coordinator = Self::new(
            config.fallback.clone(),
            HealthCacheConfig::from(&config.health),
            clock,
        );
        for (name, settings) in &config.content_providers {
            coordinator = coordinator.with_provider(Arc::new(GatewayContentProvider::from_settings(
                name.clone(),
                settings,
                gateway.clone(),
                prompts.clone(),
            )));
        }
        let visuals = config
            .fallback
            .visuals
            .as_ref()
            .and_then(|name| config.content_providers.get(name).map(|s| (name, s)));
        if let Some((name, settings)) = visuals {
            coordinator = coordinator.with_visual_provider(Arc::new(GatewayVisualProvider::new(
                name.clone(),
                settings.model.clone(),
                gateway,
                prompts,
            )));
        }
        coordinator
    }

    /// Registered content provider names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Generate every requested content type.
    ///
    /// Content types run concurrently; within a type providers are tried
    /// strictly in chain order. Failures are reported in the result's
    /// `warnings` and `errors` instead of aborting the request.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the request itself is invalid.
    #[instrument(skip(self, request), fields(subject = %request.subject(), topic = %request.topic()))]
    pub async fn generate(
        &self,
        request: &WorksheetRequest,
    ) -> Result<WorksheetGenerationResult, ValidationError> {
        request.validate()?;
        let request_id = Uuid::new_v4();
        let content_types = request.unique_content_types();
        info!(%request_id, types = content_types.len(), "Generating worksheet");

        let sections = join_all(
            content_types
                .iter()
                .map(|content_type| self.generate_section(request, *content_type)),
        );
        let (outcomes, visuals) = tokio::join!(sections, self.visuals(request));

        let mut content = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for outcome in outcomes {
            warnings.extend(outcome.warnings);
            content.extend(outcome.content);
            errors.extend(outcome.failure);
        }

        match visuals {
            Some(Ok(assets)) => match content.first_mut() {
                Some(first) => first.visuals = assets,
                None => warnings.push("visuals: no section to attach to".to_string()),
            },
            Some(Err(message)) => warnings.push(message),
            None => {}
        }

        let result = WorksheetGenerationResult::new(request_id, content, errors, warnings);
        if result.is_degraded() {
            warn!(
                %request_id,
                failed = result.errors.len(),
                succeeded = result.content.len(),
                "Worksheet generated with missing sections"
            );
        } else {
            info!(%request_id, sections = result.content.len(), "Worksheet generated");
        }
        Ok(result)
    }

    /// Walk the provider chain for one content type.
    #[instrument(skip(self, request))]
    pub async fn generate_section(
        &self,
        request: &WorksheetRequest,
        content_type: ContentType,
    ) -> SectionOutcome {
        let chain = resolve_chain(content_type, &self.settings, &self.providers);
        let mut warnings = chain.skipped;
        let mut state = ContentState::NotStarted;
        let mut last_error: Option<ProviderError> = None;

        for (index, provider) in chain.providers.iter().enumerate() {
            state = ContentState::Trying {
                index,
                provider: provider.name().to_string(),
            };
            debug!(?state, "Content state changed");

            match provider.generate(request, content_type).await {
                Ok(mut section) => {
                    section.content_type = content_type;
                    section.source_provider = provider.name().to_string();
                    state = ContentState::Succeeded {
                        provider: provider.name().to_string(),
                    };
                    debug!(?state, "Content state changed");
                    return SectionOutcome {
                        content_type,
                        content: Some(section),
                        warnings,
                        failure: None,
                        state,
                    };
                }
                Err(error) => {
                    warn!(
                        provider = provider.name(),
                        classification = error.classification(),
                        error = %error.kind,
                        "Provider failed, trying next in chain"
                    );
                    warnings.push(format!(
                        "{}: provider '{}' failed: {}",
                        content_type,
                        provider.name(),
                        error.kind
                    ));
                    last_error = Some(error);
                }
            }
        }

        let message = match last_error {
            None => "no configured provider".to_string(),
            Some(last) => ContentErrorKind::AllProvidersFailed {
                content_type: content_type.to_string(),
                attempts: chain.providers.len(),
                last_error: last.kind.to_string(),
            }
            .to_string(),
        };
        warn!(%content_type, from = ?state, %message, "Content type failed");
        SectionOutcome {
            content_type,
            content: None,
            warnings,
            failure: Some(ContentFailure {
                content_type,
                message,
            }),
            state: ContentState::Failed,
        }
    }

    async fn visuals(&self, request: &WorksheetRequest) -> Option<Result<Vec<VisualAsset>, String>> {
        if !*request.include_visuals() {
            return None;
        }
        let Some(provider) = &self.visual_provider else {
            return Some(Err("visuals: no visual provider configured".to_string()));
        };
        Some(
            provider
                .generate_visuals(request)
                .await
                .map_err(|e| format!("visuals: provider '{}' failed: {}", provider.name(), e.kind)),
        )
    }

    /// Cached health of one registered provider.
    pub async fn check_health(&self, name: &str) -> ServiceHealth {
        self.health.check_health(name).await
    }

    /// Cached health of every registered provider.
    pub async fn check_all_services_health(&self) -> Vec<ServiceHealth> {
        self.health.check_all_services_health().await
    }
}
