//! Chain resolution.

use lectern_core::ContentType;
use lectern_interface::ContentProvider;
use lectern_rate_limit::FallbackSettings;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Ordered providers for one content type plus the names that were skipped.
pub struct ProviderChain {
    /// Providers to try, in order
    pub providers: Vec<Arc<dyn ContentProvider>>,
    /// Warnings for configured names that are not registered or not usable
    pub skipped: Vec<String>,
}

impl ProviderChain {
    /// Provider names in chain order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

/// Resolve `[specialized, generic...]` for `content_type`.
///
/// Duplicates are dropped keeping the first position. Names that are not
/// registered, or whose provider reports itself unconfigured, are skipped
/// with a warning and never attempted.
pub fn resolve_chain(
    content_type: ContentType,
    settings: &FallbackSettings,
    registry: &HashMap<String, Arc<dyn ContentProvider>>,
) -> ProviderChain {
    let mut names: Vec<&str> = Vec::with_capacity(settings.generic.len() + 1);
    let declared = settings
        .specialized_for(content_type)
        .into_iter()
        .chain(settings.generic.iter().map(String::as_str));
    for name in declared {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let mut providers = Vec::with_capacity(names.len());
    let mut skipped = Vec::new();
    for name in names {
        match registry.get(name) {
            Some(provider) if provider.is_configured() => providers.push(provider.clone()),
            Some(_) => skipped.push(format!(
                "{}: provider '{}' unavailable: not configured",
                content_type, name
            )),
            None => skipped.push(format!(
                "{}: provider '{}' unavailable: not registered",
                content_type, name
            )),
        }
    }

    debug!(
        content_type = %content_type,
        chain = ?providers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(),
        skipped = skipped.len(),
        "Resolved provider chain"
    );

    ProviderChain { providers, skipped }
}
