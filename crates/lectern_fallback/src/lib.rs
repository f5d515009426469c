//! Provider fallback chains for multi-part worksheet generation.
//!
//! Each requested content type is resolved to an ordered chain of
//! providers (specialized first, then the generic ones) and the chain is
//! walked strictly in order until one succeeds. Content types are
//! independent: they run concurrently and a failed type only removes its
//! own section from the result.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chain;
mod coordinator;
mod provider;

pub use chain::{ProviderChain, resolve_chain};
pub use coordinator::{ContentState, FallbackCoordinator, SectionOutcome};
pub use provider::{ContentProbe, GatewayContentProvider, GatewayVisualProvider};
