//! Static provider configuration and cascade ordering.
//!
//! ```rust
//! use kprovider::{trial_order, ProviderId, PRIORITY_ORDER};
//!
//! assert_eq!(PRIORITY_ORDER[0], ProviderId::Anthropic);
//!
//! let order = trial_order(Some(ProviderId::Deepseek));
//! assert_eq!(order[0], ProviderId::Deepseek);
//! assert_eq!(order.len(), PRIORITY_ORDER.len());
//! ```

use crate::{ChatAdapter, ProviderId, SecureCredentialManager};

/// Fixed fallback priority when the client expresses no preference:
/// cheapest-per-quality first, matching the deployment's cost profile.
pub const PRIORITY_ORDER: [ProviderId; 5] = [
    ProviderId::Anthropic,
    ProviderId::Kimi,
    ProviderId::Gemini,
    ProviderId::Deepseek,
    ProviderId::OpenAi,
];

pub const DEFAULT_PROVIDER: ProviderId = ProviderId::Anthropic;

/// Per-provider configuration snapshot, computed once per process from
/// credential presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub configured: bool,
    pub model_candidates: Vec<String>,
    pub priority: usize,
}

impl ProviderDescriptor {
    pub fn describe(adapter: &dyn ChatAdapter, credentials: &SecureCredentialManager) -> Self {
        let id = adapter.id();
        Self {
            id,
            configured: credentials.has_credentials(id),
            model_candidates: adapter.model_candidates().to_vec(),
            priority: priority_of(id),
        }
    }
}

pub fn priority_of(id: ProviderId) -> usize {
    PRIORITY_ORDER
        .iter()
        .position(|candidate| *candidate == id)
        .unwrap_or(PRIORITY_ORDER.len())
}

/// Builds the cascade trial order: the preferred provider first, then every
/// other provider in fixed priority order.
pub fn trial_order(preferred: Option<ProviderId>) -> Vec<ProviderId> {
    let preferred = preferred.unwrap_or(DEFAULT_PROVIDER);
    let mut order = vec![preferred];
    order.extend(PRIORITY_ORDER.iter().copied().filter(|id| *id != preferred));
    order
}
