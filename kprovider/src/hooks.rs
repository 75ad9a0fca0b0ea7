//! Operational hook contracts for the model-candidate attempt loop.
//!
//! ```rust
//! use kprovider::{NoopAdapterHooks, TracingAdapterHooks};
//!
//! let _quiet: &dyn kprovider::AdapterHooks = &NoopAdapterHooks;
//! let _loud: &dyn kprovider::AdapterHooks = &TracingAdapterHooks;
//! ```

use crate::{ProviderError, ProviderId};

pub trait AdapterHooks: Send + Sync {
    fn on_candidate_start(&self, _provider: ProviderId, _model: &str) {}

    fn on_candidate_failed(&self, _provider: ProviderId, _model: &str, _error: &ProviderError) {}

    fn on_adapter_success(&self, _provider: ProviderId, _model: &str) {}

    fn on_adapter_exhausted(&self, _provider: ProviderId, _candidates_tried: usize) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAdapterHooks;

impl AdapterHooks for NoopAdapterHooks {}

/// Emits one structured tracing event per attempt-loop transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAdapterHooks;

impl AdapterHooks for TracingAdapterHooks {
    fn on_candidate_start(&self, provider: ProviderId, model: &str) {
        tracing::info!(
            phase = "adapter",
            event = "candidate_start",
            provider = %provider,
            model
        );
    }

    fn on_candidate_failed(&self, provider: ProviderId, model: &str, error: &ProviderError) {
        tracing::warn!(
            phase = "adapter",
            event = "candidate_failed",
            provider = %provider,
            model,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_adapter_success(&self, provider: ProviderId, model: &str) {
        tracing::info!(
            phase = "adapter",
            event = "adapter_success",
            provider = %provider,
            model
        );
    }

    fn on_adapter_exhausted(&self, provider: ProviderId, candidates_tried: usize) {
        tracing::error!(
            phase = "adapter",
            event = "adapter_exhausted",
            provider = %provider,
            candidates_tried
        );
    }
}
