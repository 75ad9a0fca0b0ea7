//! Stable adapter construction surface for gateway consumers.

use std::time::Duration;

#[cfg(any(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
use std::sync::Arc;

#[cfg(any(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
use crate::{ChatAdapter, ProviderError, SecureCredentialManager};

#[derive(Debug, Clone)]
pub struct AdapterBuildConfig {
    pub timeout: Duration,
}

impl AdapterBuildConfig {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(90),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for AdapterBuildConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds one adapter per enabled provider family, all sharing a single
/// HTTP client. Adapters are built whether or not their key is present;
/// callers consult [`crate::ProviderDescriptor`] for configured status.
#[cfg(any(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
pub fn build_default_adapters(
    credentials: Arc<SecureCredentialManager>,
) -> Result<Vec<Arc<dyn ChatAdapter>>, ProviderError> {
    build_adapters_with_config(credentials, AdapterBuildConfig::new())
}

#[cfg(any(
    feature = "provider-openai",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
pub fn build_adapters_with_config(
    credentials: Arc<SecureCredentialManager>,
    config: AdapterBuildConfig,
) -> Result<Vec<Arc<dyn ChatAdapter>>, ProviderError> {
    let http = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;

    let mut adapters: Vec<Arc<dyn ChatAdapter>> = Vec::new();

    #[cfg(feature = "provider-anthropic")]
    {
        let transport = Arc::new(
            crate::adapters::anthropic::AnthropicChatAdapter::default_http_transport(http.clone()),
        );
        adapters.push(Arc::new(
            crate::adapters::anthropic::AnthropicChatAdapter::new(credentials.clone(), transport),
        ));
    }

    #[cfg(feature = "provider-kimi")]
    {
        let transport = Arc::new(crate::adapters::kimi::KimiChatAdapter::default_http_transport(
            http.clone(),
        ));
        adapters.push(Arc::new(crate::adapters::kimi::KimiChatAdapter::new(
            credentials.clone(),
            transport,
        )));
    }

    #[cfg(feature = "provider-gemini")]
    {
        let transport = Arc::new(
            crate::adapters::gemini::GeminiChatAdapter::default_http_transport(http.clone()),
        );
        adapters.push(Arc::new(crate::adapters::gemini::GeminiChatAdapter::new(
            credentials.clone(),
            transport,
        )));
    }

    #[cfg(feature = "provider-deepseek")]
    {
        let transport = Arc::new(
            crate::adapters::deepseek::DeepseekChatAdapter::default_http_transport(http.clone()),
        );
        adapters.push(Arc::new(
            crate::adapters::deepseek::DeepseekChatAdapter::new(credentials.clone(), transport),
        ));
    }

    #[cfg(feature = "provider-openai")]
    {
        let transport = Arc::new(
            crate::adapters::openai::OpenAiChatAdapter::default_http_transport(http.clone()),
        );
        adapters.push(Arc::new(crate::adapters::openai::OpenAiChatAdapter::new(
            credentials.clone(),
            transport,
        )));
    }

    let _ = (&credentials, &http);

    Ok(adapters)
}

// The full-order assertion needs every family enabled.
#[cfg(all(
    test,
    feature = "provider-openai",
    feature = "provider-kimi",
    feature = "provider-deepseek",
    feature = "provider-anthropic",
    feature = "provider-gemini"
))]
mod tests {
    use super::*;
    use crate::PRIORITY_ORDER;

    #[test]
    fn default_build_yields_one_adapter_per_family_in_priority_order() {
        let credentials = Arc::new(SecureCredentialManager::new());
        let adapters = build_default_adapters(credentials).expect("build");
        let ids: Vec<_> = adapters.iter().map(|adapter| adapter.id()).collect();
        assert_eq!(ids, PRIORITY_ORDER.to_vec());
    }
}
