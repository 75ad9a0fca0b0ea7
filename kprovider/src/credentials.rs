//! In-memory API-key management with zeroized secrets.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{ProviderError, ProviderId};

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

/// Holds one API key per provider. `is_configured` for a provider is simply
/// key presence; the gateway computes its descriptor set from this once per
/// process.
#[derive(Default)]
pub struct SecureCredentialManager {
    credentials: Mutex<HashMap<ProviderId, SecretString>>,
}

impl SecureCredentialManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the environment variables the deployment sets per provider.
    /// Absent or empty variables simply leave that provider unconfigured.
    pub fn from_env() -> Self {
        let manager = Self::new();

        for (provider, variable) in [
            (ProviderId::Kimi, "KIMI_API_KEY"),
            (ProviderId::Gemini, "GOOGLE_AI_API_KEY"),
            (ProviderId::Deepseek, "DEEPSEEK_AI_API_KEY"),
            (ProviderId::Anthropic, "ANTHROPIC_API_KEY"),
            (ProviderId::OpenAi, "OPENAI_API_KEY"),
        ] {
            if let Ok(value) = std::env::var(variable) {
                let _ = manager.set_api_key(provider, value);
            }
        }

        manager
    }

    pub fn set_api_key(
        &self,
        provider: ProviderId,
        api_key: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let api_key = SecretString::new(api_key);
        if api_key.is_empty() {
            return Err(ProviderError::authentication("api key must not be empty"));
        }

        self.credentials_mut()?.insert(provider, api_key);
        Ok(())
    }

    pub fn has_credentials(&self, provider: ProviderId) -> bool {
        self.credentials_ref()
            .map(|credentials| credentials.contains_key(&provider))
            .unwrap_or(false)
    }

    pub fn any_configured(&self) -> bool {
        self.credentials_ref()
            .map(|credentials| !credentials.is_empty())
            .unwrap_or(false)
    }

    pub fn with_api_key<R>(
        &self,
        provider: ProviderId,
        f: impl FnOnce(&str) -> R,
    ) -> Result<Option<R>, ProviderError> {
        let credentials = self.credentials_ref()?;
        Ok(credentials.get(&provider).map(|secret| f(secret.expose())))
    }

    pub fn clear(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.credentials_mut()?.remove(&provider).is_some())
    }

    fn credentials_ref(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ProviderId, SecretString>>, ProviderError> {
        self.credentials
            .lock()
            .map_err(|_| ProviderError::other("credential manager lock poisoned"))
    }

    fn credentials_mut(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ProviderId, SecretString>>, ProviderError> {
        self.credentials
            .lock()
            .map_err(|_| ProviderError::other("credential manager lock poisoned"))
    }
}

/// Resolves a provider's key or fails the attempt with an authentication
/// error naming the provider.
pub fn resolve_api_key(
    credentials: &SecureCredentialManager,
    provider: ProviderId,
) -> Result<String, ProviderError> {
    credentials
        .with_api_key(provider, |value| value.to_string())?
        .ok_or_else(|| {
            ProviderError::authentication(format!("no {provider} credentials configured"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_api_key_rejects_empty_values() {
        let manager = SecureCredentialManager::new();
        let err = manager
            .set_api_key(ProviderId::OpenAi, "")
            .expect_err("empty key must fail");
        assert_eq!(err.kind, crate::ProviderErrorKind::Authentication);
        assert!(!manager.has_credentials(ProviderId::OpenAi));
    }

    #[test]
    fn configured_state_tracks_stored_keys() {
        let manager = SecureCredentialManager::new();
        assert!(!manager.any_configured());

        manager
            .set_api_key(ProviderId::Kimi, "sk-kimi-test")
            .expect("store key");
        assert!(manager.any_configured());
        assert!(manager.has_credentials(ProviderId::Kimi));
        assert!(!manager.has_credentials(ProviderId::Gemini));

        let resolved = resolve_api_key(&manager, ProviderId::Kimi).expect("key should resolve");
        assert_eq!(resolved, "sk-kimi-test");

        let missing = resolve_api_key(&manager, ProviderId::Gemini)
            .expect_err("missing key must fail");
        assert_eq!(missing.kind, crate::ProviderErrorKind::Authentication);

        assert!(manager.clear(ProviderId::Kimi).expect("clear"));
        assert!(!manager.any_configured());
    }

    #[test]
    fn secret_string_debug_never_prints_the_value() {
        let secret = SecretString::new("sk-very-secret");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
    }
}
