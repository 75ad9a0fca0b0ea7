//! Gateway error kinds and their HTTP mapping.
//!
//! ```rust
//! use kgateway::GatewayError;
//!
//! assert_eq!(GatewayError::invalid_request("Message is required").status(), 400);
//! assert_eq!(GatewayError::rate_limited("Rate limit exceeded").status(), 429);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use kprovider::ProviderError;

use crate::relay::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    InvalidRequest,
    NotConfigured,
    RateLimited,
    Relay,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidRequest, message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::NotConfigured, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::RateLimited, message)
    }

    pub fn relay(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Relay, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Internal, message)
    }

    /// HTTP status a transport layer should answer with, so it never needs
    /// to match on the kinds itself.
    pub fn status(&self) -> u16 {
        match self.kind {
            GatewayErrorKind::InvalidRequest => 400,
            GatewayErrorKind::NotConfigured => 503,
            GatewayErrorKind::RateLimited => 429,
            GatewayErrorKind::Relay | GatewayErrorKind::Internal => 500,
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for GatewayError {}

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<RelayError> for GatewayError {
    fn from(err: RelayError) -> Self {
        Self::relay(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_stable() {
        assert_eq!(GatewayError::invalid_request("m").status(), 400);
        assert_eq!(GatewayError::not_configured("m").status(), 503);
        assert_eq!(GatewayError::rate_limited("m").status(), 429);
        assert_eq!(GatewayError::relay("m").status(), 500);
        assert_eq!(GatewayError::internal("m").status(), 500);
    }
}
