//! Provider module for CemtrAS
//!
//! This module contains the model client abstraction and the Gemini
//! implementation.

pub mod base;
pub mod gemini;

pub use base::ModelClient;
pub use gemini::GeminiClient;

use crate::config::ProviderConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create a model client based on configuration
///
/// Returns `Ok(None)` when no API key is configured. The chat controller
/// treats that as a configuration error on every send, so the application can
/// still start, browse history and manage the signed-in user.
///
/// # Errors
///
/// Returns error if the HTTP client cannot be initialized
///
/// # Examples
///
/// ```
/// use cemtras::config::ProviderConfig;
/// use cemtras::providers::create_client;
///
/// let config = ProviderConfig::default();
/// assert!(create_client(&config).unwrap().is_none());
/// ```
pub fn create_client(config: &ProviderConfig) -> Result<Option<Arc<dyn ModelClient>>> {
    match config.credential() {
        Some(key) => Ok(Some(Arc::new(GeminiClient::new(config, key)?))),
        None => {
            tracing::warn!("No Gemini API key configured; sending is disabled");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_key() {
        let config = ProviderConfig {
            api_key: Some("key".to_string()),
            ..ProviderConfig::default()
        };
        let client = create_client(&config).unwrap().unwrap();
        assert_eq!(client.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_create_client_without_key() {
        let config = ProviderConfig {
            api_key: Some(String::new()),
            ..ProviderConfig::default()
        };
        assert!(create_client(&config).unwrap().is_none());
    }
}
