//! Test utilities for CemtrAS
//!
//! This module provides common test utilities including temporary directory
//! management, test file creation, a scripted model client and a store that
//! always fails.

use crate::attachments::FileAttachment;
use crate::config::Config;
use crate::error::{CemtrasError, ProviderError, Result};
use crate::providers::ModelClient;
use crate::roles::Role;
use crate::storage::KeyValueStore;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content and return its path
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with default values and a dummy key
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.api_key = Some("test-key".to_string());
    config
}

/// One recorded call to [`FakeModelClient`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Prompt as received
    pub prompt: String,
    /// Persona as received
    pub role: Role,
    /// Names of the attachments as received
    pub attachment_names: Vec<String>,
}

/// Scripted model client
///
/// Returns the same result for every call and records what it was called
/// with.
pub struct FakeModelClient {
    result: std::result::Result<String, ProviderError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeModelClient {
    /// Client that always answers `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            result: Ok(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Client that always fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

#[async_trait]
impl ModelClient for FakeModelClient {
    async fn generate(
        &self,
        prompt: &str,
        role: Role,
        attachments: &[FileAttachment],
    ) -> std::result::Result<String, ProviderError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(RecordedCall {
                prompt: prompt.to_string(),
                role,
                attachment_names: attachments.iter().map(|f| f.name.clone()).collect(),
            });
        self.result.clone()
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

/// Store whose reads succeed empty and whose writes always fail
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(CemtrasError::Storage("storage quota exceeded".to_string()).into())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(CemtrasError::Storage("storage quota exceeded".to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains() {
        let result: Result<()> = Err(CemtrasError::Config("invalid value".to_string()).into());
        assert_error_contains(result, "invalid value");
    }

    #[test]
    #[should_panic(expected = "but got Ok")]
    fn test_assert_error_contains_panics_on_ok() {
        assert_error_contains(Ok(()), "anything");
    }

    #[tokio::test]
    async fn test_fake_client_records_calls() {
        let fake = FakeModelClient::replying("hi");
        let file = FileAttachment::from_bytes("a.png", "image/png", b"x");
        let reply = fake
            .generate("prompt", Role::GeneralAi, &[file])
            .await
            .unwrap();

        assert_eq!(reply, "hi");
        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].role, Role::GeneralAi);
        assert_eq!(calls[0].attachment_names, vec!["a.png".to_string()]);
    }

    #[test]
    fn test_failing_store_rejects_writes() {
        assert!(FailingStore.set("k", "v").is_err());
        assert!(FailingStore.get("k").unwrap().is_none());
    }
}
