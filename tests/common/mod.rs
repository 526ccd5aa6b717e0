use async_trait::async_trait;
use cemtras::attachments::FileAttachment;
use cemtras::error::ProviderError;
use cemtras::providers::ModelClient;
use cemtras::roles::Role;
use cemtras::storage::SledStore;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_store() -> (Arc<SledStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SledStore::new_with_path(tmp.path().join("store")).expect("failed to open store");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Model client that plays back a queue of results
///
/// Once the queue is empty every call answers "ok".
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<(String, Role)>>,
}

#[allow(dead_code)]
impl ScriptedClient {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<(String, Role)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn generate(
        &self,
        prompt: &str,
        role: Role,
        _attachments: &[FileAttachment],
    ) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push((prompt.to_string(), role));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
