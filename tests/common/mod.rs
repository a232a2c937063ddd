use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::MockServer;

use reviewlens::api::HttpBackend;
use reviewlens::config::{ApiConfig, ChatConfig};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// HTTP backend pointed at a mock server
#[allow(dead_code)]
pub fn backend_for(server: &MockServer) -> HttpBackend {
    let config = ApiConfig {
        base_url: server.uri(),
        request_timeout_seconds: 5,
        collect_timeout_seconds: 10,
    };
    HttpBackend::new(&config).expect("failed to build backend")
}

/// Chat settings without the cosmetic pauses
#[allow(dead_code)]
pub fn fast_chat_config() -> ChatConfig {
    ChatConfig {
        analysis_pause_ms: 0,
        error_pause_ms: 0,
        ..ChatConfig::default()
    }
}
