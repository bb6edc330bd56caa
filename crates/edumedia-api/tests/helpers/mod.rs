//! Test helpers: build the router over local or scripted storage.

#![allow(dead_code)]

use axum_test::TestServer;
use edumedia_api::setup::{build_state, routes};
use edumedia_api::state::AppState;
use edumedia_core::{Config, LocalStorageConfig, ServerConfig, StorageBackend, UploadSettings};
use edumedia_processing::UploadOrchestrator;
use edumedia_storage::testing::{RecordingSleeper, ScriptedStorage};
use edumedia_storage::{LocalStorage, RemoteStorage};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const MEDIA_PATH: &str = "/api/v0/media";
pub const LOCAL_BASE_URL: &str = "http://localhost:3000/media";

/// Test application: server plus owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_root(&self) -> &Path {
        self.temp_dir.path()
    }
}

pub fn test_config(storage_path: &Path, max_upload_size_bytes: usize) -> Config {
    Config {
        server: ServerConfig {
            server_port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            max_upload_size_bytes,
        },
        storage_backend: StorageBackend::Local,
        cloudinary: None,
        local_storage: Some(LocalStorageConfig {
            path: storage_path.to_string_lossy().to_string(),
            base_url: LOCAL_BASE_URL.to_string(),
        }),
        upload: UploadSettings::default(),
    }
}

/// App over filesystem storage in a temp dir.
pub async fn setup_local_app(max_upload_size_bytes: usize) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(temp_dir.path(), max_upload_size_bytes);

    let storage: Arc<dyn RemoteStorage> = Arc::new(
        LocalStorage::new(temp_dir.path(), LOCAL_BASE_URL.to_string())
            .await
            .expect("Failed to create local storage"),
    );
    let state = build_state(&config, storage);
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp { server, temp_dir }
}

/// App over scripted storage; retries do not wait.
pub fn setup_scripted_app(storage: Arc<ScriptedStorage>) -> (TestServer, Arc<RecordingSleeper>) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(temp_dir.path(), 10 * 1024 * 1024);

    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator =
        UploadOrchestrator::with_sleeper(storage.clone(), config.upload.clone(), sleeper.clone());
    let state = Arc::new(AppState::new(storage, orchestrator));

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");
    (server, sleeper)
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 128])
    });
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("Failed to encode PNG");
    buffer
}
