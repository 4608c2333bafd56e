//! Common fixtures for registry integration tests
//!
//! Every test gets its own in-memory SQLite database. Tests that also run
//! against PostgreSQL read its URL from `REGISTRY_TEST_POSTGRES_URL` and are
//! skipped when it is unset.

#![allow(dead_code, reason = "each test binary uses a different subset of the fixtures")]

use api_registry::logging;
use api_registry::prelude::*;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, Once};

pub const PROJECT: &str = "projects/p";
pub const LOCATED: &str = "projects/p/locations/global";
pub const API: &str = "projects/p/locations/global/apis/a";
pub const VERSION: &str = "projects/p/locations/global/apis/a/versions/v1";
pub const SPEC: &str = "projects/p/locations/global/apis/a/versions/v1/specs/s";
pub const DEPLOYMENT: &str = "projects/p/locations/global/apis/a/deployments/d";

pub const YAML: &str = "application/x.openapi;version=3";

static LOGGING: Once = Once::new();

/// Install the test subscriber once per test binary
pub fn init_logging() {
    LOGGING.call_once(|| {
        let config = RegistryConfig {
            log_level: "DEBUG".to_string(),
            ..RegistryConfig::default()
        };
        logging::init(&config);
    });
}

/// A registry over a fresh in-memory database
pub async fn registry() -> Registry {
    init_logging();
    Registry::connect(&RegistryConfig::in_memory())
        .await
        .expect("Failed to open in-memory registry")
}

/// A registry over the PostgreSQL database named by `REGISTRY_TEST_POSTGRES_URL`
pub async fn postgres_registry() -> Option<Registry> {
    let url = std::env::var("REGISTRY_TEST_POSTGRES_URL").ok()?;
    init_logging();
    let config = RegistryConfig::default().with_database_url(url);
    Some(
        Registry::connect(&config)
            .await
            .expect("Failed to open PostgreSQL registry"),
    )
}

/// Notifier that remembers every change it is told about
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(ChangeType, String)>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(ChangeType, String)> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, change: ChangeType, resource: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push((change, resource.to_string()));
    }
}

/// A registry that records its notifications
pub async fn recording_registry() -> (Registry, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let registry = registry().await.with_notifier(Arc::clone(&notifier) as Arc<dyn Notifier>);
    (registry, notifier)
}

pub fn spec_body(contents: &str) -> ApiSpec {
    ApiSpec {
        mime_type: YAML.to_string(),
        filename: "openapi.yaml".to_string(),
        contents: contents.as_bytes().to_vec(),
        ..ApiSpec::default()
    }
}

/// Create `projects/p`, api `a` and version `v1`
pub async fn seed_version(registry: &Registry) {
    registry
        .create_project("p", &Project::default())
        .await
        .expect("create project");
    registry
        .create_api(LOCATED, "a", &Api::default())
        .await
        .expect("create api");
    registry
        .create_api_version(API, "v1", &Version::default())
        .await
        .expect("create version");
}

/// Seed a version and create spec `s` with `contents`
pub async fn seed_spec(registry: &Registry, contents: &str) -> ApiSpec {
    seed_version(registry).await;
    registry
        .create_api_spec(VERSION, "s", &spec_body(contents))
        .await
        .expect("create spec")
}

/// Replace the contents of spec `s`, creating a new revision
pub async fn update_contents(registry: &Registry, contents: &str) -> ApiSpec {
    let body = ApiSpec {
        name: SPEC.to_string(),
        ..spec_body(contents)
    };
    registry
        .update_api_spec(&body, Some(&FieldMask::new(["contents"])), false)
        .await
        .expect("update spec contents")
}

pub fn revision_ids(specs: &[ApiSpec]) -> Vec<String> {
    specs.iter().map(|spec| spec.revision_id.clone()).collect()
}
