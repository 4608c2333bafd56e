//! # Allow-missing update tests
//!
//! Updates with `allow_missing` create absent resources, and concurrent
//! upserts of the same name create it exactly once.

mod common;

use api_registry::prelude::*;
use common::*;
use futures::future::join_all;
use std::sync::Arc;

#[tokio::test]
async fn test_allow_missing_creates() {
    let (registry, notifier) = recording_registry().await;
    registry
        .create_project("p", &Project::default())
        .await
        .expect("create project");

    let body = Api {
        name: API.to_string(),
        display_name: "Petstore".to_string(),
        ..Api::default()
    };
    let err = registry
        .update_api(&body, None, false)
        .await
        .expect_err("missing without allow_missing");
    assert_eq!(err.code(), Code::NotFound);

    let created = registry
        .update_api(&body, None, true)
        .await
        .expect("created by upsert");
    assert_eq!(created.name, API);
    assert_eq!(created.display_name, "Petstore");

    let body = Api {
        description: "second".to_string(),
        ..body
    };
    let updated = registry
        .update_api(&body, None, true)
        .await
        .expect("updated by upsert");
    assert_eq!(updated.create_time, created.create_time);
    assert_eq!(updated.description, "second");

    let events = notifier.events();
    assert_eq!(
        events[1..],
        [
            (ChangeType::Created, API.to_string()),
            (ChangeType::Updated, API.to_string())
        ]
    );
}

#[tokio::test]
async fn test_allow_missing_still_needs_parent_and_valid_id() {
    let registry = registry().await;
    seed_version(&registry).await;

    let body = ApiSpec {
        name: format!("{API}/versions/nope/specs/s"),
        ..spec_body("X")
    };
    let err = registry
        .update_api_spec(&body, None, true)
        .await
        .expect_err("parent version is missing");
    assert_eq!(err.code(), Code::NotFound);

    let body = Version {
        name: format!("{API}/versions/Bad_Id"),
        ..Version::default()
    };
    let err = registry
        .update_api_version(&body, None, true)
        .await
        .expect_err("invalid id");
    assert_eq!(err.code(), Code::InvalidArgument);

    let body = ApiSpec {
        name: SPEC.to_string(),
        ..spec_body("X")
    };
    let spec = registry
        .update_api_spec(&body, None, true)
        .await
        .expect("spec created by upsert");
    assert!(!spec.revision_id.is_empty());
    let contents = registry.get_api_spec_contents(SPEC).await.expect("contents");
    assert_eq!(contents.data, b"X");
}

#[tokio::test]
async fn test_concurrent_upserts_create_once() {
    let (registry, notifier) = recording_registry().await;
    registry
        .create_project("p", &Project::default())
        .await
        .expect("create project");

    let bodies: Vec<Api> = (0..8)
        .map(|i| Api {
            name: API.to_string(),
            description: format!("writer {i}"),
            ..Api::default()
        })
        .collect();
    let results = join_all(
        bodies
            .iter()
            .map(|body| registry.update_api(body, None, true)),
    )
    .await;

    for result in results {
        result.expect("every upsert succeeds");
    }
    let created = notifier
        .events()
        .iter()
        .filter(|(change, name)| *change == ChangeType::Created && name == API)
        .count();
    assert_eq!(created, 1, "exactly one writer creates the api");

    let apis = registry
        .list_apis(&ListRequest::new(LOCATED))
        .await
        .expect("list");
    assert_eq!(apis.items.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_across_tasks() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("registry.db").display());
    let notifier = Arc::new(RecordingNotifier::default());
    let registry = Arc::new(
        Registry::connect(&RegistryConfig::default().with_database_url(url))
            .await
            .expect("file registry")
            .with_notifier(Arc::clone(&notifier) as Arc<dyn Notifier>),
    );
    seed_version(&registry).await;

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let body = ApiSpec {
                    name: SPEC.to_string(),
                    description: format!("writer {i}"),
                    ..spec_body("openapi: 3.0.0")
                };
                registry.update_api_spec(&body, None, true).await
            })
        })
        .collect();

    for result in join_all(tasks).await {
        let spec = result.expect("task joins").expect("upsert succeeds");
        assert_eq!(spec.name, SPEC);
    }

    let created = notifier
        .events()
        .iter()
        .filter(|(change, name)| *change == ChangeType::Created && name == SPEC)
        .count();
    assert_eq!(created, 1, "exactly one writer creates the spec");

    let revisions = registry
        .list_api_spec_revisions(&ListRequest::new(SPEC))
        .await
        .expect("list revisions");
    assert_eq!(revisions.items.len(), 1, "identical contents never add revisions");
}
