//! # End-to-end registry scenario
//!
//! Walks a spec through creation, a content update, a revision listing and a
//! rollback, checking revision ids, timestamps and stored contents at each step.

mod common;

use api_registry::prelude::*;
use common::*;

async fn run_scenario(registry: &Registry, project_id: &str) {
    let project = format!("projects/{project_id}/locations/global");
    let api = format!("{project}/apis/a");
    let version = format!("{api}/versions/v1");
    let spec = format!("{version}/specs/s");

    registry
        .create_project(project_id, &Project::default())
        .await
        .expect("create project");
    registry
        .create_api(&project, "a", &Api::default())
        .await
        .expect("create api");
    registry
        .create_api_version(&api, "v1", &Version::default())
        .await
        .expect("create version");
    let r1 = registry
        .create_api_spec(&version, "s", &spec_body("X"))
        .await
        .expect("create spec");

    let current = registry.get_api_spec(&spec).await.expect("get spec");
    assert_eq!(current.revision_id, r1.revision_id);
    assert_eq!(
        current.revision_create_time, current.revision_update_time,
        "a fresh revision has not been updated"
    );
    assert_eq!(current.size_bytes, 1);

    let body = ApiSpec {
        name: spec.clone(),
        ..spec_body("Y")
    };
    let r2 = registry
        .update_api_spec(&body, None, false)
        .await
        .expect("update contents");
    assert_ne!(r2.revision_id, r1.revision_id, "new contents create a new revision");

    let revisions = registry
        .list_api_spec_revisions(&ListRequest::new(format!("{spec}@-")))
        .await
        .expect("list revisions");
    assert_eq!(
        revision_ids(&revisions.items),
        vec![r2.revision_id.clone(), r1.revision_id.clone()],
        "revisions are listed newest first"
    );
    assert!(revisions.next_page_token.is_empty());

    let r3 = registry
        .rollback_api_spec(&spec, &r1.revision_id)
        .await
        .expect("rollback");
    assert_ne!(r3.revision_id, r1.revision_id);
    assert_ne!(r3.revision_id, r2.revision_id);
    assert_eq!(r3.hash, r1.hash);

    let contents = registry
        .get_api_spec_contents(&format!("{spec}@{}", r3.revision_id))
        .await
        .expect("rolled back contents");
    assert_eq!(contents.data, b"X");
    assert_eq!(contents.mime_type, YAML);

    let current = registry.get_api_spec(&spec).await.expect("current spec");
    assert_eq!(current.revision_id, r3.revision_id, "rollback becomes current");

    registry
        .delete_project(&format!("projects/{project_id}"), true)
        .await
        .expect("clean up project");
}

#[tokio::test]
async fn test_spec_lifecycle_sqlite() {
    let registry = registry().await;
    run_scenario(&registry, "p").await;
}

#[tokio::test]
async fn test_spec_lifecycle_postgres() {
    let Some(registry) = postgres_registry().await else {
        return;
    };
    let suffix = api_registry::storage::new_revision_id();
    run_scenario(&registry, &format!("scenario-{suffix}")).await;
}

#[tokio::test]
async fn test_mutations_are_announced_after_commit() {
    let (registry, notifier) = recording_registry().await;
    seed_spec(&registry, "X").await;
    let updated = update_contents(&registry, "Y").await;

    // A failed create announces nothing.
    registry
        .create_project("p", &Project::default())
        .await
        .expect_err("project already exists");

    registry.delete_project(PROJECT, true).await.expect("delete");

    let events = notifier.events();
    assert_eq!(
        events,
        vec![
            (ChangeType::Created, PROJECT.to_string()),
            (ChangeType::Created, API.to_string()),
            (ChangeType::Created, VERSION.to_string()),
            (ChangeType::Created, SPEC.to_string()),
            (ChangeType::Updated, SPEC.to_string()),
            (ChangeType::Deleted, PROJECT.to_string()),
        ]
    );
    assert!(!updated.revision_id.is_empty());
}

#[tokio::test]
async fn test_create_requires_parent_and_unique_id() {
    let registry = registry().await;

    let err = registry
        .create_api(LOCATED, "a", &Api::default())
        .await
        .expect_err("project does not exist");
    assert_eq!(err.code(), Code::NotFound);

    seed_version(&registry).await;
    let err = registry
        .create_api(LOCATED, "a", &Api::default())
        .await
        .expect_err("api exists");
    assert_eq!(err.code(), Code::AlreadyExists);

    let invalid_ids = vec!["Upper", "under_score", "-leading", "trailing-", ""];
    for id in invalid_ids {
        let err = registry
            .create_api(LOCATED, id, &Api::default())
            .await
            .expect_err(&format!("id '{id}' should be rejected"));
        assert_eq!(err.code(), Code::InvalidArgument, "id '{id}'");
    }
}

#[tokio::test]
async fn test_update_with_masks() {
    let registry = registry().await;
    seed_version(&registry).await;

    let body = Api {
        name: API.to_string(),
        display_name: "Petstore".to_string(),
        description: "Pets".to_string(),
        ..Api::default()
    };
    registry.update_api(&body, None, false).await.expect("update populated");

    let body = Api {
        name: API.to_string(),
        display_name: "Renamed".to_string(),
        description: "ignored".to_string(),
        ..Api::default()
    };
    let api = registry
        .update_api(&body, Some(&FieldMask::new(["display_name"])), false)
        .await
        .expect("update display_name");
    assert_eq!(api.display_name, "Renamed");
    assert_eq!(api.description, "Pets", "unmasked fields are kept");

    let body = Api {
        name: API.to_string(),
        display_name: "Only".to_string(),
        ..Api::default()
    };
    let api = registry
        .update_api(&body, Some(&FieldMask::all()), false)
        .await
        .expect("update all");
    assert_eq!(api.display_name, "Only");
    assert_eq!(api.description, "", "wildcard mask resets unset fields");

    let err = registry
        .update_api(&body, Some(&FieldMask::new(["create_time"])), false)
        .await
        .expect_err("output field in mask");
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_update_rejects_revision_names() {
    let registry = registry().await;
    let spec = seed_spec(&registry, "X").await;

    let body = ApiSpec {
        name: format!("{SPEC}@{}", spec.revision_id),
        description: "pinned".to_string(),
        ..ApiSpec::default()
    };
    let err = registry
        .update_api_spec(&body, None, false)
        .await
        .expect_err("revision suffix on update");
    assert_eq!(err.code(), Code::InvalidArgument);
}
