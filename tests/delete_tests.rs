//! # Cascading delete tests
//!
//! Forced deletes leave no rows behind in any table; unforced deletes of a
//! resource with children fail without removing anything.

mod common;

use api_registry::prelude::*;
use api_registry::storage::entities::{
    ApiEntity, ArtifactEntity, BlobEntity, DeploymentEntity, DeploymentRevisionTagEntity,
    ProjectEntity, SpecEntity, SpecRevisionTagEntity, VersionEntity,
};
use common::*;
use sea_orm::{EntityTrait, PaginatorTrait};

/// Row counts of every table, in a fixed order
async fn table_counts(registry: &Registry) -> Vec<(&'static str, u64)> {
    async fn count<E: EntityTrait>(registry: &Registry) -> u64
    where
        E::Model: Sync,
    {
        E::find().count(registry.db()).await.expect("count rows")
    }

    vec![
        ("projects", count::<ProjectEntity>(registry).await),
        ("apis", count::<ApiEntity>(registry).await),
        ("versions", count::<VersionEntity>(registry).await),
        ("specs", count::<SpecEntity>(registry).await),
        ("spec_revision_tags", count::<SpecRevisionTagEntity>(registry).await),
        ("deployments", count::<DeploymentEntity>(registry).await),
        ("deployment_revision_tags", count::<DeploymentRevisionTagEntity>(registry).await),
        ("artifacts", count::<ArtifactEntity>(registry).await),
        ("blobs", count::<BlobEntity>(registry).await),
    ]
}

fn total(counts: &[(&str, u64)]) -> u64 {
    counts.iter().map(|(_, count)| count).sum()
}

/// A project with at least one row in every table
async fn populate(registry: &Registry) {
    let spec = seed_spec(registry, "X").await;
    update_contents(registry, "Y").await;
    registry
        .tag_api_spec_revision(&format!("{SPEC}@{}", spec.revision_id), "first")
        .await
        .expect("tag spec");

    let body = ApiDeployment {
        api_spec_revision: format!("{SPEC}@{}", spec.revision_id),
        ..ApiDeployment::default()
    };
    registry
        .create_api_deployment(API, "d", &body)
        .await
        .expect("create deployment");
    registry
        .tag_api_deployment_revision(DEPLOYMENT, "live")
        .await
        .expect("tag deployment");

    let artifact = Artifact {
        mime_type: "text/plain".to_string(),
        contents: b"notes".to_vec(),
        ..Artifact::default()
    };
    for parent in [LOCATED, API, VERSION, SPEC, DEPLOYMENT] {
        registry
            .create_artifact(parent, "notes", &artifact)
            .await
            .unwrap_or_else(|e| panic!("artifact under {parent}: {e}"));
    }
}

#[tokio::test]
async fn test_forced_project_delete_leaves_nothing() {
    let registry = registry().await;
    populate(&registry).await;

    let before = table_counts(&registry).await;
    assert!(
        before.iter().all(|(_, count)| *count > 0),
        "every table is populated: {before:?}"
    );

    registry.delete_project(PROJECT, true).await.expect("forced delete");

    let after = table_counts(&registry).await;
    assert_eq!(total(&after), 0, "rows left behind: {after:?}");
}

#[tokio::test]
async fn test_unforced_delete_with_children_changes_nothing() {
    let registry = registry().await;
    populate(&registry).await;
    let before = table_counts(&registry).await;

    let err = registry.delete_project(PROJECT, false).await.expect_err("project has apis");
    assert_eq!(err.code(), Code::FailedPrecondition);
    let err = registry.delete_api(API, false).await.expect_err("api has versions");
    assert_eq!(err.code(), Code::FailedPrecondition);
    let err = registry.delete_api_version(VERSION, false).await.expect_err("version has specs");
    assert_eq!(err.code(), Code::FailedPrecondition);
    let err = registry.delete_api_spec(SPEC, false).await.expect_err("spec has artifacts");
    assert_eq!(err.code(), Code::FailedPrecondition);
    let err = registry
        .delete_api_deployment(DEPLOYMENT, false)
        .await
        .expect_err("deployment has artifacts");
    assert_eq!(err.code(), Code::FailedPrecondition);

    assert_eq!(table_counts(&registry).await, before, "failed deletes remove nothing");
    registry.get_api_spec(SPEC).await.expect("spec still readable");
}

#[tokio::test]
async fn test_tags_and_contents_do_not_block() {
    let registry = registry().await;
    let spec = seed_spec(&registry, "X").await;
    registry
        .tag_api_spec_revision(&format!("{SPEC}@{}", spec.revision_id), "prod")
        .await
        .expect("tag");

    registry
        .delete_api_spec(SPEC, false)
        .await
        .expect("revisions, tags and contents are part of the spec");

    let err = registry.get_api_spec(SPEC).await.expect_err("spec gone");
    assert_eq!(err.code(), Code::NotFound);
    let counts = table_counts(&registry).await;
    let leftover: Vec<_> = counts
        .iter()
        .filter(|(table, count)| {
            *count > 0 && ["specs", "spec_revision_tags", "blobs"].contains(table)
        })
        .collect();
    assert!(leftover.is_empty(), "spec rows left behind: {leftover:?}");

    // The version is now childless and can go without force.
    registry
        .delete_api_version(VERSION, false)
        .await
        .expect("empty version");
}

#[tokio::test]
async fn test_delete_scopes_to_the_named_resource() {
    let registry = registry().await;
    seed_spec(&registry, "X").await;
    registry
        .create_api_version(API, "v2", &Version::default())
        .await
        .expect("sibling version");
    registry
        .create_api_spec(&format!("{API}/versions/v2"), "s", &spec_body("Z"))
        .await
        .expect("sibling spec");

    registry.delete_api_version(VERSION, true).await.expect("delete v1");

    let sibling = registry
        .get_api_spec(&format!("{API}/versions/v2/specs/s"))
        .await
        .expect("sibling spec survives");
    let contents = registry
        .get_api_spec_contents(&sibling.name)
        .await
        .expect("sibling contents survive");
    assert_eq!(contents.data, b"Z");
}

#[tokio::test]
async fn test_delete_missing_and_malformed() {
    let registry = registry().await;

    let err = registry.delete_project("projects/nope", true).await.expect_err("missing");
    assert_eq!(err.code(), Code::NotFound);
    let err = registry
        .delete_api("projects/-/locations/global/apis/-", true)
        .await
        .expect_err("wildcard");
    assert_eq!(err.code(), Code::InvalidArgument);
    let err = registry.delete_artifact("projects/p/locations/global/artifacts/x")
        .await
        .expect_err("missing artifact");
    assert_eq!(err.code(), Code::NotFound);
}
