//! # Revision store tests
//!
//! Revision creation rules, tag resolution, rollback and revision deletion for
//! specs and deployments.

mod common;

use api_registry::prelude::*;
use common::*;

#[tokio::test]
async fn test_metadata_update_keeps_revision() {
    let registry = registry().await;
    let created = seed_spec(&registry, "X").await;

    let body = ApiSpec {
        name: SPEC.to_string(),
        description: "same every time".to_string(),
        ..ApiSpec::default()
    };
    let mask = FieldMask::new(["description"]);
    let first = registry
        .update_api_spec(&body, Some(&mask), false)
        .await
        .expect("first update");
    let second = registry
        .update_api_spec(&body, Some(&mask), false)
        .await
        .expect("second update");

    assert_eq!(first.revision_id, created.revision_id);
    assert_eq!(second.revision_id, created.revision_id);
    assert!(
        second.revision_update_time > first.revision_update_time,
        "every update advances revision_update_time"
    );
    assert_eq!(second.revision_create_time, created.revision_create_time);
    assert_eq!(second.description, "same every time");

    let revisions = registry
        .list_api_spec_revisions(&ListRequest::new(SPEC))
        .await
        .expect("list revisions");
    assert_eq!(revisions.items.len(), 1);
}

#[tokio::test]
async fn test_content_update_creates_revision() {
    let registry = registry().await;
    let first = seed_spec(&registry, "X").await;

    let second = update_contents(&registry, "Y").await;
    assert_ne!(second.revision_id, first.revision_id);
    assert_ne!(second.hash, first.hash);
    assert_eq!(second.create_time, first.create_time, "create_time belongs to the spec");
    assert!(second.revision_create_time > first.revision_create_time);

    // Resubmitting identical contents is a metadata update.
    let third = update_contents(&registry, "Y").await;
    assert_eq!(third.revision_id, second.revision_id);

    let old = registry
        .get_api_spec_contents(&format!("{SPEC}@{}", first.revision_id))
        .await
        .expect("old revision contents");
    assert_eq!(old.data, b"X", "earlier revisions keep their contents");
}

#[tokio::test]
async fn test_tag_resolves_like_revision() {
    let registry = registry().await;
    let first = seed_spec(&registry, "X").await;
    let by_revision = format!("{SPEC}@{}", first.revision_id);

    let tagged = registry
        .tag_api_spec_revision(&by_revision, "prod")
        .await
        .expect("tag revision");
    assert_eq!(tagged.name, format!("{SPEC}@prod"));
    assert_eq!(tagged.revision_tags, vec!["prod".to_string()]);

    update_contents(&registry, "Y").await;

    let via_tag = registry.get_api_spec(&format!("{SPEC}@prod")).await.expect("get by tag");
    let via_id = registry.get_api_spec(&by_revision).await.expect("get by id");
    assert_eq!(via_tag.revision_id, first.revision_id, "tag still points at the tagged revision");
    assert_eq!(via_tag.hash, via_id.hash);

    let via_tag_path = registry
        .get_api_spec_contents(&format!("{SPEC}/tags/prod"))
        .await
        .expect("contents by tag path");
    assert_eq!(via_tag_path.data, b"X");
}

#[tokio::test]
async fn test_tags_move_and_validate() {
    let registry = registry().await;
    let first = seed_spec(&registry, "X").await;
    let second = update_contents(&registry, "Y").await;

    registry
        .tag_api_spec_revision(&format!("{SPEC}@{}", first.revision_id), "stable")
        .await
        .expect("tag first");
    // Tagging a tag tags the revision it resolves to.
    registry
        .tag_api_spec_revision(&format!("{SPEC}@stable"), "lts")
        .await
        .expect("tag through tag");
    registry
        .tag_api_spec_revision(SPEC, "stable")
        .await
        .expect("move tag to current");

    let stable = registry.get_api_spec(&format!("{SPEC}@stable")).await.expect("stable");
    assert_eq!(stable.revision_id, second.revision_id, "tag moved to the current revision");
    let lts = registry.get_api_spec(&format!("{SPEC}@lts")).await.expect("lts");
    assert_eq!(lts.revision_id, first.revision_id);
    assert_eq!(lts.revision_tags, vec!["lts".to_string()]);

    for tag in ["Bad_Tag", "", "-"] {
        let err = registry
            .tag_api_spec_revision(SPEC, tag)
            .await
            .expect_err(&format!("tag '{tag}' should be rejected"));
        assert_eq!(err.code(), Code::InvalidArgument, "tag '{tag}'");
    }

    let err = registry
        .tag_api_spec_revision(SPEC, &first.revision_id)
        .await
        .expect_err("tag shadowing a revision id");
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = registry
        .get_api_spec(&format!("{SPEC}@missing"))
        .await
        .expect_err("unknown tag");
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn test_rollback_never_reuses_ids() {
    let registry = registry().await;
    let first = seed_spec(&registry, "X").await;
    update_contents(&registry, "Y").await;
    registry
        .tag_api_spec_revision(&format!("{SPEC}@{}", first.revision_id), "golden")
        .await
        .expect("tag");

    let by_id = registry
        .rollback_api_spec(SPEC, &first.revision_id)
        .await
        .expect("rollback by id");
    let by_tag = registry
        .rollback_api_spec(SPEC, "golden")
        .await
        .expect("rollback by tag");

    let revisions = registry
        .list_api_spec_revisions(&ListRequest::new(format!("{SPEC}@-")))
        .await
        .expect("list");
    let ids = revision_ids(&revisions.items);
    assert_eq!(ids.len(), 4);
    assert_eq!(ids[0], by_tag.revision_id);
    assert_eq!(ids[1], by_id.revision_id);
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len(), "revision ids are never reused: {ids:?}");

    for rolled_back in [&by_id, &by_tag] {
        assert_eq!(rolled_back.hash, first.hash);
        assert_eq!(rolled_back.size_bytes, first.size_bytes);
        assert!(rolled_back.revision_tags.is_empty(), "tags stay on the original revision");
    }

    let err = registry.rollback_api_spec(SPEC, "").await.expect_err("empty id");
    assert_eq!(err.code(), Code::InvalidArgument);
    let err = registry
        .rollback_api_spec(SPEC, "nope")
        .await
        .expect_err("unknown revision");
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn test_delete_spec_revision() {
    let (registry, notifier) = recording_registry().await;
    let first = seed_spec(&registry, "X").await;
    let second = update_contents(&registry, "Y").await;
    registry
        .tag_api_spec_revision(&format!("{SPEC}@{}", second.revision_id), "latest")
        .await
        .expect("tag");

    let current = registry
        .delete_api_spec_revision(&format!("{SPEC}@latest"))
        .await
        .expect("delete by tag");
    assert_eq!(current.revision_id, first.revision_id, "the previous revision is current again");
    assert_eq!(current.name, SPEC);

    let err = registry
        .get_api_spec(&format!("{SPEC}@latest"))
        .await
        .expect_err("tag went with its revision");
    assert_eq!(err.code(), Code::NotFound);
    let err = registry
        .get_api_spec_contents(&format!("{SPEC}@{}", second.revision_id))
        .await
        .expect_err("contents went with the revision");
    assert_eq!(err.code(), Code::NotFound);

    let err = registry
        .delete_api_spec_revision(&format!("{SPEC}@{}", first.revision_id))
        .await
        .expect_err("only revision");
    assert_eq!(err.code(), Code::FailedPrecondition);
    let still_there = registry.get_api_spec(SPEC).await.expect("spec survives");
    assert_eq!(still_there.revision_id, first.revision_id);

    let err = registry.delete_api_spec_revision(SPEC).await.expect_err("no revision");
    assert_eq!(err.code(), Code::InvalidArgument);

    assert!(notifier
        .events()
        .contains(&(ChangeType::Deleted, format!("{SPEC}@{}", second.revision_id))));
}

#[tokio::test]
async fn test_compressed_contents_must_be_gzip() {
    let registry = registry().await;
    seed_version(&registry).await;

    let body = ApiSpec {
        mime_type: "application/x.openapi+gzip;version=3".to_string(),
        contents: b"openapi: 3.0.0".to_vec(),
        ..ApiSpec::default()
    };
    let err = registry
        .create_api_spec(VERSION, "zipped", &body)
        .await
        .expect_err("plain text declared as gzip");
    assert_eq!(err.code(), Code::FailedPrecondition);

    let body = ApiSpec {
        contents: vec![0x1f, 0x8b, 0x08, 0x00, 0x00],
        ..body
    };
    let spec = registry
        .create_api_spec(VERSION, "zipped", &body)
        .await
        .expect("gzip contents");
    let contents = registry
        .get_api_spec_contents(&spec.name)
        .await
        .expect("contents");
    assert_eq!(contents.data, vec![0x1f, 0x8b, 0x08, 0x00, 0x00], "stored as given");

    // Declaring plain contents as gzip after the fact is rejected too.
    let plain = registry
        .create_api_spec(VERSION, "plain", &spec_body("openapi: 3.0.0"))
        .await
        .expect("plain spec");
    let body = ApiSpec {
        name: plain.name.clone(),
        mime_type: "application/x.openapi+gzip".to_string(),
        ..ApiSpec::default()
    };
    let err = registry
        .update_api_spec(&body, Some(&FieldMask::new(["mime_type"])), false)
        .await
        .expect_err("mime type no longer matches contents");
    assert_eq!(err.code(), Code::FailedPrecondition);
}

#[tokio::test]
async fn test_deployment_revisions() {
    let registry = registry().await;
    let spec = seed_spec(&registry, "X").await;
    let served = format!("{SPEC}@{}", spec.revision_id);

    let body = ApiDeployment {
        display_name: "Production".to_string(),
        api_spec_revision: served.clone(),
        endpoint_uri: "https://pets.example.com".to_string(),
        ..ApiDeployment::default()
    };
    let first = registry
        .create_api_deployment(API, "d", &body)
        .await
        .expect("create deployment");
    assert_eq!(first.name, DEPLOYMENT);
    assert_eq!(first.revision_create_time, first.revision_update_time);

    let body = ApiDeployment {
        name: DEPLOYMENT.to_string(),
        endpoint_uri: "https://pets.example.org".to_string(),
        ..ApiDeployment::default()
    };
    let moved = registry
        .update_api_deployment(&body, None, false)
        .await
        .expect("change endpoint");
    assert_eq!(moved.revision_id, first.revision_id, "endpoint changes stay in place");
    assert!(moved.revision_update_time > first.revision_update_time);

    let second_spec = update_contents(&registry, "Y").await;
    let body = ApiDeployment {
        name: DEPLOYMENT.to_string(),
        api_spec_revision: format!("{SPEC}@{}", second_spec.revision_id),
        ..ApiDeployment::default()
    };
    let redeployed = registry
        .update_api_deployment(&body, None, false)
        .await
        .expect("serve new spec revision");
    assert_ne!(redeployed.revision_id, first.revision_id);
    assert_eq!(redeployed.endpoint_uri, "https://pets.example.org");

    registry
        .tag_api_deployment_revision(&format!("{DEPLOYMENT}@{}", first.revision_id), "blue")
        .await
        .expect("tag");
    let rolled_back = registry
        .rollback_api_deployment(DEPLOYMENT, "blue")
        .await
        .expect("rollback");
    assert_eq!(rolled_back.api_spec_revision, served);

    let revisions = registry
        .list_api_deployment_revisions(&ListRequest::new(format!("{DEPLOYMENT}@-")))
        .await
        .expect("list revisions");
    let ids: Vec<_> = revisions.items.iter().map(|d| d.revision_id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            rolled_back.revision_id.clone(),
            redeployed.revision_id.clone(),
            first.revision_id.clone()
        ]
    );
    assert!(revisions.items.iter().all(|d| d.name.contains('@')), "revision names are pinned");

    let current = registry
        .delete_api_deployment_revision(&format!("{DEPLOYMENT}@{}", rolled_back.revision_id))
        .await
        .expect("delete current revision");
    assert_eq!(current.revision_id, redeployed.revision_id);

    let body = ApiDeployment {
        name: DEPLOYMENT.to_string(),
        api_spec_revision: "not-a-spec".to_string(),
        ..ApiDeployment::default()
    };
    let err = registry
        .update_api_deployment(&body, None, false)
        .await
        .expect_err("malformed spec pointer");
    assert_eq!(err.code(), Code::InvalidArgument);
}
