//! # Listing tests
//!
//! Page sizes, page tokens, ordering, filters and wildcard parents.

mod common;

use api_registry::prelude::*;
use common::*;
use std::collections::BTreeSet;

async fn seed_projects(registry: &Registry, count: usize) {
    for i in 0..count {
        registry
            .create_project(&format!("p{i:04}"), &Project::default())
            .await
            .expect("create project");
    }
}

#[tokio::test]
async fn test_page_size_defaults_and_limits() {
    let registry = registry().await;
    seed_projects(&registry, 1005).await;

    let page = registry
        .list_projects(&ListRequest::default())
        .await
        .expect("default page");
    assert_eq!(page.items.len(), 50);
    assert!(!page.next_page_token.is_empty());

    let page = registry
        .list_projects(&ListRequest::default().with_page_size(1500))
        .await
        .expect("clamped page");
    assert_eq!(page.items.len(), 1000);
    assert!(!page.next_page_token.is_empty());

    let rest = registry
        .list_projects(&ListRequest::default().with_page_size(1500).with_page_token(page.next_page_token))
        .await
        .expect("last page");
    assert_eq!(rest.items.len(), 5);
    assert!(rest.next_page_token.is_empty());

    let err = registry
        .list_projects(&ListRequest::default().with_page_size(-1))
        .await
        .expect_err("negative page size");
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_pages_resume_without_gaps() {
    let registry = registry().await;
    seed_projects(&registry, 7).await;

    let mut seen = Vec::new();
    let mut token = String::new();
    loop {
        let page = registry
            .list_projects(&ListRequest::default().with_page_size(3).with_page_token(token))
            .await
            .expect("page");
        assert!(page.items.len() <= 3);
        seen.extend(page.items.into_iter().map(|p| p.name));
        if page.next_page_token.is_empty() {
            break;
        }
        token = page.next_page_token;
    }

    let expected: Vec<String> = (0..7).map(|i| format!("projects/p{i:04}")).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_exact_final_page_has_no_token() {
    let registry = registry().await;
    seed_projects(&registry, 4).await;

    let page = registry
        .list_projects(&ListRequest::default().with_page_size(4))
        .await
        .expect("page");
    assert_eq!(page.items.len(), 4);
    assert!(page.next_page_token.is_empty(), "no further rows means no token");
}

#[tokio::test]
async fn test_filtered_pages() {
    let registry = registry().await;
    for i in 0..10 {
        let body = Project {
            description: if i % 2 == 0 { "even" } else { "odd" }.to_string(),
            ..Project::default()
        };
        registry
            .create_project(&format!("p{i:04}"), &body)
            .await
            .expect("create project");
    }

    let filter = "description == 'even'";
    let first = registry
        .list_projects(&ListRequest::default().with_filter(filter).with_page_size(2))
        .await
        .expect("first page");
    let names: Vec<_> = first.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["projects/p0000", "projects/p0002"]);

    let second = registry
        .list_projects(
            &ListRequest::default()
                .with_filter(filter)
                .with_page_size(2)
                .with_page_token(first.next_page_token.clone()),
        )
        .await
        .expect("second page");
    let names: Vec<_> = second.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["projects/p0004", "projects/p0006"]);

    let err = registry
        .list_projects(
            &ListRequest::default()
                .with_filter("description == 'odd'")
                .with_page_size(2)
                .with_page_token(first.next_page_token.clone()),
        )
        .await
        .expect_err("filter changed between pages");
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = registry
        .list_projects(
            &ListRequest::default()
                .with_filter(filter)
                .with_order_by("description")
                .with_page_token(first.next_page_token),
        )
        .await
        .expect_err("order changed between pages");
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = registry
        .list_projects(&ListRequest::default().with_page_token("garbage!"))
        .await
        .expect_err("malformed token");
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_order_by() {
    let registry = registry().await;
    for (id, name) in [("a", "Charlie"), ("b", "Alpha"), ("c", "Bravo")] {
        let body = Project {
            display_name: name.to_string(),
            ..Project::default()
        };
        registry.create_project(id, &body).await.expect("create project");
    }

    let page = registry
        .list_projects(&ListRequest::default().with_order_by("display_name desc"))
        .await
        .expect("ordered");
    let names: Vec<_> = page.items.iter().map(|p| p.display_name.as_str()).collect();
    assert_eq!(names, vec!["Charlie", "Bravo", "Alpha"]);

    let page = registry
        .list_projects(&ListRequest::default().with_order_by("display_name"))
        .await
        .expect("ascending");
    assert_eq!(page.items[0].display_name, "Alpha");

    for order_by in ["color", "display_name sideways"] {
        let err = registry
            .list_projects(&ListRequest::default().with_order_by(order_by))
            .await
            .expect_err(&format!("order_by '{order_by}'"));
        assert_eq!(err.code(), Code::InvalidArgument, "order_by '{order_by}'");
    }
}

#[tokio::test]
async fn test_label_filters() {
    let registry = registry().await;
    registry
        .create_project("p", &Project::default())
        .await
        .expect("create project");
    for (id, team) in [("a", Some("payments")), ("b", Some("search")), ("c", None)] {
        let body = Api {
            labels: team
                .map(|team| Labels::from([("team".to_string(), team.to_string())]))
                .unwrap_or_default(),
            ..Api::default()
        };
        registry.create_api(LOCATED, id, &body).await.expect("create api");
    }

    let ids = |page: ListResponse<Api>| -> Vec<String> {
        page.items
            .into_iter()
            .map(|api| api.name.rsplit('/').next().unwrap_or_default().to_string())
            .collect()
    };

    let cases = vec![
        ("labels.team == 'payments'", vec!["a"]),
        ("has(labels.team)", vec!["a", "b"]),
        ("!has(labels.team)", vec!["c"]),
        ("'team' in labels && labels.team != 'payments'", vec!["b"]),
        ("api_id.startsWith('a') || api_id == 'c'", vec!["a", "c"]),
        ("'pay' in labels.team.split('m')", vec!["a"]),
    ];
    for (filter, expected) in cases {
        let page = registry
            .list_apis(&ListRequest::new(LOCATED).with_filter(filter))
            .await
            .unwrap_or_else(|e| panic!("filter '{filter}' failed: {e}"));
        assert_eq!(ids(page), expected, "filter '{filter}'");
    }

    for filter in ["labels ==", "color == 'red'", "labels"] {
        let err = registry
            .list_apis(&ListRequest::new(LOCATED).with_filter(filter))
            .await
            .expect_err(&format!("filter '{filter}'"));
        assert_eq!(err.code(), Code::InvalidArgument, "filter '{filter}'");
    }
}

#[tokio::test]
async fn test_oversized_filters_are_rejected() {
    let registry = registry().await;
    seed_projects(&registry, 3).await;

    let filters = vec![
        format!("{}{}", "(".repeat(5000), ")".repeat(5000)),
        format!("{}project_id != 'x'{}", "(".repeat(100), ")".repeat(100)),
        format!("{}true", "!".repeat(1000)),
        vec!["project_id != 'x'"; 200_000].join(" && "),
    ];
    for filter in filters {
        let err = registry
            .list_projects(&ListRequest::default().with_filter(filter))
            .await
            .expect_err("filter is too large");
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    let long_chain = vec!["project_id != 'x'"; 300].join(" && ");
    let page = registry
        .list_projects(&ListRequest::default().with_filter(long_chain))
        .await
        .expect("a long flat chain is fine");
    assert_eq!(page.items.len(), 3);
}

#[tokio::test]
async fn test_list_parent_must_exist() {
    let registry = registry().await;
    seed_version(&registry).await;

    let missing = vec![
        "projects/nope/locations/global",
        "projects/p/locations/global/apis/nope",
        "projects/p/locations/global/apis/a/versions/nope",
    ];
    let err = registry
        .list_apis(&ListRequest::new(missing[0]))
        .await
        .expect_err("missing project");
    assert_eq!(err.code(), Code::NotFound);
    let err = registry
        .list_api_versions(&ListRequest::new(missing[1]))
        .await
        .expect_err("missing api");
    assert_eq!(err.code(), Code::NotFound);
    let err = registry
        .list_api_specs(&ListRequest::new(missing[2]))
        .await
        .expect_err("missing version");
    assert_eq!(err.code(), Code::NotFound);

    // Wildcard parents never fail for lack of matches.
    let page = registry
        .list_api_specs(&ListRequest::new("projects/-/locations/global/apis/-/versions/-"))
        .await
        .expect("wildcard parent");
    assert!(page.items.is_empty());

    let err = registry
        .list_apis(&ListRequest::new("widgets/p"))
        .await
        .expect_err("malformed parent");
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_wildcard_lists_match_union_of_parents() {
    let registry = registry().await;
    registry
        .create_project("p", &Project::default())
        .await
        .expect("create project");

    let mut pairs = Vec::new();
    for api_id in ["a", "b"] {
        let api = registry
            .create_api(LOCATED, api_id, &Api::default())
            .await
            .expect("create api");
        for version_id in ["v1", "v2"] {
            let version = registry
                .create_api_version(&api.name, version_id, &Version::default())
                .await
                .expect("create version");
            for artifact_id in ["x", "y"] {
                registry
                    .create_artifact(&version.name, artifact_id, &Artifact::default())
                    .await
                    .expect("create artifact");
            }
            pairs.push(version.name);
        }
    }
    // Artifacts attached higher up are not part of a version listing.
    registry
        .create_artifact(API, "z", &Artifact::default())
        .await
        .expect("api artifact");

    let wildcard: BTreeSet<String> = registry
        .list_artifacts(&ListRequest::new("projects/p/locations/global/apis/-/versions/-").with_page_size(100))
        .await
        .expect("wildcard list")
        .items
        .into_iter()
        .map(|a| a.name)
        .collect();

    let mut union = BTreeSet::new();
    for parent in &pairs {
        let page = registry
            .list_artifacts(&ListRequest::new(parent.as_str()))
            .await
            .expect("per-parent list");
        union.extend(page.items.into_iter().map(|a| a.name));
    }

    assert_eq!(wildcard.len(), 8);
    assert_eq!(wildcard, union);

    let versions = registry
        .list_api_versions(&ListRequest::new("projects/-/locations/global/apis/-"))
        .await
        .expect("versions of every api");
    assert_eq!(versions.items.len(), 4);
}

#[tokio::test]
async fn test_spec_listing_shows_current_revisions() {
    let registry = registry().await;
    let first = seed_spec(&registry, "X").await;
    let second = update_contents(&registry, "Y").await;
    registry
        .create_api_spec(VERSION, "t", &spec_body("Z"))
        .await
        .expect("second spec");

    let page = registry
        .list_api_specs(&ListRequest::new(VERSION))
        .await
        .expect("list specs");
    let names: Vec<_> = page.items.iter().map(|s| s.name.clone()).collect();
    assert_eq!(names, vec![SPEC.to_string(), format!("{VERSION}/specs/t")]);
    assert_eq!(page.items[0].revision_id, second.revision_id);

    let all = registry
        .list_api_spec_revisions(&ListRequest::new(format!("{VERSION}/specs/-@-")))
        .await
        .expect("every revision of every spec");
    assert_eq!(all.items.len(), 3);

    let filtered = registry
        .list_api_spec_revisions(
            &ListRequest::new(SPEC).with_filter(format!("revision_id == '{}'", first.revision_id)),
        )
        .await
        .expect("filtered revisions");
    assert_eq!(filtered.items.len(), 1);
    assert_eq!(filtered.items[0].name, format!("{SPEC}@{}", first.revision_id));
}
