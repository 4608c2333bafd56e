//! # registry-admin
//!
//! Administrative command-line access to a registry database.
//!
//! ## Usage
//!
//! ```bash
//! # Create any missing tables
//! registry-admin migrate
//!
//! # Show one resource (any kind, including name@revision and tags)
//! registry-admin get projects/demo/locations/global/apis/petstore
//!
//! # List the children of a parent; the kind is inferred from the parent
//! registry-admin list projects/demo/locations/global/apis/-/versions/- --filter 'state == "production"'
//!
//! # Delete a resource and everything under it
//! registry-admin delete projects/demo --force
//! ```
//!
//! The database comes from `REGISTRY_DATABASE_URL` unless `--database-url` is given.

use anyhow::{Context, Result};
use api_registry::config::RegistryConfig;
use api_registry::logging;
use api_registry::models::ListRequest;
use api_registry::names::prelude::*;
use api_registry::Registry;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
);

/// API registry administration
#[derive(Debug, Parser)]
#[command(name = "registry-admin", version, long_version = LONG_VERSION)]
#[command(
    about = "Inspect and maintain an API registry database",
    long_about = None,
    after_help = "\
Examples:
  registry-admin migrate
  registry-admin get projects/demo/locations/global/apis/petstore/versions/v1/specs/openapi@prod
  registry-admin list projects/demo/locations/global --kind artifacts
  registry-admin delete projects/demo/locations/global/apis/petstore --force
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database URL (overrides REGISTRY_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create any missing tables and indexes
    Migrate,

    /// Print one resource as JSON
    Get {
        /// Resource name
        name: String,

        /// Print the stored contents of a spec or artifact instead of its metadata
        #[arg(long)]
        contents: bool,
    },

    /// Print one page of a listing as JSON
    List {
        /// Parent name; any segment may be `-`
        #[arg(default_value = "")]
        parent: String,

        /// Kind to list (inferred from the parent when omitted)
        #[arg(short, long, value_enum)]
        kind: Option<ListKind>,

        /// Filter expression
        #[arg(long, default_value = "")]
        filter: String,

        /// Comma-separated `field [asc|desc]` list
        #[arg(long, default_value = "")]
        order_by: String,

        /// Page size (0 for the default)
        #[arg(long, default_value_t = 0)]
        page_size: i32,

        /// Token from a previous page
        #[arg(long, default_value = "")]
        page_token: String,
    },

    /// Delete a resource, or one revision when the name carries `@revision`
    Delete {
        /// Resource name
        name: String,

        /// Also delete everything under the resource
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListKind {
    Projects,
    Apis,
    Versions,
    Specs,
    SpecRevisions,
    Deployments,
    DeploymentRevisions,
    Artifacts,
}

impl ListKind {
    /// The kind listed under `parent` when none is given
    fn infer(parent: &str) -> Result<Self> {
        if parent.is_empty() {
            return Ok(ListKind::Projects);
        }
        let name = ResourceName::parse(parent)
            .with_context(|| format!("Cannot infer what to list under {parent:?}"))?;
        match name {
            ResourceName::Project(_) => Ok(ListKind::Apis),
            ResourceName::Api(_) => Ok(ListKind::Versions),
            ResourceName::Version(_) => Ok(ListKind::Specs),
            ResourceName::Spec(_) => Ok(ListKind::SpecRevisions),
            ResourceName::Deployment(_) => Ok(ListKind::DeploymentRevisions),
            ResourceName::Artifact(_) => {
                anyhow::bail!("Artifacts have no children; pass --kind to list something else")
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RegistryConfig::from_env();
    if let Some(url) = cli.database_url {
        config = config.with_database_url(url);
    }
    logging::init(&config);

    let registry = Registry::connect(&config)
        .await
        .context("Failed to open the registry database")?;

    match cli.command {
        Commands::Migrate => {
            registry.migrate().await.context("Migration failed")?;
            println!("Schema is up to date");
        }
        Commands::Get { name, contents } => get(&registry, &name, contents).await?,
        Commands::List {
            parent,
            kind,
            filter,
            order_by,
            page_size,
            page_token,
        } => {
            let kind = match kind {
                Some(kind) => kind,
                None => ListKind::infer(&parent)?,
            };
            let request = ListRequest::new(parent)
                .with_filter(filter)
                .with_order_by(order_by)
                .with_page_size(page_size)
                .with_page_token(page_token);
            list(&registry, kind, &request).await?;
        }
        Commands::Delete { name, force } => delete(&registry, &name, force).await?,
    }
    Ok(())
}

async fn get(registry: &Registry, name: &str, contents: bool) -> Result<()> {
    let resource = ResourceName::parse(name).context("Invalid resource name")?;
    let context = || format!("Failed to get {name}");

    if contents {
        let contents = match resource {
            ResourceName::Spec(_) => registry.get_api_spec_contents(name).await,
            ResourceName::Artifact(_) => registry.get_artifact_contents(name).await,
            other => anyhow::bail!("A {} has no stored contents", other.kind()),
        };
        return print_json(&contents.with_context(context)?);
    }

    match resource {
        ResourceName::Project(_) => print_json(&registry.get_project(name).await.with_context(context)?),
        ResourceName::Api(_) => print_json(&registry.get_api(name).await.with_context(context)?),
        ResourceName::Version(_) => {
            print_json(&registry.get_api_version(name).await.with_context(context)?)
        }
        ResourceName::Spec(_) => print_json(&registry.get_api_spec(name).await.with_context(context)?),
        ResourceName::Deployment(_) => {
            print_json(&registry.get_api_deployment(name).await.with_context(context)?)
        }
        ResourceName::Artifact(_) => {
            print_json(&registry.get_artifact(name).await.with_context(context)?)
        }
    }
}

async fn list(registry: &Registry, kind: ListKind, request: &ListRequest) -> Result<()> {
    let context = || format!("Failed to list {kind:?} under {:?}", request.parent);
    match kind {
        ListKind::Projects => print_json(&registry.list_projects(request).await.with_context(context)?),
        ListKind::Apis => print_json(&registry.list_apis(request).await.with_context(context)?),
        ListKind::Versions => {
            print_json(&registry.list_api_versions(request).await.with_context(context)?)
        }
        ListKind::Specs => print_json(&registry.list_api_specs(request).await.with_context(context)?),
        ListKind::SpecRevisions => print_json(
            &registry
                .list_api_spec_revisions(request)
                .await
                .with_context(context)?,
        ),
        ListKind::Deployments => print_json(
            &registry
                .list_api_deployments(request)
                .await
                .with_context(context)?,
        ),
        ListKind::DeploymentRevisions => print_json(
            &registry
                .list_api_deployment_revisions(request)
                .await
                .with_context(context)?,
        ),
        ListKind::Artifacts => {
            print_json(&registry.list_artifacts(request).await.with_context(context)?)
        }
    }
}

async fn delete(registry: &Registry, name: &str, force: bool) -> Result<()> {
    let resource = ResourceName::parse(name).context("Invalid resource name")?;
    let context = || format!("Failed to delete {name}");

    match resource {
        ResourceName::Project(_) => registry.delete_project(name, force).await.with_context(context)?,
        ResourceName::Api(_) => registry.delete_api(name, force).await.with_context(context)?,
        ResourceName::Version(_) => registry
            .delete_api_version(name, force)
            .await
            .with_context(context)?,
        ResourceName::Spec(spec) if spec.has_revision() => {
            let current = registry
                .delete_api_spec_revision(name)
                .await
                .with_context(context)?;
            println!("Deleted {name}; current revision is {}", current.revision_id);
            return Ok(());
        }
        ResourceName::Spec(_) => registry
            .delete_api_spec(name, force)
            .await
            .with_context(context)?,
        ResourceName::Deployment(deployment) if deployment.has_revision() => {
            let current = registry
                .delete_api_deployment_revision(name)
                .await
                .with_context(context)?;
            println!("Deleted {name}; current revision is {}", current.revision_id);
            return Ok(());
        }
        ResourceName::Deployment(_) => registry
            .delete_api_deployment(name, force)
            .await
            .with_context(context)?,
        ResourceName::Artifact(_) => registry.delete_artifact(name).await.with_context(context)?,
    }
    println!("Deleted {name}");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_kind_inference() {
        let cases = vec![
            ("", ListKind::Projects),
            ("projects/p/locations/global", ListKind::Apis),
            ("projects/p/locations/global/apis/-", ListKind::Versions),
            ("projects/p/locations/global/apis/a/versions/v", ListKind::Specs),
            ("projects/p/locations/global/apis/a/versions/v/specs/s", ListKind::SpecRevisions),
            ("projects/p/locations/global/apis/a/deployments/d", ListKind::DeploymentRevisions),
        ];
        for (parent, kind) in cases {
            assert_eq!(ListKind::infer(parent).expect("kind"), kind, "parent '{parent}'");
        }
        assert!(ListKind::infer("projects/p/locations/global/artifacts/x").is_err());
        assert!(ListKind::infer("widgets/w").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["registry-admin", "delete", "projects/p", "--force"])
            .expect("delete parses");
        assert!(matches!(cli.command, Commands::Delete { force: true, .. }));

        let cli = Cli::try_parse_from([
            "registry-admin",
            "list",
            "projects/p/locations/global",
            "--kind",
            "artifacts",
            "--page-size",
            "5",
        ])
        .expect("list parses");
        assert!(matches!(
            cli.command,
            Commands::List {
                kind: Some(ListKind::Artifacts),
                page_size: 5,
                ..
            }
        ));
    }
}
