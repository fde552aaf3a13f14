//! End-to-end tests for remote bootstrapping against a mock hosting service.

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use httpmock::prelude::*;
use scaffold::bootstrap::{
    Collaborators, CredentialIssuer, MetadataReporter, PackageNamer, ProjectMetadata,
    RemoteBootstrap, RemoteOptions, StaticTokenIssuer,
};
use scaffold::config::{Endpoints, Settings};
use scaffold::error::{ScaffoldError, ValidationRule};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const MANIFEST: &str = r#"{"name": "starter", "dependencies": {"core": "^1"}}"#;
const ENV_EXAMPLE: &str = "# Project settings\nCORE_PROJECT_ID=\nCORE_DATASET=\nOTHER_SETTING=keep\n";

fn settings(server: &MockServer) -> Settings {
    Settings {
        endpoints: Endpoints::single_host(&server.base_url()),
        ..Settings::default()
    }
}

fn options(output: &Path) -> RemoteOptions {
    RemoteOptions {
        reference: "acme/starter".into(),
        output_dir: output.to_path_buf(),
        project_id: "abc123".into(),
        dataset: "production".into(),
        package_name: None,
        api_version: Some("2025-01-01".into()),
    }
}

/// Gzip tarball with every file under a single top-level directory.
fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, body) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("acme-starter-1a2b3c/{path}"), body.as_bytes())
            .unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    std::io::Write::write_all(&mut encoder, &tar).unwrap();
    encoder.finish().unwrap()
}

async fn mock_metadata(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/starter");
            then.status(200)
                .json_body(serde_json::json!({"default_branch": "main"}));
        })
        .await;
}

async fn mock_raw(server: &MockServer, file: &str, body: &str) {
    let path = format!("/acme/starter/main/{file}");
    let body = body.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET).path(path);
            then.status(200).body(body);
        })
        .await;
}

#[tokio::test]
async fn single_package_template_is_materialized() {
    let server = MockServer::start_async().await;
    mock_metadata(&server).await;
    mock_raw(&server, "package.json", MANIFEST).await;
    mock_raw(&server, "config.ts", "export default {}").await;
    mock_raw(&server, "cli-config.ts", "export default {}").await;
    mock_raw(&server, ".env.example", ENV_EXAMPLE).await;

    let archive = tarball(&[
        ("package.json", MANIFEST),
        ("config.ts", "export default {}"),
        ("cli-config.ts", "export default {}"),
        (".env.example", ENV_EXAMPLE),
        ("schemaTypes/index.ts", "export const schemaTypes = []"),
    ]);
    let download = server
        .mock_async(|when, then| {
            when.method(GET).path("/acme/starter/tar.gz/main");
            then.status(200)
                .header("content-type", "application/x-gzip")
                .body(archive);
        })
        .await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("project");
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, Collaborators::default()).unwrap();

    let outcome = bootstrap.run(&options(&output)).await.unwrap();

    download.assert_async().await;
    assert_eq!(outcome.reference.branch, "main");
    assert_eq!(outcome.packages, vec![String::new()]);
    assert_eq!(outcome.extracted.written, 5);
    assert_eq!(
        fs::read_to_string(output.join("schemaTypes/index.ts")).unwrap(),
        "export const schemaTypes = []"
    );
    assert_eq!(
        fs::read_to_string(output.join(".env")).unwrap(),
        "# Project settings\nCORE_PROJECT_ID=abc123\nCORE_DATASET=production\nOTHER_SETTING=keep\n"
    );
    assert_eq!(
        fs::read_to_string(output.join(".env.example")).unwrap(),
        ENV_EXAMPLE
    );
    assert_eq!(outcome.env_files.len(), 1);
    outcome.metadata_update.await.unwrap();
}

#[tokio::test]
async fn missing_env_template_fails_before_download() {
    let server = MockServer::start_async().await;
    mock_metadata(&server).await;
    mock_raw(&server, "package.json", MANIFEST).await;
    mock_raw(&server, "config.ts", "export default {}").await;
    mock_raw(&server, "cli-config.ts", "export default {}").await;

    let download = server
        .mock_async(|when, then| {
            when.method(GET).path("/acme/starter/tar.gz/main");
            then.status(200).body(tarball(&[("package.json", MANIFEST)]));
        })
        .await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("project");
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, Collaborators::default()).unwrap();

    let result = bootstrap.run(&options(&output)).await;

    match result {
        Err(ScaffoldError::ValidationFailed {
            rule: ValidationRule::MissingEnvTemplate { packages, .. },
        }) => assert_eq!(packages, vec!["root"]),
        other => panic!("expected missing env template, got {other:?}"),
    }
    download.assert_calls_async(0).await;
    assert!(!output.exists());
}

#[tokio::test]
async fn monorepo_packages_get_their_own_env_files() {
    let server = MockServer::start_async().await;
    mock_metadata(&server).await;

    let root_manifest = r#"{"private": true, "workspaces": ["./studio", "web/"]}"#;
    let studio_manifest = r#"{"dependencies": {"core": "^1"}}"#;
    let web_manifest = r#"{"dependencies": {"next": "15"}}"#;
    let studio_env = "CORE_STUDIO_PROJECT_ID=\"\"\nCORE_STUDIO_DATASET=\"\"\n";
    let web_env = "NEXT_PUBLIC_CORE_PROJECT_ID=\nNEXT_PUBLIC_CORE_DATASET=\nCORE_API_READ_TOKEN=\n";

    mock_raw(&server, "package.json", root_manifest).await;
    mock_raw(&server, "studio/package.json", studio_manifest).await;
    mock_raw(&server, "studio/config.ts", "").await;
    mock_raw(&server, "studio/cli-config.ts", "").await;
    mock_raw(&server, "studio/.env.template", studio_env).await;
    mock_raw(&server, "web/package.json", web_manifest).await;
    mock_raw(&server, "web/.env.local.example", web_env).await;

    let archive = tarball(&[
        ("package.json", root_manifest),
        ("studio/package.json", studio_manifest),
        ("studio/.env.template", studio_env),
        ("web/package.json", web_manifest),
        ("web/.env.local.example", web_env),
    ]);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/acme/starter/tar.gz/main");
            then.status(200).body(archive);
        })
        .await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("project");
    let collaborators = Collaborators::default()
        .with_credentials(Arc::new(StaticTokenIssuer::new(Some("sk-read".into()))));
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, collaborators).unwrap();

    let outcome = bootstrap.run(&options(&output)).await.unwrap();

    assert_eq!(outcome.packages, vec!["studio", "web"]);
    assert_eq!(
        fs::read_to_string(output.join("studio/.env")).unwrap(),
        "CORE_STUDIO_PROJECT_ID=\"abc123\"\nCORE_STUDIO_DATASET=\"production\"\n"
    );
    assert_eq!(
        fs::read_to_string(output.join("web/.env.local")).unwrap(),
        "NEXT_PUBLIC_CORE_PROJECT_ID=abc123\nNEXT_PUBLIC_CORE_DATASET=production\nCORE_API_READ_TOKEN=sk-read\n"
    );
    let web = outcome
        .env_files
        .iter()
        .find(|e| e.package == "web")
        .unwrap();
    let framework = web.framework.as_ref().unwrap();
    assert_eq!(framework.slug, "nextjs");
    assert_eq!(framework.env_prefix.as_deref(), Some("NEXT_PUBLIC_"));
}

struct CountingIssuer(AtomicUsize);

#[async_trait]
impl CredentialIssuer for CountingIssuer {
    async fn issue_read_token(&self, _project_id: &str) -> scaffold::Result<String> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok("issued".into())
    }
}

#[tokio::test]
async fn read_token_is_only_issued_when_asked_for() {
    let server = MockServer::start_async().await;
    mock_metadata(&server).await;
    mock_raw(&server, "package.json", MANIFEST).await;
    mock_raw(&server, "config.js", "").await;
    mock_raw(&server, "cli-config.js", "").await;
    mock_raw(&server, ".env.example", ENV_EXAMPLE).await;
    let archive = tarball(&[("package.json", MANIFEST), (".env.example", ENV_EXAMPLE)]);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/acme/starter/tar.gz/main");
            then.status(200).body(archive);
        })
        .await;

    let issuer = Arc::new(CountingIssuer(AtomicUsize::new(0)));
    let collaborators = Collaborators::default().with_credentials(issuer.clone());
    let temp = TempDir::new().unwrap();
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, collaborators).unwrap();

    bootstrap.run(&options(&temp.path().join("p"))).await.unwrap();

    assert_eq!(issuer.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn package_name_is_applied() {
    let server = MockServer::start_async().await;
    mock_metadata(&server).await;
    mock_raw(&server, "package.json", MANIFEST).await;
    mock_raw(&server, "config.ts", "").await;
    mock_raw(&server, "cli-config.ts", "").await;
    mock_raw(&server, ".env.example", ENV_EXAMPLE).await;
    let archive = tarball(&[("package.json", MANIFEST), (".env.example", ENV_EXAMPLE)]);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/acme/starter/tar.gz/main");
            then.status(200).body(archive);
        })
        .await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("p");
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, Collaborators::default()).unwrap();
    let mut options = options(&output);
    options.package_name = Some("my-project".into());

    bootstrap.run(&options).await.unwrap();

    let manifest = fs::read_to_string(output.join("package.json")).unwrap();
    assert!(manifest.contains("\"name\": \"my-project\""));
    assert!(manifest.contains("\"core\": \"^1\""));
}

/// Serve a minimal valid single-package template, archive included.
async fn mock_single_package(server: &MockServer) {
    mock_metadata(server).await;
    mock_raw(server, "package.json", MANIFEST).await;
    mock_raw(server, "config.ts", "").await;
    mock_raw(server, "cli-config.ts", "").await;
    mock_raw(server, ".env.example", ENV_EXAMPLE).await;
    let archive = tarball(&[("package.json", MANIFEST), (".env.example", ENV_EXAMPLE)]);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/acme/starter/tar.gz/main");
            then.status(200).body(archive);
        })
        .await;
}

struct BrokenNamer;

#[async_trait]
impl PackageNamer for BrokenNamer {
    async fn apply_name(&self, _project_dir: &Path, _name: &str) -> scaffold::Result<()> {
        Err(anyhow::anyhow!("manifest is read-only").into())
    }
}

#[tokio::test]
async fn package_name_failure_does_not_fail_run() {
    let server = MockServer::start_async().await;
    mock_single_package(&server).await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("p");
    let collaborators = Collaborators::default().with_package_namer(Arc::new(BrokenNamer));
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, collaborators).unwrap();
    let mut options = options(&output);
    options.package_name = Some("my-project".into());

    let outcome = bootstrap.run(&options).await.unwrap();

    assert_eq!(outcome.env_files.len(), 1);
    assert!(fs::read_to_string(output.join(".env"))
        .unwrap()
        .contains("CORE_PROJECT_ID=abc123"));
    assert_eq!(fs::read_to_string(output.join("package.json")).unwrap(), MANIFEST);
}

#[tokio::test]
async fn unparseable_root_manifest_keeps_run_successful() {
    let server = MockServer::start_async().await;
    mock_metadata(&server).await;

    let root_manifest = r#"{"workspaces": ["studio"]}"#;
    let studio_manifest = r#"{"dependencies": {"core": "^1"}}"#;
    mock_raw(&server, "package.json", root_manifest).await;
    mock_raw(&server, "studio/package.json", studio_manifest).await;
    mock_raw(&server, "studio/config.ts", "").await;
    mock_raw(&server, "studio/cli-config.ts", "").await;
    mock_raw(&server, "studio/.env.example", ENV_EXAMPLE).await;

    // Detection reads a good root manifest; the downloaded one is broken.
    let archive = tarball(&[
        ("package.json", "{ not json"),
        ("studio/package.json", studio_manifest),
        ("studio/.env.example", ENV_EXAMPLE),
    ]);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/acme/starter/tar.gz/main");
            then.status(200).body(archive);
        })
        .await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("p");
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, Collaborators::default()).unwrap();
    let mut options = options(&output);
    options.package_name = Some("my-project".into());

    let outcome = bootstrap.run(&options).await.unwrap();

    assert_eq!(outcome.packages, vec!["studio"]);
    assert!(output.join("studio/.env").exists());
    assert_eq!(
        fs::read_to_string(output.join("package.json")).unwrap(),
        "{ not json"
    );
}

struct FailingReporter(AtomicUsize);

#[async_trait]
impl MetadataReporter for FailingReporter {
    async fn report(&self, _metadata: &ProjectMetadata) -> scaffold::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("service unavailable").into())
    }
}

#[tokio::test]
async fn metadata_failure_does_not_fail_run() {
    let server = MockServer::start_async().await;
    mock_single_package(&server).await;

    let reporter = Arc::new(FailingReporter(AtomicUsize::new(0)));
    let collaborators = Collaborators::default().with_metadata(reporter.clone());
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("p");
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, collaborators).unwrap();

    let outcome = bootstrap.run(&options(&output)).await.unwrap();

    assert!(output.join(".env").exists());
    outcome.metadata_update.await.unwrap();
    assert_eq!(reporter.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn private_repository_suggests_token() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/secret");
            then.status(404);
        })
        .await;

    let temp = TempDir::new().unwrap();
    let bootstrap = RemoteBootstrap::new(&settings(&server), None, Collaborators::default()).unwrap();
    let mut options = options(temp.path());
    options.reference = "acme/secret".into();

    let err = bootstrap.run(&options).await.unwrap_err();
    assert!(matches!(err, ScaffoldError::NotFound { .. }));
    assert!(err.to_string().contains("token"));
}
