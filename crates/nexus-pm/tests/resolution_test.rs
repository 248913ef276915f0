/// End-to-end resolution tests
///
/// These run the batch coordinator against a mock repository with the real
/// HTTP downloader and archive extractor.

use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use nexus_pm::{ArtifactOutcome, BatchCoordinator, Phase, TargetConfig};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SNAPSHOT_METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata modelVersion="1.1.0">
  <groupId>com.example</groupId>
  <artifactId>bar</artifactId>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshotVersions>
      <snapshotVersion>
        <extension>tar.gz</extension>
        <value>1.0-20230101.120000-3</value>
      </snapshotVersion>
    </snapshotVersions>
  </versioning>
</metadata>"#;

fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("tmp")).unwrap();
        Self { root }
    }

    fn dest(&self) -> std::path::PathBuf {
        self.root.path().join("deps")
    }

    fn temp(&self) -> std::path::PathBuf {
        self.root.path().join("tmp")
    }

    fn target(&self, server: &MockServer, unpack: bool, deps: &[(&str, &str)]) -> TargetConfig {
        let mut target = TargetConfig {
            base_url: Some(format!("{}/", server.uri())),
            repository: Some("public".to_string()),
            group_id: Some("com.example".to_string()),
            path: Some(format!("{}/", self.dest().display())),
            unpack: Some(unpack),
            temp_dir: Some(self.temp()),
            ..TargetConfig::default()
        };
        for (artifact, version) in deps {
            target.dependencies.insert(artifact.to_string(), version.to_string());
        }
        target
    }
}

fn temp_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_release_is_downloaded_and_unpacked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/public/com/example/foo/1.0.0/foo-1.0.0.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(tar_gz(&[("bin/foo", b"binary")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/public/com/example/foo/1.0.0/maven-metadata.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let workspace = Workspace::new();
    let target = workspace.target(&server, true, &[("foo", "1.0.0")]);
    let coordinator = BatchCoordinator::from_target("web", &target).unwrap();

    let outcome = coordinator.run(&target.requests()).await;

    assert!(outcome.succeeded());
    assert_eq!(
        outcome.outcomes,
        vec![ArtifactOutcome::Installed {
            artifact_id: "foo".to_string(),
            version: "1.0.0".to_string(),
            path: workspace.dest().join("foo"),
        }]
    );
    assert_eq!(std::fs::read(workspace.dest().join("foo/bin/foo")).unwrap(), b"binary");
    assert!(temp_is_empty(&workspace.temp()));
}

#[tokio::test]
async fn test_snapshot_resolved_through_metadata() {
    let server = MockServer::start().await;
    let folder = "/public/com/example/bar/1.0-SNAPSHOT";
    Mock::given(method("GET"))
        .and(path(format!("{}/bar-1.0-SNAPSHOT.tar.gz", folder)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/maven-metadata.xml", folder)))
        .respond_with(ResponseTemplate::new(200).set_body_string(SNAPSHOT_METADATA))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/bar-1.0-20230101.120000-3.tar.gz", folder)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"snapshot-archive".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = Workspace::new();
    let target = workspace.target(&server, true, &[("bar", "1.0-SNAPSHOT")]);
    let coordinator = BatchCoordinator::from_target("web", &target).unwrap();

    let outcome = coordinator.run(&target.requests()).await;

    let installed = workspace.dest().join("bar-1.0-20230101.120000-3.tar.gz");
    assert!(outcome.succeeded());
    assert_eq!(
        outcome.outcomes,
        vec![ArtifactOutcome::Installed {
            artifact_id: "bar".to_string(),
            version: "1.0-SNAPSHOT".to_string(),
            path: installed.clone(),
        }]
    );
    assert_eq!(std::fs::read(&installed).unwrap(), b"snapshot-archive");
    assert!(!workspace.dest().join("bar").exists());
    assert!(temp_is_empty(&workspace.temp()));
}

#[tokio::test]
async fn test_server_error_does_not_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/public/com/example/baz/2.0.0/baz-2.0.0.tar.gz"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/public/com/example/baz/2.0.0/maven-metadata.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/com/example/foo/1.0.0/foo-1.0.0.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"foo".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = Workspace::new();
    let target = workspace.target(&server, false, &[("baz", "2.0.0"), ("foo", "1.0.0")]);
    let coordinator = BatchCoordinator::from_target("web", &target).unwrap();

    let outcome = coordinator.run(&target.requests()).await;

    assert!(outcome.failed());
    match &outcome.outcomes[0] {
        ArtifactOutcome::Failed { artifact_id, phase, message, .. } => {
            assert_eq!(artifact_id, "baz");
            assert_eq!(*phase, Phase::Downloading);
            assert!(message.contains("500"));
        }
        other => panic!("expected baz to fail, got {:?}", other),
    }
    assert!(!outcome.outcomes[1].is_failed());
    assert!(workspace.dest().join("foo-1.0.0.tar.gz").exists());
}

#[tokio::test]
async fn test_empty_dependency_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let workspace = Workspace::new();
    let target = workspace.target(&server, true, &[]);
    let coordinator = BatchCoordinator::from_target("web", &target).unwrap();

    let outcome = coordinator.run(&target.requests()).await;

    assert!(outcome.succeeded());
    assert!(outcome.outcomes.is_empty());
    assert!(!workspace.dest().exists());
}

#[tokio::test]
async fn test_missing_snapshot_metadata_fails_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let workspace = Workspace::new();
    let target = workspace.target(&server, false, &[("gone", "3.0-SNAPSHOT")]);
    let coordinator = BatchCoordinator::from_target("web", &target).unwrap();

    let outcome = coordinator.run(&target.requests()).await;

    assert!(outcome.failed());
    assert!(matches!(
        outcome.outcomes[0],
        ArtifactOutcome::Failed { phase: Phase::FetchingMetadata, .. }
    ));
    assert!(temp_is_empty(&workspace.temp()));
}
