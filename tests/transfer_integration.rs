//! End-to-end tests of the transfer agent.
//!
//! These tests drive the event loop against a real git repository and a
//! mock WebDAV server, with only the credential helper faked.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use git_lfs_webdav::credentials::mock::{CredentialCall, MockCredentialHelper};
use git_lfs_webdav::git::{ConfigScope, Git, Repo, LFS_URL_KEY};
use git_lfs_webdav::transfer::Processor;
use git_lfs_webdav::webdav::WebDavConnector;

const INIT: &str = r#"{"event":"init","operation":"upload","remote":"origin","concurrent":true,"concurrenttransfers":8}"#;
const TERMINATE: &str = r#"{"event":"terminate"}"#;

/// "alice:s3cret"
const ALICE: &str = "Basic YWxpY2U6czNjcmV0";

fn multistatus(size: u64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<D:multistatus xmlns:D="DAV:"><D:response><D:href>/lfs/ab/cd/abcd1234</D:href>
<D:propstat><D:prop><D:resourcetype/><D:getcontentlength>{}</D:getcontentlength></D:prop>
<D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response></D:multistatus>"#,
        size
    )
}

/// Test fixture: a git repository whose `.lfsconfig` points at a server.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new(lfs_url: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        git2::Repository::init(dir.path()).expect("failed to init repo");
        let repo = Self { dir };
        repo.git()
            .config_set(&ConfigScope::lfs_config(), LFS_URL_KEY, lfs_url)
            .unwrap();
        repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    fn staging_path(&self, oid: &str) -> PathBuf {
        self.git()
            .git_dir()
            .unwrap()
            .join("lfs")
            .join("tmp")
            .join(format!("{}.tmp", oid))
    }

    fn write_object(&self, content: &[u8]) -> String {
        let path = self.path().join("object.bin");
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    async fn transfer(&self, helper: &MockCredentialHelper, requests: &[String]) -> Vec<Value> {
        let mut processor = Processor::new(
            Box::new(Git::new(self.path())),
            Arc::new(WebDavConnector),
            Arc::new(helper.clone()),
        );
        let input = requests.join("\n") + "\n";
        let mut out = Vec::new();
        processor
            .run(input.as_bytes(), &mut out)
            .await
            .expect("transfer loop failed");
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

/// Masked form of the mock server URL.
fn lfs_url(server: &MockServer) -> String {
    format!("{}/lfs", server.uri()).replacen("http://", "webdav://", 1)
}

#[tokio::test]
async fn download_stages_object_in_git_dir() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/lfs/ab/cd/abcd1234"))
        .respond_with(ResponseTemplate::new(207).set_body_string(multistatus(5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lfs/ab/cd/abcd1234"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let repo = TestRepo::new(&lfs_url(&server));
    let helper = MockCredentialHelper::new();
    let download = json!({"event": "download", "oid": "abcd1234", "size": 5}).to_string();
    let lines = repo
        .transfer(&helper, &[INIT.into(), download, TERMINATE.into()])
        .await;

    assert_eq!(lines[0], json!({}));
    let staging = repo.staging_path("abcd1234");
    assert_eq!(
        lines.last().unwrap(),
        &json!({"event": "complete", "oid": "abcd1234", "path": staging.to_str().unwrap()})
    );
    assert_eq!(std::fs::read(&staging).unwrap(), b"hello");
    assert!(helper.calls().is_empty());
}

#[tokio::test]
async fn upload_retries_with_helper_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(header("Authorization", ALICE))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("MKCOL"))
        .and(header("Authorization", ALICE))
        .respond_with(ResponseTemplate::new(201))
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/lfs/ab/cd/abcd1234"))
        .and(header("Authorization", ALICE))
        .respond_with(ResponseTemplate::new(201))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    // Anything without credentials
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(401))
        .with_priority(10)
        .expect(1)
        .mount(&server)
        .await;

    let repo = TestRepo::new(&lfs_url(&server));
    let object = repo.write_object(b"0123456789");
    let helper = MockCredentialHelper::answering("alice", "s3cret");
    let upload =
        json!({"event": "upload", "oid": "abcd1234", "size": 10, "path": object}).to_string();

    let lines = repo
        .transfer(&helper, &[INIT.into(), upload, TERMINATE.into()])
        .await;

    assert_eq!(
        lines.last().unwrap(),
        &json!({"event": "complete", "oid": "abcd1234"})
    );
    let calls = helper.calls();
    assert_eq!(calls.len(), 2);
    let base = format!("{}/lfs", server.uri());
    assert!(matches!(&calls[0], CredentialCall::Fill(q) if q["url"] == base));
    assert!(matches!(&calls[1], CredentialCall::Approve(c) if c["username"] == "alice"));
}

#[tokio::test]
async fn upload_retries_rejected_put_with_whole_file() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("MKCOL"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(header("Authorization", ALICE))
        .and(body_bytes(b"0123456789".to_vec()))
        .respond_with(ResponseTemplate::new(201))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(10)
        .expect(1)
        .mount(&server)
        .await;

    let repo = TestRepo::new(&lfs_url(&server));
    let object = repo.write_object(b"0123456789");
    let helper = MockCredentialHelper::answering("alice", "s3cret");
    let upload =
        json!({"event": "upload", "oid": "abcd1234", "size": 10, "path": object}).to_string();

    let lines = repo
        .transfer(&helper, &[INIT.into(), upload, TERMINATE.into()])
        .await;

    assert_eq!(
        lines.last().unwrap(),
        &json!({"event": "complete", "oid": "abcd1234"})
    );
    let reported: u64 = lines
        .iter()
        .filter(|l| l["event"] == "progress")
        .map(|l| l["bytesSinceLast"].as_u64().unwrap())
        .sum();
    assert_eq!(reported, 10);
    assert_eq!(helper.fill_count(), 1);
    assert!(matches!(helper.calls().last(), Some(CredentialCall::Approve(_))));
}

#[tokio::test]
async fn upload_skips_existing_object() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/lfs/ab/cd/abcd1234"))
        .respond_with(ResponseTemplate::new(207).set_body_string(multistatus(10)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let repo = TestRepo::new(&lfs_url(&server));
    let object = repo.write_object(b"0123456789");
    let upload =
        json!({"event": "upload", "oid": "abcd1234", "size": 10, "path": object}).to_string();

    let lines = repo
        .transfer(&MockCredentialHelper::new(), &[INIT.into(), upload, TERMINATE.into()])
        .await;

    assert_eq!(
        &lines[1..],
        &[
            json!({"event": "progress", "oid": "abcd1234", "bytesSoFar": 10, "bytesSinceLast": 10}),
            json!({"event": "complete", "oid": "abcd1234"}),
        ]
    );
}

#[tokio::test]
async fn download_with_wrong_size_fails_without_reading() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(207).set_body_string(multistatus(7)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"1234567".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let repo = TestRepo::new(&lfs_url(&server));
    let download = json!({"event": "download", "oid": "abcd1234", "size": 5}).to_string();
    let lines = repo
        .transfer(&MockCredentialHelper::new(), &[INIT.into(), download, TERMINATE.into()])
        .await;

    assert_eq!(lines[1]["error"]["code"], 7);
    assert!(!repo.staging_path("abcd1234").exists());
}

#[tokio::test]
async fn repository_url_overrides_lfsconfig() {
    let server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(header("Authorization", ALICE))
        .respond_with(ResponseTemplate::new(207).set_body_string(multistatus(5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("Authorization", ALICE))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let repo = TestRepo::new("webdav://unused.invalid/lfs");
    let personal = lfs_url(&server).replacen("webdav://", "webdav://alice:s3cret@", 1);
    repo.git()
        .config_set(&ConfigScope::Repository, LFS_URL_KEY, &personal)
        .unwrap();

    let helper = MockCredentialHelper::new();
    let download = json!({"event": "download", "oid": "abcd1234", "size": 5}).to_string();
    let lines = repo
        .transfer(&helper, &[INIT.into(), download, TERMINATE.into()])
        .await;

    assert!(lines.last().unwrap().get("error").is_none());
    assert!(helper.calls().is_empty());
}

#[tokio::test]
async fn init_outside_repository_reports_code_1() {
    let dir = TempDir::new().unwrap();
    let mut processor = Processor::new(
        Box::new(Git::new(dir.path())),
        Arc::new(WebDavConnector),
        Arc::new(MockCredentialHelper::new()),
    );
    let input = format!("{}\n{}\n", INIT, TERMINATE);
    let mut out = Vec::new();
    processor.run(input.as_bytes(), &mut out).await.unwrap();

    let line: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(line["error"]["code"], 1);
}
