//! CLI integration tests against a mock repository manager.

mod common;

use std::path::Path;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{command, run_cli, run_cli_success};

const SEARCH_PATH: &str = "/service/rest/v1/search/assets";

fn asset(server: &MockServer, path: &str) -> serde_json::Value {
    json!({
        "downloadUrl": format!("{}/repository/raw-hosted/{}", server.uri(), path),
        "path": path,
        "repository": "raw-hosted",
        "format": "raw"
    })
}

async fn mount_search(server: &MockServer, name: &str, paths: &[&str]) {
    let items: Vec<_> = paths.iter().map(|p| asset(server, p)).collect();
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("name", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": items,
            "continuationToken": null
        })))
        .mount(server)
        .await;
}

async fn mount_content(server: &MockServer, asset_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/repository/raw-hosted/{}", asset_path)))
        .respond_with(ResponseTemplate::new(status).set_body_string(format!("content of {asset_path}")))
        .mount(server)
        .await;
}

fn artifacts_dir(output: &Path) -> std::path::PathBuf {
    let entries: Vec<_> = std::fs::read_dir(output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("artifacts_")
        })
        .collect();
    assert_eq!(entries.len(), 1, "expected one artifacts directory");
    entries[0].clone()
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    let output = command(&["--version"], home.path()).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("nexus "));
}

#[test]
fn test_list_without_cache_fails() {
    let home = TempDir::new().unwrap();
    let output = command(&["list"], home.path()).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("run a search first"), "stderr: {stderr}");
}

#[test]
fn test_search_requires_host() {
    let home = TempDir::new().unwrap();
    let output = command(&["search", "-r", "raw-hosted", "*.zip"], home.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("NEXUS_HOST"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_then_list() {
    let server = MockServer::start().await;
    mount_search(&server, "MyProject/*/a/*.zip", &["MyProject/b1/a/x.zip", "MyProject/b2/a/y.zip"]).await;
    mount_search(&server, "Other/*.txt", &["Other/notes.txt"]).await;

    let home = TempDir::new().unwrap();
    let stdout = run_cli_success(
        &["search", "MyProject/*/a/*.zip", "Other/*.txt"],
        home.path(),
        &server.uri(),
    );
    assert!(stdout.contains("Found 3 assets"), "stdout: {stdout}");
    assert!(stdout.contains("search_"));

    let stdout = run_cli_success(&["list"], home.path(), &server.uri());
    assert!(stdout.contains("raw-hosted: MyProject/b1/a/x.zip"));
    assert!(stdout.contains("raw-hosted: Other/notes.txt"));
    assert!(stdout.contains("Total: 3"));

    let stdout = run_cli_success(&["list", "--filter", "*.txt"], home.path(), &server.uri());
    assert!(!stdout.contains("x.zip"));
    assert!(stdout.contains("Total: 1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_from_cache() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        "MyProject/*",
        &[
            "MyProject/build_1/component-a/artifact.zip",
            "MyProject/build_1/component-b/artifact.zip",
        ],
    )
    .await;
    mount_content(&server, "MyProject/build_1/component-a/artifact.zip", 200).await;
    mount_content(&server, "MyProject/build_1/component-b/artifact.zip", 200).await;

    let home = TempDir::new().unwrap();
    run_cli_success(&["search", "MyProject/*"], home.path(), &server.uri());

    let out = home.path().join("out");
    run_cli_success(
        &["download", "-o", out.to_str().unwrap()],
        home.path(),
        &server.uri(),
    );

    let artifacts = artifacts_dir(&out);
    assert_eq!(
        std::fs::read_to_string(artifacts.join("component-a/artifact.zip")).unwrap(),
        "content of MyProject/build_1/component-a/artifact.zip"
    );
    assert!(artifacts.join("component-b/artifact.zip").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_partial_failure_exits_nonzero() {
    let server = MockServer::start().await;
    let paths = ["p/c1/a.bin", "p/c2/b.bin", "p/c3/c.bin", "p/c4/d.bin", "p/c5/e.bin"];
    mount_search(&server, "p/*", &paths).await;
    for (i, p) in paths.iter().enumerate() {
        mount_content(&server, p, if i == 2 { 500 } else { 200 }).await;
    }

    let home = TempDir::new().unwrap();
    let out = home.path().join("out");
    let output = run_cli(
        &["download", "-p", "p/*", "-o", out.to_str().unwrap()],
        home.path(),
        &server.uri(),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 5 downloads failed"), "stderr: {stderr}");

    let artifacts = artifacts_dir(&out);
    for (i, p) in paths.iter().enumerate() {
        let local = artifacts.join(p.trim_start_matches("p/"));
        assert_eq!(local.exists(), i != 2, "{}", local.display());
    }
    let c3 = artifacts.join("c3");
    assert!(!c3.exists() || std::fs::read_dir(&c3).unwrap().next().is_none());

    // The fresh search was cached.
    let stdout = run_cli_success(&["list"], home.path(), &server.uri());
    assert!(stdout.contains("Total: 5"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_collision_aborts_before_writing() {
    let server = MockServer::start().await;
    mount_search(&server, "p/*", &["p/b1/comp/a.zip", "p/b2/comp/a.zip"]).await;

    let home = TempDir::new().unwrap();
    let out = home.path().join("out");
    let output = run_cli(
        &["download", "-p", "p/*", "-o", out.to_str().unwrap()],
        home.path(),
        &server.uri(),
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("would both be written"));
    assert!(!out.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/service/rest/v1/components"))
        .and(query_param("repository", "raw-hosted"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let file = home.path().join("myfile.txt");
    std::fs::write(&file, "payload").unwrap();

    let stdout = run_cli_success(
        &[
            "upload",
            file.to_str().unwrap(),
            "--directory",
            "/data/files",
            "-P",
            "version=1.0.0",
        ],
        home.path(),
        &server.uri(),
    );
    assert!(stdout.contains("raw-hosted/data/files/myfile.txt"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_rejects_bad_property_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let file = home.path().join("myfile.txt");
    std::fs::write(&file, "payload").unwrap();

    let output = run_cli(
        &["upload", file.to_str().unwrap(), "-P", "novalue"],
        home.path(),
        &server.uri(),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid upload property"));
}
