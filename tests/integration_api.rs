// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the API client using wiremock.
//!
//! Covers:
//! - Retry on 5xx and rate limits, no retry on 404/422
//! - Required request headers
//! - URL building for slash-containing branch names
//! - The full chmod pipeline over HTTP, including a rejected branch update

use forge_tree::api::retry::RetryPolicy;
use forge_tree::api::{ApiClient, RepoSlug};
use forge_tree::config::types::{ApiConfig, RetryConfig};
use forge_tree::error::{ApiError, ErrorKind, ForgeError, NetworkError};
use forge_tree::git::ops::{ChangeOptions, Outcome, change_modes};
use forge_tree::git::refs::resolve_ref_to_commit;
use forge_tree::git::store::{GitStore, ObjectKind};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const C0: &str = "c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0";
const C1: &str = "c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1";
const T0: &str = "2d61f1924581cba57efc2dbe90c90bd26286cc2d";
const T1: &str = "8db3a7cd80846946e2b12937d4758422547ab8d2";
const RUN_PY: &str = "b917a726c93f902e43291d9009d6488385133b67";
const TAG: &str = "7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a";

fn client_with(server: &MockServer, timeout_secs: u64) -> ApiClient {
    let api = ApiConfig {
        base_url: server.uri(),
        timeout_secs,
        ..ApiConfig::default()
    };
    let repo: RepoSlug = "octo/hello".parse().unwrap();
    ApiClient::new(&api, &RetryConfig::default(), "t0ken", repo)
        .unwrap()
        .with_policy(RetryPolicy::immediate(3))
}

fn client(server: &MockServer) -> ApiClient {
    client_with(server, 30)
}

fn branch_ref(name: &str, sha: &str) -> serde_json::Value {
    json!({
        "ref": format!("refs/heads/{name}"),
        "object": {"sha": sha, "type": "commit"}
    })
}

fn base_listing() -> serde_json::Value {
    json!({
        "sha": T0,
        "truncated": false,
        "tree": [
            {"path": "hello.txt", "mode": "100644", "type": "blob",
             "sha": "ce013625030ba8dba906f756967f9e9ca394464a", "size": 6},
            {"path": "scripts", "mode": "040000", "type": "tree",
             "sha": "0ac22a257f2397bade6b945f1e1e2e3dfa4655e9"},
            {"path": "scripts-b", "mode": "100644", "type": "blob",
             "sha": "c1b0730e0133447badcfd47fd144e254807b06e1", "size": 1},
            {"path": "scripts/a.sh", "mode": "100644", "type": "blob",
             "sha": "1a2485251c33a70432394c93fb89330ef214bfc9", "size": 10},
            {"path": "scripts/run.py", "mode": "100644", "type": "blob",
             "sha": RUN_PY, "size": 9}
        ]
    })
}

/// Mount the reads of a chmod run on `main` at C0.
async fn mount_base(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"default_branch": "main"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(branch_ref("main", C0)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/octo/hello/git/commits/{C0}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": C0,
            "tree": {"sha": T0},
            "parents": [],
            "message": "Initial commit"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/octo/hello/git/trees/{T0}")))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(base_listing()))
        .mount(server)
        .await;
}

/// Mount tree and commit creation for `scripts/run.py` -> 755.
async fn mount_writes(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/repos/octo/hello/git/trees"))
        .and(body_json(json!({
            "base_tree": T0,
            "tree": [{"path": "scripts/run.py", "mode": "100755", "type": "blob", "sha": RUN_PY}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": T1, "tree": []})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/hello/git/commits"))
        .and(body_json(json!({
            "message": "Change mode to 755: scripts/run.py",
            "tree": T1,
            "parents": [C0]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": C1})))
        .expect(1)
        .mount(server)
        .await;
}

// =============================================================================
// Retry layer
// =============================================================================

#[tokio::test]
async fn test_server_error_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(branch_ref("main", C0)))
        .expect(1)
        .mount(&server)
        .await;

    let head = client(&server).get_branch("main").await.unwrap().unwrap();
    assert_eq!(head.sha, C0);
    assert_eq!(head.kind, ObjectKind::Commit);
}

#[tokio::test]
async fn test_server_error_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/ref/heads/main"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "Service Unavailable"})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).get_branch("main").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::ServerError));
    insta::assert_snapshot!(err.to_string(), @"api error: server error 503: Service Unavailable");
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "0")
                .set_body_json(json!({"message": "API rate limit exceeded for user."})),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"default_branch": "trunk"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).default_branch().await.unwrap(), "trunk");
}

#[tokio::test]
async fn test_rate_limit_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-ratelimit-reset", "1700000000")
                .set_body_string(""),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).default_branch().await.unwrap_err();
    match err {
        ForgeError::Api(api) => assert!(matches!(
            *api,
            ApiError::RateLimited {
                reset_at: Some(1_700_000_000)
            }
        )),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/ref/heads/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).get_branch("gone").await.unwrap().is_none());
}

#[tokio::test]
async fn test_forbidden_without_rate_limit_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/hello/git/commits"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"message": "Resource not accessible by integration"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_commit("m", T0, &[C0])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AuthFailure));
    assert_eq!(err.hint(), Some("the token may lack the required scopes"));
}

#[tokio::test]
async fn test_required_headers_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .and(header("authorization", "Bearer t0ken"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .and(header(
            "user-agent",
            format!("forge-tree/{}", env!("CARGO_PKG_VERSION")).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"default_branch": "main"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).default_branch().await.unwrap(), "main");
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_secs(3))
                .set_body_json(json!({"default_branch": "main"})),
        )
        .mount(&server)
        .await;

    let err = client_with(&server, 1).default_branch().await.unwrap_err();
    match err {
        ForgeError::Network(net) => assert!(matches!(*net, NetworkError::Timeout { .. })),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server).default_branch().await.unwrap_err();
    assert!(err.to_string().contains("failed to decode response"));
}

// =============================================================================
// Reference resolution
// =============================================================================

#[tokio::test]
async fn test_slash_branch_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/ref/heads/feature/x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(branch_ref("feature/x", C1)))
        .expect(1)
        .mount(&server)
        .await;

    let head = client(&server).get_branch("feature/x").await.unwrap().unwrap();
    assert_eq!(head.sha, C1);
}

#[tokio::test]
async fn test_resolve_annotated_tag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/ref/heads/v1.0"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/ref/tags/v1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ref": "refs/tags/v1.0",
            "object": {"sha": TAG, "type": "tag"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/octo/hello/git/tags/{TAG}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": TAG,
            "tag": "v1.0",
            "object": {"sha": C0, "type": "commit"}
        })))
        .mount(&server)
        .await;

    let commit = resolve_ref_to_commit(&client(&server), "v1.0").await.unwrap();
    assert_eq!(commit, C0);
}

#[tokio::test]
async fn test_resolve_unknown_reference() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/commits/nope"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "No commit found for SHA: nope"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let err = resolve_ref_to_commit(&client(&server), "nope").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    insta::assert_snapshot!(err.to_string(), @"api error: reference 'nope' not found");
}

// =============================================================================
// Full pipeline
// =============================================================================

#[tokio::test]
async fn test_chmod_pipeline_over_http() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_writes(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/hello/git/refs/heads/main"))
        .and(body_json(json!({"sha": C1, "force": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(branch_ref("main", C1)))
        .expect(1)
        .mount(&server)
        .await;

    let report = change_modes(
        &client(&server),
        &["scripts/run.py"],
        "755",
        &ChangeOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.outcome, Outcome::Committed);
    assert_eq!(report.branch, "main");
    assert_eq!(report.base_commit, C0);
    assert_eq!(report.tree.as_deref(), Some(T1));
    assert_eq!(report.commit.as_deref(), Some(C1));
}

#[tokio::test]
async fn test_chmod_rejected_update_is_conflict() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_writes(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/hello/git/refs/heads/main"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Update is not a fast forward"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = change_modes(
        &client(&server),
        &["scripts/run.py"],
        "755",
        &ChangeOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Conflict));
    assert!(matches!(err.api(), Some(ApiError::NonFastForward { branch, .. }) if branch == "main"));
}

#[tokio::test]
async fn test_chmod_forced_update() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    mount_writes(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/hello/git/refs/heads/main"))
        .and(body_json(json!({"sha": C1, "force": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(branch_ref("main", C1)))
        .expect(1)
        .mount(&server)
        .await;

    let options = ChangeOptions::builder().force(true).build();
    let report = change_modes(&client(&server), &["scripts/run.py"], "755", &options)
        .await
        .unwrap();
    assert_eq!(report.commit.as_deref(), Some(C1));
}

#[tokio::test]
async fn test_chmod_missing_path_writes_nothing() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = change_modes(
        &client(&server),
        &["scripts/run.py", "y", "docs/z.md"],
        "755",
        &ChangeOptions::default(),
    )
    .await
    .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"api error: paths not found in tree: y, docs/z.md");
}
