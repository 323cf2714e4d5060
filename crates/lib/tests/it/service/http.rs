use dossier::service::http::ErrorResponse;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{spawn_server, test_service};

async fn server() -> (reqwest::Client, String) {
    let base = spawn_server(test_service().await).await;
    (reqwest::Client::new(), base)
}

async fn create(client: &reqwest::Client, base: &str, id: &str, content: Value) -> Value {
    let response = client
        .post(format!("{base}/documents/{id}"))
        .json(&json!({ "content": content }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

#[tokio::test]
async fn health_reports_backend() {
    let (client, base) = server().await;
    let body: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["backend"].is_string());
}

#[tokio::test]
async fn create_get_and_patch() {
    let (client, base) = server().await;
    let created = create(&client, &base, "dossier-1", json!({"a": 1})).await;
    assert_eq!(created["created"], true);
    assert_eq!(created["version"], 0);

    let response = client
        .get(format!("{base}/documents/dossier-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let etag = response.headers()["etag"].to_str().unwrap().to_string();
    let latest: Value = response.json().await.unwrap();
    assert_eq!(etag, format!("\"{}\"", latest["etag"].as_str().unwrap()));
    assert_eq!(latest["content"], json!({"a": 1}));

    let response = client
        .post(format!("{base}/documents/dossier-1"))
        .json(&json!({
            "base_version": 0,
            "patch": [
                {"op": "replace", "path": "/a", "value": 2},
                {"op": "add", "path": "/b", "value": 3}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let patched: Value = response.json().await.unwrap();
    assert_eq!(patched["created"], false);
    assert_eq!(patched["version"], 1);
    assert_eq!(patched["content"], json!({"a": 2, "b": 3}));
    assert_eq!(patched["backward_patch"].as_array().unwrap().len(), 2);

    let old: Value = client
        .get(format!("{base}/documents/dossier-1/0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(old["content"], json!({"a": 1}));
}

#[tokio::test]
async fn stale_base_version_is_409_with_current_version() {
    let (client, base) = server().await;
    create(&client, &base, "doc", json!({"a": 1})).await;
    let body = json!({"base_version": 0, "content": {"a": 2}});

    let first = client
        .post(format!("{base}/documents/doc"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = client
        .post(format!("{base}/documents/doc"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = second.json().await.unwrap();
    assert_eq!(error.status, 409);
    assert_eq!(error.error, "conflict");
    assert_eq!(error.current_version, Some(1));
}

#[tokio::test]
async fn creating_an_existing_document_conflicts() {
    let (client, base) = server().await;
    create(&client, &base, "once", json!(1)).await;
    let response = client
        .post(format!("{base}/documents/once"))
        .json(&json!({"content": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.current_version, Some(0));
}

#[tokio::test]
async fn inapplicable_patches_are_422() {
    let (client, base) = server().await;
    create(&client, &base, "doc", json!({"a": "text"})).await;

    let cases = [
        (json!({"op": "remove", "path": "/missing"}), "path_not_found"),
        (json!({"op": "add", "path": "/a/b", "value": 1}), "type_mismatch"),
        (json!({"op": "test", "path": "/a", "value": "other"}), "test_failed"),
    ];
    for (op, code) in cases {
        let response = client
            .post(format!("{base}/documents/doc"))
            .json(&json!({"base_version": 0, "patch": [op]}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{code}");
        let error: ErrorResponse = response.json().await.unwrap();
        assert_eq!(error.error, code);
    }

    let latest: Value = client
        .get(format!("{base}/documents/doc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["version"], 0);
}

#[tokio::test]
async fn malformed_requests_are_400() {
    let (client, base) = server().await;
    create(&client, &base, "doc", json!({})).await;

    let bodies = [
        json!({"base_version": 0}),
        json!({"base_version": 0, "patch": [], "content": {}}),
        json!({"patch": []}),
        json!({"base_version": 0, "patch": [{"op": "remove", "path": "bad"}]}),
        json!({"base_version": "zero", "content": {}}),
    ];
    for body in bodies {
        let response = client
            .post(format!("{base}/documents/doc"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let error: ErrorResponse = response.json().await.unwrap();
        assert_eq!(error.error, "invalid_request");
    }

    let response = client
        .get(format!("{base}/documents/doc/latest"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_documents_and_versions_are_404() {
    let (client, base) = server().await;
    for path in ["/documents/ghost", "/documents/ghost/0", "/documents/ghost/history"] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }

    create(&client, &base, "real", json!(1)).await;
    let response = client
        .get(format!("{base}/documents/real/7"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .post(format!("{base}/documents/ghost"))
        .json(&json!({"base_version": 0, "content": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_writes_a_tombstone() {
    let (client, base) = server().await;
    create(&client, &base, "doc", json!({"a": 1})).await;

    let response = client
        .delete(format!("{base}/documents/doc?base_version=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tombstone: Value = response.json().await.unwrap();
    assert_eq!(tombstone["deleted"], true);
    assert_eq!(tombstone["version"], 1);
    assert!(tombstone["content"].is_null());

    let latest: Value = client
        .get(format!("{base}/documents/doc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["deleted"], true);

    // Still versioned, never erased.
    let old: Value = client
        .get(format!("{base}/documents/doc/0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(old["content"], json!({"a": 1}));

    let again = client
        .delete(format!("{base}/documents/doc"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let stale = client
        .delete(format!("{base}/documents/doc?base_version=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn history_list_and_diff() {
    let (client, base) = server().await;
    create(&client, &base, "h", json!({"a": 1})).await;
    create(&client, &base, "other", json!([])).await;
    client
        .post(format!("{base}/documents/h"))
        .json(&json!({"base_version": 0, "content": {"a": 2, "b": 3}}))
        .send()
        .await
        .unwrap();

    let history: Value = client
        .get(format!("{base}/documents/h/history"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["versions"], json!([0, 1]));

    let list: Vec<Value> = client
        .get(format!("{base}/documents"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 2);

    let diff: Value = client
        .get(format!("{base}/documents/h/diff?from=0&to=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(diff["base_version"], 0);
    assert_eq!(
        diff["operations"],
        json!([
            {"op": "replace", "path": "/a", "value": 2},
            {"op": "add", "path": "/b", "value": 3}
        ])
    );

    let response = client
        .get(format!("{base}/documents/h/diff?from=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validate_is_a_dry_run() {
    let (client, base) = server().await;
    create(&client, &base, "v", json!({"a": 1})).await;

    let report: Value = client
        .post(format!("{base}/documents/v/validate"))
        .json(&json!({"patch": [
            {"op": "replace", "path": "/a", "value": 5},
            {"op": "move", "from": "/a", "path": "/a/x"}
        ]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["errors"][0]["index"], 1);
    assert_eq!(report["errors"][0]["error"], "type_mismatch");

    let report: Value = client
        .post(format!("{base}/documents/v/validate"))
        .json(&json!({"patch": [{"op": "replace", "path": "/a", "value": 5}]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["valid"], true);

    let latest: Value = client
        .get(format!("{base}/documents/v"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["content"], json!({"a": 1}));
}
