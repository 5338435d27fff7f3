//! Admin API tests.

use serde_json::{json, Value};

mod common;

use common::ADMIN_KEY;

#[tokio::test]
async fn test_admin_requires_bearer_key() {
    let server = common::start_server(|_| {}).await;
    let client = common::client();

    let res = client
        .get(server.admin_url("/admin/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(server.admin_url("/admin/status"))
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(server.admin_url("/admin/status"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["reload"], "always");
}

#[tokio::test]
async fn test_handlers_are_listed() {
    let server = common::start_server(|_| {}).await;

    let body: Value = common::client()
        .get(server.admin_url("/admin/handlers"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body,
        json!({ "handlers": ["echo", "fails", "panics", "status"] })
    );
}

#[tokio::test]
async fn test_module_cache_inspection_and_eviction() {
    let server = common::start_server(|config| {
        config.api.reload = api_dispatcher::config::ReloadPolicy::OnChange;
    })
    .await;
    server.write_handler("users/list.toml", "handler = \"status\"\n");
    server.write_handler("templates/1.json", r#"{ "respond": { "body": { "id": 1 } } }"#);

    let client = common::client();
    for path in ["/api/users/list", "/api/templates/1"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }

    let modules: Value = client
        .get(server.admin_url("/admin/modules"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(modules["stats"]["entries"], 2);
    assert_eq!(modules["entries"].as_array().unwrap().len(), 2);
    assert_eq!(modules["entries"][0]["shape"], "callable");

    let evicted: Value = client
        .post(server.admin_url("/admin/modules/evict"))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({ "path": "users/list" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(evicted, json!({ "route": "users/list", "evicted": 1 }));
    assert_eq!(server.cache.len(), 1);

    let cleared: Value = client
        .delete(server.admin_url("/admin/modules"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared, json!({ "evicted": 1 }));
    assert!(server.cache.is_empty());
}

#[tokio::test]
async fn test_evict_rejects_invalid_path() {
    let server = common::start_server(|_| {}).await;

    let res = common::client()
        .post(server.admin_url("/admin/modules/evict"))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({ "path": "../secrets" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid API path" }));
}
