//! End-to-end dispatch tests against a live server.

use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_traversal_is_rejected() {
    let server = common::start_server(|_| {}).await;
    std::fs::write(server.base().join("passwd.toml"), "handler = \"echo\"").unwrap();

    for target in [
        "/api/admin/../../etc/passwd",
        "/api/admin/%2e%2e/%2e%2e/etc/passwd",
        "/api/users/..%2Fpasswd",
        "/api/users%00/list",
        "/api//etc/passwd",
        "/api/.env",
    ] {
        let (status, body) = common::raw_get(server.addr, target).await;
        assert_eq!(status, 400, "target {target}");
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({ "error": "Invalid API path" }));
    }

    // Nothing was cached along the way either.
    assert!(server.cache.is_empty());
}

#[tokio::test]
async fn test_missing_handler_is_not_found() {
    let server = common::start_server(|_| {}).await;

    let res = common::client()
        .get(server.url("/api/users/list"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "API endpoint not found" }));
}

#[tokio::test]
async fn test_template_body_is_returned_unchanged() {
    let server = common::start_server(|_| {}).await;
    server.write_handler(
        "templates/1.toml",
        r#"
        [respond]
        status = 200

        [respond.body]
        id = 1
        name = "Welcome"
        tags = ["intro", "email"]
        "#,
    );

    let res = common::client()
        .get(server.url("/api/templates/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "id": 1, "name": "Welcome", "tags": ["intro", "email"] })
    );
}

#[tokio::test]
async fn test_json_fallback_and_native_handler() {
    let server = common::start_server(|_| {}).await;
    server.write_handler("users/create.json", r#"{ "handler": "echo" }"#);

    let res = common::client()
        .post(server.url("/api/users/create?dry_run=1"))
        .header("x-request-id", "req-e2e")
        .json(&json!({ "name": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-e2e");

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["method"], "POST");
    assert_eq!(body["route"], "users/create");
    assert_eq!(body["query"], "dry_run=1");
    assert_eq!(body["request_id"], "req-e2e");
    assert_eq!(body["body"], json!({ "name": "Ada" }));
}

#[tokio::test]
async fn test_default_export_matches_bare_callable() {
    let server = common::start_server(|_| {}).await;
    server.write_handler("bare.toml", "[respond]\nstatus = 202\nbody = { ok = true }\n");
    server.write_handler(
        "wrapped.toml",
        "[default.respond]\nstatus = 202\nbody = { ok = true }\n\n[meta]\nowner = \"docs\"\n",
    );

    let client = common::client();
    let bare = client.get(server.url("/api/bare")).send().await.unwrap();
    let wrapped = client.get(server.url("/api/wrapped")).send().await.unwrap();
    assert_eq!(bare.status(), 202);
    assert_eq!(wrapped.status(), 202);
    assert_eq!(
        bare.json::<Value>().await.unwrap(),
        wrapped.json::<Value>().await.unwrap()
    );
}

#[tokio::test]
async fn test_malformed_handlers_are_invalid() {
    let server = common::start_server(|_| {}).await;
    server.write_handler("list.json", "[1, 2, 3]");
    server.write_handler("exports_only.toml", "[list]\nhandler = \"echo\"\n");
    server.write_handler("data_default.toml", "default = \"hello\"\n");

    let client = common::client();
    for route in ["list", "exports_only", "data_default"] {
        let res = client
            .get(server.url(&format!("/api/{route}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 500, "route {route}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Invalid API handler" }));
    }
}

#[tokio::test]
async fn test_failing_and_panicking_handlers_hide_detail() {
    let server = common::start_server(|_| {}).await;
    server.write_handler("orders/sync.toml", "handler = \"fails\"\n");
    server.write_handler("orders/crash.toml", "handler = \"panics\"\n");

    let client = common::client();
    for route in ["orders/sync", "orders/crash"] {
        let res = client
            .get(server.url(&format!("/api/{route}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 500, "route {route}");
        let text = res.text().await.unwrap();
        assert_eq!(text, r#"{"error":"Internal server error"}"#);
    }

    // The server survives the panic.
    server.write_handler("ping.toml", "handler = \"status\"\n");
    let res = client.get(server.url("/api/ping")).send().await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_broken_primary_falls_back() {
    let server = common::start_server(|_| {}).await;
    server.write_handler("reports.toml", "handler = = broken");
    server.write_handler(
        "reports.json",
        r#"{ "respond": { "status": 200, "body": "from json" } }"#,
    );

    let res = common::client()
        .get(server.url("/api/reports"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "from json");
}

#[tokio::test]
async fn test_mount_root_is_invalid_path() {
    let server = common::start_server(|_| {}).await;

    let client = common::client();
    for path in ["/api", "/api/"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 400, "path {path}");
    }
}

#[tokio::test]
async fn test_concurrent_dispatches_each_get_one_response() {
    let server = common::start_server(|_| {}).await;
    server.write_handler("items.toml", "[respond]\nstatus = 200\nbody = { items = [] }\n");

    let client = common::client();
    let mut tasks = Vec::new();
    for i in 0..50 {
        let client = client.clone();
        let url = if i % 2 == 0 {
            server.url("/api/items")
        } else {
            server.url("/api/missing")
        };
        tasks.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().status().as_u16()
        }));
    }

    let mut ok = 0;
    let mut not_found = 0;
    for task in tasks {
        match task.await.unwrap() {
            200 => ok += 1,
            404 => not_found += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(ok, 25);
    assert_eq!(not_found, 25);
}

#[tokio::test]
async fn test_custom_mount() {
    let server = common::start_server(|config| config.api.mount = "/v1".into()).await;
    server.write_handler("health.toml", "handler = \"status\"\n");

    let client = common::client();
    let res = client.get(server.url("/v1/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let res = client.get(server.url("/api/health")).send().await.unwrap();
    assert_eq!(res.status(), 404);
}
