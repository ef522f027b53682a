mod common;

use axum::http::StatusCode;
use common::{TestOptions, bearer, create_test_app};
use serde_json::{Value, json};

// ─── CREATE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_link_generates_code() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "originalUrl": "https://example.com/long/path" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body = response.json::<Value>();
    let code = body["link"]["shortCode"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert_eq!(body["link"]["originalUrl"], "https://example.com/long/path");
    assert_eq!(body["link"]["clickCount"], 0);
    assert_eq!(body["link"]["isActive"], true);
    assert_eq!(body["link"]["ownerId"], 1);
    assert_eq!(body["shortUrl"], format!("https://s.example.com/{}", code));
}

#[tokio::test]
async fn test_create_link_with_alias() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "originalUrl": "https://example.com", "customAlias": "my-link" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body = response.json::<Value>();
    assert_eq!(body["link"]["customAlias"], "my-link");
    assert_eq!(body["shortUrl"], "https://s.example.com/my-link");
}

#[tokio::test]
async fn test_create_link_duplicate_alias_conflicts() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let first = app.token_for(1).await;
    let second = app.token_for(2).await;
    let server = app.server();

    server
        .post("/api/links")
        .add_header("Authorization", bearer(&first))
        .json(&json!({ "originalUrl": "https://one.com", "customAlias": "my-link" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer(&second))
        .json(&json!({ "originalUrl": "https://two.com", "customAlias": "my-link" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "conflict");
    assert_eq!(body["error"]["message"], "This alias is already taken");

    // The first link still resolves
    let redirect = server.get("/my-link").await;
    assert_eq!(redirect.status_code(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(redirect.header("location"), "https://one.com");
}

#[tokio::test]
async fn test_create_link_rejects_invalid_input() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    for body in [
        json!({ "originalUrl": "ftp://example.com" }),
        json!({ "originalUrl": "not a url" }),
        json!({ "originalUrl": "https://example.com", "customAlias": "ab" }),
        json!({ "originalUrl": "https://example.com", "customAlias": "has space" }),
        json!({ "originalUrl": "https://example.com", "customAlias": "a".repeat(51) }),
        json!({ "customAlias": "missing-url" }),
    ] {
        let response = server
            .post("/api/links")
            .add_header("Authorization", bearer(&token))
            .json(&body)
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_create_link_malformed_body_uses_error_envelope() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "originalUrl": 123 }))
        .await;

    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["message"], "Invalid request body");

    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .text("originalUrl=https://example.com")
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");

    assert!(app.state.link_service.list(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_link_alias_length_boundaries() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    for alias in ["abc".to_string(), "b".repeat(50)] {
        server
            .post("/api/links")
            .add_header("Authorization", bearer(&token))
            .json(&json!({ "originalUrl": "https://example.com", "customAlias": alias }))
            .await
            .assert_status(StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_create_link_empty_alias_is_ignored() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "originalUrl": "https://example.com", "customAlias": "" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert!(body["link"]["customAlias"].is_null());
    assert_eq!(body["link"]["shortCode"].as_str().unwrap().len(), 6);
}

#[tokio::test]
async fn test_create_link_requires_auth() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let server = app.server();

    let response = server
        .post("/api/links")
        .json(&json!({ "originalUrl": "https://example.com" }))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(response.header("www-authenticate"), "Bearer");

    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer("not-a-real-token"))
        .json(&json!({ "originalUrl": "https://example.com" }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_create_link_daily_quota() {
    let (app, _rx) = create_test_app(TestOptions {
        rate_limit_per_day: 2,
        ..Default::default()
    });
    let token = app.token_for(1).await;
    let other = app.token_for(2).await;
    let server = app.server();

    for _ in 0..2 {
        server
            .post("/api/links")
            .add_header("Authorization", bearer(&token))
            .json(&json!({ "originalUrl": "https://example.com" }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "originalUrl": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(response.maybe_header("retry-after").is_some());
    assert_eq!(response.json::<Value>()["error"]["code"], "rate_limited");

    // Quotas are per owner
    server
        .post("/api/links")
        .add_header("Authorization", bearer(&other))
        .json(&json!({ "originalUrl": "https://example.com" }))
        .await
        .assert_status(StatusCode::CREATED);
}

// ─── LIST ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_links_newest_first_and_owner_scoped() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let other = app.token_for(2).await;
    let server = app.server();

    for alias in ["first", "second", "third"] {
        server
            .post("/api/links")
            .add_header("Authorization", bearer(&token))
            .json(&json!({ "originalUrl": "https://example.com", "customAlias": alias }))
            .await
            .assert_status(StatusCode::CREATED);
    }
    server
        .post("/api/links")
        .add_header("Authorization", bearer(&other))
        .json(&json!({ "originalUrl": "https://example.com", "customAlias": "foreign" }))
        .await
        .assert_status(StatusCode::CREATED);

    let first = server
        .get("/api/links")
        .add_header("Authorization", bearer(&token))
        .await;
    first.assert_status_ok();

    let body = first.json::<Value>();
    let aliases: Vec<&str> = body["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["customAlias"].as_str().unwrap())
        .collect();
    assert_eq!(aliases, vec!["third", "second", "first"]);

    let again = server
        .get("/api/links")
        .add_header("Authorization", bearer(&token))
        .await
        .json::<Value>();
    assert_eq!(again, body);
}

// ─── UPDATE ──────────────────────────────────────────────────────────────────

async fn create(server: &axum_test::TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/api/links")
        .add_header("Authorization", bearer(token))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["link"].clone()
}

#[tokio::test]
async fn test_update_link_url_and_alias() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let link = create(&server, &token, json!({ "originalUrl": "https://old.com" })).await;
    let id = link["id"].as_i64().unwrap();

    server
        .put(&format!("/api/links/{}", id))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "customAlias": "old-alias" }))
        .await
        .assert_status_ok();

    let response = server
        .put(&format!("/api/links/{}", id))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "originalUrl": "https://new.com", "customAlias": "new-alias" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["link"]["originalUrl"], "https://new.com");
    assert_eq!(body["link"]["customAlias"], "new-alias");
    assert_eq!(body["link"]["shortCode"], link["shortCode"]);

    let redirect = server.get("/new-alias").await;
    assert_eq!(redirect.status_code(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(redirect.header("location"), "https://new.com");

    // The short code keeps working and the old alias is free again
    let code = link["shortCode"].as_str().unwrap();
    server
        .get(&format!("/{}", code))
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);
    create(
        &server,
        &token,
        json!({ "originalUrl": "https://other.com", "customAlias": "old-alias" }),
    )
    .await;
}

#[tokio::test]
async fn test_update_link_clear_alias() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let link = create(
        &server,
        &token,
        json!({ "originalUrl": "https://example.com" }),
    )
    .await;
    let id = link["id"].as_i64().unwrap();

    server
        .put(&format!("/api/links/{}", id))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "customAlias": "temp-alias" }))
        .await
        .assert_status_ok();

    let response = server
        .put(&format!("/api/links/{}", id))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "customAlias": null }))
        .await;

    response.assert_status_ok();
    assert!(response.json::<Value>()["link"]["customAlias"].is_null());
    server.get("/temp-alias").await.assert_status_not_found();
}

#[tokio::test]
async fn test_update_link_alias_conflict() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    create(
        &server,
        &token,
        json!({ "originalUrl": "https://a.com", "customAlias": "taken" }),
    )
    .await;
    let link = create(&server, &token, json!({ "originalUrl": "https://b.com" })).await;

    server
        .put(&format!("/api/links/{}", link["id"]))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "customAlias": "taken" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_link_deactivate_stops_redirects() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let link = create(
        &server,
        &token,
        json!({ "originalUrl": "https://example.com", "customAlias": "pausable" }),
    )
    .await;

    server.get("/pausable").await.assert_status(StatusCode::TEMPORARY_REDIRECT);

    let response = server
        .put(&format!("/api/links/{}", link["id"]))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "isActive": false }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["link"]["isActive"], false);

    server.get("/pausable").await.assert_status_not_found();
}

#[tokio::test]
async fn test_update_link_of_other_owner_is_not_found() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let owner = app.token_for(1).await;
    let intruder = app.token_for(2).await;
    let server = app.server();

    let link = create(&server, &owner, json!({ "originalUrl": "https://example.com" })).await;

    server
        .put(&format!("/api/links/{}", link["id"]))
        .add_header("Authorization", bearer(&intruder))
        .json(&json!({ "originalUrl": "https://evil.com" }))
        .await
        .assert_status_not_found();

    server
        .put("/api/links/9999")
        .add_header("Authorization", bearer(&owner))
        .json(&json!({ "originalUrl": "https://example.com" }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_update_link_invalid_url() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let link = create(&server, &token, json!({ "originalUrl": "https://example.com" })).await;

    server
        .put(&format!("/api/links/{}", link["id"]))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "originalUrl": "javascript:alert(1)" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_update_link_malformed_input_uses_error_envelope() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let link = create(&server, &token, json!({ "originalUrl": "https://example.com" })).await;

    let response = server
        .put(&format!("/api/links/{}", link["id"]))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "isActive": "nope" }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");

    let response = server
        .delete("/api/links/not-a-number")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "Invalid path parameter"
    );
}

// ─── DELETE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_link_success() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    let link = create(
        &server,
        &token,
        json!({ "originalUrl": "https://example.com", "customAlias": "doomed" }),
    )
    .await;

    let response = server
        .delete(&format!("/api/links/{}", link["id"]))
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "Link deleted");

    server.get("/doomed").await.assert_status_not_found();

    // Deleting again is a 404
    server
        .delete(&format!("/api/links/{}", link["id"]))
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_delete_link_of_other_owner_is_not_found() {
    let (app, _rx) = create_test_app(TestOptions::default());
    let owner = app.token_for(1).await;
    let intruder = app.token_for(2).await;
    let server = app.server();

    let link = create(
        &server,
        &owner,
        json!({ "originalUrl": "https://example.com", "customAlias": "mine" }),
    )
    .await;

    server
        .delete(&format!("/api/links/{}", link["id"]))
        .add_header("Authorization", bearer(&intruder))
        .await
        .assert_status_not_found();

    server.get("/mine").await.assert_status(StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    use linktrail::domain::repositories::TokenRepository;

    let (app, _rx) = create_test_app(TestOptions::default());
    let token = app.token_for(1).await;
    let server = app.server();

    server
        .get("/api/links")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status_ok();

    let stored = app.tokens.find_by_name("test-1").await.unwrap().unwrap();
    app.tokens.revoke_token(stored.id).await.unwrap();

    let response = server
        .get("/api/links")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header("www-authenticate"), "Bearer");
}
