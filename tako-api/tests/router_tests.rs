/// Router tests that never reach the database
///
/// Every request here is rejected or answered before a query runs, so the
/// app is built over a lazily-connected pool.

mod common;

use axum::body::Body;
use axum::http::Request;
use common::{bearer, get_request, interaction_body, json_request, lazy_app, send, signed_slack_request, slack_signature};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_index() {
    let app = lazy_app().await;

    let (status, body) = send(&app, get_request("/", None)).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "service": "tako-tasks", "status": "ok" }));
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = lazy_app().await;

    let response = app.oneshot(get_request("/tasks", None)).await.unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_task_api_requires_bearer_token() {
    let app = lazy_app().await;

    let (status, body) = send(&app, get_request("/tasks", None)).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&app, get_request("/workspace/settings", Some("Bearer not-a-jwt"))).await;
    assert_eq!(status, 401);

    let (status, _) = send(&app, get_request("/tasks/1", Some("Basic dXNlcjpwYXNz"))).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let app = lazy_app().await;

    let claims = tako_shared::auth::jwt::Claims::new(
        1,
        "T1",
        tako_shared::auth::jwt::SubjectKind::Workspace,
        chrono::Duration::minutes(5),
    );
    let token = tako_shared::auth::jwt::create_token(&claims, "another-secret-that-is-32-bytes-long!").unwrap();

    let (status, _) = send(&app, get_request("/tasks", Some(&format!("Bearer {}", token)))).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_create_task_validation() {
    let app = lazy_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/tasks",
            Some(&bearer(1)),
            json!({
                "title": "",
                "assignee_user_id": "U1",
                "creator_user_id": "U1",
                "workspace_id": 1,
                "priority": "high"
            }),
        ),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "title");
}

#[tokio::test]
async fn test_settings_must_be_an_object() {
    let app = lazy_app().await;

    let (status, body) = send(
        &app,
        json_request("PUT", "/workspace/settings", Some(&bearer(1)), json!([1, 2, 3])),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["message"], "Settings must be a JSON object");
}

#[tokio::test]
async fn test_request_access_validation() {
    let app = lazy_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/request-access",
            None,
            json!({ "name": "Ada", "email": "not-an-email", "company": "Engines", "team_size": "1-10" }),
        ),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(body["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_verify_key_too_short() {
    let app = lazy_app().await;

    let (status, _) = send(&app, json_request("POST", "/verify-key", None, json!({ "key": "  KEY  " }))).await;

    assert_eq!(status, 422);
}

#[tokio::test]
async fn test_install_redirects_to_slack() {
    let app = lazy_app().await;

    let response = app.oneshot(get_request("/slack/install", None)).await.unwrap();

    assert_eq!(response.status(), 307);
    let location = response.headers().get("location").unwrap().to_str().unwrap();
    assert!(location.starts_with("https://slack.com/oauth/v2/authorize?client_id=123.456&scope=commands%20chat:write"));
    assert!(location.ends_with("redirect_uri=https%3A%2F%2Ftako.test%2Fslack%2Foauth%2Fcallback"));
}

#[tokio::test]
async fn test_commands_reject_bad_signature() {
    let app = lazy_app().await;
    let body = "command=%2Ftask&text=create&team_id=T1&trigger_id=1.2";
    let timestamp = chrono::Utc::now().timestamp().to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/slack/commands")
        .header("x-slack-request-timestamp", &timestamp)
        .header("x-slack-signature", slack_signature(&timestamp, "command=%2Ftask"))
        .body(Body::from(body))
        .unwrap();

    let (status, response) = send(&app, request).await;
    assert_eq!(status, 401);
    assert_eq!(response["message"], "Invalid signature");
}

#[tokio::test]
async fn test_commands_reject_missing_headers() {
    let app = lazy_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/slack/commands")
        .body(Body::from("command=%2Ftask"))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_interactions_reject_stale_timestamp() {
    let app = lazy_app().await;
    let body = interaction_body(&json!({ "type": "shortcut" }));
    let timestamp = (chrono::Utc::now().timestamp() - 301).to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/slack/interactions")
        .header("x-slack-request-timestamp", &timestamp)
        .header("x-slack-signature", slack_signature(&timestamp, &body))
        .body(Body::from(body))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_commands_reject_out_of_range_timestamp() {
    let app = lazy_app().await;
    let body = "command=%2Ftask&text=create&team_id=T1".to_string();
    let timestamp = i64::MIN.to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/slack/commands")
        .header("x-slack-request-timestamp", &timestamp)
        .header("x-slack-signature", slack_signature(&timestamp, &body))
        .body(Body::from(body))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_unknown_interaction_is_unhandled() {
    let app = lazy_app().await;
    let body = interaction_body(&json!({ "type": "shortcut", "team": { "id": "T1" } }));

    let (status, response) = send(&app, signed_slack_request("/slack/interactions", &body)).await;

    assert_eq!(status, 200);
    assert_eq!(response, json!({ "text": "Unhandled interaction" }));
}

#[tokio::test]
async fn test_malformed_interaction_payload() {
    let app = lazy_app().await;

    let (status, _) = send(&app, signed_slack_request("/slack/interactions", "payload=%7Bnot-json")).await;
    assert_eq!(status, 400);

    let (status, _) = send(&app, signed_slack_request("/slack/interactions", "nothing=here")).await;
    assert_eq!(status, 400);
}
