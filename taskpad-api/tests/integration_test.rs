/// Integration tests for the Taskpad API
///
/// Exercises the full system end-to-end against a real database:
/// - Registration, login, and token refresh
/// - Profile read/update and password change
/// - Task CRUD and cross-user isolation
/// - Page ownership rules
/// - Message log
/// - Rate limiting (only when REDIS_URL is set)
///
/// All tests skip cleanly when DATABASE_URL is unset.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use taskpad_shared::auth::jwt::{create_token, Claims, TokenType};

/// Registering twice with the same username or email returns 409
#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;

    // Same username, different email
    let (status, body) = ctx
        .request(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": user.username,
                "email": format!("other-{}", user.email),
                "password": "SecureP4ssword",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // Same email, different username
    let (status, _) = ctx
        .request(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": format!("{}x", user.username),
                "email": user.email,
                "password": "SecureP4ssword",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    ctx.cleanup(&[&user]).await;
}

/// Wrong password and unknown email produce identical 401 responses
#[tokio::test]
async fn test_login_failures_indistinguishable() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;

    let (wrong_pw_status, wrong_pw_body) = ctx
        .request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": user.email, "password": "WrongP4ssword" })),
        )
        .await;

    let (unknown_status, unknown_body) = ctx
        .request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "WrongP4ssword" })),
        )
        .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    // Same body in both cases, so the endpoint does not reveal which
    // emails are registered.
    assert_eq!(wrong_pw_body, unknown_body);

    ctx.cleanup(&[&user]).await;
}

/// Validation failures return 422 with field details
#[tokio::test]
async fn test_registration_validation() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    // Bad email format
    let (status, body) = ctx
        .request(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "valid-name",
                "email": "not-an-email",
                "password": "SecureP4ssword",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    // Weak password (no digits)
    let (status, _) = ctx
        .request(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "valid-name",
                "email": "valid@example.com",
                "password": "Weakpassword",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

/// Task CRUD happy path
#[tokio::test]
async fn test_task_lifecycle() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;
    let token = user.access_token.clone();

    // Create
    let (status, task) = ctx
        .request(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({ "name": "Write tests" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["name"], "Write tests");
    assert_eq!(task["state"], "active");
    let task_id = task["id"].as_str().unwrap().to_string();

    // List contains it
    let (status, tasks) = ctx.request("GET", "/api/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    // Update state
    let (status, updated) = ctx
        .request(
            "PUT",
            &format!("/api/tasks/{}", task_id),
            Some(&token),
            Some(json!({ "state": "done" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["state"], "done");
    assert_eq!(updated["name"], "Write tests");

    // Delete
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/tasks/{}", task_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tasks) = ctx.request("GET", "/api/tasks", Some(&token), None).await;
    assert!(tasks.as_array().unwrap().is_empty());

    ctx.cleanup(&[&user]).await;
}

/// One user's tasks are invisible to another: absent from listings, and
/// mutations return 404 rather than 403
#[tokio::test]
async fn test_task_isolation_between_users() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let alice = ctx.register_user().await;
    let bob = ctx.register_user().await;

    let (_, task) = ctx
        .request(
            "POST",
            "/api/tasks",
            Some(&alice.access_token),
            Some(json!({ "name": "Alice's secret" })),
        )
        .await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // Bob's listing does not contain Alice's task
    let (_, bob_tasks) = ctx
        .request("GET", "/api/tasks", Some(&bob.access_token), None)
        .await;
    assert!(bob_tasks.as_array().unwrap().is_empty());

    // Bob's update and delete both 404 (not 403, so IDs leak nothing)
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/tasks/{}", task_id),
            Some(&bob.access_token),
            Some(json!({ "name": "hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/tasks/{}", task_id),
            Some(&bob.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Alice still sees her task
    let (_, alice_tasks) = ctx
        .request("GET", "/api/tasks", Some(&alice.access_token), None)
        .await;
    assert_eq!(alice_tasks.as_array().unwrap().len(), 1);

    ctx.cleanup(&[&alice, &bob]).await;
}

/// Protected routes reject missing and malformed credentials
#[tokio::test]
async fn test_authentication_required() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let (status, _) = ctx.request("GET", "/api/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.request("GET", "/api/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request("GET", "/api/tasks", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Expired and refresh-typed tokens are rejected on protected routes
#[tokio::test]
async fn test_wrong_token_kinds_rejected() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;

    // A refresh token is not an access token
    let (status, _) = ctx
        .request("GET", "/api/tasks", Some(&user.refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // An expired access token (2 hours past, beyond validation leeway)
    let expired_claims = Claims::with_expiration(
        user.user_id,
        TokenType::Access,
        chrono::Duration::hours(-2),
    );
    let expired_token = create_token(&expired_claims, common::TEST_JWT_SECRET).unwrap();

    let (status, _) = ctx
        .request("GET", "/api/tasks", Some(&expired_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&[&user]).await;
}

/// A refresh token can be exchanged for a working access token
#[tokio::test]
async fn test_token_refresh() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;

    let (status, body) = ctx
        .request(
            "POST",
            "/api/refresh",
            None,
            Some(json!({ "refresh_token": user.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let new_access = body["access_token"].as_str().unwrap().to_string();
    let (status, _) = ctx.request("GET", "/api/tasks", Some(&new_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not accepted by the refresh endpoint
    let (status, _) = ctx
        .request(
            "POST",
            "/api/refresh",
            None,
            Some(json!({ "refresh_token": user.access_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&[&user]).await;
}

/// Profile responses never contain the password hash
#[tokio::test]
async fn test_profile_read_and_update() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;
    let token = user.access_token.clone();

    let (status, profile) = ctx.request("GET", "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], user.username);
    assert_eq!(profile["email"], user.email);
    assert!(profile.get("password_hash").is_none());
    assert!(profile["last_login_at"].is_string());

    // Partial update: only the avatar
    let (status, updated) = ctx
        .request(
            "PUT",
            "/api/user",
            Some(&token),
            Some(json!({ "avatar_url": "https://example.com/a.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["avatar_url"], "https://example.com/a.png");
    assert_eq!(updated["username"], user.username);

    ctx.cleanup(&[&user]).await;
}

/// Changing the password invalidates the old one at next login
#[tokio::test]
async fn test_password_change() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;
    let token = user.access_token.clone();
    let new_password = "EvenM0reSecure";

    // Wrong current password is rejected
    let (status, _) = ctx
        .request(
            "PATCH",
            "/api/user",
            Some(&token),
            Some(json!({
                "current_password": "WrongP4ssword",
                "new_password": new_password,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request(
            "PATCH",
            "/api/user",
            Some(&token),
            Some(json!({
                "current_password": user.password,
                "new_password": new_password,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works
    let (status, _) = ctx
        .request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": user.email, "password": user.password })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // New password does
    let (status, _) = ctx
        .request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": user.email, "password": new_password })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup(&[&user]).await;
}

/// Pages are publicly readable but only the creator may mutate them
#[tokio::test]
async fn test_page_ownership() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let alice = ctx.register_user().await;
    let bob = ctx.register_user().await;
    let title = format!("Home-{}", uuid::Uuid::new_v4().simple());

    let (status, page) = ctx
        .request(
            "POST",
            "/api/pages",
            Some(&alice.access_token),
            Some(json!({ "title": title, "content": "Welcome" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(page["title"], title.as_str());

    // Duplicate title conflicts
    let (status, _) = ctx
        .request(
            "POST",
            "/api/pages",
            Some(&bob.access_token),
            Some(json!({ "title": title, "content": "Mine now" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Anyone can read, no token needed
    let (status, page) = ctx
        .request("GET", &format!("/api/pages/{}", title), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"], "Welcome");

    // Non-owner edits and deletes are forbidden
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/pages/{}", title),
            Some(&bob.access_token),
            Some(json!({ "content": "Defaced" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/pages/{}", title),
            Some(&bob.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner may edit
    let (status, page) = ctx
        .request(
            "PUT",
            &format!("/api/pages/{}", title),
            Some(&alice.access_token),
            Some(json!({ "content": "Welcome back" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"], "Welcome back");

    // And delete
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/pages/{}", title),
            Some(&alice.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .request("GET", &format!("/api/pages/{}", title), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup(&[&alice, &bob]).await;
}

/// Page search filters by title substring, case-insensitively
#[tokio::test]
async fn test_page_search() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;
    let marker = uuid::Uuid::new_v4().simple().to_string();

    for title in [
        format!("Guide-{}", marker),
        format!("Reference-{}", marker),
    ] {
        let (status, _) = ctx
            .request(
                "POST",
                "/api/pages",
                Some(&user.access_token),
                Some(json!({ "title": title, "content": "..." })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, pages) = ctx
        .request("GET", &format!("/api/pages?q=guide-{}", marker), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let pages = pages.as_array().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["title"], format!("Guide-{}", marker));

    ctx.cleanup(&[&user]).await;
}

/// Messages append to a shared log and list newest first
#[tokio::test]
async fn test_message_log() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let user = ctx.register_user().await;
    let token = user.access_token.clone();

    let (status, first) = ctx
        .request(
            "POST",
            "/api/messages",
            Some(&token),
            Some(json!({ "body": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["body"], "hello");

    let (status, _) = ctx
        .request(
            "POST",
            "/api/messages",
            Some(&token),
            Some(json!({ "body": "world" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, messages) = ctx
        .request("GET", "/api/messages?limit=2", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    // Newest first
    assert_eq!(messages[0]["body"], "world");
    assert_eq!(messages[1]["body"], "hello");

    // Empty bodies are rejected
    let (status, _) = ctx
        .request(
            "POST",
            "/api/messages",
            Some(&token),
            Some(json!({ "body": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    ctx.cleanup(&[&user]).await;
}

/// The health endpoint reports database connectivity
#[tokio::test]
async fn test_health_check() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let (status, body) = ctx.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

/// Security headers are present on every response
#[tokio::test]
async fn test_security_headers() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::Service as _;

    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.call(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    // HSTS only in production mode, which tests never enable
    assert!(response
        .headers()
        .get("strict-transport-security")
        .is_none());
}

/// The sixth login attempt inside a minute from one IP is rejected
///
/// Requires Redis; skipped (alongside the DATABASE_URL guard) when
/// REDIS_URL is unset.
#[tokio::test]
async fn test_login_rate_limit() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };
    if ctx.config.redis.url.is_none() {
        eprintln!("REDIS_URL not set, skipping rate limit test");
        return;
    }

    use axum::body::Body;
    use axum::http::Request;
    use tower::Service as _;

    // A unique client IP per run so earlier runs don't pollute the bucket
    let id = uuid::Uuid::new_v4();
    let ip = format!("10.1.{}.{}", id.as_bytes()[0], id.as_bytes()[1]);

    let mut last_status = StatusCode::OK;
    let mut retry_after_present = false;

    for _ in 0..6 {
        let request = Request::builder()
            .method("POST")
            .uri("/api/login")
            .header("content-type", "application/json")
            .header("x-forwarded-for", &ip)
            .body(Body::from(
                json!({ "email": "nobody@example.com", "password": "WrongP4ssword" })
                    .to_string(),
            ))
            .unwrap();

        let response = ctx.app.call(request).await.unwrap();
        last_status = response.status();
        retry_after_present = response.headers().contains_key("retry-after");
    }

    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
    assert!(retry_after_present);
}
