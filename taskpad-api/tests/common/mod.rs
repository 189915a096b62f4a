/// Common test utilities for integration tests
///
/// Provides shared infrastructure:
/// - Test database setup (skips the test when DATABASE_URL is unset)
/// - App router construction with a fixed test JWT secret
/// - User registration/login helpers that go through the real API
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use sqlx::PgPool;
use taskpad_api::app::{build_router, AppState};
use taskpad_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, RedisConfig};
use tower::Service as _;
use uuid::Uuid;

/// JWT secret used by all integration tests
pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-0123456789abcdef";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
}

/// A user registered through the API, with a valid access token
pub struct TestUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestUser {
    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl TestContext {
    /// Creates a new test context against the configured database
    ///
    /// Returns None (so the caller can skip) when DATABASE_URL is unset,
    /// letting the suite pass on machines without a test database.
    pub async fn new() -> Option<Self> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return None;
        };

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: database_url.clone(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
            redis: RedisConfig {
                url: std::env::var("REDIS_URL").ok(),
            },
        };

        let db = PgPool::connect(&database_url).await.unwrap();

        // Path relative to the crate's Cargo.toml, not this file
        sqlx::migrate!("../taskpad-shared/migrations")
            .run(&db)
            .await
            .unwrap();

        let redis = match &config.redis.url {
            Some(url) => {
                let client = redis::Client::open(url.as_str()).unwrap();
                Some(redis::aio::ConnectionManager::new(client).await.unwrap())
            }
            None => None,
        };

        let state = AppState::new(db.clone(), redis, config.clone());
        let app = build_router(state);

        Some(TestContext { db, app, config })
    }

    /// Registers a fresh user through the API and logs in for tokens
    ///
    /// Username and email are randomized so tests never collide.
    pub async fn register_user(&mut self) -> TestUser {
        let suffix = Uuid::new_v4().simple().to_string();
        let username = format!("user-{}", &suffix[..12]);
        let email = format!("{}@example.com", username);
        let password = "SecureP4ssword".to_string();

        let (status, body) = self
            .request(
                "POST",
                "/api/register",
                None,
                Some(json!({
                    "username": username,
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let (status, body) = self
            .request(
                "POST",
                "/api/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        TestUser {
            user_id: body["user_id"].as_str().unwrap().parse().unwrap(),
            username,
            email,
            password,
            access_token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Sends a JSON request to the app, returning status and parsed body
    ///
    /// An empty response body (e.g. 204) parses as JSON null.
    pub async fn request(
        &mut self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = builder
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = self.app.call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Deletes test users (cascades to their tasks, pages, and messages)
    pub async fn cleanup(&self, users: &[&TestUser]) {
        for user in users {
            taskpad_shared::models::user::User::delete(&self.db, user.user_id)
                .await
                .unwrap();
        }
    }
}
