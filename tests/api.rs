//! HTTP-level tests against the full router

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use podium::api::{build_router, AppState};
use podium::app::build_state;
use podium::config::Config;
use podium::db::{create_test_pool, migrations};
use podium::models::{CreateUserInput, UserRole};

const PASSWORD: &str = "correct-horse-42";

struct TestApp {
    server: TestServer,
    state: AppState,
    _uploads: TempDir,
    _backups: TempDir,
}

async fn test_app() -> TestApp {
    let uploads = TempDir::new().unwrap();
    let backups = TempDir::new().unwrap();

    let mut config = Config::default();
    config.upload.path = uploads.path().to_path_buf();
    config.backup.dir = backups.path().to_path_buf();

    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let state = build_state(pool, &config);
    let server = TestServer::new(build_router(state.clone(), &config.server.cors_origin)).unwrap();

    TestApp {
        server,
        state,
        _uploads: uploads,
        _backups: backups,
    }
}

impl TestApp {
    async fn add_user(&self, email: &str, role: UserRole) {
        self.state
            .user_service
            .create_user(CreateUserInput {
                email: email.to_string(),
                name: "Test User".to_string(),
                password: PASSWORD.to_string(),
                role: Some(role),
            })
            .await
            .unwrap();
    }

    /// Create a user with `role` and return a bearer token for it
    async fn token_for(&self, email: &str, role: UserRole) -> String {
        self.add_user(email, role).await;
        let response = self
            .server
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    let app = test_app().await;

    let response = app.server.get("/api/admin/content/news").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "UNAUTHORIZED");

    let response = app
        .server
        .get("/api/admin/content/news")
        .authorization_bearer("not-a-session")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_token_opens_the_admin_api() {
    let app = test_app().await;
    let token = app.token_for("editor@example.org", UserRole::ContentEditor).await;

    let me = app.server.get("/api/auth/me").authorization_bearer(&token).await;
    me.assert_status_ok();
    let body = me.json::<Value>();
    assert_eq!(body["email"], "editor@example.org");
    assert_eq!(body["role"], "content_editor");
    assert!(body.get("password_hash").is_none());

    app.server
        .get("/api/admin/dashboard")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    app.server
        .post("/api/auth/logout")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .get("/api/auth/me")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = test_app().await;
    app.add_user("someone@example.org", UserRole::Viewer).await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "someone@example.org", "password": "nope-nope" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn viewer_cannot_write_news() {
    let app = test_app().await;
    let token = app.token_for("viewer@example.org", UserRole::Viewer).await;

    // Reads are open to every role
    app.server
        .get("/api/admin/content/news")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let response = app
        .server
        .post("/api/admin/content/news")
        .authorization_bearer(&token)
        .json(&json!({ "title": "Not allowed", "content": "x" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn news_editor_cannot_manage_users() {
    let app = test_app().await;
    let token = app.token_for("news@example.org", UserRole::NewsEditor).await;

    app.server
        .get("/api/admin/users")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn empty_title_is_rejected_and_nothing_is_stored() {
    let app = test_app().await;
    let token = app.token_for("news@example.org", UserRole::NewsEditor).await;

    let response = app
        .server
        .post("/api/admin/content/news")
        .authorization_bearer(&token)
        .json(&json!({ "title": "", "content": "x" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

    let list = app
        .server
        .get("/api/admin/content/news")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn published_news_is_public_and_drafts_are_not() {
    let app = test_app().await;
    let token = app.token_for("news@example.org", UserRole::NewsEditor).await;

    let created = app
        .server
        .post("/api/admin/content/news")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "New Bridge Opens",
            "content": "The **bridge** is open.",
            "status": "published"
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["slug"], "new-bridge-opens");

    app.server
        .post("/api/admin/content/news")
        .authorization_bearer(&token)
        .json(&json!({ "title": "Unfinished draft", "content": "wip" }))
        .await
        .assert_status(StatusCode::CREATED);

    let list = app.server.get("/api/news").await.json::<Value>();
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["title"], "New Bridge Opens");

    app.server
        .get("/api/news/new-bridge-opens")
        .await
        .assert_status_ok();
    app.server
        .get("/api/news/unfinished-draft")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn speech_update_changes_only_the_given_fields() {
    let app = test_app().await;
    let token = app.token_for("editor@example.org", UserRole::ContentEditor).await;

    let created = app
        .server
        .post("/api/admin/content/speeches")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Address to the Chamber",
            "content": "Madam Speaker...",
            "venue": "Old Hall"
        }))
        .await
        .json::<Value>();
    let id = created["id"].as_i64().unwrap();

    let updated = app
        .server
        .put(&format!("/api/admin/content/speeches/{}", id))
        .authorization_bearer(&token)
        .json(&json!({ "venue": "Town Hall" }))
        .await;
    updated.assert_status_ok();
    let updated = updated.json::<Value>();
    assert_eq!(updated["venue"], "Town Hall");
    assert_eq!(updated["title"], "Address to the Chamber");
    assert_eq!(updated["content"], "Madam Speaker...");
    assert_eq!(updated["slug"], created["slug"]);
}

#[tokio::test]
async fn short_search_query_returns_an_empty_page() {
    let app = test_app().await;

    let response = app.server.get("/api/search").add_query_param("q", "a").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["total"], 0);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn search_highlights_matches_in_published_content() {
    let app = test_app().await;
    let token = app.token_for("editor@example.org", UserRole::ContentEditor).await;

    app.server
        .post("/api/admin/content/reports")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Annual Roads Report",
            "summary": "Spending on roads rose this year.",
            "status": "published"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get("/api/search")
        .add_query_param("q", "roads")
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["query"], "roads");
    assert_eq!(body["total"], 1);

    let hit = &body["items"][0];
    assert_eq!(hit["type"], "report");
    assert_eq!(hit["title_html"], "Annual <mark>Roads</mark> Report");
    assert!(hit["snippet"].as_str().unwrap().contains("<mark>roads</mark>"));
}

#[tokio::test]
async fn search_rejects_an_unknown_type_filter() {
    let app = test_app().await;

    app.server
        .get("/api/search")
        .add_query_param("q", "roads")
        .add_query_param("type", "podcast")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contact_form_lands_in_the_inbox() {
    let app = test_app().await;

    let receipt = app
        .server
        .post("/api/contact")
        .json(&json!({
            "name": "Jo Citizen",
            "email": "jo@example.org",
            "subject": "Pothole",
            "message": "There is a pothole on Main Street."
        }))
        .await;
    receipt.assert_status(StatusCode::CREATED);

    app.server
        .post("/api/contact")
        .json(&json!({ "name": "Jo", "email": "not-an-email", "message": "hi" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let token = app.token_for("viewer@example.org", UserRole::Viewer).await;
    let inbox = app
        .server
        .get("/api/admin/messages")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(inbox["total"], 1);
    assert_eq!(inbox["items"][0]["subject"], "Pothole");
}

#[tokio::test]
async fn site_info_is_public() {
    let app = test_app().await;

    let response = app.server.get("/api/site").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["version"].is_string());
    assert!(body.get("items_per_page").is_none());
}

#[tokio::test]
async fn health_pings_the_database() {
    let app = test_app().await;

    let response = app.server.get("/api/health").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "sqlite");
}

#[tokio::test]
async fn failed_logins_are_limited_across_email_spellings() {
    let app = test_app().await;
    app.add_user("admin@example.org", UserRole::SuperAdmin).await;

    for i in 0..5 {
        let email = format!("{}ADMIN@example.org", " ".repeat(i));
        app.server
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": "wrong-password" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": " admin@example.org", "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>()["error"]["code"], "RATE_LIMIT");
}

#[tokio::test]
async fn spoofed_forwarded_for_does_not_escape_the_ip_limit() {
    let app = test_app().await;

    for i in 0..10 {
        app.server
            .post("/api/auth/login")
            .add_header(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_str(&format!("10.9.8.{}, 198.51.100.4", i)).unwrap(),
            )
            .json(&json!({ "email": format!("nobody{}@example.org", i), "password": "x" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    app.server
        .post("/api/auth/login")
        .add_header(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("10.9.8.200, 198.51.100.4"),
        )
        .json(&json!({ "email": "fresh@example.org", "password": "x" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
