mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use catalog_api::types::Role;
use common::{TestApp, PASSWORD};

#[tokio::test]
async fn register_returns_token_without_password() {
    let app = TestApp::new();
    let res = app
        .send(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({
                "name": "Ann",
                "email": "Ann@Example.com",
                "password": "longenough",
                "role": "admin"
            })),
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["status"], "success");
    assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
    let user = &res.body["data"]["user"];
    assert_eq!(user["email"], "ann@example.com");
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());
    assert!(user.get("__v").is_none());

    let token = res.body["token"].as_str().unwrap();
    let res = app.send(Method::GET, "/api/users/me", Some(token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["user"]["name"], "Ann");
}

#[tokio::test]
async fn register_rejects_taken_email_and_bad_input() {
    let app = TestApp::new();
    app.seed_user("Ann", "ann@example.com", Role::User).await;

    let res = app
        .send(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({"name": "Imposter", "email": "ANN@example.com", "password": "longenough"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Email already in use");

    let res = app
        .send(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({"name": "Bob", "email": "bob-at-example", "password": "short"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let message = res.body["message"].as_str().unwrap();
    assert!(message.contains("Please provide a valid email"));
    assert!(message.contains("Password must be at least 8 characters"));
}

#[tokio::test]
async fn login_outcomes() {
    let app = TestApp::new();
    app.seed_user("Ann", "ann@example.com", Role::User).await;

    let res = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"email": "ann@example.com"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Please provide email and password");

    for (email, password) in [
        ("ann@example.com", "wrong password"),
        ("nobody@example.com", PASSWORD),
    ] {
        let res = app
            .send(
                Method::POST,
                "/api/users/login",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["message"], "Incorrect email or password");
    }

    let res = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"email": "ANN@example.com", "password": PASSWORD})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["token"].is_string());
    assert!(res.body["data"]["user"].get("password").is_none());
}

#[tokio::test]
async fn update_me_changes_profile_but_not_password() {
    let app = TestApp::new();
    app.seed_user("Bob", "bob@example.com", Role::User).await;
    let (_, token) = app.seed_user("Ann", "ann@example.com", Role::User).await;

    let res = app
        .send(
            Method::PATCH,
            "/api/users/updateMe",
            Some(&token),
            Some(json!({"password": "newpassword"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "This route is not for password updates");

    let res = app
        .send(
            Method::PATCH,
            "/api/users/updateMe",
            Some(&token),
            Some(json!({"email": "bob@example.com"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Email already in use");

    let res = app
        .send(
            Method::PATCH,
            "/api/users/updateMe",
            Some(&token),
            Some(json!({"name": "Annie", "role": "admin"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["user"]["name"], "Annie");
    assert_eq!(res.body["data"]["user"]["role"], "user");
}

#[tokio::test]
async fn admin_manages_users() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (id, user_token) = app.seed_user("Ann", "ann@example.com", Role::User).await;
    let uri = format!("/api/users/{}", id);

    let res = app.send(Method::GET, "/api/users", Some(&user_token), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.send(Method::GET, "/api/users", Some(&admin), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["results"], 2);
    assert!(res.body["data"]["users"][1].get("password").is_none());

    let res = app.send(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(res.body["data"]["user"]["email"], "ann@example.com");

    let res = app
        .send(Method::PATCH, &uri, Some(&admin), Some(json!({"role": "superuser"})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .send(Method::PATCH, &uri, Some(&admin), Some(json!({"role": "admin"})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["user"]["role"], "admin");

    let res = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.raw.is_empty());

    for method in [Method::GET, Method::DELETE] {
        let res = app.send(method, &uri, Some(&admin), None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body["message"], "User not found");
    }
}

#[tokio::test]
async fn malformed_json_is_a_400_envelope() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let res = app.send_request(request).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["status"], "fail");
    assert!(res.body["data"].is_null());
}

#[tokio::test]
async fn health_banner_and_unknown_routes() {
    let app = TestApp::new();

    let res = app.get("/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["store"], "ok");

    let res = app.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["name"], "Catalog API");

    let res = app.get("/api/widgets").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["status"], "fail");
    assert_eq!(res.body["message"], "Can't find /api/widgets on this server");
}
