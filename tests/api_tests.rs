//! HTTP-level tests for accounts, recipes and comments.

mod common;

use axum::http::StatusCode;
use common::{
    empty_request, json_request, multipart_request, register_and_login, send, spawn_app,
};
use serde_json::json;

async fn create_recipe(app: &axum::Router, cookie: &str, name: &str) -> i64 {
    let response = send(
        app,
        multipart_request(
            "/api/recipes",
            Some(cookie),
            &[
                ("name", name),
                ("description", "Simmer for a long time"),
                ("duration", "90 min"),
            ],
            None,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app("cookbook-api").await;

    let response = send(&app, empty_request("GET", "/api/health", None)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["database"], true);
}

#[tokio::test]
async fn test_register_login_me() {
    let app = spawn_app("cookbook-api").await;

    let response = send(&app, empty_request("GET", "/api/auth/me", None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let cookie = register_and_login(&app, "Anna", "anna@example.com").await;

    let response = send(&app, empty_request("GET", "/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"], "anna@example.com");
    assert_eq!(response.body["data"]["is_admin"], true);

    let response = send(
        &app,
        empty_request("POST", "/api/auth/logout", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&app, empty_request("GET", "/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_errors() {
    let app = spawn_app("cookbook-api").await;
    register_and_login(&app, "Anna", "anna@example.com").await;

    let duplicate = json!({
        "name": "Anna",
        "email": "anna@example.com",
        "confirm_email": "anna@example.com",
        "password": "pw1234",
    });
    let response = send(
        &app,
        json_request("POST", "/api/auth/register", None, &duplicate),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "User already exists");

    let mismatched = json!({
        "name": "Ben",
        "email": "ben@example.com",
        "confirm_email": "benny@example.com",
        "password": "pw1234",
    });
    let response = send(
        &app,
        json_request("POST", "/api/auth/register", None, &mismatched),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "email": "anna@example.com", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_recipe_admin_flow() {
    let app = spawn_app("cookbook-api").await;
    let admin = register_and_login(&app, "Chef", "chef@example.com").await;
    let guest = register_and_login(&app, "Guest", "guest@example.com").await;

    // Non-admins cannot create recipes.
    let response = send(
        &app,
        multipart_request(
            "/api/recipes",
            Some(&guest),
            &[("name", "Soup"), ("description", "Hot")],
            None,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = send(
        &app,
        multipart_request(
            "/api/recipes",
            None,
            &[("name", "Soup"), ("description", "Hot")],
            None,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Image upload is stored and served under /images.
    let response = send(
        &app,
        multipart_request(
            "/api/recipes",
            Some(&admin),
            &[("name", "Goulash"), ("description", "Beef and paprika")],
            Some(("goulash.jpg", b"not really a jpeg")),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let goulash = response.body["data"]["id"].as_i64().unwrap();
    let image_path = response.body["data"]["image_path"].as_str().unwrap().to_string();
    assert!(image_path.starts_with("/images/"));

    let response = send(&app, empty_request("GET", &image_path, None)).await;
    assert_eq!(response.status, StatusCode::OK);

    let too_long = "x".repeat(46);
    let response = send(
        &app,
        multipart_request(
            "/api/recipes",
            Some(&admin),
            &[("name", &too_long), ("description", "Hot")],
            None,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let strudel = create_recipe(&app, &admin, "Apple strudel").await;

    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/api/recipes/{goulash}/ingredients"),
            Some(&admin),
            &json!({ "name": "Paprika" }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let paprika = response.body["data"]["id"].as_i64().unwrap();

    let response = send(&app, empty_request("GET", "/api/recipes", None)).await;
    assert_eq!(response.body["data"]["count"], 2);

    let response = send(
        &app,
        empty_request("GET", "/api/recipes/search?name=strudel", None),
    )
    .await;
    assert_eq!(response.body["data"]["count"], 1);
    assert_eq!(response.body["data"]["recipes"][0]["id"], strudel);

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/recipes/{goulash}"),
            Some(&admin),
            &json!({
                "name": "Szegedin goulash",
                "description": "With sauerkraut",
                "ingredients": [{ "id": paprika, "name": "Smoked paprika" }],
            }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["recipe"]["name"], "Szegedin goulash");
    assert_eq!(response.body["data"]["ingredients"][0]["name"], "Smoked paprika");

    let response = send(
        &app,
        empty_request("GET", "/api/admin/latest-recipe", Some(&admin)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], strudel);

    let response = send(
        &app,
        empty_request("GET", "/api/admin/latest-recipe", Some(&guest)),
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = send(
        &app,
        empty_request("DELETE", &format!("/api/recipes/{strudel}"), Some(&admin)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(
        &app,
        empty_request("GET", &format!("/api/recipes/{strudel}"), None),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(&app, empty_request("GET", "/api/recipes/0", None)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_threaded_comments() {
    let app = spawn_app("cookbook-api").await;
    let admin = register_and_login(&app, "Chef", "chef@example.com").await;
    let cook = register_and_login(&app, "Cook", "cook@example.com").await;

    let soup = create_recipe(&app, &admin, "Soup").await;
    let stew = create_recipe(&app, &admin, "Stew").await;
    let comments = format!("/api/recipes/{soup}/comments");

    let response = send(
        &app,
        json_request("POST", &comments, None, &json!({ "body": "Hello" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        json_request("POST", &comments, Some(&cook), &json!({ "body": "Lovely" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let top = response.body["data"]["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_request(
            "POST",
            &comments,
            Some(&admin),
            &json!({ "body": "Thanks!", "parent_id": top }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let reply = response.body["data"]["id"].as_i64().unwrap();

    send(
        &app,
        json_request(
            "POST",
            &comments,
            Some(&cook),
            &json!({ "body": "You're welcome", "parent_id": reply }),
        ),
    )
    .await;

    let response = send(
        &app,
        json_request("POST", &comments, Some(&cook), &json!({ "body": "   " })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // A parent from another recipe is rejected.
    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/api/recipes/{stew}/comments"),
            Some(&cook),
            &json!({ "body": "Wrong thread", "parent_id": top }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        empty_request("GET", &format!("/api/recipes/{soup}"), Some(&cook)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let detail = &response.body["data"];
    assert_eq!(detail["is_authenticated"], true);
    assert_eq!(detail["is_admin"], false);
    assert_eq!(detail["comment_count"], 3);
    assert_eq!(detail["comments"][0]["body"], "Lovely");
    assert_eq!(detail["comments"][0]["author_name"], "Cook");
    assert_eq!(detail["comments"][0]["children"][0]["body"], "Thanks!");
    assert_eq!(
        detail["comments"][0]["children"][0]["children"][0]["body"],
        "You're welcome"
    );

    let response = send(
        &app,
        empty_request("DELETE", &comments, Some(&cook)),
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = send(
        &app,
        empty_request("DELETE", &comments, Some(&admin)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&app, empty_request("GET", &comments, None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["count"], 0);
}

#[tokio::test]
async fn test_persistent_sessions() {
    let mut config = common::test_config("cookbook-api");
    config.server.persistent_sessions = true;

    let state = cookbook::api::create_app_state_from_config(config, None)
        .await
        .unwrap();
    let app = cookbook::api::router(state).await;

    let cookie = register_and_login(&app, "Anna", "anna@example.com").await;
    let response = send(&app, empty_request("GET", "/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["name"], "Anna");
}
