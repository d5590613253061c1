/// Integration tests for the TaskVault API
///
/// These tests drive the full router in-process over in-memory storage:
/// - Registration, login, and cookie transport of tokens
/// - Refresh token rotation and replay rejection
/// - Logout and account deletion
/// - Task ownership, listing, search, and paging
/// - Request validation and error envelopes

mod common;

use axum::http::StatusCode;
use common::{cookie_header, session_from, TestContext, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_greeting_and_health() {
    let ctx = TestContext::new();

    let response = ctx.get("/", &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "Message": "Hi!" }));
    assert_eq!(
        response.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let response = ctx.get("/health", &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

/// register -> login -> create -> search as owner and as a stranger
#[tokio::test]
async fn test_alice_and_bob_scenario() {
    let ctx = TestContext::new();

    let response = ctx.register("alice", "a@x.com").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["statusCode"], 201);
    assert_eq!(response.body["success"], true);
    assert!(response.body["data"]["id"].is_string());
    assert_eq!(response.body["data"]["userName"], "alice");
    assert!(response.body["data"].get("password").is_none());
    assert!(response.body["data"].get("passwordHash").is_none());
    assert!(response.body["data"].get("refreshToken").is_none());

    let response = ctx
        .post(
            "/api/v1/user/login",
            json!({ "userName": "alice", "password": PASSWORD }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let cookies = response.cookies();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly") && c.contains("Secure")));
    let alice = session_from(&response.body["data"]);

    let response = ctx
        .post(
            "/api/v1/task/createTask",
            json!({ "title": "Buy milk", "dueDate": "2030-01-01T00:00:00Z" }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let task = &response.body["data"];
    assert_eq!(task["title"], "buy milk");
    assert_eq!(task["status"], "pending");
    assert!(task.get("ownerId").is_none());
    assert!(task.get("version").is_none());

    let response = ctx
        .get("/api/v1/task/getAllTasks?search=milk", &[alice.bearer()])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["totalDocs"], 1);
    assert_eq!(response.body["data"]["docs"][0]["id"], task["id"]);

    let bob = ctx.signup("bob").await;
    let response = ctx
        .get("/api/v1/task/getAllTasks?search=milk", &[bob.bearer()])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["totalDocs"], 0);
    assert_eq!(response.body["data"]["docs"], json!([]));
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::new();
    ctx.register("alice", "a@x.com").await;

    let response = ctx.register("alice2", "A@X.com").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        response.body,
        json!({
            "status": 409,
            "success": false,
            "message": "This Email Or User Name Already Exists!"
        })
    );
}

#[tokio::test]
async fn test_login_failures() {
    let ctx = TestContext::new();
    ctx.register("alice", "a@x.com").await;

    let response = ctx
        .post(
            "/api/v1/user/login",
            json!({ "email": "nobody@x.com", "password": PASSWORD }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = ctx
        .post(
            "/api/v1/user/login",
            json!({ "userName": "alice", "password": "Bb2@bbbb" }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Incorrect Password!");
    assert!(response.cookies().is_empty());
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let ctx = TestContext::new();

    for uri in [
        "/api/v1/user/getCurrentUser",
        "/api/v1/user/logout",
        "/api/v1/user/refreshAccessToken",
        "/api/v1/task/getAllTasks",
    ] {
        let response = ctx.get(uri, &[]).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.body["status"], 401);
        assert_eq!(response.body["success"], false);
    }

    let garbage = ("authorization".to_string(), "Bearer not-a-token".to_string());
    let response = ctx.get("/api/v1/user/getCurrentUser", &[garbage]).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid Access Token!");
}

#[tokio::test]
async fn test_access_cookie_authenticates() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let cookie = cookie_header(&[("accessToken", &alice.access_token)]);
    let response = ctx.get("/api/v1/user/getCurrentUser", &[cookie]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["userName"], "alice");
    assert_eq!(response.body["data"]["id"], alice.user_id.as_str());
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let response = ctx
        .post(
            "/api/v1/user/refreshAccessToken",
            json!({ "refreshToken": alice.refresh_token }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Access Token Refreshed");
    assert_eq!(response.cookies().len(), 2);
    let rotated = response.body["data"]["refreshToken"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(rotated, alice.refresh_token);

    // replaying the consumed token fails
    let response = ctx
        .post(
            "/api/v1/user/refreshAccessToken",
            json!({ "refreshToken": alice.refresh_token }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Refresh token is expired or used");

    // the rotated token works from the cookie on a GET
    let cookie = cookie_header(&[
        ("accessToken", &alice.access_token),
        ("refreshToken", &rotated),
    ]);
    let response = ctx
        .get("/api/v1/user/refreshAccessToken", &[cookie])
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_token() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let response = ctx
        .get("/api/v1/user/refreshAccessToken", &[alice.bearer()])
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Unauthorized request");
}

#[tokio::test]
async fn test_logout_clears_cookies_and_slot() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let response = ctx.get("/api/v1/user/logout", &[alice.bearer()]).await;
    assert_eq!(response.status, StatusCode::OK);
    let cookies = response.cookies();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

    let response = ctx
        .post(
            "/api/v1/user/refreshAccessToken",
            json!({ "refreshToken": alice.refresh_token }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_account_invalidates_access_token() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let response = ctx.get("/api/v1/user/deleteAccount", &[alice.bearer()]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Account Deleted!");
    assert_eq!(response.cookies().len(), 2);

    let response = ctx
        .get("/api/v1/user/getCurrentUser", &[alice.bearer()])
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // the name is free again
    let response = ctx.register("alice", "alice@example.com").await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_update_account_info() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;
    ctx.signup("bob").await;

    let response = ctx
        .post(
            "/api/v1/user/updateAccountInfo",
            json!({ "userName": "bob" }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    // own current email is reported as taken
    let response = ctx
        .post(
            "/api/v1/user/updateAccountInfo",
            json!({ "email": "alice@example.com" }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = ctx
        .post("/api/v1/user/updateAccountInfo", json!({}), &[alice.bearer()])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["data"][0]["field"], "body");

    let response = ctx
        .post(
            "/api/v1/user/updateAccountInfo",
            json!({ "userName": "alicia" }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["loggedInUser"]["userName"], "alicia");
    assert_eq!(response.cookies().len(), 2);
    let renewed = session_from(&response.body["data"]);

    // the session was reissued, so the login refresh token is superseded
    let response = ctx
        .post(
            "/api/v1/user/refreshAccessToken",
            json!({ "refreshToken": alice.refresh_token }),
            &[renewed.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_password() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let response = ctx
        .post(
            "/api/v1/user/updatePassword",
            json!({
                "oldPassword": PASSWORD,
                "newPassword": PASSWORD,
                "confirmPassword": PASSWORD
            }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["message"],
        "Old And New Password Can't Be The Same!"
    );

    let response = ctx
        .post(
            "/api/v1/user/updatePassword",
            json!({
                "oldPassword": PASSWORD,
                "newPassword": "Bb2@bbbb",
                "confirmPassword": "Bb2@bbbb"
            }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Password Updated Successfully!");

    let response = ctx
        .post(
            "/api/v1/user/login",
            json!({ "userName": "alice", "password": PASSWORD }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .post(
            "/api/v1/user/login",
            json!({ "userName": "alice", "password": "Bb2@bbbb" }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_validation() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/api/v1/user/register",
            json!({ "userName": "al", "email": "not-an-email", "password": "weak" }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["statusCode"], 400);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["message"], "Invalid Data, Error!");
    let fields: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[..2], ["email", "password"]);

    let response = ctx
        .post(
            "/api/v1/user/register",
            json!({ "userName": "alice", "email": "a@x.com", "password": PASSWORD, "role": "admin" }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .post("/api/v1/user/login", json!({ "password": PASSWORD }), &[])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let response = ctx
        .post(
            "/api/v1/task/createTask",
            json!({
                "title": "big",
                "description": "x".repeat(20 * 1024),
                "dueDate": "2030-01-01T00:00:00Z"
            }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_task_ownership() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;
    let bob = ctx.signup("bob").await;
    let task_id = ctx.create_task(&alice, "Report", "quarterly numbers").await;

    let response = ctx
        .post(
            &format!("/api/v1/task/updateTask?taskId={}", task_id),
            json!({ "status": "completed" }),
            &[bob.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Not Authorized!");

    let response = ctx
        .get(
            &format!("/api/v1/task/deleteTask?taskId={}", task_id),
            &[bob.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // reading by id is not owner-checked
    let response = ctx
        .get(
            &format!("/api/v1/task/getTaskById?taskId={}", task_id),
            &[bob.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["title"], "report");

    let response = ctx
        .post(
            &format!("/api/v1/task/updateTask?taskId={}", task_id),
            json!({ "status": "in-progress", "title": "Report v2" }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "in-progress");
    assert_eq!(response.body["data"]["title"], "report v2");

    let response = ctx
        .get(
            &format!("/api/v1/task/deleteTask?taskId={}", task_id),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Task Deleted Successfully!");

    let response = ctx
        .get(
            &format!("/api/v1/task/getTaskById?taskId={}", task_id),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_created_task_reads_back_normalized() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let response = ctx
        .post(
            "/api/v1/task/createTask",
            json!({
                "title": "  Buy Milk ",
                "description": " Two Litres, Semi-Skimmed  ",
                "status": "in-progress",
                "dueDate": "2030-06-15T09:30:00Z"
            }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let created = response.body["data"].clone();
    let task_id = created["id"].as_str().unwrap().to_string();

    let response = ctx
        .get(
            &format!("/api/v1/task/getTaskById?taskId={}", task_id),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let fetched = &response.body["data"];

    assert_eq!(fetched["id"], task_id.as_str());
    assert_eq!(fetched["title"], "buy milk");
    assert_eq!(fetched["description"], "two litres, semi-skimmed");
    assert_eq!(fetched["status"], "in-progress");

    let due = chrono::DateTime::parse_from_rfc3339(fetched["dueDate"].as_str().unwrap()).unwrap();
    let expected = chrono::DateTime::parse_from_rfc3339("2030-06-15T09:30:00Z").unwrap();
    assert_eq!(due, expected);

    for field in ["title", "description", "status", "dueDate", "createdAt"] {
        assert_eq!(fetched[field], created[field], "{} changed after read", field);
    }

    let object = fetched.as_object().unwrap();
    for hidden in ["ownerId", "owner", "owner_id", "version", "__v"] {
        assert!(!object.contains_key(hidden), "{} exposed", hidden);
    }
}

#[tokio::test]
async fn test_update_rejects_blank_title() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;
    let task_id = ctx.create_task(&alice, "Report", "quarterly numbers").await;

    let response = ctx
        .post(
            &format!("/api/v1/task/updateTask?taskId={}", task_id),
            json!({ "title": "   " }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Title Is Required!");

    let response = ctx
        .get(
            &format!("/api/v1/task/getTaskById?taskId={}", task_id),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.body["data"]["title"], "report");
}

#[tokio::test]
async fn test_user_name_length_counts_trimmed_value() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/api/v1/user/register",
            json!({ "userName": "  ab  ", "email": "ab@x.com", "password": PASSWORD }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid Data, Error!");
    assert_eq!(response.body["data"][0]["message"], "User name must be 3-50 characters");
}

#[tokio::test]
async fn test_task_id_validation() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;

    let response = ctx
        .get("/api/v1/task/getTaskById?taskId=12345", &[alice.bearer()])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid Data, Error!");

    let response = ctx.get("/api/v1/task/getTaskById", &[alice.bearer()]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .post(
            "/api/v1/task/updateTask?taskId=00000000-0000-0000-0000-000000000000",
            json!({ "title": "x" }),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid Task Id!");

    let task_id = ctx.create_task(&alice, "Report", "numbers").await;
    let response = ctx
        .post(
            &format!("/api/v1/task/updateTask?taskId={}", task_id),
            json!({}),
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_pages_and_filters() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;
    for i in 0..5 {
        ctx.create_task(&alice, &format!("Task {}", i), "routine chore")
            .await;
    }

    let response = ctx
        .get("/api/v1/task/getAllTasks?page=2&limit=2", &[alice.bearer()])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "OK");
    let page = &response.body["data"];
    assert_eq!(page["docs"].as_array().unwrap().len(), 2);
    assert_eq!(page["totalDocs"], 5);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["pagingCounter"], 3);
    assert_eq!(page["hasPrevPage"], true);
    assert_eq!(page["hasNextPage"], true);

    let response = ctx
        .get(
            "/api/v1/task/getAllTasks?status=completed&sortBy=createdAt&sortType=asc",
            &[alice.bearer()],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["totalDocs"], 0);

    for bad in [
        "limit=0",
        "page=0",
        "search=ab",
        "status=done",
        "sortBy=title",
        "sortType=up",
        "owner=someone",
    ] {
        let response = ctx
            .get(&format!("/api/v1/task/getAllTasks?{}", bad), &[alice.bearer()])
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", bad);
    }
}

#[tokio::test]
async fn test_search_results_carry_score() {
    let ctx = TestContext::new();
    let alice = ctx.signup("alice").await;
    ctx.create_task(&alice, "Groceries", "milk eggs milk").await;
    ctx.create_task(&alice, "Errands", "milk").await;
    ctx.create_task(&alice, "Gym", "legs").await;

    let response = ctx
        .get("/api/v1/task/getAllTasks?search=milk", &[alice.bearer()])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let docs = response.body["data"]["docs"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["title"], "groceries");
    assert!(docs[0]["score"].as_f64().unwrap() > docs[1]["score"].as_f64().unwrap());

    let response = ctx.get("/api/v1/task/getAllTasks", &[alice.bearer()]).await;
    let docs = response.body["data"]["docs"].as_array().unwrap();
    assert!(docs.iter().all(|d| d.get("score").is_none()));
}
