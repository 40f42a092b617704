/// Router-level tests
///
/// The first group runs without a database: every request is answered
/// before a query would run. The `db_` tests need Postgres at
/// `DATABASE_URL` and are ignored by default:
///
/// ```bash
/// DATABASE_URL=postgresql://localhost/inyeon_test cargo test -p inyeon-api -- --ignored
/// ```

mod common;

use axum::http::{header, StatusCode};
use common::{bearer_for, get, json_request, offline_app, send, TestContext, TEST_PASSWORD, TEST_SECRET};
use inyeon_shared::{auth::jwt, messages};
use serde_json::{json, Value};
use uuid::Uuid;

fn detail_message<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body["details"]
        .as_array()?
        .iter()
        .find(|d| d["field"] == field)
        .and_then(|d| d["message"].as_str())
}

#[tokio::test]
async fn test_contacts_require_sign_in() {
    let app = offline_app(&[]);

    let (status, _, body) = send(&app, get("/v1/contacts", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], messages::NOT_SIGNED_IN);
}

#[tokio::test]
async fn test_non_bearer_credentials_are_rejected() {
    let app = offline_app(&[]);

    let (status, _, _) = send(&app, get("/v1/plans/upcoming", Some("Basic dXNlcjpwYXNz"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, get("/v1/plans/upcoming", Some("Bearer not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = offline_app(&[]);
    let session = jwt::issue_session(Uuid::new_v4(), TEST_SECRET).expect("Session should issue");

    let auth = format!("Bearer {}", session.refresh_token);
    let (status, _, _) = send(&app, get("/v1/contacts/pinned", Some(&auth))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_new_session() {
    let app = offline_app(&[]);
    let session = jwt::issue_session(Uuid::new_v4(), TEST_SECRET).expect("Session should issue");

    let request = json_request(
        "POST",
        "/v1/auth/refresh",
        None,
        &json!({ "refresh_token": session.refresh_token }),
    );
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].is_string());

    let request = json_request(
        "POST",
        "/v1/auth/refresh",
        None,
        &json!({ "refresh_token": session.access_token }),
    );
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_reports_first_failure_per_field() {
    let app = offline_app(&[]);

    let request = json_request(
        "POST",
        "/v1/auth/signup",
        None,
        &json!({
            "email": "a@b.com",
            "password": "abcdefgh",
            "password_check": "abcdefgh",
            "nickname": "철수!"
        }),
    );
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(detail_message(&body, "password"), Some(messages::PASSWORD_SPECIAL_CHAR));
    assert_eq!(detail_message(&body, "nickname"), Some(messages::NICKNAME_CHARSET));
    assert_eq!(detail_message(&body, "email"), None);
}

#[tokio::test]
async fn test_signin_validates_before_lookup() {
    let app = offline_app(&[]);

    let request = json_request("POST", "/v1/auth/signin", None, &json!({ "email": "", "password": "" }));
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_message(&body, "email"), Some(messages::EMAIL_REQUIRED));
    assert_eq!(detail_message(&body, "password"), Some(messages::PASSWORD_REQUIRED));
}

#[tokio::test]
async fn test_duplicate_check_validates_format() {
    let app = offline_app(&[]);

    let (status, _, body) = send(&app, get("/v1/auth/duplicates/email?email=nope", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], messages::CHECK_EMAIL_FORMAT);

    let (status, _, body) = send(&app, get("/v1/auth/duplicates/nickname?nickname=a", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], messages::CHECK_NICKNAME_FORMAT);
}

#[tokio::test]
async fn test_malformed_recovery_token() {
    let app = offline_app(&[]);

    let request = json_request("POST", "/v1/auth/recover", None, &json!({ "token": "short" }));
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], messages::RECOVERY_LINK_INVALID);
}

#[tokio::test]
async fn test_contact_form_is_validated() {
    let app = offline_app(&[]);
    let auth = bearer_for(Uuid::new_v4());

    let request = json_request(
        "POST",
        "/v1/contacts",
        Some(&auth),
        &json!({ "name": " ", "phone": "010-1234" }),
    );
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_message(&body, "name"), Some(messages::CONTACT_NAME_REQUIRED));
    assert_eq!(detail_message(&body, "phone"), Some(messages::CONTACT_PHONE_INVALID));
}

#[tokio::test]
async fn test_regular_page_out_of_range() {
    let app = offline_app(&[]);
    let auth = bearer_for(Uuid::new_v4());

    let uri = format!("/v1/contacts/regular?page={}", i64::MAX);
    let (status, _, body) = send(&app, get(&uri, Some(&auth))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "page is out of range");
}

#[tokio::test]
async fn test_plan_requires_contact_and_start() {
    let app = offline_app(&[]);
    let auth = bearer_for(Uuid::new_v4());

    let request = json_request("POST", "/v1/plans", Some(&auth), &json!({ "title": "점심" }));
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_message(&body, "contacts"), Some(messages::PLAN_CONTACT_REQUIRED));
    assert_eq!(detail_message(&body, "date_input.from"), Some(messages::PLAN_START_REQUIRED));
    assert_eq!(detail_message(&body, "title"), None);
}

#[tokio::test]
async fn test_invalid_month_and_offset() {
    let app = offline_app(&[]);
    let auth = bearer_for(Uuid::new_v4());

    let (status, _, _) = send(&app, get("/v1/plans?year=2025&month=13", Some(&auth))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, get("/v1/plans?year=2025&month=3&offset_minutes=9999", Some(&auth))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_search() {
    let app = offline_app(&[]);
    let auth = bearer_for(Uuid::new_v4());

    let (status, _, body) = send(&app, get("/v1/places/search?query=", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "documents": [] }));

    let (status, _, _) = send(&app, get("/v1/places/search?query=%EA%B0%95%EB%82%A8", Some(&auth))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_oauth_authorize_urls() {
    let app = offline_app(&[
        ("KAKAO_CLIENT_ID", "kakao-client"),
        ("KAKAO_CLIENT_SECRET", "kakao-secret"),
        ("API_PUBLIC_URL", "https://api.inyeon.app"),
    ]);

    let (status, _, body) = send(&app, get("/v1/auth/oauth/kakao", None)).await;
    assert_eq!(status, StatusCode::OK);
    let url = body["url"].as_str().expect("URL should be present");
    assert!(url.starts_with("https://kauth.kakao.com/oauth/authorize?"));
    assert!(url.contains("auth_type=reauthenticate"));
    assert!(url.contains("client_id=kakao-client"));
    assert!(url.contains("redirect_uri=https%3A%2F%2Fapi.inyeon.app%2Fv1%2Fauth%2Foauth%2Fkakao%2Fcallback"));

    let (status, _, _) = send(&app, get("/v1/auth/oauth/google", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _, _) = send(&app, get("/v1/auth/oauth/naver", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oauth_callback_without_state_redirects_with_error() {
    let app = offline_app(&[("REDIRECT_TO", "https://inyeon.app")]);

    let (status, headers, _) = send(&app, get("/v1/auth/oauth/kakao/callback?code=abc", None)).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    let location = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Redirect should have a location");
    assert!(location.starts_with("https://inyeon.app#error=oauth_failed"));
}

#[tokio::test]
async fn test_security_headers_on_errors() {
    let app = offline_app(&[]);

    let (_, headers, _) = send(&app, get("/v1/contacts", None)).await;

    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");
}

// Database-backed flows

fn sign_up_body(suffix: &str) -> Value {
    json!({
        "email": format!("new-{}@example.com", suffix),
        "password": TEST_PASSWORD,
        "password_check": TEST_PASSWORD,
        "nickname": format!("n{}", suffix),
    })
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn db_sign_up_sign_in_and_duplicates() {
    let ctx = TestContext::new().await.expect("Test context should start");
    let suffix = &Uuid::new_v4().simple().to_string()[..6];
    let body = sign_up_body(suffix);

    let (status, _, created) = send(&ctx.app, json_request("POST", "/v1/auth/signup", None, &body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user"]["provider"], "email");
    assert_eq!(created["user"]["email_confirmed"], false);
    assert!(created["session"]["access_token"].is_string());

    // Confirmation link was mailed
    let sent = ctx.mailer.sent();
    let link = &sent.last().expect("Confirmation email should be sent").link;
    assert!(link.contains("/v1/auth/confirm?token="));

    let (status, _, again) = send(&ctx.app, json_request("POST", "/v1/auth/signup", None, &body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["message"], messages::DUPLICATE_EMAIL);

    let check = format!("/v1/auth/duplicates/nickname?nickname=n{}", suffix);
    let (_, _, taken) = send(&ctx.app, get(&check, None)).await;
    assert_eq!(taken["exists"], true);

    let wrong = json!({ "email": body["email"], "password": "Wrong123!" });
    let (status, _, rejected) = send(&ctx.app, json_request("POST", "/v1/auth/signin", None, &wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected["message"], messages::INVALID_CREDENTIALS);

    let right = json!({ "email": body["email"], "password": TEST_PASSWORD });
    let (status, _, signed_in) = send(&ctx.app, json_request("POST", "/v1/auth/signin", None, &right)).await;
    assert_eq!(status, StatusCode::OK);

    let user_id = signed_in["user"]["id"].as_str().expect("User id").to_string();
    sqlx::query("DELETE FROM users WHERE id = $1::uuid")
        .bind(user_id)
        .execute(&ctx.db)
        .await
        .expect("Cleanup should succeed");
    ctx.cleanup().await.expect("Cleanup should succeed");
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn db_pinning_moves_contact_between_partitions() {
    let ctx = TestContext::new().await.expect("Test context should start");
    let auth = Some(ctx.auth.as_str());

    let (status, _, contact) = send(
        &ctx.app,
        json_request("POST", "/v1/contacts", auth, &json!({ "name": "영희", "phone": "01012345678" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(contact["relationship_level"], "친구");
    assert_eq!(contact["notes"], Value::Null);
    let id = contact["contacts_id"].as_str().expect("Contact id").to_string();

    let (_, _, regular) = send(&ctx.app, get("/v1/contacts/regular?page=0", auth)).await;
    assert_eq!(regular["contacts"].as_array().map(Vec::len), Some(1));
    assert_eq!(regular["next_page"], Value::Null);

    let pin = json_request("PATCH", &format!("/v1/contacts/{}/pin", id), auth, &json!({ "is_pinned": true }));
    let (status, _, pinned) = send(&ctx.app, pin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pinned["is_pinned"], true);

    let (_, _, regular) = send(&ctx.app, get("/v1/contacts/regular", auth)).await;
    assert_eq!(regular["contacts"], json!([]));
    let (_, _, pinned_list) = send(&ctx.app, get("/v1/contacts/pinned", auth)).await;
    assert_eq!(pinned_list[0]["contacts_id"], id.as_str());

    // Another user sees nothing
    let stranger = bearer_for(Uuid::new_v4());
    let (status, _, _) = send(&ctx.app, get(&format!("/v1/contacts/{}", id), Some(&stranger))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.expect("Cleanup should succeed");
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn db_plan_month_window_and_move() {
    let ctx = TestContext::new().await.expect("Test context should start");
    let auth = Some(ctx.auth.as_str());

    let (_, _, contact) = send(&ctx.app, json_request("POST", "/v1/contacts", auth, &json!({ "name": "민수" }))).await;
    let contact_id = contact["contacts_id"].clone();

    // 2025-03-31 23:30 KST
    let form = json!({
        "title": "저녁",
        "contacts": contact_id,
        "date_input": { "from": "2025-03-31T14:30:00Z" },
    });
    let (status, _, plan) = send(&ctx.app, json_request("POST", "/v1/plans", auth, &form)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["colors"], "#2F80ED");
    assert_eq!(plan["start_date"], plan["end_date"]);
    let plan_id = plan["plan_id"].as_str().expect("Plan id").to_string();

    let (_, _, march) = send(&ctx.app, get("/v1/plans?year=2025&month=3", auth)).await;
    assert_eq!(march.as_array().map(Vec::len), Some(1));
    let (_, _, april) = send(&ctx.app, get("/v1/plans?year=2025&month=4", auth)).await;
    assert_eq!(april, json!([]));

    let dates = json!({ "start_date": "2025-04-02T01:00:00Z", "end_date": "2025-04-02T03:00:00Z" });
    let request = json_request("PATCH", &format!("/v1/plans/{}/dates", plan_id), auth, &dates);
    let (status, _, moved) = send(&ctx.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["title"], "저녁");
    assert_eq!(moved["colors"], plan["colors"]);

    let (_, _, detail) = send(&ctx.app, get(&format!("/v1/plans/{}", plan_id), auth)).await;
    assert_eq!(detail["contact_name"], "민수");

    let (_, _, with_plans) = send(&ctx.app, get(&format!("/v1/contacts/{}", contact_id.as_str().unwrap_or_default()), auth)).await;
    assert_eq!(with_plans["plans"].as_array().map(Vec::len), Some(1));

    let delete = axum::http::Request::builder()
        .method("DELETE")
        .uri(format!("/v1/plans/{}", plan_id))
        .header(header::AUTHORIZATION, ctx.auth.as_str())
        .body(axum::body::Body::empty())
        .expect("Request should build");
    let (status, _, _) = send(&ctx.app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    ctx.cleanup().await.expect("Cleanup should succeed");
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn db_password_recovery_flow() {
    let ctx = TestContext::new().await.expect("Test context should start");

    let request = json_request("POST", "/v1/auth/password/reset", None, &json!({ "email": ctx.user.email }));
    let (status, _, _) = send(&ctx.app, request).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let link = ctx.mailer.sent().last().expect("Recovery email should be sent").link.clone();
    let token = link.split("token=").nth(1).expect("Link should carry a token").to_string();

    let recover = json_request("POST", "/v1/auth/recover", None, &json!({ "token": token }));
    let (status, _, session) = send(&ctx.app, recover).await;
    assert_eq!(status, StatusCode::OK);

    // Single use
    let (status, _, _) = send(&ctx.app, json_request("POST", "/v1/auth/recover", None, &json!({ "token": token }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let auth = format!("Bearer {}", session["session"]["access_token"].as_str().unwrap_or_default());
    let change = json_request(
        "PUT",
        "/v1/auth/password",
        Some(&auth),
        &json!({ "password": "NewPass1!", "password_check": "NewPass1!" }),
    );
    let (status, _, _) = send(&ctx.app, change).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let sign_in = json!({ "email": ctx.user.email, "password": "NewPass1!" });
    let (status, _, _) = send(&ctx.app, json_request("POST", "/v1/auth/signin", None, &sign_in)).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.expect("Cleanup should succeed");
}
