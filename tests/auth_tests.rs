//! Registration, login and the session-gated landing page.

#[macro_use]
mod common;

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use std::sync::Arc;

use attendance::auth::session::SESSION_COOKIE;
use common::*;

fn form(username: &str, password: &str) -> Vec<(&'static str, String)> {
    vec![
        ("username", username.to_string()),
        ("password", password.to_string()),
    ]
}

async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

#[actix_web::test]
async fn register_login_and_reach_the_dashboard() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/register")
            .set_form(form("lecturer", "chalk"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE username = ?")
        .bind("lecturer")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_ne!(stored, "chalk");

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/")
            .set_form(form("lecturer", "chalk"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("session cookie")
        .into_owned();
    assert!(session.http_only().unwrap_or(false));

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/")
            .cookie(session)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Select a section"));
}

#[actix_web::test]
async fn landing_without_session_shows_login() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains(r#"action="/""#));
    assert!(!body.contains("{{ message }}"));
}

#[actix_web::test]
async fn forged_session_is_ignored() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/")
            .cookie(Cookie::new(SESSION_COOKIE, "not-a-token"))
            .to_request(),
    )
    .await;
    assert!(body_text(resp).await.contains(r#"action="/""#));
}

#[actix_web::test]
async fn wrong_password_rerenders_login_with_error() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    test::call_service(
        &app,
        TestRequest::post()
            .uri("/register")
            .set_form(form("lecturer", "chalk"))
            .to_request(),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/")
            .set_form(form("lecturer", "duster"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.response().cookies().all(|c| c.name() != SESSION_COOKIE));
    assert!(body_text(resp).await.contains("Invalid credentials"));
}

#[actix_web::test]
async fn duplicate_username_is_rejected() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    for expected in [StatusCode::SEE_OTHER, StatusCode::CONFLICT] {
        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/register")
                .set_form(form("lecturer", "chalk"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), expected);
        if expected == StatusCode::CONFLICT {
            assert!(body_text(resp).await.contains("Username already exists"));
        }
    }

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[actix_web::test]
async fn logout_expires_the_cookie() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    let resp = test::call_service(&app, TestRequest::get().uri("/logout").to_request()).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "/?logged_out=1"
    );
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("removal cookie");
    assert_eq!(cookie.value(), "");

    let resp =
        test::call_service(&app, TestRequest::get().uri("/?logged_out=1").to_request()).await;
    assert!(body_text(resp).await.contains("Logged out successfully"));
}

#[actix_web::test]
async fn static_pages_are_served() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    for uri in ["/attendance", "/hours", "/students", "/view_stats", "/register"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[actix_web::test]
async fn logged_out_flag_accepts_any_value() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    for uri in ["/?logged_out=true", "/?logged_out=", "/?logged_out=yes"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert!(body_text(resp).await.contains("Logged out successfully"), "{uri}");
    }
}

#[actix_web::test]
async fn repeated_logins_and_page_loads_are_not_throttled() {
    let ctx = TestCtx::new(Arc::new(RecordingMailer::default())).await;
    let app = test_app!(ctx);

    test::call_service(
        &app,
        TestRequest::post()
            .uri("/register")
            .set_form(form("lecturer", "chalk"))
            .to_request(),
    )
    .await;

    for _ in 0..5 {
        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/")
                .set_form(form("lecturer", "duster"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    for _ in 0..100 {
        let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
