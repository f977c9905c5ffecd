//! Integration tests for the operator HTTP surface.

mod helpers;

use axum::http::StatusCode;

use helpers::{OPERATOR_TOKEN, TestApp};
use vestibulare_core::types::ExamEventId;
use vestibulare_entity::event::EventCategory;
use vestibulare_entity::subscription::Channel;

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["database"], "not-configured");
    assert_eq!(response.body["data"]["operator_enabled"], true);
}

#[tokio::test]
async fn test_sweep_requires_token() {
    let app = TestApp::new();

    let missing = app.request("POST", "/api/admin/sweep", None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["error"], "UNAUTHORIZED");

    let wrong = app.request("POST", "/api/admin/sweep", Some("nope")).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_must_match_exactly() {
    let app = TestApp::new();
    let longer = format!("{OPERATOR_TOKEN}x");
    let shorter = &OPERATOR_TOKEN[..OPERATOR_TOKEN.len() - 1];

    for token in [longer.as_str(), shorter, ""] {
        let response = app.request("POST", "/api/admin/sweep", Some(token)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "token {token:?}");
    }
    assert_eq!(app.world.email.count(), 0);
}

#[tokio::test]
async fn test_admin_routes_refuse_runs_during_shutdown() {
    let app = TestApp::shutting_down();
    let world = &app.world;
    let enem = world.program("ENEM");
    let user = world.user("basic", "Xavier");
    world.subscribe(&user, &enem, &[Channel::Email]);
    let event = world.event(&enem, EventCategory::ExamSitting, "Prova", 7, &[7]);

    let sweep = app
        .request("POST", "/api/admin/sweep", Some(OPERATOR_TOKEN))
        .await;
    assert_eq!(sweep.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(sweep.body["error"], "SERVICE_UNAVAILABLE");

    let broadcast = app
        .request(
            "POST",
            &format!("/api/admin/events/{}/broadcast", event.id),
            Some(OPERATOR_TOKEN),
        )
        .await;
    assert_eq!(broadcast.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(world.email.count(), 0);
    assert!(world.attempts().is_empty());
}

#[tokio::test]
async fn test_empty_token_disables_admin_routes() {
    let app = TestApp::with_token("");

    let response = app.request("POST", "/api/admin/sweep", Some("")).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_sweep_returns_report() {
    let app = TestApp::new();
    let world = &app.world;
    let enem = world.program("ENEM");
    let user = world.user("basic", "Vera");
    world.subscribe(&user, &enem, &[Channel::Whatsapp, Channel::Email]);
    world.event(&enem, EventCategory::ExamSitting, "Prova", 7, &[1, 3, 7]);

    let response = app
        .request("POST", "/api/admin/sweep", Some(OPERATOR_TOKEN))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["sent"], 2);
    assert_eq!(response.body["data"]["failed"], 0);
    assert_eq!(response.body["data"]["aborted"], false);

    let again = app
        .request("POST", "/api/admin/sweep", Some(OPERATOR_TOKEN))
        .await;
    assert_eq!(again.body["data"]["sent"], 0);
    assert_eq!(again.body["data"]["skip_reasons"]["already-sent"], 2);
}

#[tokio::test]
async fn test_sweep_window_is_validated() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/admin/sweep?window_days=1000",
            Some(OPERATOR_TOKEN),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_broadcast_endpoint() {
    let app = TestApp::new();
    let world = &app.world;
    let enem = world.program("ENEM");
    let user = world.user("premium", "Wagner");
    world.subscribe(&user, &enem, &[Channel::Sms]);
    let event = world.event(&enem, EventCategory::Other, "Aviso", 25, &[1]);

    let response = app
        .request(
            "POST",
            &format!("/api/admin/events/{}/broadcast", event.id),
            Some(OPERATOR_TOKEN),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["sent"], 1);
    assert_eq!(world.sms.count(), 1);
}

#[tokio::test]
async fn test_broadcast_unknown_event_is_404() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            &format!("/api/admin/events/{}/broadcast", ExamEventId::new()),
            Some(OPERATOR_TOKEN),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}
