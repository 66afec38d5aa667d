//! HTTP tests over the in-memory store.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use guestlist_core::WebhookKind;
use guestlist_core::environment::Clock;
use guestlist_core::invite::InviteLinkBuilder;
use guestlist_runtime::LifecycleEnvironment;
use guestlist_testing::{FixedClock, InMemoryStore, RecordingNotifier, test_clock};
use guestlist_web::{AppState, build_router};
use serde_json::{Value, json};
use std::sync::Arc;

struct Api {
    server: TestServer,
    store: InMemoryStore,
    notifier: RecordingNotifier,
    clock: FixedClock,
}

fn api() -> Api {
    let clock = test_clock();
    let store = InMemoryStore::new();
    let notifier = RecordingNotifier::new();
    let env = LifecycleEnvironment::new(
        Arc::new(clock.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(notifier.clone()),
        InviteLinkBuilder::new("http://localhost:3000/confirmar"),
    );
    let server = TestServer::new(build_router(AppState::new(env))).unwrap();
    Api {
        server,
        store,
        notifier,
        clock,
    }
}

fn ana() -> Value {
    json!({
        "name": "Ana",
        "email": "ana@x.com",
        "phone": "(11) 99999-0000",
        "company": "X",
        "role": "Eng",
        "referrer": "Bruno"
    })
}

impl Api {
    async fn invite(&self, body: Value) -> Value {
        let response = self.server.post("/api/guests").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json()
    }

    async fn confirm(&self, id: &str) -> Value {
        let response = self
            .server
            .post("/api/guests/confirm")
            .json(&json!({ "id": id }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        response.json()
    }
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_ok() {
    let api = api();
    let response = api.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_invite_confirm_check_in_flow() {
    let api = api();
    let guest = api.invite(ana()).await;
    assert_eq!(guest["status"], "invited");
    assert_eq!(guest["phone"], "11999990000");
    assert_eq!(
        guest["invite_url"],
        "http://localhost:3000/confirmar?emailconf=ana@x.com&utm_source=Bruno"
    );
    let id = id_of(&guest);

    let early = api
        .server
        .post(&format!("/api/guests/{id}/check-in"))
        .json(&json!({ "checked_in_by": "staff1" }))
        .await;
    assert_eq!(early.status_code(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(early.json::<Value>()["code"], "PRECONDITION_FAILED");

    let confirmed = api.confirm(&id).await;
    assert_eq!(confirmed["status"], "confirmed");
    api.confirm(&id).await;
    assert_eq!(api.notifier.count(WebhookKind::GuestConfirmed), 1);

    let checked_in = api
        .server
        .post(&format!("/api/guests/{id}/check-in"))
        .json(&json!({ "checked_in_by": "staff1" }))
        .await;
    assert_eq!(checked_in.status_code(), StatusCode::OK);
    let body: Value = checked_in.json();
    assert_eq!(body["checked_in_by"], "staff1");

    let again = api
        .server
        .post(&format!("/api/guests/{id}/check-in"))
        .json(&json!({ "checked_in_by": "staff2" }))
        .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);

    let stats: Value = api.server.get("/api/guests/stats").await.json();
    assert_eq!(stats["invited"], 1);
    assert_eq!(stats["confirmed"], 1);
    assert_eq!(stats["checked_in"], 1);
}

#[tokio::test]
async fn test_check_in_honours_the_captured_time() {
    let api = api();
    let id = id_of(&api.invite(ana()).await);
    api.confirm(&id).await;

    let captured = api.clock.now() - chrono::Duration::minutes(20);
    api.clock.advance(chrono::Duration::hours(1));
    let response = api
        .server
        .post(&format!("/api/guests/{id}/check-in"))
        .json(&json!({ "checked_in_by": "staff1", "checked_in_at": captured }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["checked_in_at"], json!(captured));
}

#[tokio::test]
async fn test_confirm_by_masked_phone() {
    let api = api();
    api.invite(ana()).await;
    let response = api
        .server
        .post("/api/guests/confirm")
        .json(&json!({ "phone": "11 99999 0000" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "confirmed");
}

#[tokio::test]
async fn test_confirm_requires_id_or_phone() {
    let api = api();
    let response = api.server.post("/api/guests/confirm").json(&json!({})).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_duplicate_invite_is_a_conflict() {
    let api = api();
    api.invite(ana()).await;
    let mut other = ana();
    other["email"] = json!("other@x.com");
    let response = api.server.post("/api/guests").json(&other).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(api.store.all_guests().len(), 1);
}

#[tokio::test]
async fn test_missing_fields_are_validation_errors() {
    let api = api();
    let mut body = ana();
    body["name"] = json!("   ");
    let response = api.server.post("/api/guests").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = api.server.post("/api/editions").json(&json!({})).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_omitted_fields_use_the_error_envelope() {
    let api = api();
    let mut body = ana();
    body.as_object_mut().unwrap().remove("company");
    let response = api.server.post("/api/guests").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let error = response.json::<Value>();
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert_eq!(error["message"], "company is required");

    let response = api
        .server
        .post("/api/preselections")
        .json(&json!({ "name": "Carla", "company": "Y", "role": "CTO" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["message"], "phone is required");
    assert!(api.store.all_guests().is_empty());
}

#[tokio::test]
async fn test_undecodable_bodies_use_the_error_envelope() {
    let api = api();
    let mut body = ana();
    body["company"] = json!(5);
    let response = api.server.post("/api/guests").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");

    let response = api.server.post("/api/guests").text("Ana").await;
    assert_eq!(response.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(response.json::<Value>()["code"], "INVALID_BODY");
}

#[tokio::test]
async fn test_unknown_guest_is_not_found() {
    let api = api();
    let response = api
        .server
        .get(&format!("/api/guests/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_undo_check_in_reverts_to_confirmed() {
    let api = api();
    let id = id_of(&api.invite(ana()).await);
    api.confirm(&id).await;
    api.server
        .post(&format!("/api/guests/{id}/check-in"))
        .json(&json!({ "checked_in_by": "staff1" }))
        .await;

    let response = api
        .server
        .post(&format!("/api/guests/{id}/undo-check-in"))
        .json(&json!({ "undone_by": "staff2", "reason": "wrong guest" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "confirmed");
    assert!(body["checked_in_at"].is_null());

    let again = api
        .server
        .post(&format!("/api/guests/{id}/undo-check-in"))
        .json(&json!({ "undone_by": "staff2" }))
        .await;
    assert_eq!(again.status_code(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_enrichment_patch_overlays_fields() {
    let api = api();
    let id = id_of(&api.invite(ana()).await);
    let response = api
        .server
        .patch(&format!("/api/guests/{id}"))
        .json(&json!({ "company": "Y", "industry": "Fintech" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["company"], "Y");
    assert_eq!(body["role"], "Eng");
    assert_eq!(body["industry"], "Fintech");
}

#[tokio::test]
async fn test_confirmed_list_supports_search() {
    let api = api();
    let ana_id = id_of(&api.invite(ana()).await);
    let mut carlos = ana();
    carlos["name"] = json!("Carlos");
    carlos["email"] = json!("carlos@y.com");
    carlos["phone"] = json!("11988880000");
    carlos["company"] = json!("Y");
    let carlos_id = id_of(&api.invite(carlos).await);
    api.confirm(&ana_id).await;
    api.confirm(&carlos_id).await;

    let all: Vec<Value> = api.server.get("/api/guests/confirmed").await.json();
    assert_eq!(all.len(), 2);

    let found: Vec<Value> = api
        .server
        .get("/api/guests/confirmed")
        .add_query_param("q", "carl")
        .await
        .json();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Carlos");
}

#[tokio::test]
async fn test_edition_archive_and_switch() {
    let api = api();
    let active: Value = api.server.get("/api/editions/active").await.json();
    assert_eq!(active["name"], "Março 2025");
    api.invite(ana()).await;

    let archived = api
        .server
        .post(&format!("/api/editions/{}/archive", id_of(&active)))
        .await;
    assert_eq!(archived.status_code(), StatusCode::OK);
    let body: Value = archived.json();
    assert_eq!(body["active"]["name"], "Abril 2025");
    assert_eq!(body["archived"]["archived"], true);
    assert_eq!(
        body["export"]["guests_csv"].as_str().unwrap().lines().count(),
        2
    );

    let again = api
        .server
        .post(&format!("/api/editions/{}/archive", id_of(&active)))
        .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);

    let reactivate = api
        .server
        .post(&format!("/api/editions/{}/activate", id_of(&active)))
        .await;
    assert_eq!(reactivate.status_code(), StatusCode::CONFLICT);

    let created = api
        .server
        .post("/api/editions")
        .json(&json!({ "name": "Especial", "description": "Demo day" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);

    let april_id = id_of(&body["active"]);
    let switched = api
        .server
        .post(&format!("/api/editions/{april_id}/activate"))
        .await;
    assert_eq!(switched.status_code(), StatusCode::OK);
    assert_eq!(api.store.active_count(), 1);

    let list: Vec<Value> = api.server.get("/api/editions").await.json();
    assert_eq!(list.len(), 3);
}

#[tokio::test]
async fn test_preselection_promotion() {
    let api = api();
    let created = api
        .server
        .post("/api/preselections")
        .json(&json!({
            "name": "Carla",
            "phone": "(11) 98888-7777",
            "company": "Z",
            "role": "CTO"
        }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let id = id_of(&created.json());

    let missing_referrer = api
        .server
        .post(&format!("/api/preselections/{id}/promote"))
        .json(&json!({}))
        .await;
    assert_eq!(missing_referrer.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let promoted = api
        .server
        .post(&format!("/api/preselections/{id}/promote"))
        .json(&json!({ "referrer": "Bruno" }))
        .await;
    assert_eq!(promoted.status_code(), StatusCode::CREATED);
    let body: Value = promoted.json();
    assert_eq!(body["preselection"]["status"], "promoted");
    assert_eq!(body["guest"]["phone"], "11988887777");
    assert_eq!(api.notifier.count(WebhookKind::PreselectionPromoted), 1);

    let again = api
        .server
        .post(&format!("/api/preselections/{id}/promote"))
        .json(&json!({ "referrer": "Bruno" }))
        .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);

    let pool: Vec<Value> = api.server.get("/api/preselections").await.json();
    assert_eq!(pool.len(), 1);
    let guests: Vec<Value> = api.server.get("/api/guests").await.json();
    assert_eq!(guests.len(), 1);
}

#[tokio::test]
async fn test_storage_failure_is_a_generic_500() {
    let api = api();
    api.store.set_unavailable(true);
    let response = api.server.get("/api/guests").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["message"], "An internal error occurred");
}
