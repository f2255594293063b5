//! Carbon-credit ledger scenarios exercised through the HTTP router and the file-backed store.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use ecomart::impact::impact_router;
use ecomart::ledger::{
    ledger_router, CreditLedger, JsonFileStore, KeyValueStore, MemoryStore, SharedLedger,
    CREDITS_KEY,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn shared_ledger() -> (SharedLedger<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    let ledger = CreditLedger::load(Arc::new(store.clone())).expect("ledger loads");
    (Arc::new(Mutex::new(ledger)), store)
}

async fn send(router: axum::Router, method: &str, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
    let body = match payload {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json"))
}

#[tokio::test]
async fn snapshot_starts_with_demo_user() {
    let (ledger, _) = shared_ledger();
    let (status, body) = send(ledger_router(ledger), "GET", "/api/v1/ledger", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["carbon_credits"], 250);
    assert_eq!(body["user"]["id"], "demo-user");
    assert_eq!(body["is_logged_in"], true);
}

#[tokio::test]
async fn earn_then_spend_updates_balance() {
    let (ledger, store) = shared_ledger();

    let (status, body) = send(
        ledger_router(ledger.clone()),
        "POST",
        "/api/v1/ledger/credits/earn",
        Some(json!({ "amount": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["carbon_credits"], 290);

    let (status, body) = send(
        ledger_router(ledger),
        "POST",
        "/api/v1/ledger/credits/spend",
        Some(json!({ "amount": 90 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["carbon_credits"], 200);
    assert_eq!(body["user"]["carbon_credits"], 200);
    assert_eq!(store.get(CREDITS_KEY).expect("get"), Some("200".to_string()));
}

#[tokio::test]
async fn overspending_returns_conflict() {
    let (ledger, _) = shared_ledger();
    let (status, body) = send(
        ledger_router(ledger.clone()),
        "POST",
        "/api/v1/ledger/credits/spend",
        Some(json!({ "amount": 1000 })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["requested"], 1000);
    assert_eq!(body["available"], 250);
    assert_eq!(ledger.lock().expect("ledger lock").credits(), 250);
}

#[tokio::test]
async fn zero_amount_is_unprocessable() {
    let (ledger, _) = shared_ledger();
    let (status, _) = send(
        ledger_router(ledger),
        "POST",
        "/api/v1/ledger/credits/earn",
        Some(json!({ "amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn redeem_login_and_logout_flow() {
    let (ledger, _) = shared_ledger();

    let (status, body) = send(
        ledger_router(ledger.clone()),
        "POST",
        "/api/v1/ledger/rewards/redeem",
        Some(json!({ "id": "bamboo-brush", "title": "Bamboo toothbrush", "cost": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["carbon_credits"], 220);
    assert_eq!(body["redeemed_rewards"][0]["id"], "bamboo-brush");

    let (status, body) = send(
        ledger_router(ledger.clone()),
        "POST",
        "/api/v1/ledger/session/login",
        Some(json!({ "email": "grace@example.com", "full_name": "Grace" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "grace@example.com");
    assert_eq!(body["user"]["carbon_credits"], 220);

    let (status, body) = send(
        ledger_router(ledger),
        "POST",
        "/api/v1/ledger/session/logout",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], "demo-user");
    assert_eq!(body["carbon_credits"], 250);
    assert_eq!(body["redeemed_rewards"], json!([]));
}

#[tokio::test]
async fn impact_endpoint_reports_ledger_balance() {
    let (ledger, _) = shared_ledger();
    let (status, body) = send(impact_router(ledger), "GET", "/api/v1/impact", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_eco_purchases"], 3420);
    assert_eq!(body["labels"]["eco_purchases"], "3.4K");
    assert_eq!(body["carbon_credits"], 250);
}

#[tokio::test]
async fn earn_without_amount_returns_json_error() {
    let (ledger, _) = shared_ledger();
    let (status, body) = send(
        ledger_router(ledger),
        "POST",
        "/api/v1/ledger/credits/earn",
        Some(json!({ "credits": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().expect("error message").contains("amount"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_earns_on_file_store_all_land() {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let dir: PathBuf =
        std::env::temp_dir().join(format!("ecomart-concurrent-{}-{nanos}", std::process::id()));
    let path = dir.join("ledger.json");

    let ledger = CreditLedger::load(Arc::new(JsonFileStore::new(&path))).expect("ledger loads");
    let shared = Arc::new(Mutex::new(ledger));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let router = ledger_router(shared.clone());
        tasks.push(tokio::spawn(async move {
            send(
                router,
                "POST",
                "/api/v1/ledger/credits/earn",
                Some(json!({ "amount": 5 })),
            )
            .await
        }));
    }
    for task in tasks {
        let (status, _) = task.await.expect("request task");
        assert_eq!(status, StatusCode::OK);
    }

    let reloaded =
        CreditLedger::load(Arc::new(JsonFileStore::new(&path))).expect("ledger reloads");
    assert_eq!(reloaded.credits(), 290);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn file_backed_ledger_survives_restart() {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let dir: PathBuf =
        std::env::temp_dir().join(format!("ecomart-ledger-{}-{nanos}", std::process::id()));
    let path = dir.join("ledger.json");

    {
        let store = Arc::new(JsonFileStore::new(&path));
        let mut ledger = CreditLedger::load(store).expect("ledger loads");
        ledger.add_credits(25).expect("earn");
        ledger.spend_credits(5).expect("spend");
    }

    let store = Arc::new(JsonFileStore::new(&path));
    let ledger = CreditLedger::load(store).expect("ledger reloads");
    assert_eq!(ledger.credits(), 270);
    assert_eq!(ledger.user().map(|user| user.id.as_str()), Some("demo-user"));

    let _ = std::fs::remove_dir_all(dir);
}
