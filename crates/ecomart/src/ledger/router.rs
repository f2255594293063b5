use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::store::KeyValueStore;
use super::{CreditLedger, LedgerError, LedgerSnapshot, RedeemedReward};
use crate::AppError;

/// Ledger handle shared between request handlers.
pub type SharedLedger<S> = Arc<Mutex<CreditLedger<S>>>;

#[derive(Debug, Deserialize)]
pub struct CreditAmount {
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub full_name: String,
}

/// Router builder exposing the carbon-credit ledger.
pub fn ledger_router<S>(ledger: SharedLedger<S>) -> Router
where
    S: KeyValueStore + 'static,
{
    Router::new()
        .route("/api/v1/ledger", get(snapshot_handler::<S>))
        .route("/api/v1/ledger/credits/earn", post(earn_handler::<S>))
        .route("/api/v1/ledger/credits/spend", post(spend_handler::<S>))
        .route("/api/v1/ledger/rewards/redeem", post(redeem_handler::<S>))
        .route("/api/v1/ledger/session/login", post(login_handler::<S>))
        .route("/api/v1/ledger/session/logout", post(logout_handler::<S>))
        .with_state(ledger)
}

fn lock<S>(ledger: &SharedLedger<S>) -> Result<MutexGuard<'_, CreditLedger<S>>, Response> {
    ledger.lock().map_err(|_| {
        let payload = json!({ "error": "ledger unavailable" });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
    })
}

/// Runs `apply` on a blocking thread: a file-backed store does synchronous I/O under the lock.
async fn respond<S, F>(ledger: SharedLedger<S>, apply: F) -> Response
where
    S: KeyValueStore + 'static,
    F: FnOnce(&mut CreditLedger<S>) -> Result<(), LedgerError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        let mut guard = match lock(&ledger) {
            Ok(guard) => guard,
            Err(response) => return response,
        };

        match apply(&mut guard) {
            Ok(()) => (StatusCode::OK, Json(guard.snapshot())).into_response(),
            Err(error) => ledger_error_response(&error),
        }
    })
    .await;

    outcome.unwrap_or_else(|_| {
        let payload = json!({ "error": "ledger unavailable" });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
    })
}

pub(crate) fn ledger_error_response(error: &LedgerError) -> Response {
    let status = match error {
        LedgerError::InsufficientCredits { .. } => StatusCode::CONFLICT,
        LedgerError::InvalidAmount
        | LedgerError::BalanceOverflow
        | LedgerError::InvalidReward
        | LedgerError::InvalidLogin => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = match error {
        LedgerError::InsufficientCredits {
            requested,
            available,
        } => json!({
            "error": error.to_string(),
            "requested": requested,
            "available": available,
        }),
        _ => json!({ "error": error.to_string() }),
    };
    (status, Json(payload)).into_response()
}

pub(crate) async fn snapshot_handler<S>(State(ledger): State<SharedLedger<S>>) -> Response
where
    S: KeyValueStore + 'static,
{
    match lock(&ledger) {
        Ok(guard) => {
            let snapshot: LedgerSnapshot = guard.snapshot();
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn earn_handler<S>(
    State(ledger): State<SharedLedger<S>>,
    payload: Result<Json<CreditAmount>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(request) = payload?;
    let response = respond(ledger, move |ledger| {
        ledger.add_credits(request.amount).map(|_| ())
    })
    .await;
    Ok(response)
}

pub(crate) async fn spend_handler<S>(
    State(ledger): State<SharedLedger<S>>,
    payload: Result<Json<CreditAmount>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(request) = payload?;
    let response = respond(ledger, move |ledger| {
        ledger.spend_credits(request.amount).map(|_| ())
    })
    .await;
    Ok(response)
}

pub(crate) async fn redeem_handler<S>(
    State(ledger): State<SharedLedger<S>>,
    payload: Result<Json<RedeemedReward>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(reward) = payload?;
    Ok(respond(ledger, move |ledger| ledger.redeem(reward).map(|_| ())).await)
}

pub(crate) async fn login_handler<S>(
    State(ledger): State<SharedLedger<S>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(request) = payload?;
    let response = respond(ledger, move |ledger| {
        ledger
            .login(&request.email, &request.full_name)
            .map(|_| ())
    })
    .await;
    Ok(response)
}

pub(crate) async fn logout_handler<S>(State(ledger): State<SharedLedger<S>>) -> Response
where
    S: KeyValueStore + 'static,
{
    respond(ledger, |ledger| ledger.logout()).await
}
