pub mod transactions;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::domain::NewTransaction;
use crate::health::check_health;
use crate::AppState;
use transactions::{InsertResponse, TransactionResponse, TransactionsResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        transactions::insert_transactions,
        transactions::get_transactions,
        transactions::get_transactions_by_period,
        transactions::get_transactions_by_period_epoch
    ),
    components(schemas(NewTransaction, InsertResponse, TransactionResponse, TransactionsResponse)),
    tags(
        (name = "Health", description = "Liveness and dependency status"),
        (name = "Transactions", description = "Purchases and their currency conversion")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Healthy or degraded"),
        (status = 503, description = "A critical dependency is down")
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = check_health(&state.health, state.start_time).await;

    // Return 503 only when a critical dependency is down
    let status_code = if response.status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}
