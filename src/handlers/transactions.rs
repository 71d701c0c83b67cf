use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{NewTransaction, TransactionView};
use crate::error::AppError;
use crate::validation;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InsertResponse {
    pub ids: Vec<String>,
}

/// A converted purchase as returned over HTTP. `created_at` is internal and
/// stays in the cached view only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: String,
    #[schema(value_type = String, example = "23.70")]
    pub purchase_amount: BigDecimal,
    pub description: String,
    #[schema(value_type = String, format = Date, example = "2023-10-15")]
    pub purchase_date: NaiveDate,
    #[schema(value_type = String, example = "1.35")]
    pub exchange_rate: BigDecimal,
    #[schema(value_type = String, example = "31.95")]
    pub converted_purchase_amount: BigDecimal,
}

impl From<TransactionView> for TransactionResponse {
    fn from(view: TransactionView) -> Self {
        Self {
            id: view.id,
            purchase_amount: view.purchase_amount,
            description: view.description,
            purchase_date: view.purchase_date,
            exchange_rate: view.exchange_rate,
            converted_purchase_amount: view.converted_purchase_amount,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionResponse>,
}

impl From<Vec<TransactionView>> for TransactionsResponse {
    fn from(views: Vec<TransactionView>) -> Self {
        Self {
            transactions: views.into_iter().map(TransactionResponse::from).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdsQuery {
    /// Comma-separated transaction ids
    pub ids: Option<String>,
    /// Fiscal Data currency label, e.g. `Canada-Dollar`
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub currency: Option<String>,
}

fn required<'a>(name: &str, value: &'a Option<String>) -> Result<&'a str, AppError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Input(format!("missing query parameter: {}", name))),
    }
}

/// Labels are spliced into the provider's `filter` expression, where `,`
/// separates clauses and `:` separates operator from operand.
fn currency_label(value: &Option<String>) -> Result<&str, AppError> {
    let label = required("currency", value)?;
    if label.contains([',', ':']) {
        return Err(AppError::Input(format!(
            "currency must not contain ',' or ':': {}",
            label
        )));
    }
    Ok(label)
}

fn parse_epoch(name: &str, raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::Input(format!("{} must be a Unix timestamp in seconds", name)))
}

/// `"a, b,,c"` -> `["a", "b", "c"]`
pub fn split_ids(raw: &str) -> Vec<String> {
    raw.replace(' ', "")
        .split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[utoipa::path(
    post,
    path = "/v1/transaction",
    request_body = Vec<NewTransaction>,
    responses(
        (status = 200, description = "Ids of the stored purchases, in input order", body = InsertResponse),
        (status = 400, description = "Invalid amount, description or purchase date"),
        (status = 500, description = "Store failure")
    ),
    tag = "Transactions"
)]
pub async fn insert_transactions(
    State(state): State<AppState>,
    Json(payload): Json<Vec<NewTransaction>>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_batch(&payload)?;

    let ids = match <[NewTransaction; 1]>::try_from(payload) {
        Ok([single]) => vec![state.transactions.insert_one(single).await?],
        Err(batch) => state.transactions.insert_many(batch).await?,
    };

    Ok(Json(InsertResponse { ids }))
}

#[utoipa::path(
    get,
    path = "/v1/transaction",
    params(IdsQuery),
    responses(
        (status = 200, description = "Purchases converted into the requested currency", body = TransactionsResponse),
        (status = 400, description = "Missing parameter or malformed id"),
        (status = 422, description = "No exchange rate within 6 months of a purchase"),
        (status = 502, description = "Exchange rate provider failure")
    ),
    tag = "Transactions"
)]
pub async fn get_transactions(
    State(state): State<AppState>,
    Query(params): Query<IdsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids = split_ids(required("ids", &params.ids)?);
    let currency = currency_label(&params.currency)?;

    let transactions = state.transactions.get_by_ids(&ids, currency).await?;
    Ok(Json(TransactionsResponse::from(transactions)))
}

#[utoipa::path(
    get,
    path = "/v1/transaction/period",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Purchases created in [startDate, endDate), dates as YYYY-MM-DD", body = TransactionsResponse),
        (status = 400, description = "Missing parameter or malformed date"),
        (status = 422, description = "No exchange rate within 6 months of a purchase"),
        (status = 502, description = "Exchange rate provider failure")
    ),
    tag = "Transactions"
)]
pub async fn get_transactions_by_period(
    State(state): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<impl IntoResponse, AppError> {
    let start = required("startDate", &params.start_date)?;
    let end = required("endDate", &params.end_date)?;
    let currency = currency_label(&params.currency)?;

    let transactions = state
        .transactions
        .get_by_period(start, end, currency)
        .await?;
    Ok(Json(TransactionsResponse::from(transactions)))
}

#[utoipa::path(
    get,
    path = "/v1/transaction/epoch-period",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Purchases created in [startDate, endDate), bounds in epoch seconds", body = TransactionsResponse),
        (status = 400, description = "Missing parameter or non-numeric bound"),
        (status = 422, description = "No exchange rate within 6 months of a purchase"),
        (status = 502, description = "Exchange rate provider failure")
    ),
    tag = "Transactions"
)]
pub async fn get_transactions_by_period_epoch(
    State(state): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<impl IntoResponse, AppError> {
    let start = parse_epoch("startDate", required("startDate", &params.start_date)?)?;
    let end = parse_epoch("endDate", required("endDate", &params.end_date)?)?;
    let currency = currency_label(&params.currency)?;

    let transactions = state
        .transactions
        .get_by_period_epoch(start, end, currency)
        .await?;
    Ok(Json(TransactionsResponse::from(transactions)))
}
