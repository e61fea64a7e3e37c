//! Route handlers.
//!
//! Handlers validate the body, call the transfer service and marshal the
//! result. They never retry; the service's failover executor does.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::blockchain::service::{HealthReport, MultisendReceipt, RefundReport, SettlementReport, TransferReceipt};
use crate::http::request::{
    missing_fields, present, BalanceRequest, MultisendRequest, ParticipantEntry, RefundRequest, SendRequest,
    SettleRequest,
};
use crate::http::response::{success, ApiError, Success};
use crate::http::server::AppState;
use crate::settlement::Participant;

const DEFAULT_MULTISEND_MEMO: &str = "Multisend transaction";

type ApiResult<T> = Result<Json<Success<T>>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ApiError::Validation(format!("Invalid request body: {}", rejection.body_text())))
}

fn require(fields: &[(&str, bool)]) -> Result<(), ApiError> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn credential(raw: Option<String>) -> Result<String, ApiError> {
    raw.ok_or_else(|| ApiError::Validation("Missing required fields: sender_credential".to_string()))
}

fn participants(raw: Option<Vec<ParticipantEntry>>) -> Result<Vec<Participant>, ApiError> {
    match raw {
        Some(entries) if !entries.is_empty() => Ok(entries.into_iter().map(Participant::from).collect()),
        _ => Err(ApiError::Validation(
            "participants must be a non-empty array".to_string(),
        )),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    #[serde(flatten)]
    node: HealthReport,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let node = state.service.health().await;
    Json(HealthBody {
        status: if node.rpc_reachable { "healthy" } else { "degraded" },
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        node,
    })
}

/// `POST /balance`
pub async fn balance(
    State(state): State<AppState>,
    payload: Result<Json<BalanceRequest>, JsonRejection>,
) -> ApiResult<serde_json::Value> {
    let request = body(payload)?;
    require(&[("address", present(&request.address))])?;
    let address = request.address.unwrap_or_default();

    let report = state
        .service
        .balance(&address, request.denom.as_deref())
        .await?;
    Ok(success(json!({ "balance": report })))
}

/// `POST /send`
pub async fn send(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> ApiResult<TransferReceipt> {
    let request = body(payload)?;
    require(&[
        ("sender_credential", present(&request.sender_credential)),
        ("recipient_address", present(&request.recipient_address)),
        ("amount", request.amount.is_some()),
    ])?;

    let amount = request.amount.map(|a| a.as_decimal()).unwrap_or_default();
    let receipt = state
        .service
        .send(
            &credential(request.sender_credential)?,
            request.recipient_address.as_deref().unwrap_or_default(),
            &amount,
            request.token.as_deref(),
            request.memo.as_deref().unwrap_or(""),
        )
        .await?;
    Ok(success(receipt))
}

/// `POST /multisend`
pub async fn multisend(
    State(state): State<AppState>,
    payload: Result<Json<MultisendRequest>, JsonRejection>,
) -> ApiResult<MultisendReceipt> {
    let request = body(payload)?;
    require(&[("sender_credential", present(&request.sender_credential))])?;

    let recipients = match request.recipients {
        Some(list) if !list.is_empty() => list,
        _ => {
            return Err(ApiError::Validation(
                "recipients must be a non-empty array".to_string(),
            ))
        }
    };
    let native = state.service.denoms().native_token().to_string();
    let instructions: Vec<_> = recipients
        .into_iter()
        .map(|r| r.into_instruction(&native))
        .collect();

    let receipt = state
        .service
        .multisend(
            &credential(request.sender_credential)?,
            &instructions,
            request.memo.as_deref().unwrap_or(DEFAULT_MULTISEND_MEMO),
        )
        .await?;
    Ok(success(receipt))
}

/// `POST /settle`
pub async fn settle(
    State(state): State<AppState>,
    payload: Result<Json<SettleRequest>, JsonRejection>,
) -> ApiResult<SettlementReport> {
    let request = body(payload)?;
    require(&[
        ("sender_credential", present(&request.sender_credential)),
        ("winning_option", request.winning_option.is_some()),
    ])?;
    let participants = participants(request.participants)?;

    let report = state
        .service
        .settle(
            &credential(request.sender_credential)?,
            &participants,
            request.winning_option.unwrap_or_default(),
            request.memo.as_deref(),
        )
        .await?;
    Ok(success(report))
}

/// `POST /refund`
pub async fn refund(
    State(state): State<AppState>,
    payload: Result<Json<RefundRequest>, JsonRejection>,
) -> ApiResult<RefundReport> {
    let request = body(payload)?;
    require(&[("sender_credential", present(&request.sender_credential))])?;
    let participants = participants(request.participants)?;

    let report = state
        .service
        .refund(
            &credential(request.sender_credential)?,
            &participants,
            request.memo.as_deref(),
        )
        .await?;
    Ok(success(report))
}
