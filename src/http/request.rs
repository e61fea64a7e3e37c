//! Request bodies and request identification.
//!
//! # Responsibilities
//! - Generate a UUID request ID for every request that lacks one
//! - Define the JSON bodies the façade accepts
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Required fields are `Option` so a missing field is reported by name
//!   instead of as a serde rejection
//! - Amounts accept JSON strings or numbers and are kept as decimal text

use axum::http::{HeaderMap, HeaderValue, Request};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::blockchain::aggregator::TransferInstruction;
use crate::settlement::Participant;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID from headers, or `unknown`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Decimal amount given as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountValue {
    Text(String),
    Number(serde_json::Number),
}

impl AmountValue {
    pub fn as_decimal(&self) -> String {
        match self {
            AmountValue::Text(s) => s.trim().to_string(),
            AmountValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceRequest {
    pub address: Option<String>,
    pub denom: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub sender_credential: Option<String>,
    pub recipient_address: Option<String>,
    pub amount: Option<AmountValue>,
    pub token: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecipientEntry {
    pub address: String,
    pub amount: AmountValue,
    pub token: Option<String>,
}

impl RecipientEntry {
    pub fn into_instruction(self, default_token: &str) -> TransferInstruction {
        TransferInstruction::new(
            self.address,
            self.amount.as_decimal(),
            self.token.unwrap_or_else(|| default_token.to_string()),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct MultisendRequest {
    pub sender_credential: Option<String>,
    pub recipients: Option<Vec<RecipientEntry>>,
    pub memo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantEntry {
    pub address: String,
    pub amount: AmountValue,
    pub token: Option<String>,
    pub option: u32,
}

impl From<ParticipantEntry> for Participant {
    fn from(entry: ParticipantEntry) -> Self {
        Participant {
            address: entry.address,
            amount: entry.amount.as_decimal(),
            token: entry.token,
            option: entry.option,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub sender_credential: Option<String>,
    pub participants: Option<Vec<ParticipantEntry>>,
    pub winning_option: Option<u32>,
    pub memo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub sender_credential: Option<String>,
    pub participants: Option<Vec<ParticipantEntry>>,
    pub memo: Option<String>,
}

/// Names of required fields that are absent or blank.
pub fn missing_fields<'a>(fields: &[(&'a str, bool)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect()
}

/// `true` when the option holds non-blank text.
pub fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
