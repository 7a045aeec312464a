use crate::server::model::cart::{CartEntry, LineItemKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum ReceiptStatus {
    #[default]
    Pending,
    Fulfilled,
    Cancelled,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "Pending",
            ReceiptStatus::Fulfilled => "Fulfilled",
            ReceiptStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for ReceiptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Fulfilled" => Ok(Self::Fulfilled),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(format!("Invalid receipt status: {s}")),
        }
    }
}

/// Receipt header as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReceiptRow {
    pub receipt_id: i64,
    pub date: DateTime<Utc>,
    pub order_time: DateTime<Utc>,
    pub totalamount: Decimal,
    pub status: ReceiptStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LineItemRow {
    pub line_item_id: i64,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct LineItemView {
    pub line_item_id: i64,
    pub price: Decimal,
    #[serde(flatten)]
    pub kind: LineItemKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Receipt {
    #[serde(flatten)]
    pub header: ReceiptRow,
    pub line_items: Vec<LineItemView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetReceiptsResponse {
    pub receipts: Vec<ReceiptRow>,
}

/// Full replacement of a receipt's contents.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PutReceiptRequest {
    pub status: ReceiptStatus,
    pub line_items: Vec<CartEntry>,
    #[serde(default)]
    pub totalamount: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct PatchReceiptStatusRequest {
    pub status: ReceiptStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReceiptMutationResponse {
    pub receipt_id: i64,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ReceiptListParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<ReceiptStatus>,
}
