use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::supplier::SupplierId;
use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransportRequestId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransportQuoteId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportRequestStatus {
    Open,
    Quoted,
    Awarded,
    Cancelled,
}

/// Customer-initiated solicitation for supplier bids (RFQ).
///
/// Quote comparison is stateless and recomputed on demand; the only
/// persisted outcome is the denormalized `winning_quote_id` pointer set
/// when the request is awarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportRequest {
    pub id: TransportRequestId,
    pub tenant_id: TenantId,
    pub origin: String,
    pub destination: String,
    pub cargo_description: String,
    pub status: TransportRequestStatus,
    pub winning_quote_id: Option<TransportQuoteId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A supplier's bid against a transport request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportQuote {
    pub id: TransportQuoteId,
    pub request_id: TransportRequestId,
    pub supplier_id: SupplierId,
    pub price: Decimal,
    pub transit_time_hours: i64,
    pub carbon_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
}
