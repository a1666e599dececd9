use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use wegroup_core::domain::supplier::SupplierId;
use wegroup_core::domain::tenant::TenantId;
use wegroup_core::domain::transport::{
    TransportQuote, TransportQuoteId, TransportRequest, TransportRequestId,
    TransportRequestStatus,
};

use super::{RepositoryError, TransportRepository};
use crate::DbPool;

pub struct SqlTransportRepository {
    pool: DbPool,
}

impl SqlTransportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_request_status(s: &str) -> TransportRequestStatus {
    match s {
        "quoted" => TransportRequestStatus::Quoted,
        "awarded" => TransportRequestStatus::Awarded,
        "cancelled" => TransportRequestStatus::Cancelled,
        _ => TransportRequestStatus::Open,
    }
}

pub fn request_status_as_str(status: &TransportRequestStatus) -> &'static str {
    match status {
        TransportRequestStatus::Open => "open",
        TransportRequestStatus::Quoted => "quoted",
        TransportRequestStatus::Awarded => "awarded",
        TransportRequestStatus::Cancelled => "cancelled",
    }
}

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> Result<TransportRequest, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let origin: String =
        row.try_get("origin").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let destination: String =
        row.try_get("destination").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let cargo_description: String =
        row.try_get("cargo_description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let winning_quote_id: Option<String> =
        row.try_get("winning_quote_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(TransportRequest {
        id: TransportRequestId(id),
        tenant_id: TenantId(tenant_id),
        origin,
        destination,
        cargo_description,
        status: parse_request_status(&status_str),
        winning_quote_id: winning_quote_id.map(TransportQuoteId),
        created_at,
        updated_at,
    })
}

fn row_to_quote(row: &sqlx::sqlite::SqliteRow) -> Result<TransportQuote, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let request_id: String =
        row.try_get("request_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let supplier_id: String =
        row.try_get("supplier_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_str: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let transit_time_hours: i64 =
        row.try_get("transit_time_hours").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let carbon_kg: Option<f64> =
        row.try_get("carbon_kg").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let price = Decimal::from_str(&price_str)
        .map_err(|e| RepositoryError::Decode(format!("price: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(TransportQuote {
        id: TransportQuoteId(id),
        request_id: TransportRequestId(request_id),
        supplier_id: SupplierId(supplier_id),
        price,
        transit_time_hours,
        carbon_kg,
        created_at,
    })
}

#[async_trait::async_trait]
impl TransportRepository for SqlTransportRepository {
    async fn find_request_by_id(
        &self,
        id: &TransportRequestId,
    ) -> Result<Option<TransportRequest>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, origin, destination, cargo_description, status,
                    winning_quote_id, created_at, updated_at
             FROM transport_request WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_request(r)?)),
            None => Ok(None),
        }
    }

    async fn list_requests_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<TransportRequest>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, tenant_id, origin, destination, cargo_description, status,
                    winning_quote_id, created_at, updated_at
             FROM transport_request WHERE tenant_id = ? ORDER BY created_at DESC",
        )
        .bind(&tenant_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_request).collect::<Result<Vec<_>, _>>()
    }

    async fn save_request(&self, request: TransportRequest) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO transport_request (id, tenant_id, origin, destination,
                                            cargo_description, status, winning_quote_id,
                                            created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 origin = excluded.origin,
                 destination = excluded.destination,
                 cargo_description = excluded.cargo_description,
                 status = excluded.status,
                 winning_quote_id = excluded.winning_quote_id,
                 updated_at = excluded.updated_at",
        )
        .bind(&request.id.0)
        .bind(&request.tenant_id.0)
        .bind(&request.origin)
        .bind(&request.destination)
        .bind(&request.cargo_description)
        .bind(request_status_as_str(&request.status))
        .bind(request.winning_quote_id.as_ref().map(|id| id.0.clone()))
        .bind(request.created_at.to_rfc3339())
        .bind(request.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_quotes_for_request(
        &self,
        request_id: &TransportRequestId,
    ) -> Result<Vec<TransportQuote>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, request_id, supplier_id, price, transit_time_hours, carbon_kg, created_at
             FROM transport_quote WHERE request_id = ? ORDER BY created_at ASC",
        )
        .bind(&request_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_quote).collect::<Result<Vec<_>, _>>()
    }

    async fn save_quote(&self, quote: TransportQuote) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO transport_quote (id, request_id, supplier_id, price,
                                          transit_time_hours, carbon_kg, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 price = excluded.price,
                 transit_time_hours = excluded.transit_time_hours,
                 carbon_kg = excluded.carbon_kg",
        )
        .bind(&quote.id.0)
        .bind(&quote.request_id.0)
        .bind(&quote.supplier_id.0)
        .bind(quote.price.to_string())
        .bind(quote.transit_time_hours)
        .bind(quote.carbon_kg)
        .bind(quote.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
