use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use wegroup_core::domain::supplier::SupplierId;
use wegroup_core::domain::transport::{
    TransportQuote, TransportQuoteId, TransportRequest, TransportRequestId,
    TransportRequestStatus,
};
use wegroup_core::scoring::{QuoteComparator, QuoteComparison, WeightProfile};
use wegroup_db::repositories::{
    SqlSupplierRepository, SqlTransportRepository, SupplierRepository, TransportRepository,
};

use crate::api::{ok, ApiEnvelope, ApiError, ApiState};
use crate::auth::authenticate;

#[derive(Debug, Deserialize)]
pub struct CreateRequestRequest {
    pub origin: String,
    pub destination: String,
    pub cargo_description: String,
}

#[derive(Debug, Deserialize)]
pub struct AddQuoteRequest {
    pub supplier_id: String,
    pub price: String,
    pub transit_time_hours: i64,
    pub carbon_kg: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ComparisonQuery {
    pub profile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AwardRequest {
    pub quote_id: String,
}

#[derive(Debug, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: TransportRequest,
    pub quotes: Vec<TransportQuote>,
}

pub async fn list_requests(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<ApiEnvelope<Vec<TransportRequest>>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let requests = SqlTransportRepository::new(state.db_pool.clone())
        .list_requests_for_tenant(&session.tenant_id)
        .await
        .map_err(ApiError::internal)?;

    Ok(ok(requests))
}

pub async fn get_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<RequestView>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;
    let repo = SqlTransportRepository::new(state.db_pool.clone());

    let request = repo
        .find_request_by_id(&TransportRequestId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|request| request.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("transport request"))?;

    let quotes =
        repo.list_quotes_for_request(&request.id).await.map_err(ApiError::internal)?;

    Ok(ok(RequestView { request, quotes }))
}

pub async fn create_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<CreateRequestRequest>,
) -> Result<Json<ApiEnvelope<TransportRequest>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    for (field, value) in [
        ("origin", &request.origin),
        ("destination", &request.destination),
        ("cargo_description", &request.cargo_description),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::bad_request(format!("{field} must not be empty")));
        }
    }

    let now = Utc::now();
    let transport_request = TransportRequest {
        id: TransportRequestId(format!("TR-{}", Uuid::new_v4())),
        tenant_id: session.tenant_id,
        origin: request.origin.trim().to_string(),
        destination: request.destination.trim().to_string(),
        cargo_description: request.cargo_description.trim().to_string(),
        status: TransportRequestStatus::Open,
        winning_quote_id: None,
        created_at: now,
        updated_at: now,
    };

    SqlTransportRepository::new(state.db_pool.clone())
        .save_request(transport_request.clone())
        .await
        .map_err(ApiError::internal)?;

    Ok(ok(transport_request))
}

pub async fn add_quote(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<AddQuoteRequest>,
) -> Result<Json<ApiEnvelope<TransportQuote>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;
    let repo = SqlTransportRepository::new(state.db_pool.clone());

    let mut transport_request = repo
        .find_request_by_id(&TransportRequestId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|r| r.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("transport request"))?;

    if matches!(
        transport_request.status,
        TransportRequestStatus::Awarded | TransportRequestStatus::Cancelled
    ) {
        return Err(ApiError::bad_request("transport request no longer accepts quotes"));
    }

    let supplier = SqlSupplierRepository::new(state.db_pool.clone())
        .find_by_id(&SupplierId(request.supplier_id.clone()))
        .await
        .map_err(ApiError::internal)?
        .filter(|supplier| supplier.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("supplier"))?;

    let price = Decimal::from_str(request.price.trim())
        .map_err(|_| ApiError::bad_request("price must be a decimal number"))?;
    if price <= Decimal::ZERO {
        return Err(ApiError::bad_request("price must be positive"));
    }
    if request.transit_time_hours <= 0 {
        return Err(ApiError::bad_request("transit_time_hours must be positive"));
    }

    let quote = TransportQuote {
        id: TransportQuoteId(format!("TQ-{}", Uuid::new_v4())),
        request_id: transport_request.id.clone(),
        supplier_id: supplier.id,
        price,
        transit_time_hours: request.transit_time_hours,
        carbon_kg: request.carbon_kg,
        created_at: Utc::now(),
    };

    repo.save_quote(quote.clone()).await.map_err(ApiError::internal)?;

    if transport_request.status == TransportRequestStatus::Open {
        transport_request.status = TransportRequestStatus::Quoted;
        transport_request.updated_at = Utc::now();
        repo.save_request(transport_request).await.map_err(ApiError::internal)?;
    }

    Ok(ok(quote))
}

/// Stateless weighted comparison across the request's quotes, recomputed
/// on demand under the requested (or configured) weight profile.
pub async fn compare_quotes(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<ComparisonQuery>,
) -> Result<Json<ApiEnvelope<QuoteComparison>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;
    let repo = SqlTransportRepository::new(state.db_pool.clone());

    let profile = match query.profile.as_deref() {
        Some(raw) => WeightProfile::from_str(raw).map_err(ApiError::bad_request)?,
        None => state.weight_profile,
    };

    let request = repo
        .find_request_by_id(&TransportRequestId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|r| r.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("transport request"))?;

    let quotes =
        repo.list_quotes_for_request(&request.id).await.map_err(ApiError::internal)?;

    let suppliers = SqlSupplierRepository::new(state.db_pool.clone())
        .list_for_tenant(&session.tenant_id)
        .await
        .map_err(ApiError::internal)?;
    let reliability_by_supplier: HashMap<SupplierId, f64> = suppliers
        .into_iter()
        .map(|supplier| (supplier.id, supplier.reliability_score))
        .collect();

    let comparison = QuoteComparator::new(profile)
        .compare(&quotes, &reliability_by_supplier)
        .ok_or_else(|| ApiError::bad_request("transport request has no quotes to compare"))?;

    info!(
        event_name = "api.transport.quotes_compared",
        request_id = %request.id.0,
        tenant_id = %request.tenant_id.0,
        profile = profile.as_str(),
        quotes = comparison.scores.len(),
        recommended_quote_id = %comparison.recommended_quote_id.0,
        "transport quotes compared"
    );

    Ok(ok(comparison))
}

/// Persist the denormalized winning-quote pointer.
pub async fn award_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<AwardRequest>,
) -> Result<Json<ApiEnvelope<TransportRequest>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;
    let repo = SqlTransportRepository::new(state.db_pool.clone());

    let mut transport_request = repo
        .find_request_by_id(&TransportRequestId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|r| r.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("transport request"))?;

    if transport_request.status == TransportRequestStatus::Awarded {
        return Err(ApiError::bad_request("transport request is already awarded"));
    }

    let quotes = repo
        .list_quotes_for_request(&transport_request.id)
        .await
        .map_err(ApiError::internal)?;
    let winning = quotes
        .iter()
        .find(|quote| quote.id.0 == request.quote_id)
        .ok_or_else(|| ApiError::not_found("quote"))?;

    transport_request.status = TransportRequestStatus::Awarded;
    transport_request.winning_quote_id = Some(winning.id.clone());
    transport_request.updated_at = Utc::now();
    repo.save_request(transport_request.clone()).await.map_err(ApiError::internal)?;

    Ok(ok(transport_request))
}
