use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use wegroup_core::domain::supplier::{Supplier, SupplierId};
use wegroup_db::repositories::{SqlSupplierRepository, SupplierRepository};

use crate::api::{ok, ApiEnvelope, ApiError, ApiState};
use crate::auth::authenticate;

#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    pub name: String,
    pub reliability_score: f64,
}

pub async fn list_suppliers(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<ApiEnvelope<Vec<Supplier>>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let suppliers = SqlSupplierRepository::new(state.db_pool.clone())
        .list_for_tenant(&session.tenant_id)
        .await
        .map_err(ApiError::internal)?;

    Ok(ok(suppliers))
}

pub async fn get_supplier(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<Supplier>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let supplier = SqlSupplierRepository::new(state.db_pool.clone())
        .find_by_id(&SupplierId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|supplier| supplier.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("supplier"))?;

    Ok(ok(supplier))
}

pub async fn create_supplier(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<Json<ApiEnvelope<Supplier>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if !(0.0..=1.0).contains(&request.reliability_score) {
        return Err(ApiError::bad_request("reliability_score must be between 0 and 1"));
    }

    let now = Utc::now();
    let supplier = Supplier {
        id: SupplierId(format!("sup-{}", Uuid::new_v4())),
        tenant_id: session.tenant_id,
        name: name.to_string(),
        reliability_score: request.reliability_score,
        total_deliveries: 0,
        on_time_deliveries: 0,
        created_at: now,
        updated_at: now,
    };

    SqlSupplierRepository::new(state.db_pool.clone())
        .save(supplier.clone())
        .await
        .map_err(ApiError::internal)?;

    Ok(ok(supplier))
}
