use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use wegroup_agent::analysis::{InvoiceAnalysis, InvoiceAnalyst};
use wegroup_agent::{AgentIntent, GuardrailDecision};
use wegroup_core::approvals::ApprovalRouter;
use wegroup_core::domain::approval::{ApprovalWorkflow, WorkflowStatus};
use wegroup_core::domain::invoice::{
    Invoice, InvoiceApprovalStatus, InvoiceId, ProcessingStatus,
};
use wegroup_core::domain::notification::NotificationKind;
use wegroup_core::workflow::WorkflowEngine;
use wegroup_db::repositories::{
    InvoiceRepository, SqlInvoiceRepository, SqlWorkflowRepository, WorkflowRepository,
};

use crate::api::workflows::record_notification;
use crate::api::{ok, ApiEnvelope, ApiError, ApiState};
use crate::auth::authenticate;

#[derive(Debug, Deserialize, Default)]
pub struct InvoiceListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub vendor_name: String,
    pub total_amount: String,
    pub currency: String,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RouteInvoiceResponse {
    pub workflow: ApprovalWorkflow,
    pub analysis: AnalysisView,
}

#[derive(Debug, Serialize)]
pub struct AnalysisView {
    pub confidence: f64,
    pub summary: String,
    pub anomalies: Vec<String>,
}

impl From<&InvoiceAnalysis> for AnalysisView {
    fn from(analysis: &InvoiceAnalysis) -> Self {
        Self {
            confidence: analysis.confidence,
            summary: analysis.summary.clone(),
            anomalies: analysis.anomalies.clone(),
        }
    }
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<InvoiceApprovalStatus>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "all" => Ok(None),
        "unsubmitted" => Ok(Some(InvoiceApprovalStatus::Unsubmitted)),
        "in_review" => Ok(Some(InvoiceApprovalStatus::InReview)),
        "approved" => Ok(Some(InvoiceApprovalStatus::Approved)),
        "rejected" => Ok(Some(InvoiceApprovalStatus::Rejected)),
        other => Err(ApiError::bad_request(format!("unknown status filter `{other}`"))),
    }
}

pub async fn list_invoices(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<ApiEnvelope<Vec<Invoice>>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;
    let status = parse_status_filter(query.status.as_deref())?;

    let invoices = SqlInvoiceRepository::new(state.db_pool.clone())
        .list_for_tenant(&session.tenant_id, status)
        .await
        .map_err(ApiError::internal)?;

    Ok(ok(invoices))
}

pub async fn get_invoice(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<Invoice>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let invoice = SqlInvoiceRepository::new(state.db_pool.clone())
        .find_by_id(&InvoiceId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|invoice| invoice.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("invoice"))?;

    Ok(ok(invoice))
}

pub async fn create_invoice(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<ApiEnvelope<Invoice>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let vendor_name = request.vendor_name.trim();
    if vendor_name.is_empty() {
        return Err(ApiError::bad_request("vendor_name must not be empty"));
    }

    let total_amount = Decimal::from_str(request.total_amount.trim())
        .map_err(|_| ApiError::bad_request("total_amount must be a decimal number"))?;
    if total_amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("total_amount must be positive"));
    }

    let currency = request.currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::bad_request("currency must be a 3-letter code"));
    }

    let now = Utc::now();
    let invoice = Invoice {
        id: InvoiceId(format!("INV-{}", Uuid::new_v4())),
        tenant_id: session.tenant_id,
        vendor_name: vendor_name.to_string(),
        total_amount,
        currency,
        processing_status: ProcessingStatus::Received,
        approval_status: InvoiceApprovalStatus::Unsubmitted,
        source: request.source.unwrap_or_else(|| "manual".to_string()),
        created_at: now,
        updated_at: now,
    };

    SqlInvoiceRepository::new(state.db_pool.clone())
        .save(invoice.clone())
        .await
        .map_err(ApiError::internal)?;

    info!(
        event_name = "api.invoice.ingested",
        invoice_id = %invoice.id.0,
        tenant_id = %invoice.tenant_id.0,
        source = %invoice.source,
        "invoice ingested"
    );

    Ok(ok(invoice))
}

/// Analyze the invoice with the AI collaborator, route it through the
/// approval-stage policy and open its workflow. A zero-stage route
/// completes immediately and approves the invoice.
pub async fn route_invoice(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<RouteInvoiceResponse>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let invoice_repo = SqlInvoiceRepository::new(state.db_pool.clone());
    let workflow_repo = SqlWorkflowRepository::new(state.db_pool.clone());

    let mut invoice = invoice_repo
        .find_by_id(&InvoiceId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|invoice| invoice.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("invoice"))?;

    if workflow_repo
        .find_by_invoice_id(&invoice.id)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        return Err(ApiError::bad_request("invoice is already routed"));
    }

    if invoice.processing_status == ProcessingStatus::Received {
        invoice
            .transition_processing(ProcessingStatus::Analyzing)
            .map_err(|error| ApiError::bad_request(error.to_string()))?;
    }

    let intent = AgentIntent::AnalyzeInvoice { invoice_id: invoice.id.0.clone() };
    if let GuardrailDecision::Deny { user_message, .. } = state.guardrails.evaluate(&intent) {
        return Err(ApiError::unavailable(user_message));
    }

    let analyst = InvoiceAnalyst::new(state.chat.clone());
    let analysis = analyst.analyze(&invoice).await.map_err(ApiError::upstream)?;

    let now = Utc::now();
    let decision = ApprovalRouter::new().route(invoice.total_amount, &analysis.signal());
    let workflow = WorkflowEngine::new().open(&invoice, &decision, analysis.confidence, now);

    workflow_repo.insert(workflow.clone()).await.map_err(ApiError::internal)?;

    invoice
        .transition_processing(ProcessingStatus::Routed)
        .map_err(|error| ApiError::bad_request(error.to_string()))?;

    if workflow.status == WorkflowStatus::Completed {
        invoice
            .transition_approval(InvoiceApprovalStatus::Approved)
            .map_err(|error| ApiError::bad_request(error.to_string()))?;
    } else {
        invoice
            .transition_approval(InvoiceApprovalStatus::InReview)
            .map_err(|error| ApiError::bad_request(error.to_string()))?;
    }
    invoice.updated_at = now;
    invoice_repo.save(invoice.clone()).await.map_err(ApiError::internal)?;

    record_notification(
        &state.db_pool,
        &workflow,
        NotificationKind::WorkflowCreated,
        format!(
            "Invoice {} routed: {} approval stage(s) required",
            invoice.id.0, workflow.max_approval_level
        ),
    )
    .await?;

    if workflow.status == WorkflowStatus::Completed {
        record_notification(
            &state.db_pool,
            &workflow,
            NotificationKind::WorkflowCompleted,
            format!("Invoice {} auto-approved", invoice.id.0),
        )
        .await?;
    }

    info!(
        event_name = "api.invoice.routed",
        invoice_id = %invoice.id.0,
        tenant_id = %invoice.tenant_id.0,
        workflow_id = %workflow.id.0,
        max_approval_level = workflow.max_approval_level,
        confidence = analysis.confidence,
        "invoice routed through approval policy"
    );

    Ok(ok(RouteInvoiceResponse { workflow, analysis: AnalysisView::from(&analysis) }))
}
