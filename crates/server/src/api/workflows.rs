use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use wegroup_core::domain::approval::{
    ApprovalWorkflow, StageDecision, WorkflowId, WorkflowStatus,
};
use wegroup_core::domain::invoice::InvoiceApprovalStatus;
use wegroup_core::domain::notification::{Notification, NotificationId, NotificationKind};
use wegroup_core::workflow::{WorkflowAction, WorkflowEngine, WorkflowEvent};
use wegroup_db::repositories::{
    InvoiceRepository, NotificationRepository, RepositoryError, SqlInvoiceRepository,
    SqlNotificationRepository, SqlWorkflowRepository, WorkflowRepository,
};
use wegroup_db::DbPool;

use crate::api::{ok, ApiEnvelope, ApiError, ApiState};
use crate::auth::authenticate;

#[derive(Debug, Deserialize)]
pub struct StageDecisionRequest {
    pub stage: u8,
    pub decision: String,
    pub comment: Option<String>,
    /// Version the caller read; a concurrent decision bumps it and this
    /// submission is refused with 409 instead of overwriting.
    pub expected_version: i64,
}

pub async fn get_workflow(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<ApprovalWorkflow>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let workflow = SqlWorkflowRepository::new(state.db_pool.clone())
        .find_by_id(&WorkflowId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|workflow| workflow.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("workflow"))?;

    Ok(ok(workflow))
}

/// Record a human stage decision. The state machine enforces stage order
/// and terminal states; persistence enforces the optimistic version check.
pub async fn decide_stage(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<StageDecisionRequest>,
) -> Result<Json<ApiEnvelope<ApprovalWorkflow>>, ApiError> {
    let session = authenticate(&state.db_pool, &headers).await?;

    let decision = match request.decision.trim().to_ascii_lowercase().as_str() {
        "approve" => StageDecision::Approve,
        "reject" => StageDecision::Reject,
        other => {
            return Err(ApiError::bad_request(format!(
                "decision must be approve or reject, got `{other}`"
            )))
        }
    };

    let workflow_repo = SqlWorkflowRepository::new(state.db_pool.clone());
    let mut workflow = workflow_repo
        .find_by_id(&WorkflowId(id))
        .await
        .map_err(ApiError::internal)?
        .filter(|workflow| workflow.tenant_id == session.tenant_id)
        .ok_or_else(|| ApiError::not_found("workflow"))?;

    let event = WorkflowEvent::StageDecided {
        stage: request.stage,
        approver_id: session.user_id.clone(),
        decision,
        comment: request.comment.clone(),
    };

    let now = Utc::now();
    let outcome = WorkflowEngine::new()
        .apply(&mut workflow, &event, now)
        .map_err(|error| ApiError::bad_request(error.to_string()))?;

    match workflow_repo.update(workflow.clone(), request.expected_version).await {
        Ok(()) => {}
        Err(RepositoryError::VersionConflict { .. }) => {
            return Err(ApiError::conflict(
                "workflow changed since it was read; reload and retry",
            ));
        }
        Err(error) => return Err(ApiError::internal(error)),
    }
    workflow.version = request.expected_version + 1;

    for action in &outcome.actions {
        match action {
            WorkflowAction::RecordNotification(kind) => {
                let message = notification_message(&workflow, *kind, request.stage);
                record_notification(&state.db_pool, &workflow, *kind, message).await?;
            }
            WorkflowAction::FinalizeInvoice => {
                finalize_invoice(&state.db_pool, &workflow, InvoiceApprovalStatus::Approved)
                    .await?;
            }
        }
    }

    // Stage rejection terminates the workflow; the parent invoice follows.
    if workflow.status == WorkflowStatus::Rejected {
        finalize_invoice(&state.db_pool, &workflow, InvoiceApprovalStatus::Rejected).await?;
    }

    info!(
        event_name = "api.workflow.stage_decided",
        workflow_id = %workflow.id.0,
        invoice_id = %workflow.invoice_id.0,
        tenant_id = %workflow.tenant_id.0,
        stage = request.stage,
        decision = %request.decision,
        from_stage = outcome.from_stage,
        to_stage = outcome.to_stage,
        "approval stage decided"
    );

    Ok(ok(workflow))
}

pub(crate) async fn record_notification(
    pool: &DbPool,
    workflow: &ApprovalWorkflow,
    kind: NotificationKind,
    message: String,
) -> Result<(), ApiError> {
    SqlNotificationRepository::new(pool.clone())
        .save(Notification {
            id: NotificationId(format!("ntf-{}", Uuid::new_v4())),
            tenant_id: workflow.tenant_id.clone(),
            invoice_id: workflow.invoice_id.clone(),
            workflow_id: workflow.id.clone(),
            kind,
            message,
            read: false,
            created_at: Utc::now(),
        })
        .await
        .map_err(ApiError::internal)
}

async fn finalize_invoice(
    pool: &DbPool,
    workflow: &ApprovalWorkflow,
    status: InvoiceApprovalStatus,
) -> Result<(), ApiError> {
    let invoice_repo = SqlInvoiceRepository::new(pool.clone());
    let mut invoice = invoice_repo
        .find_by_id(&workflow.invoice_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("invoice"))?;

    invoice
        .transition_approval(status)
        .map_err(|error| ApiError::bad_request(error.to_string()))?;
    invoice.updated_at = Utc::now();
    invoice_repo.save(invoice).await.map_err(ApiError::internal)
}

fn notification_message(
    workflow: &ApprovalWorkflow,
    kind: NotificationKind,
    stage: u8,
) -> String {
    match kind {
        NotificationKind::WorkflowCreated => {
            format!("Approval workflow opened for invoice {}", workflow.invoice_id.0)
        }
        NotificationKind::StageApproved => format!(
            "Stage {stage} of {} approved for invoice {}",
            workflow.max_approval_level, workflow.invoice_id.0
        ),
        NotificationKind::WorkflowCompleted => {
            format!("Invoice {} fully approved", workflow.invoice_id.0)
        }
        NotificationKind::WorkflowRejected => {
            format!("Invoice {} rejected at stage {stage}", workflow.invoice_id.0)
        }
    }
}
