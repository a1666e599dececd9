use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::approval::WorkflowId;
use crate::domain::invoice::InvoiceId;
use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WorkflowCreated,
    StageApproved,
    WorkflowCompleted,
    WorkflowRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowCreated => "workflow_created",
            Self::StageApproved => "stage_approved",
            Self::WorkflowCompleted => "workflow_completed",
            Self::WorkflowRejected => "workflow_rejected",
        }
    }
}

/// Record created on every workflow transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub workflow_id: WorkflowId,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
