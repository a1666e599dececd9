use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::invoice::InvoiceId;
use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    Automatic,
    Manual,
    Hybrid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    InProgress,
    Completed,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageDecision {
    Approve,
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiRecommendation {
    Approve,
    Review,
    Reject,
}

/// One recorded human sign-off step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: u8,
    pub approver_id: String,
    pub decision: StageDecision,
    pub comment: Option<String>,
    pub decided_at: DateTime<Utc>,
}

/// Approval workflow attached one-to-one to an invoice.
///
/// `current_stage` is 0 while no human stage is required (zero-stage
/// automatic workflows) and otherwise names the stage awaiting a decision.
/// The invariant `current_stage <= max_approval_level` holds at all times;
/// the engine in `crate::workflow` is the only mutation path.
///
/// `version` backs the optimistic concurrency check in the persistence
/// layer: a save with a stale version is refused instead of silently
/// overwriting a concurrent approval action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalWorkflow {
    pub id: WorkflowId,
    pub invoice_id: InvoiceId,
    pub tenant_id: TenantId,
    pub workflow_type: WorkflowType,
    pub max_approval_level: u8,
    pub current_stage: u8,
    pub status: WorkflowStatus,
    pub stages: Vec<StageRecord>,
    pub ai_confidence: f64,
    pub ai_recommendation: AiRecommendation,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalWorkflow {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, WorkflowStatus::Completed | WorkflowStatus::Rejected)
    }

    pub fn stage_record(&self, stage: u8) -> Option<&StageRecord> {
        self.stages.iter().find(|record| record.stage == stage)
    }
}
