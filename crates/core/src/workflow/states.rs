use serde::{Deserialize, Serialize};

use crate::domain::approval::{StageDecision, WorkflowStatus};
use crate::domain::notification::NotificationKind;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    StageDecided {
        stage: u8,
        approver_id: String,
        decision: StageDecision,
        comment: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowAction {
    RecordNotification(NotificationKind),
    FinalizeInvoice,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from_stage: u8,
    pub to_stage: u8,
    pub to_status: WorkflowStatus,
    pub actions: Vec<WorkflowAction>,
}
