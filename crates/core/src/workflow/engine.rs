//! Linear approval state machine: `PENDING -> STAGE_1 -> STAGE_2 ->
//! STAGE_3 -> COMPLETED`, with any stage rejection transitioning straight
//! to `REJECTED`. The engine is the only mutation path for a workflow's
//! stage bookkeeping; persistence enforces the optimistic version check on
//! top of it.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::approvals::RoutingDecision;
use crate::domain::approval::{
    ApprovalWorkflow, StageDecision, StageRecord, WorkflowId, WorkflowStatus,
};
use crate::domain::invoice::Invoice;
use crate::domain::notification::NotificationKind;
use crate::workflow::states::{TransitionOutcome, WorkflowAction, WorkflowEvent};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowTransitionError {
    #[error("workflow is already terminal with status {status:?}")]
    TerminalState { status: WorkflowStatus },
    #[error("decision targets stage {submitted} but the workflow awaits stage {current}")]
    StageMismatch { submitted: u8, current: u8 },
    #[error("stage {stage} exceeds the configured approval level {max_approval_level}")]
    StageOutOfRange { stage: u8, max_approval_level: u8 },
}

#[derive(Clone, Debug, Default)]
pub struct WorkflowEngine;

impl WorkflowEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build the initial workflow for a routed invoice. Zero-stage routes
    /// are born `Completed`; everything else starts awaiting stage 1.
    pub fn open(
        &self,
        invoice: &Invoice,
        decision: &RoutingDecision,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> ApprovalWorkflow {
        let (status, current_stage) = if decision.max_approval_level == 0 {
            (WorkflowStatus::Completed, 0)
        } else {
            (WorkflowStatus::InProgress, 1)
        };

        ApprovalWorkflow {
            id: WorkflowId(format!("WF-{}", Uuid::new_v4())),
            invoice_id: invoice.id.clone(),
            tenant_id: invoice.tenant_id.clone(),
            workflow_type: decision.workflow_type,
            max_approval_level: decision.max_approval_level,
            current_stage,
            status,
            stages: Vec::new(),
            ai_confidence: confidence,
            ai_recommendation: decision.recommendation,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a stage decision. The submitted stage must match the stage the
    /// workflow awaits; re-submitting an already decided stage fails with
    /// `StageMismatch` rather than silently double-recording.
    pub fn apply(
        &self,
        workflow: &mut ApprovalWorkflow,
        event: &WorkflowEvent,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, WorkflowTransitionError> {
        let WorkflowEvent::StageDecided { stage, approver_id, decision, comment } = event;

        if workflow.is_terminal() {
            return Err(WorkflowTransitionError::TerminalState { status: workflow.status });
        }
        if *stage > workflow.max_approval_level {
            return Err(WorkflowTransitionError::StageOutOfRange {
                stage: *stage,
                max_approval_level: workflow.max_approval_level,
            });
        }
        if *stage != workflow.current_stage {
            return Err(WorkflowTransitionError::StageMismatch {
                submitted: *stage,
                current: workflow.current_stage,
            });
        }

        let from_stage = workflow.current_stage;
        workflow.stages.push(StageRecord {
            stage: *stage,
            approver_id: approver_id.clone(),
            decision: *decision,
            comment: comment.clone(),
            decided_at: now,
        });

        let (to_stage, to_status, actions) = match decision {
            StageDecision::Reject => (
                from_stage,
                WorkflowStatus::Rejected,
                vec![WorkflowAction::RecordNotification(NotificationKind::WorkflowRejected)],
            ),
            StageDecision::Approve if from_stage == workflow.max_approval_level => (
                from_stage,
                WorkflowStatus::Completed,
                vec![
                    WorkflowAction::RecordNotification(NotificationKind::WorkflowCompleted),
                    WorkflowAction::FinalizeInvoice,
                ],
            ),
            StageDecision::Approve => (
                from_stage + 1,
                WorkflowStatus::InProgress,
                vec![WorkflowAction::RecordNotification(NotificationKind::StageApproved)],
            ),
        };

        workflow.current_stage = to_stage;
        workflow.status = to_status;
        workflow.updated_at = now;

        Ok(TransitionOutcome { from_stage, to_stage, to_status, actions })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::approvals::{AnalysisSignal, ApprovalRouter};
    use crate::domain::approval::{StageDecision, WorkflowStatus, WorkflowType};
    use crate::domain::invoice::{Invoice, InvoiceApprovalStatus, InvoiceId, ProcessingStatus};
    use crate::domain::notification::NotificationKind;
    use crate::domain::tenant::TenantId;
    use crate::workflow::states::{WorkflowAction, WorkflowEvent};

    use super::{WorkflowEngine, WorkflowTransitionError};

    fn invoice(amount: i64) -> Invoice {
        Invoice {
            id: InvoiceId("INV-7".to_string()),
            tenant_id: TenantId("tn-acme".to_string()),
            vendor_name: "Nordic Freight GmbH".to_string(),
            total_amount: Decimal::from(amount),
            currency: "EUR".to_string(),
            processing_status: ProcessingStatus::Analyzing,
            approval_status: InvoiceApprovalStatus::Unsubmitted,
            source: "email_ocr".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn open_workflow(amount: i64, confidence: f64) -> crate::domain::approval::ApprovalWorkflow {
        let invoice = invoice(amount);
        let decision = ApprovalRouter::new().route(
            invoice.total_amount,
            &AnalysisSignal { confidence, recommends_rejection: false },
        );
        WorkflowEngine::new().open(&invoice, &decision, confidence, Utc::now())
    }

    fn approve(stage: u8) -> WorkflowEvent {
        WorkflowEvent::StageDecided {
            stage,
            approver_id: format!("u-approver-{stage}"),
            decision: StageDecision::Approve,
            comment: Some("ok".to_string()),
        }
    }

    #[test]
    fn zero_stage_route_opens_completed() {
        let workflow = open_workflow(300, 0.95);
        assert_eq!(workflow.status, WorkflowStatus::Completed);
        assert_eq!(workflow.current_stage, 0);
        assert_eq!(workflow.workflow_type, WorkflowType::Automatic);
    }

    #[test]
    fn three_stage_workflow_completes_at_final_stage() {
        let engine = WorkflowEngine::new();
        let mut workflow = open_workflow(30_000, 0.95);
        assert_eq!(workflow.max_approval_level, 3);

        let first = engine.apply(&mut workflow, &approve(1), Utc::now()).expect("stage 1");
        assert_eq!(first.to_stage, 2);
        assert_eq!(
            first.actions,
            vec![WorkflowAction::RecordNotification(NotificationKind::StageApproved)]
        );

        engine.apply(&mut workflow, &approve(2), Utc::now()).expect("stage 2");
        let last = engine.apply(&mut workflow, &approve(3), Utc::now()).expect("stage 3");

        assert_eq!(workflow.status, WorkflowStatus::Completed);
        assert!(last.actions.contains(&WorkflowAction::FinalizeInvoice));
        assert_eq!(workflow.stages.len(), 3);
        assert_eq!(workflow.stages[2].approver_id, "u-approver-3");
    }

    #[test]
    fn rejection_at_any_stage_is_terminal() {
        let engine = WorkflowEngine::new();
        let mut workflow = open_workflow(30_000, 0.95);
        engine.apply(&mut workflow, &approve(1), Utc::now()).expect("stage 1");

        let rejection = engine
            .apply(
                &mut workflow,
                &WorkflowEvent::StageDecided {
                    stage: 2,
                    approver_id: "u-cfo".to_string(),
                    decision: StageDecision::Reject,
                    comment: Some("duplicate of INV-3".to_string()),
                },
                Utc::now(),
            )
            .expect("stage 2 rejection");

        assert_eq!(workflow.status, WorkflowStatus::Rejected);
        assert_eq!(
            rejection.actions,
            vec![WorkflowAction::RecordNotification(NotificationKind::WorkflowRejected)]
        );

        let error = engine
            .apply(&mut workflow, &approve(3), Utc::now())
            .expect_err("terminal workflow refuses further decisions");
        assert!(matches!(error, WorkflowTransitionError::TerminalState { .. }));
    }

    #[test]
    fn replaying_a_decided_stage_is_rejected() {
        let engine = WorkflowEngine::new();
        let mut workflow = open_workflow(30_000, 0.95);
        engine.apply(&mut workflow, &approve(1), Utc::now()).expect("stage 1");

        let error = engine
            .apply(&mut workflow, &approve(1), Utc::now())
            .expect_err("duplicate submission must not double-record");
        assert_eq!(error, WorkflowTransitionError::StageMismatch { submitted: 1, current: 2 });
        assert_eq!(workflow.stages.len(), 1);
    }

    #[test]
    fn stage_beyond_configured_level_is_out_of_range() {
        let engine = WorkflowEngine::new();
        let mut workflow = open_workflow(1_000, 0.8);
        assert_eq!(workflow.max_approval_level, 1);

        let error = engine
            .apply(&mut workflow, &approve(2), Utc::now())
            .expect_err("stage 2 exceeds a single-stage workflow");
        assert_eq!(
            error,
            WorkflowTransitionError::StageOutOfRange { stage: 2, max_approval_level: 1 }
        );
    }

    #[test]
    fn current_stage_never_exceeds_max_approval_level() {
        let engine = WorkflowEngine::new();
        for (amount, confidence) in [(400, 0.95), (1_000, 0.8), (10_000, 0.85), (40_000, 0.95)] {
            let mut workflow = open_workflow(amount, confidence);
            assert!(workflow.current_stage <= workflow.max_approval_level);

            for stage in 1..=workflow.max_approval_level {
                engine.apply(&mut workflow, &approve(stage), Utc::now()).expect("approve stage");
                assert!(workflow.current_stage <= workflow.max_approval_level);
            }
            assert_eq!(workflow.status, WorkflowStatus::Completed);
        }
    }
}
