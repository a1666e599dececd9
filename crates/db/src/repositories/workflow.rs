use chrono::{DateTime, Utc};
use sqlx::Row;

use wegroup_core::domain::approval::{
    AiRecommendation, ApprovalWorkflow, StageDecision, StageRecord, WorkflowId, WorkflowStatus,
    WorkflowType,
};
use wegroup_core::domain::invoice::InvoiceId;
use wegroup_core::domain::tenant::TenantId;

use super::{RepositoryError, WorkflowRepository};
use crate::DbPool;

pub struct SqlWorkflowRepository {
    pool: DbPool,
}

impl SqlWorkflowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_stages(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<StageRecord>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT stage, approver_id, decision, comment, decided_at
             FROM workflow_stage WHERE workflow_id = ? ORDER BY stage ASC",
        )
        .bind(&workflow_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_stage).collect::<Result<Vec<_>, _>>()
    }

    async fn save_stages(&self, workflow: &ApprovalWorkflow) -> Result<(), RepositoryError> {
        for record in &workflow.stages {
            sqlx::query(
                "INSERT INTO workflow_stage (workflow_id, stage, approver_id, decision, comment, decided_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(workflow_id, stage) DO UPDATE SET
                     approver_id = excluded.approver_id,
                     decision = excluded.decision,
                     comment = excluded.comment,
                     decided_at = excluded.decided_at",
            )
            .bind(&workflow.id.0)
            .bind(i64::from(record.stage))
            .bind(&record.approver_id)
            .bind(stage_decision_as_str(&record.decision))
            .bind(&record.comment)
            .bind(record.decided_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

fn parse_workflow_type(s: &str) -> WorkflowType {
    match s {
        "automatic" => WorkflowType::Automatic,
        "manual" => WorkflowType::Manual,
        _ => WorkflowType::Hybrid,
    }
}

pub fn workflow_type_as_str(workflow_type: &WorkflowType) -> &'static str {
    match workflow_type {
        WorkflowType::Automatic => "automatic",
        WorkflowType::Manual => "manual",
        WorkflowType::Hybrid => "hybrid",
    }
}

fn parse_workflow_status(s: &str) -> WorkflowStatus {
    match s {
        "completed" => WorkflowStatus::Completed,
        "rejected" => WorkflowStatus::Rejected,
        _ => WorkflowStatus::InProgress,
    }
}

pub fn workflow_status_as_str(status: &WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::InProgress => "in_progress",
        WorkflowStatus::Completed => "completed",
        WorkflowStatus::Rejected => "rejected",
    }
}

fn parse_stage_decision(s: &str) -> StageDecision {
    match s {
        "reject" => StageDecision::Reject,
        _ => StageDecision::Approve,
    }
}

pub fn stage_decision_as_str(decision: &StageDecision) -> &'static str {
    match decision {
        StageDecision::Approve => "approve",
        StageDecision::Reject => "reject",
    }
}

fn parse_recommendation(s: &str) -> AiRecommendation {
    match s {
        "approve" => AiRecommendation::Approve,
        "reject" => AiRecommendation::Reject,
        _ => AiRecommendation::Review,
    }
}

pub fn recommendation_as_str(recommendation: &AiRecommendation) -> &'static str {
    match recommendation {
        AiRecommendation::Approve => "approve",
        AiRecommendation::Review => "review",
        AiRecommendation::Reject => "reject",
    }
}

fn row_to_stage(row: &sqlx::sqlite::SqliteRow) -> Result<StageRecord, RepositoryError> {
    let stage: i64 = row.try_get("stage").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approver_id: String =
        row.try_get("approver_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let decision_str: String =
        row.try_get("decision").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let comment: Option<String> =
        row.try_get("comment").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let decided_at_str: String =
        row.try_get("decided_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let decided_at = DateTime::parse_from_rfc3339(&decided_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(StageRecord {
        stage: u8::try_from(stage).map_err(|e| RepositoryError::Decode(e.to_string()))?,
        approver_id,
        decision: parse_stage_decision(&decision_str),
        comment,
        decided_at,
    })
}

fn row_to_workflow(
    row: &sqlx::sqlite::SqliteRow,
    stages: Vec<StageRecord>,
) -> Result<ApprovalWorkflow, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let invoice_id: String =
        row.try_get("invoice_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let workflow_type_str: String =
        row.try_get("workflow_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let max_approval_level: i64 =
        row.try_get("max_approval_level").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let current_stage: i64 =
        row.try_get("current_stage").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_confidence: f64 =
        row.try_get("ai_confidence").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_recommendation_str: String =
        row.try_get("ai_recommendation").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let version: i64 =
        row.try_get("version").map_err(|e| RepositoryError::Decode(e.to_string()))?;
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

    Ok(ApprovalWorkflow {
        id: WorkflowId(id),
        invoice_id: InvoiceId(invoice_id),
        tenant_id: TenantId(tenant_id),
        workflow_type: parse_workflow_type(&workflow_type_str),
        max_approval_level: u8::try_from(max_approval_level)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        current_stage: u8::try_from(current_stage)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        status: parse_workflow_status(&status_str),
        stages,
        ai_confidence,
        ai_recommendation: parse_recommendation(&ai_recommendation_str),
        version,
        created_at,
        updated_at,
    })
}

const WORKFLOW_COLUMNS: &str = "id, invoice_id, tenant_id, workflow_type, max_approval_level,
                                current_stage, status, ai_confidence, ai_recommendation,
                                version, created_at, updated_at";

#[async_trait::async_trait]
impl WorkflowRepository for SqlWorkflowRepository {
    async fn find_by_id(
        &self,
        id: &WorkflowId,
    ) -> Result<Option<ApprovalWorkflow>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {WORKFLOW_COLUMNS} FROM approval_workflow WHERE id = ?"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => {
                let stages = self.load_stages(id).await?;
                Ok(Some(row_to_workflow(r, stages)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_invoice_id(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<ApprovalWorkflow>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {WORKFLOW_COLUMNS} FROM approval_workflow WHERE invoice_id = ?"
        ))
        .bind(&invoice_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => {
                let id: String =
                    r.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let stages = self.load_stages(&WorkflowId(id)).await?;
                Ok(Some(row_to_workflow(r, stages)?))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, workflow: ApprovalWorkflow) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO approval_workflow (id, invoice_id, tenant_id, workflow_type,
                                            max_approval_level, current_stage, status,
                                            ai_confidence, ai_recommendation, version,
                                            created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&workflow.id.0)
        .bind(&workflow.invoice_id.0)
        .bind(&workflow.tenant_id.0)
        .bind(workflow_type_as_str(&workflow.workflow_type))
        .bind(i64::from(workflow.max_approval_level))
        .bind(i64::from(workflow.current_stage))
        .bind(workflow_status_as_str(&workflow.status))
        .bind(workflow.ai_confidence)
        .bind(recommendation_as_str(&workflow.ai_recommendation))
        .bind(workflow.version)
        .bind(workflow.created_at.to_rfc3339())
        .bind(workflow.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.save_stages(&workflow).await
    }

    async fn update(
        &self,
        workflow: ApprovalWorkflow,
        expected_version: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE approval_workflow SET
                 workflow_type = ?,
                 max_approval_level = ?,
                 current_stage = ?,
                 status = ?,
                 ai_confidence = ?,
                 ai_recommendation = ?,
                 version = ?,
                 updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(workflow_type_as_str(&workflow.workflow_type))
        .bind(i64::from(workflow.max_approval_level))
        .bind(i64::from(workflow.current_stage))
        .bind(workflow_status_as_str(&workflow.status))
        .bind(workflow.ai_confidence)
        .bind(recommendation_as_str(&workflow.ai_recommendation))
        .bind(expected_version + 1)
        .bind(workflow.updated_at.to_rfc3339())
        .bind(&workflow.id.0)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::VersionConflict { expected: expected_version });
        }

        self.save_stages(&workflow).await
    }
}
