use chrono::{DateTime, Utc};
use sqlx::Row;

use wegroup_core::domain::approval::WorkflowId;
use wegroup_core::domain::invoice::InvoiceId;
use wegroup_core::domain::notification::{Notification, NotificationId, NotificationKind};
use wegroup_core::domain::tenant::TenantId;

use super::{NotificationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlNotificationRepository {
    pool: DbPool,
}

impl SqlNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_kind(s: &str) -> NotificationKind {
    match s {
        "workflow_created" => NotificationKind::WorkflowCreated,
        "stage_approved" => NotificationKind::StageApproved,
        "workflow_rejected" => NotificationKind::WorkflowRejected,
        _ => NotificationKind::WorkflowCompleted,
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let invoice_id: String =
        row.try_get("invoice_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let workflow_id: String =
        row.try_get("workflow_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let kind_str: String =
        row.try_get("kind").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let message: String =
        row.try_get("message").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let read: i64 = row.try_get("read").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Notification {
        id: NotificationId(id),
        tenant_id: TenantId(tenant_id),
        invoice_id: InvoiceId(invoice_id),
        workflow_id: WorkflowId(workflow_id),
        kind: parse_kind(&kind_str),
        message,
        read: read != 0,
        created_at,
    })
}

#[async_trait::async_trait]
impl NotificationRepository for SqlNotificationRepository {
    async fn save(&self, notification: Notification) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO notification (id, tenant_id, invoice_id, workflow_id, kind,
                                       message, read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET read = excluded.read",
        )
        .bind(&notification.id.0)
        .bind(&notification.tenant_id.0)
        .bind(&notification.invoice_id.0)
        .bind(&notification.workflow_id.0)
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(i64::from(notification.read))
        .bind(notification.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, tenant_id, invoice_id, workflow_id, kind, message, read, created_at
             FROM notification WHERE tenant_id = ?
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(&tenant_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_notification).collect::<Result<Vec<_>, _>>()
    }
}
