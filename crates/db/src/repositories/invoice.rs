use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use wegroup_core::domain::invoice::{
    Invoice, InvoiceApprovalStatus, InvoiceId, ProcessingStatus,
};
use wegroup_core::domain::tenant::TenantId;

use super::{InvoiceRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInvoiceRepository {
    pool: DbPool,
}

impl SqlInvoiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_processing_status(s: &str) -> ProcessingStatus {
    match s {
        "analyzing" => ProcessingStatus::Analyzing,
        "routed" => ProcessingStatus::Routed,
        "archived" => ProcessingStatus::Archived,
        _ => ProcessingStatus::Received,
    }
}

pub fn processing_status_as_str(status: &ProcessingStatus) -> &'static str {
    match status {
        ProcessingStatus::Received => "received",
        ProcessingStatus::Analyzing => "analyzing",
        ProcessingStatus::Routed => "routed",
        ProcessingStatus::Archived => "archived",
    }
}

fn parse_approval_status(s: &str) -> InvoiceApprovalStatus {
    match s {
        "in_review" => InvoiceApprovalStatus::InReview,
        "approved" => InvoiceApprovalStatus::Approved,
        "rejected" => InvoiceApprovalStatus::Rejected,
        _ => InvoiceApprovalStatus::Unsubmitted,
    }
}

pub fn approval_status_as_str(status: &InvoiceApprovalStatus) -> &'static str {
    match status {
        InvoiceApprovalStatus::Unsubmitted => "unsubmitted",
        InvoiceApprovalStatus::InReview => "in_review",
        InvoiceApprovalStatus::Approved => "approved",
        InvoiceApprovalStatus::Rejected => "rejected",
    }
}

fn row_to_invoice(row: &sqlx::sqlite::SqliteRow) -> Result<Invoice, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let vendor_name: String =
        row.try_get("vendor_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let total_amount_str: String =
        row.try_get("total_amount").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let currency: String =
        row.try_get("currency").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let processing_status_str: String =
        row.try_get("processing_status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approval_status_str: String =
        row.try_get("approval_status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let source: String =
        row.try_get("source").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let total_amount = Decimal::from_str(&total_amount_str)
        .map_err(|e| RepositoryError::Decode(format!("total_amount: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Invoice {
        id: InvoiceId(id),
        tenant_id: TenantId(tenant_id),
        vendor_name,
        total_amount,
        currency,
        processing_status: parse_processing_status(&processing_status_str),
        approval_status: parse_approval_status(&approval_status_str),
        source,
        created_at,
        updated_at,
    })
}

const INVOICE_COLUMNS: &str = "id, tenant_id, vendor_name, total_amount, currency,
                               processing_status, approval_status, source, created_at, updated_at";

#[async_trait::async_trait]
impl InvoiceRepository for SqlInvoiceRepository {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {INVOICE_COLUMNS} FROM invoice WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_invoice(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
        approval_status: Option<InvoiceApprovalStatus>,
    ) -> Result<Vec<Invoice>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = if let Some(status) = approval_status {
            sqlx::query(&format!(
                "SELECT {INVOICE_COLUMNS} FROM invoice
                 WHERE tenant_id = ? AND approval_status = ?
                 ORDER BY created_at DESC"
            ))
            .bind(&tenant_id.0)
            .bind(approval_status_as_str(&status))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!(
                "SELECT {INVOICE_COLUMNS} FROM invoice
                 WHERE tenant_id = ?
                 ORDER BY created_at DESC"
            ))
            .bind(&tenant_id.0)
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(row_to_invoice).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, invoice: Invoice) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO invoice (id, tenant_id, vendor_name, total_amount, currency,
                                  processing_status, approval_status, source, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 vendor_name = excluded.vendor_name,
                 total_amount = excluded.total_amount,
                 currency = excluded.currency,
                 processing_status = excluded.processing_status,
                 approval_status = excluded.approval_status,
                 source = excluded.source,
                 updated_at = excluded.updated_at",
        )
        .bind(&invoice.id.0)
        .bind(&invoice.tenant_id.0)
        .bind(&invoice.vendor_name)
        .bind(invoice.total_amount.to_string())
        .bind(&invoice.currency)
        .bind(processing_status_as_str(&invoice.processing_status))
        .bind(approval_status_as_str(&invoice.approval_status))
        .bind(&invoice.source)
        .bind(invoice.created_at.to_rfc3339())
        .bind(invoice.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
