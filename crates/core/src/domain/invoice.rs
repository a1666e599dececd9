use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::tenant::TenantId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Received,
    Analyzing,
    Routed,
    Archived,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceApprovalStatus {
    Unsubmitted,
    InReview,
    Approved,
    Rejected,
}

/// Monetary document ingested from an upstream channel (email OCR, manual
/// entry). Invoices only ever move through status transitions; they are
/// never deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    pub vendor_name: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub processing_status: ProcessingStatus,
    pub approval_status: InvoiceApprovalStatus,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn can_transition_processing(&self, next: ProcessingStatus) -> bool {
        matches!(
            (self.processing_status, next),
            (ProcessingStatus::Received, ProcessingStatus::Analyzing)
                | (ProcessingStatus::Analyzing, ProcessingStatus::Routed)
                | (ProcessingStatus::Routed, ProcessingStatus::Archived)
        )
    }

    pub fn transition_processing(&mut self, next: ProcessingStatus) -> Result<(), DomainError> {
        if self.can_transition_processing(next) {
            self.processing_status = next;
            return Ok(());
        }

        Err(DomainError::InvalidProcessingTransition { from: self.processing_status, to: next })
    }

    pub fn can_transition_approval(&self, next: InvoiceApprovalStatus) -> bool {
        matches!(
            (self.approval_status, next),
            (InvoiceApprovalStatus::Unsubmitted, InvoiceApprovalStatus::InReview)
                | (InvoiceApprovalStatus::Unsubmitted, InvoiceApprovalStatus::Approved)
                | (InvoiceApprovalStatus::InReview, InvoiceApprovalStatus::Approved)
                | (InvoiceApprovalStatus::InReview, InvoiceApprovalStatus::Rejected)
        )
    }

    pub fn transition_approval(&mut self, next: InvoiceApprovalStatus) -> Result<(), DomainError> {
        if self.can_transition_approval(next) {
            self.approval_status = next;
            return Ok(());
        }

        Err(DomainError::InvalidApprovalTransition { from: self.approval_status, to: next })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::domain::tenant::TenantId;

    use super::{Invoice, InvoiceApprovalStatus, InvoiceId, ProcessingStatus};

    fn invoice(processing: ProcessingStatus, approval: InvoiceApprovalStatus) -> Invoice {
        Invoice {
            id: InvoiceId("INV-1".to_string()),
            tenant_id: TenantId("tn-acme".to_string()),
            vendor_name: "Nordic Freight GmbH".to_string(),
            total_amount: Decimal::new(480_000, 2),
            currency: "EUR".to_string(),
            processing_status: processing,
            approval_status: approval,
            source: "email_ocr".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn allows_valid_processing_transition() {
        let mut invoice =
            invoice(ProcessingStatus::Received, InvoiceApprovalStatus::Unsubmitted);
        invoice.transition_processing(ProcessingStatus::Analyzing).expect("received -> analyzing");
        assert_eq!(invoice.processing_status, ProcessingStatus::Analyzing);
    }

    #[test]
    fn blocks_processing_skip() {
        let mut invoice =
            invoice(ProcessingStatus::Received, InvoiceApprovalStatus::Unsubmitted);
        let error = invoice
            .transition_processing(ProcessingStatus::Archived)
            .expect_err("received -> archived should fail");
        assert!(matches!(
            error,
            crate::errors::DomainError::InvalidProcessingTransition { .. }
        ));
    }

    #[test]
    fn unsubmitted_invoice_can_auto_approve() {
        let mut invoice =
            invoice(ProcessingStatus::Analyzing, InvoiceApprovalStatus::Unsubmitted);
        invoice
            .transition_approval(InvoiceApprovalStatus::Approved)
            .expect("zero-stage workflows approve straight from unsubmitted");
        assert_eq!(invoice.approval_status, InvoiceApprovalStatus::Approved);
    }

    #[test]
    fn approved_invoice_cannot_be_rejected() {
        let mut invoice = invoice(ProcessingStatus::Routed, InvoiceApprovalStatus::Approved);
        let error = invoice
            .transition_approval(InvoiceApprovalStatus::Rejected)
            .expect_err("approved is terminal");
        assert!(matches!(
            error,
            crate::errors::DomainError::InvalidApprovalTransition { .. }
        ));
    }
}
