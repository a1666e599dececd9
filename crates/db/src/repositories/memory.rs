use std::collections::HashMap;

use tokio::sync::RwLock;

use wegroup_core::domain::approval::{ApprovalWorkflow, WorkflowId};
use wegroup_core::domain::invoice::{Invoice, InvoiceApprovalStatus, InvoiceId};
use wegroup_core::domain::notification::Notification;
use wegroup_core::domain::tenant::TenantId;

use super::{
    InvoiceRepository, NotificationRepository, RepositoryError, WorkflowRepository,
};

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: RwLock<HashMap<String, Invoice>>,
}

#[async_trait::async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        let invoices = self.invoices.read().await;
        Ok(invoices.get(&id.0).cloned())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
        approval_status: Option<InvoiceApprovalStatus>,
    ) -> Result<Vec<Invoice>, RepositoryError> {
        let invoices = self.invoices.read().await;
        let mut matching: Vec<Invoice> = invoices
            .values()
            .filter(|invoice| invoice.tenant_id == *tenant_id)
            .filter(|invoice| {
                approval_status.map_or(true, |status| invoice.approval_status == status)
            })
            .cloned()
            .collect();
        matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(matching)
    }

    async fn save(&self, invoice: Invoice) -> Result<(), RepositoryError> {
        let mut invoices = self.invoices.write().await;
        invoices.insert(invoice.id.0.clone(), invoice);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryWorkflowRepository {
    workflows: RwLock<HashMap<String, ApprovalWorkflow>>,
}

#[async_trait::async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn find_by_id(
        &self,
        id: &WorkflowId,
    ) -> Result<Option<ApprovalWorkflow>, RepositoryError> {
        let workflows = self.workflows.read().await;
        Ok(workflows.get(&id.0).cloned())
    }

    async fn find_by_invoice_id(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<ApprovalWorkflow>, RepositoryError> {
        let workflows = self.workflows.read().await;
        Ok(workflows.values().find(|workflow| workflow.invoice_id == *invoice_id).cloned())
    }

    async fn insert(&self, workflow: ApprovalWorkflow) -> Result<(), RepositoryError> {
        let mut workflows = self.workflows.write().await;
        workflows.insert(workflow.id.0.clone(), workflow);
        Ok(())
    }

    async fn update(
        &self,
        workflow: ApprovalWorkflow,
        expected_version: i64,
    ) -> Result<(), RepositoryError> {
        let mut workflows = self.workflows.write().await;
        let stored_version = workflows.get(&workflow.id.0).map(|stored| stored.version);
        if stored_version != Some(expected_version) {
            return Err(RepositoryError::VersionConflict { expected: expected_version });
        }

        let mut bumped = workflow;
        bumped.version = expected_version + 1;
        workflows.insert(bumped.id.0.clone(), bumped);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: RwLock<Vec<Notification>>,
}

#[async_trait::async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn save(&self, notification: Notification) -> Result<(), RepositoryError> {
        let mut notifications = self.notifications.write().await;
        notifications.push(notification);
        Ok(())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = self.notifications.read().await;
        let mut matching: Vec<Notification> = notifications
            .iter()
            .filter(|notification| notification.tenant_id == *tenant_id)
            .cloned()
            .collect();
        matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}
