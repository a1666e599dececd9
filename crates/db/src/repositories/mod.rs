use async_trait::async_trait;
use thiserror::Error;

use wegroup_core::domain::approval::{ApprovalWorkflow, WorkflowId};
use wegroup_core::domain::invoice::{Invoice, InvoiceApprovalStatus, InvoiceId};
use wegroup_core::domain::notification::Notification;
use wegroup_core::domain::session::Session;
use wegroup_core::domain::supplier::{Supplier, SupplierId};
use wegroup_core::domain::tenant::{Tenant, TenantId};
use wegroup_core::domain::transport::{
    TransportQuote, TransportRequest, TransportRequestId,
};

pub mod invoice;
pub mod memory;
pub mod notification;
pub mod session;
pub mod supplier;
pub mod tenant;
pub mod transport;
pub mod workflow;

pub use invoice::SqlInvoiceRepository;
pub use memory::{
    InMemoryInvoiceRepository, InMemoryNotificationRepository, InMemoryWorkflowRepository,
};
pub use notification::SqlNotificationRepository;
pub use session::SqlSessionRepository;
pub use supplier::SqlSupplierRepository;
pub use tenant::SqlTenantRepository;
pub use transport::SqlTransportRepository;
pub use workflow::SqlWorkflowRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("version conflict: workflow changed since version {expected} was read")]
    VersionConflict { expected: i64 },
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError>;
    async fn save(&self, tenant: Tenant) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError>;
    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
        approval_status: Option<InvoiceApprovalStatus>,
    ) -> Result<Vec<Invoice>, RepositoryError>;
    async fn save(&self, invoice: Invoice) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &WorkflowId,
    ) -> Result<Option<ApprovalWorkflow>, RepositoryError>;

    async fn find_by_invoice_id(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<ApprovalWorkflow>, RepositoryError>;

    async fn insert(&self, workflow: ApprovalWorkflow) -> Result<(), RepositoryError>;

    /// Persist a mutated workflow. The write only lands when the stored
    /// row still carries `expected_version`; the stored version is bumped
    /// by one. A stale read yields `RepositoryError::VersionConflict`
    /// instead of silently overwriting a concurrent approval action.
    async fn update(
        &self,
        workflow: ApprovalWorkflow,
        expected_version: i64,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SupplierRepository: Send + Sync {
    async fn find_by_id(&self, id: &SupplierId) -> Result<Option<Supplier>, RepositoryError>;
    async fn list_for_tenant(&self, tenant_id: &TenantId)
        -> Result<Vec<Supplier>, RepositoryError>;
    async fn save(&self, supplier: Supplier) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TransportRepository: Send + Sync {
    async fn find_request_by_id(
        &self,
        id: &TransportRequestId,
    ) -> Result<Option<TransportRequest>, RepositoryError>;

    async fn list_requests_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<TransportRequest>, RepositoryError>;

    async fn save_request(&self, request: TransportRequest) -> Result<(), RepositoryError>;

    async fn list_quotes_for_request(
        &self,
        request_id: &TransportRequestId,
    ) -> Result<Vec<TransportQuote>, RepositoryError>;

    async fn save_quote(&self, quote: TransportQuote) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn save(&self, notification: Notification) -> Result<(), RepositoryError>;
    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, RepositoryError>;
    async fn save(&self, session: Session) -> Result<(), RepositoryError>;
}
