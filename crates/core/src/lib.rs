pub mod approvals;
pub mod config;
pub mod domain;
pub mod errors;
pub mod scoring;
pub mod workflow;

pub use approvals::{AnalysisSignal, ApprovalRouter, RoutingDecision};
pub use domain::approval::{
    AiRecommendation, ApprovalWorkflow, StageDecision, StageRecord, WorkflowId, WorkflowStatus,
    WorkflowType,
};
pub use domain::invoice::{Invoice, InvoiceApprovalStatus, InvoiceId, ProcessingStatus};
pub use domain::notification::{Notification, NotificationId, NotificationKind};
pub use domain::session::Session;
pub use domain::supplier::{Supplier, SupplierId};
pub use domain::tenant::{Tenant, TenantId};
pub use domain::transport::{
    TransportQuote, TransportQuoteId, TransportRequest, TransportRequestId, TransportRequestStatus,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use scoring::{QuoteComparator, QuoteComparison, QuoteScore, ScoringWeights, WeightProfile};
pub use workflow::{TransitionOutcome, WorkflowAction, WorkflowEngine, WorkflowEvent, WorkflowTransitionError};
