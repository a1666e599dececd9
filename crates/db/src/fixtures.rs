//! Demo dataset for local development and smoke testing.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use wegroup_core::approvals::{AnalysisSignal, ApprovalRouter};
use wegroup_core::domain::invoice::{
    Invoice, InvoiceApprovalStatus, InvoiceId, ProcessingStatus,
};
use wegroup_core::domain::session::{generate_token, hash_token, Session};
use wegroup_core::domain::supplier::{Supplier, SupplierId};
use wegroup_core::domain::tenant::{Tenant, TenantId};
use wegroup_core::domain::transport::{
    TransportQuote, TransportQuoteId, TransportRequest, TransportRequestId,
    TransportRequestStatus,
};
use wegroup_core::workflow::WorkflowEngine;

use crate::repositories::{
    InvoiceRepository, RepositoryError, SessionRepository, SqlInvoiceRepository,
    SqlSessionRepository, SqlSupplierRepository, SqlTenantRepository, SqlTransportRepository,
    SqlWorkflowRepository, SupplierRepository, TenantRepository, TransportRepository,
    WorkflowRepository,
};
use crate::DbPool;

pub const DEMO_TENANT_ID: &str = "tn-wegroup-demo";
pub const DEMO_USER_ID: &str = "u-finance-demo";

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub tenant_id: String,
    pub session_token: String,
    pub invoices: usize,
    pub workflows: usize,
    pub suppliers: usize,
    pub transport_requests: usize,
    pub transport_quotes: usize,
}

/// Seed a demo tenant: a valid session, invoices across all routing
/// brackets (with workflows already routed), suppliers, and a transport
/// request with competing quotes. Idempotent via upserts, except the
/// session token which is freshly minted on every run.
pub async fn seed_demo_dataset(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let now = Utc::now();
    let tenant_id = TenantId(DEMO_TENANT_ID.to_string());

    SqlTenantRepository::new(pool.clone())
        .save(Tenant {
            id: tenant_id.clone(),
            name: "WeGroup Demo GmbH".to_string(),
            created_at: now,
        })
        .await?;

    let session_token = generate_token();
    SqlSessionRepository::new(pool.clone())
        .save(Session {
            token_hash: hash_token(&session_token),
            user_id: DEMO_USER_ID.to_string(),
            tenant_id: tenant_id.clone(),
            expires_at: now + Duration::hours(12),
            created_at: now,
        })
        .await?;

    let invoice_repo = SqlInvoiceRepository::new(pool.clone());
    let workflow_repo = SqlWorkflowRepository::new(pool.clone());
    let router = ApprovalRouter::new();
    let engine = WorkflowEngine::new();

    let invoice_rows = [
        ("INV-DEMO-001", "Office Supplies BV", 240_00_i64, 0.96),
        ("INV-DEMO-002", "Nordic Freight GmbH", 3_800_00, 0.82),
        ("INV-DEMO-003", "DataCenter Hosting AG", 18_500_00, 0.74),
        ("INV-DEMO-004", "Industrial Machinery SA", 62_000_00, 0.88),
    ];
    let mut workflows = 0;
    for (id, vendor, amount_cents, confidence) in invoice_rows {
        let mut invoice = Invoice {
            id: InvoiceId(id.to_string()),
            tenant_id: tenant_id.clone(),
            vendor_name: vendor.to_string(),
            total_amount: Decimal::new(amount_cents, 2),
            currency: "EUR".to_string(),
            processing_status: ProcessingStatus::Routed,
            approval_status: InvoiceApprovalStatus::InReview,
            source: "email_ocr".to_string(),
            created_at: now,
            updated_at: now,
        };

        let decision = router.route(
            invoice.total_amount,
            &AnalysisSignal { confidence, recommends_rejection: false },
        );
        let workflow = engine.open(&invoice, &decision, confidence, now);
        if decision.max_approval_level == 0 {
            invoice.approval_status = InvoiceApprovalStatus::Approved;
        }

        invoice_repo.save(invoice).await?;
        if workflow_repo.find_by_invoice_id(&workflow.invoice_id).await?.is_none() {
            workflow_repo.insert(workflow).await?;
            workflows += 1;
        }
    }

    let supplier_repo = SqlSupplierRepository::new(pool.clone());
    let supplier_rows = [
        ("sup-baltic", "Baltic Carriers", 0.92, 180, 171),
        ("sup-rhine", "Rhine Logistics", 0.81, 95, 77),
        ("sup-alpine", "Alpine Express", 0.88, 240, 214),
    ];
    for (id, name, reliability, total, on_time) in supplier_rows {
        supplier_repo
            .save(Supplier {
                id: SupplierId(id.to_string()),
                tenant_id: tenant_id.clone(),
                name: name.to_string(),
                reliability_score: reliability,
                total_deliveries: total,
                on_time_deliveries: on_time,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    let transport_repo = SqlTransportRepository::new(pool.clone());
    transport_repo
        .save_request(TransportRequest {
            id: TransportRequestId("TR-DEMO-001".to_string()),
            tenant_id: tenant_id.clone(),
            origin: "Hamburg".to_string(),
            destination: "Rotterdam".to_string(),
            cargo_description: "8 pallets, machine parts, 3.2t".to_string(),
            status: TransportRequestStatus::Quoted,
            winning_quote_id: None,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let quote_rows = [
        ("TQ-DEMO-001", "sup-baltic", 920_00_i64, 30, Some(410.0)),
        ("TQ-DEMO-002", "sup-rhine", 780_00, 44, Some(530.0)),
        ("TQ-DEMO-003", "sup-alpine", 1_040_00, 24, None),
    ];
    for (id, supplier_id, price_cents, transit_hours, carbon_kg) in quote_rows {
        transport_repo
            .save_quote(TransportQuote {
                id: TransportQuoteId(id.to_string()),
                request_id: TransportRequestId("TR-DEMO-001".to_string()),
                supplier_id: SupplierId(supplier_id.to_string()),
                price: Decimal::new(price_cents, 2),
                transit_time_hours: transit_hours,
                carbon_kg,
                created_at: now,
            })
            .await?;
    }

    Ok(SeedResult {
        tenant_id: DEMO_TENANT_ID.to_string(),
        session_token,
        invoices: invoice_rows.len(),
        workflows,
        suppliers: supplier_rows.len(),
        transport_requests: 1,
        transport_quotes: quote_rows.len(),
    })
}
