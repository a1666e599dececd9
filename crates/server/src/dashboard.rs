//! Server-rendered dashboard: a single HTML summary of the tenant's
//! invoices, pending approvals and latest notifications. Deliberately
//! thin; all numbers come straight from the store, no business logic.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use sqlx::Row;
use tera::{Context, Tera};
use tracing::warn;

use wegroup_db::repositories::{NotificationRepository, SqlNotificationRepository};
use wegroup_db::DbPool;

use crate::auth::authenticate;

#[derive(Clone)]
pub struct DashboardState {
    db_pool: DbPool,
    templates: Arc<Tera>,
}

fn init_templates() -> Arc<Tera> {
    let mut tera = match Tera::new("templates/dashboard/**/*") {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "Failed to load dashboard templates from filesystem, using empty Tera instance");
            Tera::default()
        }
    };

    // Embedded fallback so the binary renders without a templates/ checkout.
    tera.add_raw_template(
        "index.html",
        include_str!("../../../templates/dashboard/index.html"),
    )
    .ok();

    Arc::new(tera)
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_page))
        .with_state(DashboardState { db_pool, templates: init_templates() })
}

async fn dashboard_page(
    State(state): State<DashboardState>,
    headers: HeaderMap,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let session = authenticate(&state.db_pool, &headers).await.map_err(|error| {
        (error.status, Html("<h1>Sign-in required</h1><p>No valid session cookie.</p>".to_string()))
    })?;

    let status_counts = sqlx::query(
        "SELECT approval_status, COUNT(*) AS count
         FROM invoice WHERE tenant_id = ?
         GROUP BY approval_status",
    )
    .bind(&session.tenant_id.0)
    .fetch_all(&state.db_pool)
    .await
    .map_err(render_db_error)?;

    let (mut unsubmitted, mut in_review, mut approved, mut rejected) = (0i64, 0i64, 0i64, 0i64);
    for row in &status_counts {
        let status: String = row.try_get("approval_status").unwrap_or_default();
        let count: i64 = row.try_get("count").unwrap_or(0);
        match status.as_str() {
            "unsubmitted" => unsubmitted = count,
            "in_review" => in_review = count,
            "approved" => approved = count,
            "rejected" => rejected = count,
            _ => {}
        }
    }

    let pending_workflows: i64 = sqlx::query(
        "SELECT COUNT(*) AS count FROM approval_workflow
         WHERE tenant_id = ? AND status = 'in_progress'",
    )
    .bind(&session.tenant_id.0)
    .fetch_one(&state.db_pool)
    .await
    .map_err(render_db_error)?
    .try_get("count")
    .unwrap_or(0);

    let open_requests: i64 = sqlx::query(
        "SELECT COUNT(*) AS count FROM transport_request
         WHERE tenant_id = ? AND status IN ('open', 'quoted')",
    )
    .bind(&session.tenant_id.0)
    .fetch_one(&state.db_pool)
    .await
    .map_err(render_db_error)?
    .try_get("count")
    .unwrap_or(0);

    let notifications = SqlNotificationRepository::new(state.db_pool.clone())
        .list_for_tenant(&session.tenant_id, 10)
        .await
        .map_err(|e| render_db_error(sqlx::Error::Protocol(e.to_string())))?;

    let mut context = Context::new();
    context.insert("user_id", &session.user_id);
    context.insert("tenant_id", &session.tenant_id.0);
    context.insert("invoices_unsubmitted", &unsubmitted);
    context.insert("invoices_in_review", &in_review);
    context.insert("invoices_approved", &approved);
    context.insert("invoices_rejected", &rejected);
    context.insert("pending_workflows", &pending_workflows);
    context.insert("open_transport_requests", &open_requests);
    context.insert("notifications", &notifications);

    let rendered = state.templates.render("index.html", &context).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("<h1>Template Error</h1><p>{e}</p>")),
        )
    })?;

    Ok(Html(rendered))
}

fn render_db_error(error: sqlx::Error) -> (StatusCode, Html<String>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("<h1>Database Error</h1><p>{error}</p>")),
    )
}
