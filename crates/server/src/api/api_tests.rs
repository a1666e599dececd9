//! End-to-end handler tests: real router, real SQLite, scripted AI.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use wegroup_agent::{GuardrailPolicy, ScriptedChatClient};
use wegroup_core::domain::session::{generate_token, hash_token, Session};
use wegroup_core::domain::tenant::{Tenant, TenantId};
use wegroup_core::scoring::WeightProfile;
use wegroup_db::repositories::{
    SessionRepository, SqlSessionRepository, SqlTenantRepository, TenantRepository,
};
use wegroup_db::{connect_with_settings, migrations};

use crate::api::{router, ApiState};

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    pool
}

async fn seed_session(pool: &sqlx::SqlitePool, tenant_id: &str, user_id: &str) -> String {
    let now = Utc::now();
    SqlTenantRepository::new(pool.clone())
        .save(Tenant {
            id: TenantId(tenant_id.to_string()),
            name: format!("{tenant_id} test tenant"),
            created_at: now,
        })
        .await
        .expect("insert tenant");

    let token = generate_token();
    SqlSessionRepository::new(pool.clone())
        .save(Session {
            token_hash: hash_token(&token),
            user_id: user_id.to_string(),
            tenant_id: TenantId(tenant_id.to_string()),
            expires_at: now + Duration::hours(4),
            created_at: now,
        })
        .await
        .expect("insert session");

    token
}

fn app(pool: sqlx::SqlitePool, scripted: Vec<String>) -> Router {
    router(ApiState {
        db_pool: pool,
        chat: Arc::new(ScriptedChatClient::with_responses(scripted)),
        guardrails: GuardrailPolicy::default(),
        weight_profile: WeightProfile::Standard,
    })
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("wegroup_session={token}"));
    }
    builder.body(Body::empty()).expect("request")
}

fn post_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("wegroup_session={token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

fn analysis_reply(confidence: f64, recommendation: &str) -> String {
    format!(
        r#"{{"confidence": {confidence}, "recommendation": "{recommendation}", "summary": "scripted", "anomalies": []}}"#
    )
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let pool = setup_pool().await;
    let app = app(pool, Vec::new());

    let response = app.oneshot(get("/api/invoices", None)).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "authentication required");
}

#[tokio::test]
async fn invoice_routing_and_two_stage_approval_flow() {
    let pool = setup_pool().await;
    let token = seed_session(&pool, "tn-acme", "u-approver").await;
    let app = app(pool, vec![analysis_reply(0.85, "approve")]);

    // Ingest.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/invoices",
            &token,
            serde_json::json!({
                "vendor_name": "Nordic Freight GmbH",
                "total_amount": "12000.00",
                "currency": "eur",
                "source": "email_ocr"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["currency"], "EUR");
    let invoice_id = body["data"]["id"].as_str().expect("invoice id").to_string();

    // Route through the AI analysis and the amount policy.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/invoices/{invoice_id}/route"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let workflow = &body["data"]["workflow"];
    assert_eq!(workflow["max_approval_level"], 2);
    assert_eq!(workflow["status"], "in_progress");
    assert_eq!(workflow["current_stage"], 1);
    assert_eq!(body["data"]["analysis"]["confidence"], 0.85);
    let workflow_id = workflow["id"].as_str().expect("workflow id").to_string();

    // Routing twice is a validation error.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/invoices/{invoice_id}/route"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Stage 1 approval at the version we read.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/workflows/{workflow_id}/decision"),
            &token,
            serde_json::json!({
                "stage": 1,
                "decision": "approve",
                "comment": "within budget",
                "expected_version": 1
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["current_stage"], 2);
    assert_eq!(body["data"]["version"], 2);

    // Replaying the already-decided stage is refused by the state machine.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/workflows/{workflow_id}/decision"),
            &token,
            serde_json::json!({
                "stage": 1,
                "decision": "approve",
                "expected_version": 2
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A decision against the version another writer already bumped is 409.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/workflows/{workflow_id}/decision"),
            &token,
            serde_json::json!({
                "stage": 2,
                "decision": "approve",
                "expected_version": 1
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Final stage completes the workflow and approves the invoice.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/workflows/{workflow_id}/decision"),
            &token,
            serde_json::json!({
                "stage": 2,
                "decision": "approve",
                "expected_version": 2
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "completed");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/invoices/{invoice_id}"), Some(&token)))
        .await
        .expect("response");
    let body = body_json(response).await;
    assert_eq!(body["data"]["approval_status"], "approved");

    // Every transition left a notification record.
    let response = app
        .clone()
        .oneshot(get("/api/notifications", Some(&token)))
        .await
        .expect("response");
    let body = body_json(response).await;
    let notifications = body["data"].as_array().expect("notifications array");
    assert!(notifications.len() >= 3);
}

#[tokio::test]
async fn small_confident_invoice_auto_approves_on_routing() {
    let pool = setup_pool().await;
    let token = seed_session(&pool, "tn-acme", "u-approver").await;
    let app = app(pool, vec![analysis_reply(0.95, "approve")]);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/invoices",
            &token,
            serde_json::json!({
                "vendor_name": "Office Supplies BV",
                "total_amount": "300.00",
                "currency": "EUR"
            }),
        ))
        .await
        .expect("response");
    let body = body_json(response).await;
    let invoice_id = body["data"]["id"].as_str().expect("invoice id").to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/invoices/{invoice_id}/route"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["workflow"]["max_approval_level"], 0);
    assert_eq!(body["data"]["workflow"]["status"], "completed");
    assert_eq!(body["data"]["workflow"]["workflow_type"], "automatic");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/invoices/{invoice_id}"), Some(&token)))
        .await
        .expect("response");
    let body = body_json(response).await;
    assert_eq!(body["data"]["approval_status"], "approved");
}

#[tokio::test]
async fn ai_collaborator_failure_maps_to_bad_gateway() {
    let pool = setup_pool().await;
    let token = seed_session(&pool, "tn-acme", "u-approver").await;
    // No scripted responses: every completion call fails.
    let app = app(pool, Vec::new());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/invoices",
            &token,
            serde_json::json!({
                "vendor_name": "Nordic Freight GmbH",
                "total_amount": "900.00",
                "currency": "EUR"
            }),
        ))
        .await
        .expect("response");
    let body = body_json(response).await;
    let invoice_id = body["data"]["id"].as_str().expect("invoice id").to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/invoices/{invoice_id}/route"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn disabled_analysis_guardrail_degrades_routing() {
    let pool = setup_pool().await;
    let token = seed_session(&pool, "tn-acme", "u-approver").await;
    let app = router(ApiState {
        db_pool: pool,
        chat: Arc::new(ScriptedChatClient::default()),
        guardrails: GuardrailPolicy { analysis_enabled: false },
        weight_profile: WeightProfile::Standard,
    });

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/invoices",
            &token,
            serde_json::json!({
                "vendor_name": "Nordic Freight GmbH",
                "total_amount": "900.00",
                "currency": "EUR"
            }),
        ))
        .await
        .expect("response");
    let body = body_json(response).await;
    let invoice_id = body["data"]["id"].as_str().expect("invoice id").to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/invoices/{invoice_id}/route"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn quote_comparison_and_award_flow() {
    let pool = setup_pool().await;
    let token = seed_session(&pool, "tn-acme", "u-logistics").await;
    let app = app(pool, Vec::new());

    let mut supplier_ids = Vec::new();
    for (name, reliability) in [("Baltic Carriers", 0.9), ("Rhine Logistics", 0.6)] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/suppliers",
                &token,
                serde_json::json!({ "name": name, "reliability_score": reliability }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        supplier_ids.push(body["data"]["id"].as_str().expect("supplier id").to_string());
    }

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/transport/requests",
            &token,
            serde_json::json!({
                "origin": "Hamburg",
                "destination": "Rotterdam",
                "cargo_description": "8 pallets, machine parts"
            }),
        ))
        .await
        .expect("response");
    let body = body_json(response).await;
    let request_id = body["data"]["id"].as_str().expect("request id").to_string();

    // Empty quote set cannot be compared.
    let response = app
        .clone()
        .oneshot(get(&format!("/api/transport/requests/{request_id}/comparison"), Some(&token)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut quote_ids = Vec::new();
    for (supplier_id, price) in [(&supplier_ids[0], "1000"), (&supplier_ids[1], "1400")] {
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/transport/requests/{request_id}/quotes"),
                &token,
                serde_json::json!({
                    "supplier_id": supplier_id,
                    "price": price,
                    "transit_time_hours": 36
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        quote_ids.push(body["data"]["id"].as_str().expect("quote id").to_string());
    }

    // Cheaper and more reliable: the first quote must win.
    let response = app
        .clone()
        .oneshot(get(&format!("/api/transport/requests/{request_id}/comparison"), Some(&token)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["recommended_quote_id"], quote_ids[0].as_str());
    assert_eq!(body["data"]["profile"], "standard");
    assert_eq!(body["data"]["scores"].as_array().expect("scores").len(), 2);

    // Unknown profile is a validation error.
    let response = app
        .clone()
        .oneshot(get(
            &format!("/api/transport/requests/{request_id}/comparison?profile=bogus"),
            Some(&token),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Award writes the denormalized winning-quote pointer.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/transport/requests/{request_id}/award"),
            &token,
            serde_json::json!({ "quote_id": quote_ids[0] }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "awarded");
    assert_eq!(body["data"]["winning_quote_id"], quote_ids[0].as_str());
}

#[tokio::test]
async fn sessions_are_tenant_scoped() {
    let pool = setup_pool().await;
    let acme_token = seed_session(&pool, "tn-acme", "u-acme").await;
    let rival_token = seed_session(&pool, "tn-rival", "u-rival").await;
    let app = app(pool, Vec::new());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/invoices",
            &acme_token,
            serde_json::json!({
                "vendor_name": "Nordic Freight GmbH",
                "total_amount": "900.00",
                "currency": "EUR"
            }),
        ))
        .await
        .expect("response");
    let body = body_json(response).await;
    let invoice_id = body["data"]["id"].as_str().expect("invoice id").to_string();

    // The other tenant cannot see the invoice at all.
    let response = app
        .clone()
        .oneshot(get(&format!("/api/invoices/{invoice_id}"), Some(&rival_token)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get("/api/invoices", Some(&rival_token)))
        .await
        .expect("response");
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().expect("invoices").len(), 0);
}
