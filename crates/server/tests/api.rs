use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use configs::AuthConfig;
use serde_json::{json, Value};
use service::mail::OutboxMailer;
use service::MemoryStore;
use tower::ServiceExt;

use server::routes::build_router;
use server::AppState;

fn app() -> (Router, OutboxMailer) {
    let outbox = OutboxMailer::new();
    let auth = AuthConfig { jwt_secret: "test-secret".into(), access_token_ttl_secs: 900, refresh_token_ttl_secs: 3600 };
    let state = AppState::new(Arc::new(MemoryStore::new()), auth, Arc::new(outbox.clone()));
    (build_router(state), outbox)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, value))
}

async fn login(app: &Router) -> anyhow::Result<String> {
    let (status, _) = send(app, "POST", "/auth/register", None, Some(json!({"email": "clerk@example.com", "name": "Clerk", "password": "S3curePass!"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(app, "POST", "/auth/login", None, Some(json!({"email": "clerk@example.com", "password": "S3curePass!"}))).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["access_token"].as_str().unwrap_or_default().to_string())
}

fn account(number: &str, balance: &str) -> Value {
    json!({"account_number": number, "name": "Operating", "account_type": "ASSET", "balance": balance, "currency": "EUR"})
}

#[tokio::test]
async fn health_and_docs_are_public() -> anyhow::Result<()> {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/sales-orders"].is_object());
    Ok(())
}

#[tokio::test]
async fn resources_require_a_token() -> anyhow::Result<()> {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/api/accounts", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    let (status, _) = send(&app, "GET", "/api/accounts", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_sets_cookie_that_authenticates() -> anyhow::Result<()> {
    let (app, _) = app();
    login(&app).await?;
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"email": "clerk@example.com", "password": "S3curePass!"}))?))?;
    let resp = app.clone().oneshot(req).await?;
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("auth_token="));

    let req = Request::builder().uri("/auth/me").header(header::COOKIE, cookie).body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn account_crud_maps_errors_to_statuses() -> anyhow::Result<()> {
    let (app, _) = app();
    let token = login(&app).await?;
    let t = Some(token.as_str());

    let (status, _) = send(&app, "POST", "/api/accounts", t, Some(account("1000", "-5"))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = send(&app, "POST", "/api/accounts", t, Some(account("1000", "100"))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = send(&app, "POST", "/api/accounts", t, Some(account("1000", "5"))).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, fetched) = send(&app, "GET", &format!("/api/accounts/{id}"), t, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["account_number"], "1000");

    let mut body = account("1000", "250");
    body["id"] = json!(uuid::Uuid::new_v4());
    let (status, _) = send(&app, "PUT", &format!("/api/accounts/{id}"), t, Some(body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", &format!("/api/accounts/{id}"), t, Some(account("1000", "250"))).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, list) = send(&app, "GET", "/api/accounts?page=1&per_page=10", t, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, "DELETE", &format!("/api/accounts/{id}"), t, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", &format!("/api/accounts/{id}"), t, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");

    let (status, events) = send(&app, "GET", &format!("/api/event-logs/account/{id}"), t, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn reports_are_rendered_as_documents() -> anyhow::Result<()> {
    let (app, _) = app();
    let token = login(&app).await?;
    send(&app, "POST", "/api/accounts", Some(&token), Some(account("2000", "10"))).await?;

    for (format, content_type, magic) in [("pdf", "application/pdf", &b"%PDF"[..]), ("xlsx", "spreadsheetml", &b"PK"[..])] {
        let req = Request::builder()
            .uri(format!("/api/reports/accounts?format={format}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())?;
        let resp = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
        assert!(ct.contains(content_type));
        let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
        assert!(bytes.starts_with(magic));
    }

    let (status, _) = send(&app, "GET", "/api/reports/accounts?format=docx", Some(&token), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn invoice_issue_links_orders_and_mails_customer() -> anyhow::Result<()> {
    let (app, outbox) = app();
    let token = login(&app).await?;
    let t = Some(token.as_str());

    let (_, customer) = send(&app, "POST", "/api/customers", t, Some(json!({"name": "Acme", "email": "billing@acme.test"}))).await?;
    let (status, order) = send(
        &app,
        "POST",
        "/api/sales-orders",
        t,
        Some(json!({"order_number": "SO-1", "customer_id": customer["id"], "order_date": "2024-05-01", "total_amount": "120.00", "status": "CONFIRMED"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, invoice) = send(
        &app,
        "POST",
        "/api/invoices/issue",
        t,
        Some(json!({"invoice_number": "INV-1", "issue_date": "2024-05-02", "due_date": "2024-06-01", "amount": "120.00", "status": "ISSUED", "sales_order_ids": [order["id"]]})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invoice["sales_order_ids"][0], order["id"]);

    let invoice_id = invoice["id"].as_str().unwrap_or_default().to_string();
    let (status, orders) = send(&app, "GET", &format!("/api/invoices/{invoice_id}/sales-orders"), t, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().map(Vec::len), Some(1));

    let billed = |outbox: &OutboxMailer| outbox.sent().iter().any(|m| m.to == "billing@acme.test");
    for _ in 0..100 {
        if billed(&outbox) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(billed(&outbox));
    assert!(outbox.sent().iter().any(|m| m.to == "billing@acme.test" && m.subject == "Invoice INV-1"));
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_token() -> anyhow::Result<()> {
    let (app, _) = app();
    let token = login(&app).await?;
    let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
