/// End-to-end tests of the dashboard API over real HTTP
/// Each test serves the app on an ephemeral port and talks to it with reqwest
use oregon_smb_api::app;
use oregon_smb_api::catalog::Catalog;
use oregon_smb_api::config::Config;
use oregon_smb_api::handlers::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

async fn spawn_app() -> String {
    let state = Arc::new(AppState::new(Config::default(), Catalog::sample()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app::router(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn get(base: &str, path: &str, plan: Option<&str>) -> (u16, Value) {
    let mut request = reqwest::Client::new().get(format!("{}{}", base, path));
    if let Some(plan) = plan {
        request = request.header("x-plan", plan);
    }
    let response = request.send().await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

async fn patch_status(base: &str, id: u32, plan: &str, status: &str) -> (u16, Value) {
    let response = reqwest::Client::new()
        .patch(format!("{}/api/leads/{}", base, id))
        .header("x-plan", plan)
        .json(&json!({ "status": status }))
        .send()
        .await
        .unwrap();
    let code = response.status().as_u16();
    (code, response.json().await.unwrap())
}

#[tokio::test]
async fn test_health_and_smoke_endpoints() {
    let base = spawn_app().await;

    let (status, body) = get(&base, "/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["service"], "oregon-smb-api");

    let (status, body) = get(&base, "/api/test", None).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"success": true, "data": {"name": "this works"}}));
}

#[tokio::test]
async fn test_starter_leads_are_redacted() {
    let base = spawn_app().await;

    for plan in [Some("starter"), None] {
        let (status, body) = get(&base, "/api/leads", plan).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["access"], "redacted");
        assert_eq!(body["data"]["total"], 4);

        let text = body.to_string();
        assert!(!text.contains("541-555-8765"));
        assert!(!text.contains("541-555-1234"));
        assert!(!text.contains("@example.com"));
        assert!(!text.contains("Michael Davis"));
        assert!(!text.contains("Quote Sent"));
        assert!(text.contains("541-5***-****"));
    }
}

#[tokio::test]
async fn test_growth_leads_are_full() {
    let base = spawn_app().await;

    let (status, body) = get(&base, "/api/leads", Some("growth")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["access"], "full");
    assert_eq!(body["data"]["leads"][0]["name"], "Michael Davis");
    assert_eq!(body["data"]["leads"][1]["email"], "jen.smith@example.com");
}

#[tokio::test]
async fn test_seo_returns_only_callers_report() {
    let base = spawn_app().await;

    let (_, starter) = get(&base, "/api/seo", Some("starter")).await;
    assert_eq!(starter["data"]["plan"], "starter");
    assert_eq!(starter["data"]["cadence"], "one_time");
    assert_eq!(starter["data"]["score"], 45);
    assert!(starter["data"].get("growth").is_none());

    let (_, scale) = get(&base, "/api/seo", Some("scale")).await;
    assert_eq!(scale["data"]["plan"], "scale");
    assert_eq!(scale["data"]["cadence"], "recurring");
    assert_eq!(scale["data"]["checks"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_unavailable_datasets_are_forbidden() {
    let base = spawn_app().await;

    let (status, body) = get(&base, "/api/keywords", Some("starter")).await;
    assert_eq!(status, 403);
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());

    let (status, _) = get(&base, "/api/ai-logs", Some("growth")).await;
    assert_eq!(status, 403);

    let (status, body) = get(&base, "/api/keywords", Some("growth")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0], json!({"month": "Jan", "rank": 9, "competitor": 3}));

    let (status, body) = get(&base, "/api/ai-logs", Some("scale")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["usage"], json!({"minutesUsed": 27, "minutesAllotted": 250}));
}

#[tokio::test]
async fn test_unknown_plan_header_is_bad_request() {
    let base = spawn_app().await;

    let (status, body) = get(&base, "/api/leads", Some("enterprise")).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_lead_status_update_requires_unlocked_plan() {
    let base = spawn_app().await;

    let (status, _) = patch_status(&base, 1, "starter", "Won").await;
    assert_eq!(status, 403);

    let (status, body) = patch_status(&base, 1, "growth", "Won").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "Won");

    let (status, _) = patch_status(&base, 99, "growth", "Won").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_lead_status_update_invalidates_cached_leads() {
    let base = spawn_app().await;

    // Warm the cache.
    let (_, before) = get(&base, "/api/leads", Some("scale")).await;
    assert_eq!(before["data"]["leads"][2]["status"], "Contacted");

    patch_status(&base, 3, "scale", "Quote Sent").await;

    let (_, after) = get(&base, "/api/leads", Some("scale")).await;
    assert_eq!(after["data"]["leads"][2]["status"], "Quote Sent");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads_never_pin_a_stale_status() {
    let base = spawn_app().await;

    for round in 0..50 {
        let status = if round % 2 == 0 { "Won" } else { "Lost" };

        let read = tokio::spawn({
            let base = base.clone();
            async move { get(&base, "/api/leads", Some("scale")).await }
        });
        let (code, _) = patch_status(&base, 3, "scale", status).await;
        assert_eq!(code, 200);
        read.await.unwrap();

        let (_, after) = get(&base, "/api/leads", Some("scale")).await;
        assert_eq!(after["data"]["leads"][2]["status"], status, "round {}", round);
    }
}
