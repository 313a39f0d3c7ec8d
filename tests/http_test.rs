mod common;

use db_peeker::api;
use db_peeker::core::pages::{PageGenerator, PageRegistry};
use db_peeker::AppState;
use salvo::prelude::*;
use salvo::test::{ResponseExt, TestClient};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

const BASE: &str = "http://127.0.0.1:8501";

async fn app() -> (TempDir, Service) {
    let (_pool, connector) = common::seeded_connector().await;
    let temp_dir = TempDir::new().unwrap();
    PageGenerator::new(temp_dir.path(), None)
        .run(&connector)
        .await
        .unwrap();
    let pages = PageRegistry::discover(temp_dir.path()).unwrap();

    let state = AppState::from_parts(common::test_config(temp_dir.path()), Arc::new(connector), pages);
    (temp_dir, Service::new(api::router(state)))
}

#[tokio::test]
async fn test_home_lists_pages() {
    let (_dir, service) = app().await;
    let body = TestClient::get(format!("{}/", BASE))
        .send(&service)
        .await
        .take_string()
        .await
        .unwrap();

    assert!(body.contains("Database Peeker"));
    assert!(body.contains(r#"href="/pages/v_customers""#));
    assert!(body.contains(r#"href="/pages/v_oslo_eu""#));
}

#[tokio::test]
async fn test_page_renders_selected_mode() {
    let (_dir, service) = app().await;

    let body = TestClient::get(format!("{}/pages/v_customers?mode=top&top_n=3&sample_n=4", BASE))
        .send(&service)
        .await
        .take_string()
        .await
        .unwrap();
    assert!(body.contains("TOP 3 rows"));
    assert_eq!(body.matches("<td>Customer ").count(), 3);
    assert!(body.contains(r#"value="4""#), "sample widget keeps its value");

    let body = TestClient::get(format!("{}/pages/v_customers?mode=summary", BASE))
        .send(&service)
        .await
        .take_string()
        .await
        .unwrap();
    assert!(body.contains("Summary statistics"));
    assert!(body.contains("<td>city</td><td>30</td><td>2</td><td>10</td>"));
}

#[tokio::test]
async fn test_page_without_mode_loads_nothing() {
    let (_dir, service) = app().await;
    let body = TestClient::get(format!("{}/pages/v_customers", BASE))
        .send(&service)
        .await
        .take_string()
        .await
        .unwrap();
    assert!(!body.contains("<table>"));
    assert!(body.contains("click a <strong>Load</strong> button"));
}

#[tokio::test]
async fn test_out_of_range_row_count_is_shown_as_error() {
    let (_dir, service) = app().await;
    let mut res = TestClient::get(format!("{}/pages/v_customers?mode=top&top_n=21", BASE))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    let body = res.take_string().await.unwrap();
    assert!(body.contains(r#"class="error""#));
    assert!(body.contains("must be between 1 and 20"));
}

#[tokio::test]
async fn test_unknown_page_is_not_found() {
    let (_dir, service) = app().await;
    let res = TestClient::get(format!("{}/pages/nope", BASE)).send(&service).await;
    assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_json_preview_and_missing_object() {
    let (_dir, service) = app().await;

    let json: Value = TestClient::get(format!("{}/api/objects/V_Customers/sample?n=2", BASE))
        .send(&service)
        .await
        .take_json()
        .await
        .unwrap();
    assert_eq!(json["kind"], "sample");
    assert_eq!(json["row_count"], 2);
    assert_eq!(json["object"], "[V_Customers]");

    let mut res = TestClient::get(format!("{}/api/objects/missing_view/top", BASE))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_GATEWAY));
    let json: Value = res.take_json().await.unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("Data access failed"));
}

#[tokio::test]
async fn test_clear_cache_redirects_back() {
    let (_dir, service) = app().await;

    TestClient::get(format!("{}/api/objects/V_Customers/top?n=5", BASE))
        .send(&service)
        .await;
    let stats: Value = TestClient::get(format!("{}/api/cache", BASE))
        .send(&service)
        .await
        .take_json()
        .await
        .unwrap();
    assert_eq!(stats["entries"], 1);

    let referer = format!("{}/pages/v_customers?mode=top&top_n=5", BASE);
    let res = TestClient::post(format!("{}/cache/clear", BASE))
        .add_header("referer", referer, true)
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::SEE_OTHER));
    assert_eq!(
        res.headers().get("location").unwrap(),
        "/pages/v_customers?mode=top&top_n=5"
    );

    let stats: Value = TestClient::get(format!("{}/api/cache", BASE))
        .send(&service)
        .await
        .take_json()
        .await
        .unwrap();
    assert_eq!(stats["entries"], 0);
    assert_eq!(stats["clears"], 1);
}

#[tokio::test]
async fn test_health_check() {
    let (_dir, service) = app().await;
    let body: Value = TestClient::get(format!("{}/health", BASE))
        .send(&service)
        .await
        .take_json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_json_preview_rejects_bad_row_counts() {
    let (_dir, service) = app().await;

    for n in ["abc", "0", "21", "2.5"] {
        let mut res = TestClient::get(format!("{}/api/objects/V_Customers/top?n={}", BASE, n))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST), "n={}", n);
        let json: Value = res.take_json().await.unwrap();
        assert!(json["error"].is_string());
    }

    let stats: Value = TestClient::get(format!("{}/api/cache", BASE))
        .send(&service)
        .await
        .take_json()
        .await
        .unwrap();
    assert_eq!(stats["entries"], 0);
}
