//! Router-level tests: every request goes through the full axum stack.

use std::{sync::Arc, time::Duration};

use arbibot_api::{
    api::{create_router, AppState},
    arbitrage::{mock, ArbitrageService},
    bot::MonitorSupervisor,
    config::{JournalConfig, MonitorConfig, ServerConfig, StoreConfig},
    database::JournalRepository,
    types::{Opportunity, OpportunityStatus},
};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_opportunity(id: &str, status: OpportunityStatus, net_profit: f64, minutes_ago: i64) -> Opportunity {
    Opportunity {
        id: id.to_string(),
        token_pair: "ETH/USDT".to_string(),
        dex_buy: "Uniswap".to_string(),
        dex_sell: "QuickSwap".to_string(),
        price_buy: 1400.0,
        price_sell: 1421.0,
        spread_percentage: 1.5,
        potential_profit: net_profit + 100.0,
        loan_amount: 20000.0,
        gas_cost: 100.0,
        net_profit,
        status,
        execution_window: 60.0,
        confidence_score: 82.5,
        created_date: Utc::now() - chrono::Duration::minutes(minutes_ago),
    }
}

async fn create_test_app(dir: &tempfile::TempDir) -> (Router, AppState) {
    let service = ArbitrageService::new(Duration::ZERO);
    service
        .seed_opportunities(vec![
            create_test_opportunity("a", OpportunityStatus::Active, 10.0, 0),
            create_test_opportunity("b", OpportunityStatus::Active, 5.0, 5),
            create_test_opportunity("c", OpportunityStatus::Expired, 50.0, 10),
        ])
        .unwrap();
    service.replace_configs(mock::default_configs()).unwrap();

    let journal_config = JournalConfig {
        data_dir: dir.path().to_string_lossy().to_string(),
        max_entries: 100,
    };
    let monitor_config = MonitorConfig {
        program: "sleep".to_string(),
        args: vec!["30".to_string()],
        working_dir: ".".to_string(),
        stop_timeout_seconds: 5,
    };

    let state = AppState {
        service,
        journal: Arc::new(JournalRepository::new(&journal_config).await.unwrap()),
        monitor: Arc::new(MonitorSupervisor::new(monitor_config)),
        remote: None,
        store_config: Arc::new(StoreConfig {
            execution_delay_ms: 0,
            ..StoreConfig::default()
        }),
    };

    let router = create_router(state.clone(), &ServerConfig::default()).unwrap();
    (router, state)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_list_opportunities_orders_filters_and_limits() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let (status, body) = send(&router, Method::GET, "/arbitrage-opportunities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["a", "b", "c"]);

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/v1/arbitrage-opportunities?status=active&order=net_profit",
        None,
    )
    .await;
    assert_eq!(ids(&body), vec!["b", "a"]);

    let (_, body) = send(
        &router,
        Method::GET,
        "/arbitrage-opportunities?status=all&order=-net_profit&limit=1",
        None,
    )
    .await;
    assert_eq!(ids(&body), vec!["c"]);
}

#[tokio::test]
async fn test_list_opportunities_rejects_unknown_field_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let (status, body) = send(&router, Method::GET, "/arbitrage-opportunities?order=-volume", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("volume"));

    let (status, _) = send(&router, Method::GET, "/arbitrage-opportunities?status=pending", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_opportunity_assigns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let payload = json!({
        "token_pair": "AAVE/USDT",
        "dex_buy": "Balancer",
        "dex_sell": "SushiSwap",
        "price_buy": 1010.0,
        "price_sell": 1030.2,
        "spread_percentage": 2.0,
        "potential_profit": 500.0,
        "loan_amount": 25000.0,
        "gas_cost": 150.0,
        "net_profit": 350.0,
        "execution_window": 75.0,
        "confidence_score": 91.0
    });

    let (status, body) = send(&router, Method::POST, "/arbitrage-opportunities", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert!(!body["id"].as_str().unwrap().is_empty());

    let (_, stats) = send(&router, Method::GET, "/stats", None).await;
    assert_eq!(stats["total_opportunities"], 4);
    assert_eq!(stats["total_potential_profit"].as_f64().unwrap(), 365.0);
}

#[tokio::test]
async fn test_execute_opportunity_updates_stats() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let (_, stats) = send(&router, Method::GET, "/stats", None).await;
    assert_eq!(stats["active_opportunities"], 2);
    assert_eq!(stats["total_potential_profit"].as_f64().unwrap(), 15.0);
    assert_eq!(stats["system_status"], "online");

    let (status, body) = send(&router, Method::POST, "/arbitrage-opportunities/a/execute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&router, Method::POST, "/arbitrage-opportunities/a/execute", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = send(&router, Method::POST, "/api/v1/arbitrage-opportunities/zzz/execute", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (_, stats) = send(&router, Method::GET, "/stats", None).await;
    assert_eq!(stats["active_opportunities"], 1);
    assert_eq!(stats["total_opportunities"], 3);
    assert_eq!(stats["total_potential_profit"].as_f64().unwrap(), 5.0);

    let (_, executions) = send(&router, Method::GET, "/stats/executions", None).await;
    assert_eq!(executions["total_executed"], 1);
    assert_eq!(executions["total_profit"].as_f64().unwrap(), 10.0);
    assert_eq!(executions["active_monitors"], 0);

    let (_, body) = send(&router, Method::GET, "/arbitrage-opportunities?status=executed", None).await;
    assert_eq!(ids(&body), vec!["a"]);
}

#[tokio::test]
async fn test_config_mutations_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let payload = json!({
        "token_symbol": "LINK",
        "token_address": "0x514910771af9ca656af840dff83e8264ecf986ca",
        "min_spread": 0.4,
        "min_profit": 75.0,
        "max_loan_amount": 20000.0,
        "enabled_dexs": ["Uniswap", "Balancer"]
    });
    let (status, created) = send(&router, Method::POST, "/monitoring-configs", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["is_active"], true);
    let created_id = created["id"].as_str().unwrap().to_string();

    let (_, configs) = send(&router, Method::GET, "/monitoring-configs", None).await;
    assert_eq!(configs.as_array().unwrap().len(), 3);

    let persisted: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("monitoring_configs.json")).unwrap()).unwrap();
    assert_eq!(persisted.as_array().unwrap().len(), 3);
    assert_eq!(persisted[2]["id"], created_id.as_str());

    let (status, updated) = send(
        &router,
        Method::PATCH,
        "/monitoring-configs/config_1",
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_active"], false);

    let (_, stats) = send(&router, Method::GET, "/stats", None).await;
    assert_eq!(stats["active_configs"], 2);

    let (status, _) = send(
        &router,
        Method::PATCH,
        "/monitoring-configs/missing",
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let payload = json!({
        "token_symbol": "UNI",
        "token_address": "0x...",
        "min_spread": 0.4,
        "min_profit": 75.0,
        "max_loan_amount": 20000.0,
        "enabled_dexs": []
    });
    let (status, _) = send(&router, Method::POST, "/monitoring-configs", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, configs) = send(&router, Method::GET, "/monitoring-configs", None).await;
    assert_eq!(configs.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_replace_configs() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let payload = json!([{
        "id": "config_9",
        "token_symbol": "MATIC",
        "token_address": "0x...",
        "min_spread": 0.2,
        "min_profit": 20.0,
        "max_loan_amount": 10000.0,
        "enabled_dexs": ["QuickSwap"],
        "is_active": false
    }]);
    let (status, body) = send(&router, Method::PUT, "/monitoring-configs", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, configs) = send(&router, Method::GET, "/monitoring-configs", None).await;
    assert_eq!(ids(&configs), vec!["config_9"]);
}

#[tokio::test]
async fn test_bot_logs_are_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    for message in ["first", "second"] {
        let (status, body) = send(&router, Method::POST, "/bot-logs", Some(json!({ "message": message }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (_, logs) = send(&router, Method::GET, "/bot-logs", None).await;
    assert_eq!(logs, json!([{ "message": "second" }, { "message": "first" }]));

    let (status, _) = send(&router, Method::POST, "/executions", Some(json!("not an object"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, executions) = send(&router, Method::GET, "/executions", None).await;
    assert_eq!(executions, json!([]));
}

#[tokio::test]
async fn test_bot_status_and_stop_without_monitor() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let (status, _) = send(&router, Method::POST, "/bot-status", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&router, Method::POST, "/bot-status", Some(json!({ "active": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "active": true }));

    let (_, body) = send(&router, Method::GET, "/bot-status", None).await;
    assert_eq!(body, json!({ "active": false }));

    let (status, body) = send(&router, Method::POST, "/stop-bot", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_remote_routes_unavailable_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let (status, body) = send(&router, Method::GET, "/remote/arbitrage-opportunities", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_limit_larger_than_store_returns_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (router, state) = create_test_app(&dir).await;

    let extra: Vec<Opportunity> = (0..600)
        .map(|i| create_test_opportunity(&format!("bulk_{}", i), OpportunityStatus::Active, 1.0, 20 + i))
        .collect();
    state.service.seed_opportunities(extra).unwrap();

    let (status, body) = send(&router, Method::GET, "/arbitrage-opportunities?limit=1000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 603);

    let (_, body) = send(&router, Method::GET, "/arbitrage-opportunities?limit=600", None).await;
    assert_eq!(body.as_array().unwrap().len(), 600);

    let (_, body) = send(&router, Method::GET, "/arbitrage-opportunities", None).await;
    assert_eq!(body.as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn test_malformed_requests_use_error_body() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let (status, body) = send(&router, Method::GET, "/arbitrage-opportunities?limit=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, body) = send(
        &router,
        Method::POST,
        "/monitoring-configs",
        Some(json!({ "token_symbol": "ETH" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/bot-logs")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_config_creates_persist_full_table() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = create_test_app(&dir).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let payload = json!({
                "token_symbol": format!("TOK{}", i),
                "token_address": "0x...",
                "min_spread": 0.4,
                "min_profit": 75.0,
                "max_loan_amount": 20000.0,
                "enabled_dexs": ["Uniswap"]
            });
            let (status, _) = send(&router, Method::POST, "/monitoring-configs", Some(payload)).await;
            assert_eq!(status, StatusCode::OK);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let (_, configs) = send(&router, Method::GET, "/monitoring-configs", None).await;
    assert_eq!(configs.as_array().unwrap().len(), 18);

    let persisted: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("monitoring_configs.json")).unwrap()).unwrap();
    assert_eq!(persisted, configs);
}
