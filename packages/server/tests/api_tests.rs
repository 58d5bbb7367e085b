//! HTTP API tests driving the axum router directly.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use catalog::ingest;
use catalog::testing::offering_spec;

use crate::common::TestHarness;

#[tokio::test]
async fn root_reports_ready() {
    let harness = TestHarness::new();
    let (status, body) = harness.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Ready" }));
}

#[tokio::test]
async fn health_includes_counts() {
    let harness = TestHarness::seeded().await;
    let (status, body) = harness.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["catalog"]["providers"], 2);
    assert_eq!(body["catalog"]["models"], 4);
    assert_eq!(body["catalog"]["offerings"], 4);
}

#[tokio::test]
async fn models_are_active_and_cheapest_first() {
    let harness = TestHarness::seeded().await;
    let (status, body) = harness.get("/models").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["updated_at"].is_string());

    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["api_model_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["acme/small", "acme/vision", "zenith/large"]);
    assert_eq!(body["data"][0]["provider_name"], "Acme");
}

#[tokio::test]
async fn models_query_filters() {
    let harness = TestHarness::seeded().await;

    let (_, body) = harness.get("/models?required_modalities=text,image").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["api_model_name"], "acme/vision");

    let (_, body) = harness.get("/models?min_context_window=100000").await;
    assert_eq!(body["data"][0]["api_model_name"], "acme/vision");

    let (_, body) = harness.get("/models?supports_tools=true").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["api_model_name"], "zenith/large");

    let (_, body) = harness.get("/models?is_active=false").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["api_model_name"], "zenith/legacy");

    let (status, body) = harness.get("/models?required_modalities=smell").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn names_and_modalities() {
    let harness = TestHarness::seeded().await;

    let (_, body) = harness.get("/models/names").await;
    let mut names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["acme/small", "acme/vision", "zenith/large"]);

    let (_, body) = harness.get("/modalities").await;
    assert_eq!(body["data"], json!(["text", "image", "audio", "video"]));
}

#[tokio::test]
async fn single_offering_pricing() {
    let harness = TestHarness::seeded().await;
    let (_, models) = harness.get("/models").await;
    let id = models["data"][0]["id"].as_i64().unwrap();

    let (status, body) = harness.get(&format!("/models/{}/pricing", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["model"], "acme/small");
    assert_eq!(body["data"]["provider"], "Acme");
    assert_eq!(body["data"]["modality"], "text");
    assert_eq!(body["data"]["unit"], "per token");
    assert_eq!(body["data"]["free_tier"], false);
    assert!(body["data"].get("discount").is_none());
    let input = body["data"]["input_token_price"].as_f64().unwrap();
    assert!((input - 0.000001).abs() < 1e-12);

    let (status, body) = harness.get("/models/9999/pricing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn discounted_offering_exposes_window() {
    let harness = TestHarness::new();
    let spec = offering_spec("Acme", "Night", "acme/night", 2.0, 4.0).with_discount("16:30", "00:30", 0.5, 1.0);
    let report = ingest(harness.store.as_ref(), "fixture", &[spec]).await;
    assert!(report.is_success());

    let (_, models) = harness.get("/models").await;
    let id = models["data"][0]["id"].as_i64().unwrap();

    let (status, body) = harness.get(&format!("/models/{}/pricing", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["discount"]["start_time_utc"], "16:30");
    assert_eq!(body["data"]["discount"]["end_time_utc"], "00:30");
    assert_eq!(body["data"]["discount"]["input_price"], 0.5);
}

#[tokio::test]
async fn pricing_list_and_modality_filter() {
    let harness = TestHarness::seeded().await;

    let (_, body) = harness.get("/pricing").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = harness.get("/pricing?modality=image").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["model"], "acme/vision");

    let (status, _) = harness.get("/pricing?modality=smell").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compare_reports_ranks_and_summary() {
    let harness = TestHarness::seeded().await;
    let (status, body) = harness
        .post_json(
            "/pricing/compare",
            json!({ "models": ["zenith/large", "acme/small", "zenith/legacy"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["models"].as_array().unwrap().len(), 2);

    let summary = &data["comparison_summary"];
    assert_eq!(summary["total_models"], 2);
    assert_eq!(summary["mode"], "sync");
    assert_eq!(summary["recommendations"]["cheapest_overall"]["model"], "acme/small");
    let cheapest = summary["recommendations"]["cheapest_overall"]["total_cost"]
        .as_f64()
        .unwrap();
    assert!((cheapest - 0.003).abs() < 1e-12);
}

#[tokio::test]
async fn compare_errors() {
    let harness = TestHarness::seeded().await;

    let (status, body) = harness
        .post_json("/pricing/compare", json!({ "models": ["nope/none"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");

    let (status, _) = harness
        .post_json(
            "/pricing/compare",
            json!({ "models": ["acme/small"], "input_tokens": 0, "output_tokens": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn providers_paginate() {
    let harness = TestHarness::seeded().await;

    let (_, body) = harness.get("/providers").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = harness.get("/providers?skip=1&limit=1").await;
    let page = body["data"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["name"], "Zenith");
}
