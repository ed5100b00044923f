//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use chrono::{TimeDelta, Utc};
use climhub_core::{
  analysis::NewPolicyAnalysis,
  climate::{ClimateLookup, NewClimateMetric},
  item::{ItemType, NewRepositoryItem},
  seed::SeedData,
  store::HubStore,
};
use climhub_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api_router;

fn item(title: &str, item_type: ItemType, country: &str, year: i32) -> NewRepositoryItem {
  let mut i = NewRepositoryItem::new(title, item_type);
  i.country = Some(country.into());
  i.year = Some(year);
  i.sector = Some("Energy".into());
  i
}

fn analysis(country: &str, overall: f64) -> NewPolicyAnalysis {
  let mut a = NewPolicyAnalysis::new(country, "CAT 2023");
  a.overall_index = Some(overall);
  a.governance_score = Some(overall - 5.0);
  a
}

async fn seeded_store() -> SqliteStore {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let mut stale = NewClimateMetric::new("Kenya", "temperature", 2023, 24.1);
  stale.expires_at = Some(Utc::now() - TimeDelta::hours(1));
  let mut fresh = NewClimateMetric::new("Rwanda", "rainfall", 2023, 88.0);
  fresh.month = Some(4);

  store
    .replace_all(SeedData {
      items:    vec![
        item("Kenya Climate Change Act", ItemType::Policy, "Kenya", 2016),
        item("Green Growth Strategy", ItemType::Policy, "Rwanda", 2011),
        item("State of the Climate", ItemType::Report, "Kenya", 2023),
        item("Solar uptake survey", ItemType::Research, "Uganda", 2021),
      ],
      analyses: vec![analysis("Kenya", 70.8), analysis("Rwanda", 76.2)],
      climate:  vec![stale, fresh],
    })
    .await
    .unwrap();
  store
}

fn router(store: SqliteStore) -> Router {
  Router::new().nest("/api", api_router(Arc::new(store)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
  let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
  let resp = app.oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, body)
}

fn titles(body: &Value) -> Vec<&str> {
  body
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v["title"].as_str().unwrap())
    .collect()
}

// ── Repository ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_items_returns_year_desc() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/repository/items").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    titles(&body),
    vec![
      "State of the Climate",
      "Solar uptake survey",
      "Kenya Climate Change Act",
      "Green Growth Strategy",
    ]
  );
  assert_eq!(body[0]["type"], "report");
}

#[tokio::test]
async fn list_items_filters_and_paginates() {
  let store = seeded_store().await;

  let (_, body) = get(router(store.clone()), "/api/repository/items?type=policy&country=Kenya").await;
  assert_eq!(titles(&body), vec!["Kenya Climate Change Act"]);

  let (_, body) = get(router(store.clone()), "/api/repository/items?search=climate").await;
  assert_eq!(body.as_array().unwrap().len(), 2);

  let (_, body) = get(router(store.clone()), "/api/repository/items?year=&country=").await;
  assert_eq!(body.as_array().unwrap().len(), 4);

  let (_, body) = get(router(store), "/api/repository/items?page=2&limit=3").await;
  assert_eq!(titles(&body), vec!["Green Growth Strategy"]);
}

#[tokio::test]
async fn list_items_rejects_bad_params() {
  let store = seeded_store().await;
  let (status, body) = get(router(store.clone()), "/api/repository/items?type=memo").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, _) = get(router(store), "/api/repository/items?year=recent").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_items_no_match_is_empty_array() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/repository/items?country=Atlantis").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([]));
}

#[tokio::test]
async fn missing_item_is_404() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/repository/items/99999").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "error": "Item not found" }));
}

#[tokio::test]
async fn non_numeric_item_id_is_400() {
  let app = router(seeded_store().await);
  let (status, _) = get(app, "/api/repository/items/abc").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn existing_item_is_returned() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/repository/items/2").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["title"], "Green Growth Strategy");
  assert_eq!(body["country"], "Rwanda");
}

#[tokio::test]
async fn fixed_type_listings() {
  let store = seeded_store().await;
  let (_, body) = get(router(store.clone()), "/api/repository/policies").await;
  assert_eq!(body.as_array().unwrap().len(), 2);
  let (_, body) = get(router(store.clone()), "/api/repository/policies?country=Rwanda").await;
  assert_eq!(titles(&body), vec!["Green Growth Strategy"]);
  let (_, body) = get(router(store.clone()), "/api/repository/reports").await;
  assert_eq!(titles(&body), vec!["State of the Climate"]);
  let (_, body) = get(router(store), "/api/repository/research").await;
  assert_eq!(titles(&body), vec!["Solar uptake survey"]);
}

#[tokio::test]
async fn distinct_countries_and_sectors() {
  let store = seeded_store().await;
  let (_, body) = get(router(store.clone()), "/api/repository/countries").await;
  assert_eq!(body, json!(["Kenya", "Rwanda", "Uganda"]));
  let (_, body) = get(router(store), "/api/repository/sectors").await;
  assert_eq!(body, json!(["Energy"]));
}

// ── Policies ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn compare_policies_requires_ids() {
  let store = seeded_store().await;
  let (status, body) = get(router(store.clone()), "/api/policies/compare").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "error": "Policy IDs required" }));

  let (status, _) = get(router(store.clone()), "/api/policies/compare?ids=").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = get(router(store), "/api/policies/compare?ids=1,two").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compare_policies_returns_only_policies() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/policies/compare?ids=1,2,3").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(titles(&body), vec!["Kenya Climate Change Act", "Green Growth Strategy"]);
}

#[tokio::test]
async fn policies_by_country() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/policies/Kenya").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(titles(&body), vec!["Kenya Climate Change Act"]);
}

// ── Policy analysis ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ranking_orders_rwanda_before_kenya() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/policy-analysis/ranking/overall_index").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!([
      { "country": "Rwanda", "overall_index": 76.2, "source": "CAT 2023" },
      { "country": "Kenya", "overall_index": 70.8, "source": "CAT 2023" },
    ])
  );
}

#[tokio::test]
async fn ranking_rejects_unknown_metric() {
  let store = seeded_store().await;
  for metric in ["population", "id", "overall_index;DROP TABLE policy_analysis"] {
    let (status, body) = get(
      router(store.clone()),
      &format!("/api/policy-analysis/ranking/{}", metric.replace(' ', "%20")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "metric {metric}");
    assert!(body["error"].as_str().unwrap().starts_with("Invalid metric"));
  }

  let (status, _) = get(router(store), "/api/policy-analysis/ranking/governance_score").await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn analysis_by_country_404_when_absent() {
  let store = seeded_store().await;
  let (status, body) = get(router(store.clone()), "/api/policy-analysis/Atlantis").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "error": "No analysis data found for this country" }));

  let (status, body) = get(router(store), "/api/policy-analysis/Rwanda").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["classification"], "satisfactory");
}

#[tokio::test]
async fn compare_countries() {
  let store = seeded_store().await;
  let (status, _) = get(router(store.clone()), "/api/policy-analysis/compare").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = get(
    router(store),
    "/api/policy-analysis/compare?countries=%20Kenya%20,Rwanda",
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let countries: Vec<_> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v["country"].as_str().unwrap())
    .collect();
  assert_eq!(countries, vec!["Rwanda", "Kenya"]);
}

#[tokio::test]
async fn list_analyses_with_source_filter() {
  let store = seeded_store().await;
  let (_, body) = get(router(store.clone()), "/api/policy-analysis?source=CAT").await;
  assert_eq!(body.as_array().unwrap().len(), 2);
  let (_, body) = get(router(store), "/api/policy-analysis?source=UNEP").await;
  assert_eq!(body, json!([]));
}

// ── Climate ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn expired_cache_row_yields_placeholder() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/climate/Kenya/temperature").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!({
      "source":  "external-api-placeholder",
      "message": ClimateLookup::PLACEHOLDER_MESSAGE,
      "data":    [],
    })
  );
}

#[tokio::test]
async fn fresh_cache_row_is_served() {
  let store = seeded_store().await;
  let (status, body) = get(router(store.clone()), "/api/climate/Rwanda/rainfall?month=4").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["source"], "cache");
  assert!(body.get("message").is_none());
  assert_eq!(body["data"][0]["value"], 88.0);

  let (status, _) = get(router(store), "/api/climate/Rwanda/rainfall?month=13").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn climate_metrics_lists_distinct() {
  let app = router(seeded_store().await);
  let (_, body) = get(app, "/api/climate/metrics").await;
  assert_eq!(body, json!(["rainfall", "temperature"]));
}

// ── Map & stats ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn map_regions_and_indicators() {
  let store = seeded_store().await;
  let (_, body) = get(router(store.clone()), "/api/map/regions").await;
  assert_eq!(
    body,
    json!([{
      "sector": "Energy",
      "total_items": 4,
      "total_policies": 2,
      "total_reports": 1,
      "total_research": 1,
    }])
  );

  let (_, body) = get(router(store), "/api/map/climate-indicators/Rwanda").await;
  assert_eq!(body, json!([{ "metric": "rainfall", "year": 2023, "month": 4, "value": 88.0 }]));
}

#[tokio::test]
async fn stats_overview() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/stats/overview").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total_policies"], 2);
  assert_eq!(body["total_countries"], 3);
  assert_eq!(body["countries_analyzed"], 2);
  assert_eq!(body["highest_index"], 76.2);
  assert_eq!(body["lowest_index"], 70.8);
}

// ── Health & failures ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_connected() {
  let app = router(seeded_store().await);
  let (status, body) = get(app, "/api/health").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "healthy");
  assert_eq!(body["database"], "connected");
  assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn store_failure_is_generic_500() {
  let store = seeded_store().await;
  let app = router(store.clone());
  store.close().await.unwrap();

  let (status, body) = get(app.clone(), "/api/repository/items").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body, json!({ "error": "Internal server error" }));

  let (status, body) = get(app, "/api/health").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["status"], "unhealthy");
  assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn ping_through_trait() {
  let store = seeded_store().await;
  assert!(store.ping().await.is_ok());
}
