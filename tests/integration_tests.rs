/// End-to-end tests against the frozen fixture artifacts in tests/fixtures.
///
/// Fixture model: 9 schema columns, degree-2 expansion (55 terms), and a
/// linear model whose non-zero weights are on rainfall, Country_India,
/// rainfall² and rainfall·temperature.
///
/// Run with: cargo test --test integration_tests -- --nocapture

use axum::{
    body::Body,
    extract::{FromRequest, State},
    http::{header, Request, StatusCode},
    Json,
};
use std::path::PathBuf;
use std::sync::Arc;

use crop_yield::config::Config;
use crop_yield::error::{CategoryField, PipelineError, Stage};
use crop_yield::http::{self, AppState};
use crop_yield::model::LinearRegressor;
use crop_yield::reference::ReferenceCatalog;
use crop_yield::schema::SchemaRegistry;
use crop_yield::transform::{PolynomialExpander, StandardScaler};
use crop_yield::{load_context, PipelineContext, RawInput, RequestState};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_config() -> Config {
    Config {
        scaler_path: fixture("sc.json"),
        expander_path: fixture("pf.json"),
        model_path: fixture("model.json"),
        schema_path: fixture("test.csv"),
        reference_path: Some(fixture("main.csv")),
        ..Config::default()
    }
}

fn context() -> PipelineContext {
    load_context(&fixture_config()).expect("fixture pipeline should load")
}

#[test]
fn test_fixture_shapes() {
    let ctx = context();
    assert_eq!(ctx.schema().len(), 9);
    assert_eq!(ctx.schema().known_countries(), ["India", "Kenya", "Brazil"]);
    assert_eq!(ctx.schema().known_crops(), ["Maize", "Wheat", "Potatoes"]);
    assert_eq!(ctx.expanded_width(), 55);
}

#[test]
fn test_golden_value() {
    let ctx = context();
    let input = RawInput::new("India", "Maize", 1200.0, 500.0, 25.0);

    let first = ctx.predict(&input).unwrap();
    println!("✓ golden: native={} converted={}", first.native_value, first.converted_value);
    assert_eq!(first.native_value, 38_500.0);
    assert_eq!(first.converted_value, 951.35);
    assert_eq!(first.unit, "quintal/acre");

    for _ in 0..10 {
        assert_eq!(ctx.predict(&input).unwrap(), first);
    }
}

#[test]
fn test_country_shift_changes_prediction() {
    let ctx = context();
    let kenya = ctx
        .predict(&RawInput::new("Kenya", "Wheat", 1200.0, 500.0, 25.0))
        .unwrap();
    assert_eq!(kenya.native_value, 34_500.0);
    assert_eq!(kenya.converted_value, 852.51);
}

#[test]
fn test_temperature_bounds() {
    let ctx = context();
    let at = |temp: f64| ctx.predict(&RawInput::new("India", "Maize", 0.0, 0.0, temp));

    assert_eq!(at(-10.0).unwrap().native_value, 47_000.0);
    assert_eq!(at(50.0).unwrap().native_value, 17_000.0);

    for temp in [-10.01, 50.01] {
        assert!(matches!(
            at(temp),
            Err(PipelineError::InputRange { field: "avg_temp", .. })
        ));
    }
}

#[test]
fn test_zero_and_negative_amounts() {
    let ctx = context();
    assert!(ctx
        .predict(&RawInput::new("Brazil", "Potatoes", 0.0, 0.0, 20.0))
        .is_ok());

    let err = ctx
        .predict(&RawInput::new("Brazil", "Potatoes", -1.0, 0.0, 20.0))
        .unwrap_err();
    assert!(err.is_recoverable());
    let err = ctx
        .predict(&RawInput::new("Brazil", "Potatoes", 0.0, -0.5, 20.0))
        .unwrap_err();
    assert!(matches!(err, PipelineError::InputRange { field: "pesticides_tonnes", .. }));
}

#[test]
fn test_unknown_category_rejected() {
    let ctx = context();
    let state = ctx.resolve(RequestState::Pending(RawInput::new(
        "Atlantis", "Maize", 100.0, 10.0, 20.0,
    )));
    match state {
        RequestState::Rejected(PipelineError::UnknownCategory { field, value }) => {
            assert_eq!(field, CategoryField::Country);
            assert_eq!(value, "Atlantis");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    // schema untouched
    assert_eq!(ctx.schema().len(), 9);
    assert!(!ctx.schema().contains_country("Atlantis"));
}

#[test]
fn test_extreme_rainfall_is_input_error() {
    let ctx = context();
    let err = ctx
        .predict(&RawInput::new("India", "Maize", 1e200, 0.0, 20.0))
        .unwrap_err();
    println!("✓ extreme rainfall rejected: {}", err);
    assert!(matches!(err, PipelineError::InputRange { field: "average_rainfall", .. }));
    assert!(err.is_recoverable());

    let err = ctx
        .predict(&RawInput::new("India", "Maize", 1200.0, 1e200, 20.0))
        .unwrap_err();
    assert!(matches!(err, PipelineError::InputRange { field: "pesticides_tonnes", .. }));
}

#[test]
fn test_parallel_predictions_share_context() {
    let ctx = Arc::new(context());
    let input = RawInput::new("India", "Maize", 1200.0, 500.0, 25.0);

    let results: Vec<f64> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctx = Arc::clone(&ctx);
                let input = input.clone();
                s.spawn(move || {
                    (0..50)
                        .map(|_| ctx.predict(&input).unwrap().converted_value)
                        .last()
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.len(), 8);
    for value in results {
        assert_eq!(value, 951.35);
    }
}

#[test]
fn test_schema_drift_detected_at_startup() {
    // snapshot with one extra crop column against artifacts fitted on 9
    let schema = SchemaRegistry::from_headers([
        "average_rainfall",
        "presticides_tonnes",
        "avg_temp",
        "Country_India",
        "Country_Kenya",
        "Country_Brazil",
        "Item_Maize",
        "Item_Wheat",
        "Item_Potatoes",
        "Item_Yams",
    ])
    .unwrap();
    let err = PipelineContext::new(
        schema,
        StandardScaler::load(fixture("sc.json")).unwrap(),
        PolynomialExpander::load(fixture("pf.json")).unwrap(),
        Box::new(LinearRegressor::load(fixture("model.json")).unwrap()),
    )
    .err()
    .expect("width mismatch should be rejected");
    assert!(matches!(
        err,
        PipelineError::PipelineShape { stage: Stage::Scaler, expected: 9, actual: 10 }
    ));
}

#[test]
fn test_missing_artifacts() {
    let mut cfg = fixture_config();
    cfg.model_path = fixture("no_such_model.json");
    let err = load_context(&cfg).err().unwrap();
    assert_eq!(err.kind(), "schema_load");

    let mut cfg = fixture_config();
    cfg.schema_path = fixture("sc.json");
    assert!(load_context(&cfg).is_err());
}

#[test]
fn test_reference_catalog() {
    let ctx = context();
    let mut catalog = ReferenceCatalog::load(fixture("main.csv")).unwrap();
    assert_eq!(catalog.countries, ["India", "Kenya", "Brazil", "Atlantis"]);
    assert_eq!(catalog.crops, ["Maize", "Wheat", "Potatoes"]);

    let dropped = catalog.restrict_to(ctx.schema());
    assert_eq!(dropped, ["Atlantis"]);
    assert_eq!(catalog.countries, ["India", "Kenya", "Brazil"]);
}

// ---------- HTTP adapter ----------

fn app_state() -> AppState {
    let ctx = context();
    let catalog = ReferenceCatalog::from_schema(ctx.schema());
    AppState {
        ctx: Arc::new(ctx),
        catalog: Arc::new(catalog),
        log_pred: true,
    }
}

#[tokio::test]
async fn test_http_predict() {
    let Json(out) = http::predict(
        State(app_state()),
        Ok(Json(RawInput::new("India", "Maize", 1200.0, 500.0, 25.0))),
    )
    .await
    .unwrap();
    assert_eq!(out.converted_value, 951.35);
    assert!(out.message.contains("951.35 quintal/acre"));
}

#[tokio::test]
async fn test_http_validation_error_is_422() {
    let (status, Json(body)) = http::predict(
        State(app_state()),
        Ok(Json(RawInput::new("India", "Quinoa", 1200.0, 500.0, 25.0))),
    )
    .await
    .unwrap_err();
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "unknown_category");
}

#[tokio::test]
async fn test_http_malformed_body_is_json_error() {
    // country only, every other field missing
    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"country":"India"}"#))
        .unwrap();
    let rejection = Json::<RawInput>::from_request(req, &()).await.unwrap_err();

    let (status, Json(body)) = http::predict(State(app_state()), Err(rejection))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "bad_request");
    assert!(body["error"].as_str().unwrap().contains("crop"));

    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .body(Body::from("country=India"))
        .unwrap();
    let rejection = Json::<RawInput>::from_request(req, &()).await.unwrap_err();
    let (status, Json(body)) = http::predict(State(app_state()), Err(rejection))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["kind"], "bad_request");
}

#[tokio::test]
async fn test_http_options_and_health() {
    let state = app_state();
    let Json(options) = http::options(State(state.clone())).await;
    assert_eq!(options.crops, ["Maize", "Wheat", "Potatoes"]);

    let Json(health) = http::health(State(state)).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["features"], 9);
    assert_eq!(health["expanded"], 55);
}
