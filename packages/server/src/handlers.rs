//! HTTP handler functions for the complaint map API.

use actix_web::{HttpResponse, web};
use complaint_map_analytics::aggregate::category_counts;
use complaint_map_analytics::facets::facets as table_facets;
use complaint_map_analytics::join::JoinedRegion;
use complaint_map_analytics::pipeline::{ChoroplethRequest, ChoroplethView};
use complaint_map_analytics::trend::trend as period_trend;
use complaint_map_analytics::{AnalyticsError, parse_granularity};
use complaint_map_analytics_models::{FilterSpec, MarkerRow, TimeGranularity};
use complaint_map_complaint_models::IssueCategory;
use complaint_map_server_models::{ApiCategory, ApiHealth, ApiMarker, ApiRegion, MapQueryParams};
use geojson::{Feature, FeatureCollection};

use crate::{AppState, FALLBACK_GRANULARITY};

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        complaints: state.data.complaints().len(),
        layers: state.data.granularities().collect(),
    })
}

/// `GET /api/facets`
///
/// Returns the values each filter control can offer.
pub async fn facets(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(table_facets(state.data.complaints()))
}

/// `GET /api/categories`
///
/// Filtered complaint counts per category with marker icon and color.
/// Known categories without complaints are listed with a zero count.
pub async fn categories(
    state: web::Data<AppState>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let spec = match filter_spec(&params) {
        Ok(spec) => spec,
        Err(response) => return response,
    };

    match state.data.filter(&spec) {
        Ok(filtered) => {
            let mut out: Vec<ApiCategory> = category_counts(&filtered)
                .into_iter()
                .map(|c| ApiCategory {
                    icon: IssueCategory::icon_for(Some(&c.category)).to_string(),
                    color: IssueCategory::color_for(Some(&c.category)).to_string(),
                    name: c.category,
                    count: c.count,
                })
                .collect();

            for category in IssueCategory::all() {
                let name = category.to_string();
                if !out.iter().any(|c| c.name == name) {
                    out.push(ApiCategory {
                        name,
                        icon: category.icon().to_string(),
                        color: category.color().to_string(),
                        count: 0,
                    });
                }
            }

            HttpResponse::Ok().json(out)
        }
        Err(e) => error_response("count categories", &e),
    }
}

/// `GET /api/choropleth`
///
/// Returns the boundary layer of the requested granularity as a `GeoJSON`
/// `FeatureCollection`, each feature carrying `name`, `issueCount` and
/// (with `dominant=true`) `dominantCategory`. Falls back to the state
/// layer when the requested layer is not loaded.
pub async fn choropleth(
    state: web::Data<AppState>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let requested = match params.granularity.as_deref().map(parse_granularity) {
        None => FALLBACK_GRANULARITY,
        Some(Ok(granularity)) => granularity,
        Some(Err(e)) => return bad_request(&e),
    };
    let spec = match filter_spec(&params) {
        Ok(spec) => spec,
        Err(response) => return response,
    };

    let request = ChoroplethRequest::new(state.layer_granularity(requested))
        .with_filter(spec)
        .with_dominant_category(params.dominant.unwrap_or(false));

    let result = {
        let mut cache = state.cache();
        state.data.choropleth_cached(&request, &mut cache)
    };
    match result {
        Ok(view) => HttpResponse::Ok().json(feature_collection(&view)),
        Err(e) => error_response("build choropleth", &e),
    }
}

/// `GET /api/markers`
///
/// Returns filtered complaints that have coordinates.
pub async fn markers(
    state: web::Data<AppState>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let spec = match filter_spec(&params) {
        Ok(spec) => spec,
        Err(response) => return response,
    };

    match state.data.filter(&spec) {
        Ok(filtered) => {
            let markers: Vec<ApiMarker> = filtered
                .markers()
                .filter_map(MarkerRow::from_record)
                .map(ApiMarker::from)
                .take(params.limit.unwrap_or(usize::MAX))
                .collect();
            HttpResponse::Ok().json(markers)
        }
        Err(e) => error_response("query markers", &e),
    }
}

/// `GET /api/trend`
///
/// Returns filtered complaint counts per period (`period=monthly` by
/// default).
pub async fn trend(
    state: web::Data<AppState>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let period = params.period.as_deref().unwrap_or("monthly");
    let Ok(granularity) = period.parse::<TimeGranularity>() else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Unknown period '{period}'")
        }));
    };
    let spec = match filter_spec(&params) {
        Ok(spec) => spec,
        Err(response) => return response,
    };

    match state.data.filter(&spec) {
        Ok(filtered) => HttpResponse::Ok().json(period_trend(&filtered, granularity)),
        Err(e) => error_response("compute trend", &e),
    }
}

fn filter_spec(params: &MapQueryParams) -> Result<FilterSpec, HttpResponse> {
    params
        .filter_spec()
        .map_err(|e| bad_request(&AnalyticsError::from(e)))
}

fn bad_request(err: &AnalyticsError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": err.to_string()
    }))
}

fn error_response(action: &str, err: &AnalyticsError) -> HttpResponse {
    match err {
        AnalyticsError::InvalidGranularity(_) | AnalyticsError::InvalidFilter(_) => {
            bad_request(err)
        }
        AnalyticsError::MissingBoundaryLayer { .. } => {
            log::warn!("Failed to {action}: {err}");
            HttpResponse::NotFound().json(serde_json::json!({
                "error": err.to_string()
            }))
        }
        AnalyticsError::GranularityMismatch { .. } => {
            log::error!("Failed to {action}: {err}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to {action}")
            }))
        }
    }
}

fn feature_collection(view: &ChoroplethView<'_>) -> FeatureCollection {
    let mut foreign_members = serde_json::Map::new();
    foreign_members.insert(
        "summary".to_string(),
        serde_json::to_value(view.summary).unwrap_or_default(),
    );

    FeatureCollection {
        bbox: None,
        features: view.regions.iter().map(region_feature).collect(),
        foreign_members: Some(foreign_members),
    }
}

fn region_feature(region: &JoinedRegion<'_>) -> Feature {
    let properties = match serde_json::to_value(ApiRegion::from(region.to_row())) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    };

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(
            &*region.feature.geometry,
        ))),
        id: None,
        properties,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use complaint_map_analytics::pipeline::MapData;
    use complaint_map_analytics::table::ComplaintTable;
    use complaint_map_complaint_models::ComplaintRecord;
    use complaint_map_geography_models::{BoundaryLayer, Granularity, RegionFeature};
    use geo::{MultiPolygon, polygon};

    use super::*;
    use crate::routes;

    fn complaint(state: &str, municipality: &str, category: &str, date: &str) -> ComplaintRecord {
        ComplaintRecord {
            state: Some(state.to_string()),
            municipality: Some(municipality.to_string()),
            category: Some(category.to_string()),
            date: date.parse().ok(),
            ..ComplaintRecord::default()
        }
    }

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y),
        ]])
    }

    fn sample_data() -> MapData {
        let table = ComplaintTable::new(vec![
            ComplaintRecord {
                latitude: Some(49.45),
                longitude: Some(11.08),
                ..complaint("Bavaria", "Nürnberg", "Verkehr", "2024-01-05")
            },
            complaint("Bavaria", "München", "Umwelt", "2024-02-01"),
            complaint("Hesse", "Kassel", "Umwelt", "2024-01-10"),
        ]);
        let states = BoundaryLayer::new(
            Granularity::State,
            vec![
                RegionFeature::new("Bavaria", square(11.0, 48.0)),
                RegionFeature::new("Hesse", square(9.0, 50.0)),
                RegionFeature::new("Saarland", square(6.5, 49.2)),
            ],
        );
        MapData::new(table).with_layer(states)
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::new(sample_data())))
                    .configure(routes),
            )
            .await
        };
    }

    fn counts(body: &serde_json::Value) -> Vec<(String, u64)> {
        body["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| {
                (
                    f["properties"]["name"].as_str().unwrap().to_string(),
                    f["properties"]["issueCount"].as_u64().unwrap(),
                )
            })
            .collect()
    }

    #[actix_web::test]
    async fn choropleth_returns_every_feature() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/choropleth?granularity=state&from=2024-01-01&to=2024-01-31")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(
            counts(&body),
            vec![
                ("Bavaria".to_string(), 1),
                ("Hesse".to_string(), 1),
                ("Saarland".to_string(), 0)
            ]
        );
        assert_eq!(body["features"][0]["geometry"]["type"], "MultiPolygon");
        assert!(body["features"][0]["properties"]["dominantCategory"].is_null());
        assert_eq!(body["summary"]["totalFiltered"], 2);
    }

    #[actix_web::test]
    async fn choropleth_includes_dominant_category_on_request() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/choropleth?dominant=true&categories=Umwelt")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["features"][1]["properties"]["dominantCategory"],
            "Umwelt"
        );
        assert!(body["features"][2]["properties"]["dominantCategory"].is_null());
    }

    #[actix_web::test]
    async fn repeated_choropleth_is_served_from_cache() {
        let state = web::Data::new(AppState::new(sample_data()));
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(routes),
        )
        .await;

        let uri = "/api/choropleth?granularity=state&categories=Umwelt";
        let first: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri(uri).to_request(),
        )
        .await;
        assert!(state.cache.try_lock().is_ok());

        let second: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri(uri).to_request(),
        )
        .await;
        assert_eq!(first, second);

        let cache = state.cache.try_lock().unwrap();
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[actix_web::test]
    async fn missing_layer_falls_back_to_states() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/choropleth?granularity=municipality")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(counts(&body).len(), 3);
        assert_eq!(body["summary"]["granularity"], "state");
    }

    #[actix_web::test]
    async fn bad_requests_are_rejected() {
        let app = app!();
        for uri in [
            "/api/choropleth?granularity=county",
            "/api/choropleth?from=2024-02-01&to=2024-01-01",
            "/api/trend?period=hourly",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn markers_only_include_located_complaints() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/markers").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let markers = body.as_array().unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0]["municipality"], "Nürnberg");
        assert_eq!(markers[0]["icon"], "car");
    }

    #[actix_web::test]
    async fn trend_and_facets() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/trend?period=monthly&search=kassel")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            serde_json::json!([{ "period": "2024-01", "count": 1 }])
        );

        let req = test::TestRequest::get().uri("/api/facets").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["states"], serde_json::json!(["Bavaria", "Hesse"]));
        assert_eq!(body["minDate"], "2024-01-05");
    }

    #[actix_web::test]
    async fn categories_list_known_labels() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/categories?states=Hesse")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), IssueCategory::all().len());
        assert_eq!(list[0]["name"], "Umwelt");
        assert_eq!(list[0]["count"], 1);
    }

    #[actix_web::test]
    async fn health_reports_loaded_data() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["complaints"], 3);
        assert_eq!(body["layers"], serde_json::json!(["state"]));
    }
}
