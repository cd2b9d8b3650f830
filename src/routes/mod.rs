pub mod health;
pub mod legend;
pub mod nowcast;

use axum::{routing::get, Router};

use nowcast::AppState;

/// API routes (without Swagger UI and middleware layers).
pub(crate) fn api_router(state: AppState) -> Router {
    let nowcast_routes = Router::new()
        .route("/api/v1/rain-radar", get(nowcast::get_rain_radar))
        .with_state(state);

    Router::new()
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/legend", get(legend::get_legend))
        .merge(nowcast_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::radar::tests::png_pixel;
    use crate::services::radar::RadarClient;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use reqwest::Url;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(wms_url: &str, strict_coordinates: bool) -> Router {
        let config = AppConfig {
            port: 0,
            wms_url: Url::parse(wms_url).unwrap(),
            radar_layer: "Radar_rv_product_1x1km_ger".to_string(),
            user_agent: "rain_radar_api/test".to_string(),
            timezone: chrono_tz::Europe::Berlin,
            request_timeout: Duration::from_secs(2),
            max_concurrent_fetches: 4,
            strict_coordinates,
        };
        let radar_client = RadarClient::new(&config.user_agent, config.request_timeout).unwrap();
        api_router(AppState {
            radar_client,
            config: Arc::new(config),
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_rain_radar_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("BBOX", "13.403954,52.519008,13.405954,52.521008"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_pixel(1, 153, 52)))
            .expect(12)
            .mount(&server)
            .await;

        let wms_url = format!("{}/geoserver/dwd/ows", server.uri());
        let (status, json) = get_json(
            app(&wms_url, false),
            "/api/v1/rain-radar?lat=52.520008&lng=13.404954",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"]["lat"], 52.520008);
        assert_eq!(json["location"]["lng"], 13.404954);
        assert!(json["generated"].as_str().unwrap().len() >= 25);

        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 12);
        for entry in entries {
            assert_eq!(entry["status"], "ok");
            assert_eq!(entry["value"], 0.4);
            assert_eq!(entry["color"], "1,153,52");
            assert!(entry["url"].as_str().unwrap().starts_with(&wms_url));
        }

        let times: Vec<&str> = entries
            .iter()
            .map(|e| e["time_utc"].as_str().unwrap())
            .collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        let minute: u32 = times[0][14..16].parse().unwrap();
        assert_eq!(minute % 5, 0);
    }

    #[tokio::test]
    async fn test_rain_radar_missing_coordinates_default_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("BBOX", "-0.001,-0.001,0.001,0.001"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_pixel(255, 255, 255)))
            .mount(&server)
            .await;

        let (status, json) = get_json(app(&server.uri(), false), "/api/v1/rain-radar").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"]["lat"], 0.0);
        assert_eq!(json["entries"][0]["status"], "ok");
        assert_eq!(json["entries"][0]["value"], 0.0);
    }

    #[tokio::test]
    async fn test_rain_radar_reads_leading_number_of_coordinate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("BBOX", "13.399,52.499,13.401,52.501"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_pixel(1, 153, 52)))
            .expect(12)
            .mount(&server)
            .await;

        let (status, json) = get_json(
            app(&server.uri(), false),
            "/api/v1/rain-radar?lat=52.5abc&lng=13.4%C2%B0",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"]["lat"], 52.5);
        assert_eq!(json["location"]["lng"], 13.4);
        assert_eq!(json["entries"][0]["status"], "ok");
    }

    #[tokio::test]
    async fn test_rain_radar_strict_rejects_bad_coordinates() {
        let (status, json) = get_json(
            app("http://127.0.0.1:9/ows", true),
            "/api/v1/rain-radar?lat=abc&lng=13.4",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("lat"));
    }

    #[tokio::test]
    async fn test_rain_radar_upstream_down_is_still_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (status, json) =
            get_json(app(&server.uri(), false), "/api/v1/rain-radar?lat=50&lng=8").await;

        assert_eq!(status, StatusCode::OK);
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 12);
        assert!(entries.iter().all(|e| e["status"] == "error"
            && e["value"].is_null()
            && e["error"] == "fetch_failed: HTTP 404"));
    }

    #[tokio::test]
    async fn test_health_and_legend_routes() {
        let (status, json) = get_json(app("http://127.0.0.1:9/ows", false), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");

        let (status, json) = get_json(app("http://127.0.0.1:9/ows", false), "/api/v1/legend").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["entries"].as_array().unwrap().len(), 16);
    }
}
