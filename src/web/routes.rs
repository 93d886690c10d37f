use super::handlers::{healthz_handler, proxied};
use crate::{
    auth::{callback_handler, login_handler},
    upstream::ProviderKind,
    AppState,
};
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderValue, Method, Request},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/auth/provider", get(login_handler))
        .route("/auth/provider/callback", get(callback_handler))
        .route("/api/repos", proxied(ProviderKind::Repositories))
        .route("/api/weather", proxied(ProviderKind::Weather))
        .route("/api/currency-rates", proxied(ProviderKind::CurrencyRates))
        .route(
            "/api/currency-rates/historical",
            proxied(ProviderKind::HistoricalRates),
        )
        .route("/api/public-entries", proxied(ProviderKind::PublicApis))
        // Paths used by the existing client application
        .route("/auth/github", get(login_handler))
        .route("/auth/github/callback", get(callback_handler))
        .route("/api/github/repos", proxied(ProviderKind::Repositories))
        .route("/api/public-apis", proxied(ProviderKind::PublicApis))
        .layer(cors_layer(&state))
        // Span records the path only: query strings may carry the credential
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .with_state(state)
}

/// Browser access from the client application origin only
fn cors_layer(state: &AppState) -> CorsLayer {
    let origin = state.config.client_app_origin();
    let allow_origin = match HeaderValue::from_str(&origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Invalid client origin; CORS disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers([AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rates::CurrencyRates;
    use crate::upstream::http::silent_server;
    use axum::http::{
        header::{CONTENT_TYPE, LOCATION},
        StatusCode,
    };
    use axum::response::Response;
    use http_body_util::BodyExt;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const WEATHER_PATH: &str = "/api/v1/weather/simple";
    const RATES_PATH: &str = "/v2.0/rates/latest";

    fn app(server: &ServerGuard) -> Router {
        let state = AppState::from_config(Config::for_tests(&server.url())).unwrap();
        create_router(Arc::new(state))
    }

    async fn send_get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_healthz() {
        let server = Server::new_async().await;
        let response = send_get(app(&server), "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_redirects_to_provider() {
        let server = Server::new_async().await;
        let response = send_get(app(&server), "/auth/provider").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let target = location(&response);
        assert!(target.starts_with(&format!("{}/login/oauth/authorize?", server.url())));
        assert!(target.contains("client_id=test-client"));
        assert!(target.contains("scope=repo"));
        assert!(!target.contains("test-secret-123"));
    }

    #[tokio::test]
    async fn test_callback_redirects_to_client_with_credential() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/login/oauth/access_token")
            .match_body(Matcher::UrlEncoded("code".into(), "good-code".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"gho_issued","token_type":"bearer","scope":"repo"}"#)
            .expect(1)
            .create_async()
            .await;

        let response = send_get(app(&server), "/auth/provider/callback?code=good-code").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            "http://localhost:3001/?access_token=gho_issued"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_callback_exchange_failure_is_500_without_redirect() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/login/oauth/access_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"bad_verification_code"}"#)
            .create_async()
            .await;

        let response = send_get(app(&server), "/auth/github/callback?code=expired").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(LOCATION).is_none());
        let body = json_body(response).await;
        assert_eq!(body["error"], json!("Failed to authenticate"));
        assert!(!body.to_string().contains("test-secret-123"));
    }

    #[tokio::test]
    async fn test_callback_without_code_makes_no_exchange() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let response = send_get(app(&server), "/auth/provider/callback").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = send_get(app(&server), "/auth/provider/callback?error=access_denied").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_weather_without_city_is_400_before_any_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let response = send_get(app(&server), "/api/weather").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], json!("City parameter is required"));
        assert_eq!(body["provider"], json!("weather"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_weather_passthrough_unmodified() {
        let mut server = Server::new_async().await;
        // Key order and number literals must survive as sent
        let forecast = r#"{"date":"2024-01-01","city":"Warsaw","day":{"wind_velocity":10,"temp_max":5.10,"weather_code":1},"night":{"wind_velocity":4,"temp_max":-2.0,"weather_code":3}}"#;
        let _mock = server
            .mock("GET", WEATHER_PATH)
            .match_query(Matcher::UrlEncoded("city".into(), "Warsaw".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(forecast)
            .create_async()
            .await;

        let response = send_get(app(&server), "/api/weather?city=Warsaw").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], forecast.as_bytes());
    }

    #[tokio::test]
    async fn test_weather_timeout_is_502() {
        let mut config = Config::for_tests(&silent_server().await);
        config.http_request_timeout_secs = 1;
        let state = AppState::from_config(config).unwrap();

        let response = send_get(create_router(Arc::new(state)), "/api/weather?city=Warsaw").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "weather timed out", "provider": "weather" })
        );
    }

    #[tokio::test]
    async fn test_weather_failure_does_not_affect_currency_rates() {
        let mut server = Server::new_async().await;
        let _weather = server
            .mock("GET", WEATHER_PATH)
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let _rates = server
            .mock("GET", RATES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"date":"2024-01-01","base":"USD","rates":{"PLN":"4.0"}}"#)
            .create_async()
            .await;

        let router = app(&server);
        let (weather, rates) = tokio::join!(
            send_get(router.clone(), "/api/weather?city=Warsaw"),
            send_get(router.clone(), "/api/currency-rates"),
        );

        assert_eq!(weather.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(weather).await["provider"], json!("weather"));
        assert_eq!(rates.status(), StatusCode::OK);
        assert_eq!(json_body(rates).await["base"], json!("USD"));
    }

    #[tokio::test]
    async fn test_currency_rates_feed_cross_rate_conversion() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", RATES_PATH)
            .match_query(Matcher::UrlEncoded("apikey".into(), "currency-key".into()))
            .with_status(200)
            .with_body(r#"{"date":"2024-01-01","base":"USD","rates":{"PLN":4.0,"EUR":0.9}}"#)
            .create_async()
            .await;

        let response = send_get(app(&server), "/api/currency-rates").await;
        assert_eq!(response.status(), StatusCode::OK);

        let rates: CurrencyRates = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(rates.base, "USD");
        let converted = rates.convert(100.0, "PLN", "EUR").unwrap();
        assert_eq!(format!("{:.2}", converted), "22.50");
    }

    #[tokio::test]
    async fn test_historical_rates_require_date() {
        let server = Server::new_async().await;
        let response = send_get(app(&server), "/api/currency-rates/historical").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send_get(app(&server), "/api/currency-rates/historical?date=yesterday").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_repos_forward_query_credential() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/user/repos")
            .match_header("authorization", "Bearer gho_query")
            .with_status(200)
            .with_body(r#"[{"id":7,"name":"gateway"}]"#)
            .expect(2)
            .create_async()
            .await;

        let response = send_get(app(&server), "/api/repos?access_token=gho_query").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await[0]["name"], json!("gateway"));

        let response = app(&server)
            .oneshot(
                Request::builder()
                    .uri("/api/github/repos")
                    .header("authorization", "Bearer gho_query")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_repos_without_credential_is_400() {
        let server = Server::new_async().await;
        let response = send_get(app(&server), "/api/repos").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_public_entries_both_paths() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/entries")
            .with_status(200)
            .with_body(r#"{"count":1,"entries":[{"API":"Dogs","Description":"Dog pics"}]}"#)
            .expect(2)
            .create_async()
            .await;

        for path in ["/api/public-entries", "/api/public-apis"] {
            let response = send_get(app(&server), path).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json_body(response).await["entries"][0]["API"], json!("Dogs"));
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_502() {
        let state = AppState::from_config(Config::for_tests("http://127.0.0.1:1")).unwrap();
        let response = send_get(create_router(Arc::new(state)), "/api/public-entries").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            json_body(response).await["error"],
            json!("public-apis is unreachable")
        );
    }

    #[tokio::test]
    async fn test_cors_allows_client_origin() {
        let server = Server::new_async().await;
        let response = app(&server)
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .header("origin", "http://localhost:3001")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:3001")
        );
    }
}
