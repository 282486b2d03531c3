use crate::csrf::csrf_guard;
use crate::handlers::{
    create_qrcode_handler, delete_qrcode_handler, health_handler, list_qrcodes_handler,
    list_visits_handler, redirect_by_code_handler, redirect_by_slug_handler,
    update_qrcode_handler,
};
use crate::state::AppState;
use axum::middleware;
use axum::routing::{get, put};
use axum::Router;
use qrlink_core::BlobStore;
use tower_http::trace::TraceLayer;

pub struct App {}

impl App {
    pub fn router<S: BlobStore>(state: AppState<S>) -> Router {
        let api = Router::new()
            .route(
                "/api/qrcodes",
                get(list_qrcodes_handler::<S>).post(create_qrcode_handler::<S>),
            )
            .route(
                "/api/qrcodes/{id}",
                put(update_qrcode_handler::<S>).delete(delete_qrcode_handler::<S>),
            )
            .route("/api/qrcodes/{id}/visits", get(list_visits_handler::<S>))
            .route_layer(middleware::from_fn(csrf_guard));

        Router::new()
            .route("/health", get(health_handler))
            .route("/q/{code}", get(redirect_by_code_handler::<S>))
            .route("/r/{slug}", get(redirect_by_slug_handler::<S>))
            .merge(api)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csrf::{CSRF_COOKIE, CSRF_HEADER};
    use crate::extract::USER_ID_HEADER;
    use crate::handlers::REDIRECT_CACHE_CONTROL;
    use axum::body::{to_bytes, Body};
    use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, COOKIE, LOCATION};
    use axum::http::{HeaderMap, Method, Request, StatusCode};
    use qrlink_catalog::{CatalogConfig, RecordStore};
    use qrlink_redirector::RedirectorService;
    use qrlink_storage::InMemoryBlobStore;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const TOKEN: &str = "csrf-secret";

    fn app() -> Router {
        let records = RecordStore::new(
            Arc::new(InMemoryBlobStore::new()),
            CatalogConfig::default(),
        );
        let redirector = RedirectorService::new(records.clone());
        App::router(AppState::new(records, Arc::new(redirector)))
    }

    fn api(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CSRF_HEADER, TOKEN)
            .header(COOKIE, format!("{CSRF_COOKIE}={TOKEN}"));
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn visit(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("user-agent", "test-agent")
            .header("x-forwarded-for", "203.0.113.5, 10.0.0.1")
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    async fn create(app: &Router, user: &str, body: Value) -> Value {
        let (status, _, created) = send(
            app,
            api(Method::POST, "/api/qrcodes", Some(user), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        created
    }

    #[tokio::test]
    async fn health() {
        let app = app();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")})
        );
    }

    #[tokio::test]
    async fn api_requires_identity() {
        let app = app();

        let (status, _, body) = send(&app, api(Method::GET, "/api/qrcodes", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn unsafe_methods_require_matching_csrf_token() {
        let app = app();
        let body = json!({"name": "Menu", "targetUrl": "https://example.com"});

        let missing = Request::builder()
            .method(Method::POST)
            .uri("/api/qrcodes")
            .header(USER_ID_HEADER, "alice")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let mismatched = Request::builder()
            .method(Method::POST)
            .uri("/api/qrcodes")
            .header(USER_ID_HEADER, "alice")
            .header(CSRF_HEADER, "forged")
            .header(COOKIE, format!("{CSRF_COOKIE}={TOKEN}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        assert_eq!(send(&app, missing).await.0, StatusCode::FORBIDDEN);
        assert_eq!(send(&app, mismatched).await.0, StatusCode::FORBIDDEN);

        let (status, _, listed) = send(&app, api(Method::GET, "/api/qrcodes", Some("alice"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn create_then_list() {
        let app = app();

        let created = create(
            &app,
            "alice",
            json!({"name": "Menu", "targetUrl": "https://example.com/menu", "friendlySlug": "menu"}),
        )
        .await;

        assert_eq!(created["name"], "Menu");
        assert_eq!(created["isActive"], true);
        assert_eq!(created["friendlySlug"], "menu");
        assert_eq!(created["createdById"], "alice");
        assert_eq!(created["_count"]["visits"], 0);
        assert_eq!(created["code"].as_str().unwrap().len(), 10);

        let (status, _, listed) = send(&app, api(Method::GET, "/api/qrcodes", Some("alice"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], created["id"]);

        let (_, _, other) = send(&app, api(Method::GET, "/api/qrcodes", Some("bob"), None)).await;
        assert_eq!(other, json!([]));
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let app = app();

        let (status, _, body) = send(
            &app,
            api(
                Method::POST,
                "/api/qrcodes",
                Some("alice"),
                Some(json!({"name": "Menu", "targetUrl": "ftp://example.com"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _, _) = send(
            &app,
            api(Method::POST, "/api/qrcodes", Some("alice"), Some(json!({"name": ""}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict() {
        let app = app();
        create(
            &app,
            "alice",
            json!({"name": "Menu", "targetUrl": "https://example.com", "code": "promo"}),
        )
        .await;

        let (status, _, body) = send(
            &app,
            api(
                Method::POST,
                "/api/qrcodes",
                Some("bob"),
                Some(json!({"name": "Other", "targetUrl": "https://example.org", "code": "promo"})),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["field"], "code");
        assert_eq!(body["value"], "promo");
    }

    #[tokio::test]
    async fn redirects_and_records_visits() {
        let app = app();
        let created = create(
            &app,
            "alice",
            json!({"name": "Menu", "targetUrl": "https://example.com/menu", "friendlySlug": "menu"}),
        )
        .await;
        let code = created["code"].as_str().unwrap();
        let id = created["id"].as_str().unwrap();

        let (status, headers, _) = send(&app, visit(&format!("/q/{code}"))).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[LOCATION], "https://example.com/menu");
        assert_eq!(headers[CACHE_CONTROL], REDIRECT_CACHE_CONTROL);

        let (status, _, _) = send(&app, visit("/r/menu")).await;
        assert_eq!(status, StatusCode::FOUND);

        let (status, _, visits) = send(
            &app,
            api(
                Method::GET,
                &format!("/api/qrcodes/{id}/visits?limit=1"),
                Some("alice"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(visits.as_array().unwrap().len(), 1);
        assert_eq!(visits[0]["userAgent"], "test-agent");
        assert_eq!(visits[0]["ipHash"].as_str().unwrap().len(), 64);

        let (_, _, listed) = send(&app, api(Method::GET, "/api/qrcodes", Some("alice"), None)).await;
        assert_eq!(listed[0]["_count"]["visits"], 2);

        let (status, _, _) = send(
            &app,
            api(
                Method::GET,
                &format!("/api/qrcodes/{id}/visits"),
                Some("bob"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_codes_are_not_found() {
        let app = app();

        let (status, headers, body) = send(&app, visit("/q/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(headers.get(LOCATION).is_none());
        assert_eq!(body["error"], "Not found");
        assert_eq!(send(&app, visit("/r/nope")).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lifecycle_through_http() {
        let app = app();
        let created = create(
            &app,
            "alice",
            json!({"name": "Menu", "targetUrl": "https://example.com/menu", "friendlySlug": "menu"}),
        )
        .await;
        let id = created["id"].as_str().unwrap();
        let record_uri = format!("/api/qrcodes/{id}");

        let (status, _, _) = send(
            &app,
            api(Method::PUT, &record_uri, Some("bob"), Some(json!({"isActive": false}))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, updated) = send(
            &app,
            api(
                Method::PUT,
                &record_uri,
                Some("alice"),
                Some(json!({"isActive": false, "friendlySlug": null})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["isActive"], false);
        assert_eq!(updated["friendlySlug"], Value::Null);

        let code = created["code"].as_str().unwrap();
        assert_eq!(send(&app, visit(&format!("/q/{code}"))).await.0, StatusCode::GONE);
        assert_eq!(send(&app, visit("/r/menu")).await.0, StatusCode::NOT_FOUND);

        let (status, _, body) = send(&app, api(Method::DELETE, &record_uri, Some("alice"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, _, _) = send(&app, api(Method::DELETE, &record_uri, Some("alice"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            send(&app, visit(&format!("/q/{code}"))).await.0,
            StatusCode::NOT_FOUND
        );
    }
}
