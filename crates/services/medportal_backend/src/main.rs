// File: services/medportal_backend/src/main.rs
mod app_state;

use app_state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use medportal_common::{logging, log_result};
use medportal_config::load_config;
use medportal_scheduler::routes as scheduler_routes;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = state.db_client.is_healthy().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if database { "ok" } else { "degraded" },
            "database": database,
            "time_zone": state.config.scheduling.time_zone,
        })),
    )
}

fn app(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the MedPortal API!" }))
        .route("/health", get(health))
        .with_state(state.clone())
        .merge(scheduler_routes::routes(state.scheduler.clone()));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use medportal_scheduler::doc::SchedulerApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "MedPortal API",
                version = "0.1.0",
                description = "Appointment scheduling for the MedPortal healthcare portal",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(SchedulerApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    app.layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(load_config()?);
    let _log_guard = logging::init_from_config(&config.logging);

    let state = log_result(
        AppState::new(config.clone()).await,
        "Application state initialized",
        "Failed to initialize application state",
    )?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app(state).into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use medportal_config::{AppConfig, AuthConfig, DatabaseConfig};
    use medportal_scheduler::auth::{INTERNAL_AUTH_HEADER, ROLE_HEADER, USER_ID_HEADER};
    use tower::ServiceExt;

    const SECRET: &str = "backend-test-secret";

    fn test_config(auth: Option<AuthConfig>) -> AppConfig {
        let path = std::env::temp_dir().join(format!(
            "medportal-backend-{}.db",
            uuid::Uuid::new_v4()
        ));
        AppConfig {
            database: Some(DatabaseConfig {
                url: format!("sqlite:{}", path.display()),
            }),
            auth,
            ..AppConfig::default()
        }
    }

    async fn test_state() -> AppState {
        let config = test_config(Some(AuthConfig {
            shared_secret: Some(SECRET.to_string()),
            trust_identity_headers: false,
        }));
        AppState::new(Arc::new(config))
            .await
            .expect("state initializes")
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = app(test_state().await);
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["database"], true);
        assert_eq!(json["time_zone"], "UTC");
    }

    #[tokio::test]
    async fn scheduler_routes_are_nested_under_api() {
        let app = app(test_state().await);
        let response = app
            .oneshot(
                Request::get("/api/doctors/1/slots?date=2030-01-07")
                    .header(INTERNAL_AUTH_HEADER, SECRET)
                    .header(ROLE_HEADER, "patient")
                    .header(USER_ID_HEADER, "1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        // no doctor registered yet
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_database_config_fails_startup() {
        let config = AppConfig {
            database: None,
            ..AppConfig::default()
        };
        assert!(AppState::new(Arc::new(config)).await.is_err());
    }

    #[tokio::test]
    async fn unresolved_auth_secret_fails_startup() {
        // what `secret_from_env` leaves behind when AUTH_SHARED_SECRET is unset
        let unresolved = test_config(Some(AuthConfig {
            shared_secret: None,
            trust_identity_headers: false,
        }));
        assert!(AppState::new(Arc::new(unresolved)).await.is_err());
        assert!(AppState::new(Arc::new(test_config(None))).await.is_err());

        let trusting = test_config(Some(AuthConfig {
            shared_secret: None,
            trust_identity_headers: true,
        }));
        assert!(AppState::new(Arc::new(trusting)).await.is_ok());
    }
}
