// src/routes/mod.rs

use crate::{
    handlers::{
        general::{health_handler, root_handler},
        payroll::{
            create_adjustment, get_salary_details, list_adjustments, list_salary_payments,
            pay_salary,
        },
    },
    openapi::ApiDoc,
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // ─── Adjustments ──────────────────────────────────────
        .route("/payroll/adjustments", post(create_adjustment))
        .route(
            "/payroll/employee/{employee_id}/adjustments",
            get(list_adjustments),
        )
        // ─── Salaries ─────────────────────────────────────────
        .route(
            "/payroll/employee/{employee_id}/salary-details",
            get(get_salary_details),
        )
        .route(
            "/payroll/employee/{employee_id}/salary-payments",
            get(list_salary_payments),
        )
        .route("/payroll/pay-salary", post(pay_salary))
}

/// The full application: API, health probes, Swagger UI and HTTP middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/api/v1", api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
