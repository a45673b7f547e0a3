// src/handlers/reports.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    common::{error::ApiError, response},
    config::AppState,
    middleware::i18n::Locale,
    services::reports::ReportVersion,
};

async fn build(
    app_state: AppState,
    locale: Locale,
    report_type: String,
    params: HashMap<String, String>,
    version: ReportVersion,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .build_report(&report_type, &params, version)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(response::data(report))
}

// GET /v1/reports/{report_type}?total_sold&sales_per_day&from=2024-01-01
#[utoipa::path(
    get,
    path = "/v1/reports/{report_type}",
    tag = "Relatórios",
    params(
        ("report_type" = String, Path, description = "sales, orders, clients ou leads"),
        ("from" = Option<String>, Query, description = "Data inicial YYYY-MM-DD (opcional)"),
        ("until" = Option<String>, Query, description = "Data final YYYY-MM-DD (opcional)"),
        ("seller" = Option<String>, Query, description = "ObjectId do vendedor")
    ),
    responses(
        (status = 200, description = "Mapa métrica → valor, só com as métricas pedidas"),
        (status = 400, description = "Relatório desconhecido ou nenhuma métrica pedida")
    ),
    security(("bearer" = []))
)]
pub async fn report_v1(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(report_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    build(app_state, locale, report_type, params, ReportVersion::V1).await
}

// GET /v2/reports/{report_type}?total_sold&from=...&until=...
#[utoipa::path(
    get,
    path = "/v2/reports/{report_type}",
    tag = "Relatórios",
    params(
        ("report_type" = String, Path, description = "sales, orders, clients ou leads"),
        ("from" = String, Query, description = "Início: RFC 3339 ou YYYY-MM-DD"),
        ("until" = String, Query, description = "Fim: RFC 3339 ou YYYY-MM-DD"),
        ("seller" = Option<String>, Query, description = "ObjectId do vendedor")
    ),
    responses(
        (status = 200, description = "Mapa métrica → valor, só com as métricas pedidas"),
        (status = 400, description = "Intervalo ausente ou inválido")
    ),
    security(("bearer" = []))
)]
pub async fn report_v2(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(report_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    build(app_state, locale, report_type, params, ReportVersion::V2).await
}
