// src/handlers/stages.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::stage::{Stage, StageCategory},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStagePayload {
    #[validate(length(min = 2, max = 60, message = "invalid_length"))]
    #[schema(example = "Análise da Operadora")]
    pub nome: String,

    #[validate(length(min = 4, max = 9, message = "invalid_color"))]
    #[schema(example = "#6366f1")]
    pub cor: Option<String>,

    // Sem ordem, a etapa vai para o fim do funil
    #[validate(range(min = 0, max = 100_000, message = "invalid_order"))]
    pub ordem: Option<i32>,

    // Sem categoria, ela é deduzida do nome
    pub categoria: Option<StageCategory>,
}

// GET /api/stages
#[utoipa::path(
    get,
    path = "/api/stages",
    tag = "Stages",
    responses(
        (status = 200, description = "Etapas do funil em ordem", body = Vec<Stage>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_stages(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {

    let stages = app_state.pipeline_service
        .list_stages()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stages)))
}

// POST /api/stages
#[utoipa::path(
    post,
    path = "/api/stages",
    tag = "Stages",
    request_body = CreateStagePayload,
    responses(
        (status = 201, description = "Etapa criada", body = Stage),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateStagePayload>,
) -> Result<impl IntoResponse, ApiError> {

    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let stage = app_state.pipeline_service
        .create_stage(
            &user.0,
            &payload.nome,
            payload.cor.as_deref(),
            payload.ordem,
            payload.categoria,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(stage)))
}
