// src/handlers/change_requests.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::change_request::ChangeRequest,
};

// GET /api/change-requests
#[utoipa::path(
    get,
    path = "/api/change-requests",
    tag = "Change Requests",
    responses(
        (status = 200, description = "Solicitações aguardando aprovação", body = Vec<ChangeRequest>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {

    let pending = app_state.change_request_service
        .list_pending(&user.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pending)))
}
