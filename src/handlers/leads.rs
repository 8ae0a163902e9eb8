// src/handlers/leads.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        board::Board,
        change_request::{ChangeKind, ChangeRequest},
        lead::{double_option, DocumentSlot, Lead, LeadPatch, MoveOutcome, NewLead},
    },
};

// `null` ou ausente vira objeto vazio
fn extras_or_empty(dados: Value) -> Value {
    if dados.is_null() { json!({}) } else { dados }
}

// =============================================================================
//  ÁREA 1: QUADRO
// =============================================================================

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    responses(
        (status = 200, description = "Leads visíveis para o usuário", body = Vec<Lead>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {

    let leads = app_state.pipeline_service
        .list_leads(&user.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(leads)))
}

// GET /api/leads/board
#[utoipa::path(
    get,
    path = "/api/leads/board",
    tag = "Leads",
    responses(
        (status = 200, description = "Colunas do kanban com contagem e valor estimado", body = Board)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_board(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {

    let board = app_state.pipeline_service
        .board(&user.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(board)))
}

// =============================================================================
//  ÁREA 2: CADASTRO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "PF")]
    pub tipo: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub nome: String,

    #[schema(example = "+55 11 91234-5678")]
    pub telefone: Option<String>,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "maria@email.com")]
    pub email: Option<String>,

    pub endereco: Option<String>,

    #[validate(range(min = 0, max = 130, message = "invalid_age"))]
    #[schema(example = 34)]
    pub idade: Option<i32>,

    #[serde(default)]
    pub livre: bool,

    pub stage_id: Option<Uuid>,

    #[serde(default)]
    #[schema(value_type = Object, example = json!({"valor_estimado": 1500.5, "dependentes": 2}))]
    pub dados_extras: Value,
}

impl From<CreateLeadPayload> for NewLead {
    fn from(p: CreateLeadPayload) -> Self {
        NewLead {
            tipo: p.tipo.trim().to_string(),
            nome: p.nome.trim().to_string(),
            telefone: p.telefone,
            email: p.email,
            endereco: p.endereco,
            idade: p.idade,
            created_by: None,
            livre: p.livre,
            stage_id: p.stage_id,
            dados_extras: extras_or_empty(p.dados_extras),
        }
    }
}

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos"),
        (status = 422, description = "Etapa inicial exige dados que o lead não tem")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {

    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state.pipeline_service
        .create_lead(&user.0, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Familiar")]
    pub tipo: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Família Souza")]
    pub nome: String,

    pub telefone: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    #[validate(range(min = 0, max = 130, message = "invalid_age"))]
    pub idade: Option<i32>,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub dados_extras: Value,
}

// POST /api/public/leads
#[utoipa::path(
    post,
    path = "/api/public/leads",
    tag = "Leads",
    request_body = PublicLeadPayload,
    responses(
        (status = 201, description = "Lead recebido (livre, sem etapa)", body = Lead),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn capture_public_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<PublicLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {

    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let novo = NewLead {
        tipo: payload.tipo.trim().to_string(),
        nome: payload.nome.trim().to_string(),
        telefone: payload.telefone,
        email: payload.email,
        idade: payload.idade,
        dados_extras: extras_or_empty(payload.dados_extras),
        ..Default::default()
    };

    let lead = app_state.pipeline_service
        .capture_public_lead(novo)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// =============================================================================
//  ÁREA 3: EDIÇÃO E EXCLUSÃO (DONO OU ADMIN)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    pub tipo: Option<String>,

    #[validate(length(min = 1, message = "required"))]
    pub nome: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub telefone: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(email(message = "invalid_email"))]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub endereco: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(range(min = 0, max = 130, message = "invalid_age"))]
    #[schema(value_type = Option<i32>)]
    pub idade: Option<Option<i32>>,

    // Substitui o blob inteiro
    #[schema(value_type = Option<Object>)]
    pub dados_extras: Option<Value>,

    // Versão que o cliente tem em mãos
    #[schema(example = 3)]
    pub versao: Option<i64>,
}

impl UpdateLeadPayload {
    fn into_patch(self) -> (LeadPatch, Option<i64>) {
        let patch = LeadPatch {
            tipo: self.tipo.map(|t| t.trim().to_string()),
            nome: self.nome.map(|n| n.trim().to_string()),
            telefone: self.telefone,
            email: self.email,
            endereco: self.endereco,
            idade: self.idade,
            dados_extras: self.dados_extras.map(extras_or_empty),
            ..Default::default()
        };
        (patch, self.versao)
    }
}

// PATCH /api/leads/{id}
#[utoipa::path(
    patch,
    path = "/api/leads/{id}",
    tag = "Leads",
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 403, description = "Não é o dono: use uma solicitação de alteração"),
        (status = 409, description = "Versão desatualizada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Lead")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {

    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (patch, versao) = payload.into_patch();

    let lead = app_state.pipeline_service
        .update_lead(&user.0, id, patch, versao)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// DELETE /api/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    responses(
        (status = 204, description = "Lead excluído"),
        (status = 403, description = "Não é o dono: use uma solicitação de exclusão")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Lead")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {

    app_state.pipeline_service
        .delete_lead(&user.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachDocumentPayload {
    // Caminho devolvido pelo storage; `null` remove o documento
    #[schema(example = "leads/550e8400/cotacao.pdf")]
    pub path: Option<String>,
}

// PUT /api/leads/{id}/documents/{slot}
#[utoipa::path(
    put,
    path = "/api/leads/{id}/documents/{slot}",
    tag = "Leads",
    request_body = AttachDocumentPayload,
    responses(
        (status = 200, description = "Documento vinculado ao lead", body = Lead)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Lead"),
        ("slot" = DocumentSlot, Path, description = "identidade | empresa | comprovante_endereco | cotacao")
    ),
    security(("api_jwt" = []))
)]
pub async fn attach_document(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((id, slot)): Path<(Uuid, DocumentSlot)>,
    Json(payload): Json<AttachDocumentPayload>,
) -> Result<impl IntoResponse, ApiError> {

    let lead = app_state.pipeline_service
        .attach_document(&user.0, id, slot, payload.path)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// =============================================================================
//  ÁREA 4: FUNIL (MOVER / ASSUMIR)
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveLeadPayload {
    // `null` tira o lead de todas as colunas
    pub stage_id: Option<Uuid>,

    #[schema(example = 3)]
    pub versao: Option<i64>,
}

// POST /api/leads/{id}/move
#[utoipa::path(
    post,
    path = "/api/leads/{id}/move",
    tag = "Leads",
    request_body = MoveLeadPayload,
    responses(
        (status = 200, description = "Lead movido; refaça a busca do quadro", body = MoveOutcome),
        (status = 409, description = "O lead mudou desde a última leitura"),
        (status = 422, description = "Falta documento ou contato exigido pela etapa")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Lead")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {

    let outcome = app_state.pipeline_service
        .request_move(&user.0, id, payload.stage_id, payload.versao)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// POST /api/leads/{id}/claim
#[utoipa::path(
    post,
    path = "/api/leads/{id}/claim",
    tag = "Leads",
    responses(
        (status = 200, description = "Lead assumido", body = Lead),
        (status = 422, description = "Lead não está livre")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Lead")
    ),
    security(("api_jwt" = []))
)]
pub async fn claim_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {

    let lead = app_state.pipeline_service
        .claim(&user.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// =============================================================================
//  ÁREA 5: SOLICITAÇÃO DE ALTERAÇÃO
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestPayload {
    #[schema(example = "editar")]
    pub tipo: ChangeKind,

    #[schema(example = "Cliente pediu para corrigir o telefone")]
    pub motivo: String,

    // Alteração proposta, aplicada pelo aprovador
    #[schema(value_type = Option<Object>)]
    pub dados: Option<Value>,
}

// POST /api/leads/{id}/change-requests
#[utoipa::path(
    post,
    path = "/api/leads/{id}/change-requests",
    tag = "Leads",
    request_body = ChangeRequestPayload,
    responses(
        (status = 201, description = "Solicitação enviada para aprovação", body = ChangeRequest),
        (status = 422, description = "Justificativa vazia ou usuário já pode alterar direto")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Lead")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_change(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {

    let request = app_state.change_request_service
        .request_change(&user.0, id, payload.tipo, &payload.motivo, payload.dados)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(request)))
}
