use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::{I18nStore, DEFAULT_LANG},
    middleware::i18n::Locale,
    services::transition_rules::TransitionBlocked,
};

// O erro de domínio de todos os serviços.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // A mensagem é o motivo que o validador de transição devolveu
    #[error("{0}")]
    TransitionBlocked(#[from] TransitionBlocked),

    #[error("Este lead não está livre para ser assumido")]
    NotClaimable,

    #[error("A justificativa é obrigatória")]
    EmptyJustification,

    #[error("Você já pode alterar este lead diretamente")]
    ChangeRequestNotNeeded,

    #[error("O lead foi alterado por outra pessoa")]
    Conflict,

    #[error("Sem permissão para alterar este lead")]
    Forbidden,

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Token inválido")]
    InvalidToken,

    // Falha de comunicação com o banco (TransportError)
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

// O que sai para o cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::TransitionBlocked(_)
            | AppError::NotClaimable
            | AppError::EmptyJustification
            | AppError::ChangeRequestNotNeeded => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::LeadNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(e) if is_transient(e) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    // Chave de tradução no I18nStore
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "error.validation",
            AppError::TransitionBlocked(reason) => reason.code(),
            AppError::NotClaimable => "error.not_claimable",
            AppError::EmptyJustification => "error.empty_justification",
            AppError::ChangeRequestNotNeeded => "error.change_request_not_needed",
            AppError::Conflict => "error.conflict",
            AppError::Forbidden => "error.forbidden",
            AppError::LeadNotFound => "error.lead_not_found",
            AppError::InvalidToken => "error.invalid_token",
            AppError::DatabaseError(e) if is_transient(e) => "error.transient",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "error.internal",
        }
    }

    /// Converte para a resposta HTTP, traduzindo a mensagem para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let error = store
            .translate(lang, self.code())
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string());

        // Detalhes campo a campo, como o frontend espera
        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            store
                                .translate(lang, &format!("field.{}", code))
                                .map(str::to_string)
                                .unwrap_or_else(|| code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// Sem o Locale (ex.: middleware), responde no idioma padrão
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale(DEFAULT_LANG.to_string()), I18nStore::builtin())
            .into_response()
    }
}

// Falhas que valem tentar de novo: o banco não chegou a gravar nada
fn is_transient(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed
    )
}
