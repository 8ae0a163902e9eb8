// src/models/change_request.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE change_request_kind do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "change_request_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Editar,
    Excluir,
}

// pendente -> resolvida | rejeitada (transição feita pelo aprovador, fora deste serviço)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "change_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Pendente,
    Resolvida,
    Rejeitada,
}

// --- SOLICITAÇÃO (Fila de aprovação) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub id: Uuid,
    // Quem pediu
    pub user_id: Uuid,
    pub tipo: ChangeKind,
    // Lead alvo
    pub registro_id: Uuid,
    #[schema(example = "Cliente pediu para corrigir o telefone")]
    pub motivo: String,
    // Alteração proposta (só para edição)
    #[schema(value_type = Option<Object>)]
    pub dados: Option<Value>,
    pub status: ChangeStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChangeRequest {
    pub user_id: Uuid,
    pub tipo: ChangeKind,
    pub registro_id: Uuid,
    pub motivo: String,
    pub dados: Option<Value>,
}
