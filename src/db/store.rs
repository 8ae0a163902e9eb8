// src/db/store.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        change_request::{ChangeRequest, NewChangeRequest},
        lead::{Lead, LeadPatch, NewLead},
        stage::{NewStage, Stage},
    },
};

/// Tabela de leads. Os serviços só falam com ela por aqui.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Lead>, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Lead>, AppError>;

    async fn create(&self, lead: NewLead) -> Result<Lead, AppError>;

    /// Aplica `patch` somente se a versão gravada ainda for `expected_versao`.
    ///
    /// Incrementa a versão. `Ok(None)` quando o lead sumiu ou a versão mudou.
    async fn update(
        &self,
        id: Uuid,
        expected_versao: i64,
        patch: LeadPatch,
    ) -> Result<Option<Lead>, AppError>;

    /// Assume um lead livre: dono e `livre` mudam na mesma escrita.
    ///
    /// Só grava se o lead ainda estiver livre e na versão lida.
    async fn claim(
        &self,
        id: Uuid,
        expected_versao: i64,
        new_owner: Uuid,
    ) -> Result<Option<Lead>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Registro de etapas, só leitura e inclusão.
#[async_trait]
pub trait StageRegistry: Send + Sync {
    // Ordenadas por `ordem`
    async fn list(&self) -> Result<Vec<Stage>, AppError>;

    async fn create(&self, stage: NewStage) -> Result<Stage, AppError>;
}

/// Fila de aprovação das solicitações de alteração/exclusão.
#[async_trait]
pub trait ApprovalQueue: Send + Sync {
    async fn enqueue(&self, request: NewChangeRequest) -> Result<ChangeRequest, AppError>;

    async fn list_pending(&self) -> Result<Vec<ChangeRequest>, AppError>;
}
