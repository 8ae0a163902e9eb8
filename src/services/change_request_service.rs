// src/services/change_request_service.rs

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ApprovalQueue, LeadStore},
    models::{
        auth::Caller,
        change_request::{ChangeKind, ChangeRequest, NewChangeRequest},
    },
    services::visibility::{can_modify, is_visible},
};

#[derive(Clone)]
pub struct ChangeRequestService {
    leads: Arc<dyn LeadStore>,
    queue: Arc<dyn ApprovalQueue>,
}

impl ChangeRequestService {
    pub fn new(leads: Arc<dyn LeadStore>, queue: Arc<dyn ApprovalQueue>) -> Self {
        Self { leads, queue }
    }

    /// Pede para editar/excluir um lead de outra pessoa.
    ///
    /// Cria uma solicitação pendente na fila de aprovação; o lead não é alterado.
    pub async fn request_change(
        &self,
        caller: &Caller,
        lead_id: Uuid,
        tipo: ChangeKind,
        motivo: &str,
        dados: Option<Value>,
    ) -> Result<ChangeRequest, AppError> {
        let motivo = motivo.trim();
        if motivo.is_empty() {
            return Err(AppError::EmptyJustification);
        }

        let lead = self
            .leads
            .find(lead_id)
            .await?
            .filter(|lead| is_visible(lead, caller))
            .ok_or(AppError::LeadNotFound)?;

        if can_modify(&lead, caller) {
            return Err(AppError::ChangeRequestNotNeeded);
        }

        // Exclusão não carrega proposta de dados
        let dados = match tipo {
            ChangeKind::Editar => dados,
            ChangeKind::Excluir => None,
        };

        let request = self
            .queue
            .enqueue(NewChangeRequest {
                user_id: caller.user_id,
                tipo,
                registro_id: lead.id,
                motivo: motivo.to_string(),
                dados,
            })
            .await?;

        tracing::info!(
            request_id = %request.id,
            lead_id = %lead.id,
            user_id = %caller.user_id,
            tipo = ?tipo,
            "Solicitação de alteração enviada para aprovação"
        );
        Ok(request)
    }

    // A resolução fica com o painel de aprovação; aqui só listamos
    pub async fn list_pending(&self, caller: &Caller) -> Result<Vec<ChangeRequest>, AppError> {
        if !caller.is_admin {
            return Err(AppError::Forbidden);
        }
        self.queue.list_pending().await
    }
}
