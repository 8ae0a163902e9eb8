// src/services/transition_rules.rs

use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    lead::{DocumentSlot, Lead},
    stage::Stage,
};

/// Motivo pelo qual um lead não pode entrar na etapa pedida.
///
/// Só o primeiro bloqueio encontrado é devolvido.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionBlocked {
    #[error("É necessário anexar o documento de cotação antes de mover o lead para esta etapa")]
    MissingQuotation,

    #[error("É necessário informar telefone ou e-mail antes de mover o lead para esta etapa")]
    MissingContact,

    #[error("É necessário anexar o documento de identificação (RG/CNH) antes de mover o lead para esta etapa")]
    MissingIdentity,

    #[error("É necessário anexar o documento da empresa (cartão CNPJ) antes de mover o lead para esta etapa")]
    MissingCompanyDocument,

    #[error("Etapa de destino {0} não encontrada")]
    UnknownStage(Uuid),
}

impl TransitionBlocked {
    pub fn code(&self) -> &'static str {
        match self {
            TransitionBlocked::MissingQuotation => "transition.missing_quotation",
            TransitionBlocked::MissingContact => "transition.missing_contact",
            TransitionBlocked::MissingIdentity => "transition.missing_identity",
            TransitionBlocked::MissingCompanyDocument => "transition.missing_company_document",
            TransitionBlocked::UnknownStage(_) => "transition.unknown_stage",
        }
    }
}

/// Decide se `lead` pode entrar na etapa `target_stage_id`.
///
/// Sem etapa de destino (tirar o lead do funil) é sempre permitido.
/// Regras, na ordem:
/// 1. etapa de cotação exige o documento de cotação;
/// 2. etapas de atendimento ativo exigem telefone ou e-mail;
/// 3. fechamento/pós-venda exigem RG/CNH (pessoa física) ou cartão CNPJ (empresa).
pub fn can_transition(
    lead: &Lead,
    target_stage_id: Option<Uuid>,
    stages: &[Stage],
) -> Result<(), TransitionBlocked> {
    let Some(target_id) = target_stage_id else {
        return Ok(());
    };

    let target = stages
        .iter()
        .find(|s| s.id == target_id)
        .ok_or(TransitionBlocked::UnknownStage(target_id))?;
    let categoria = target.categoria;

    if categoria.requires_quotation() && lead.document(DocumentSlot::Cotacao).is_none() {
        return Err(TransitionBlocked::MissingQuotation);
    }

    if categoria.requires_contact() && !lead.has_contact() {
        return Err(TransitionBlocked::MissingContact);
    }

    if categoria.requires_identity_document() {
        if lead.is_pessoa_fisica() {
            if lead.document(DocumentSlot::Identidade).is_none() {
                return Err(TransitionBlocked::MissingIdentity);
            }
        } else if lead.document(DocumentSlot::Empresa).is_none() {
            return Err(TransitionBlocked::MissingCompanyDocument);
        }
    }

    Ok(())
}
