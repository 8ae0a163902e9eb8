// src/services/visibility.rs

use crate::{
    common::error::AppError,
    models::{auth::Caller, lead::Lead},
};

// Administrador vê tudo. Os demais veem leads livres, os próprios e os da equipe.
pub fn is_visible(lead: &Lead, caller: &Caller) -> bool {
    if caller.is_admin || lead.livre {
        return true;
    }

    match lead.created_by {
        Some(owner) => owner == caller.user_id || caller.equipe.contains(&owner),
        None => false,
    }
}

pub fn visible_leads(all: Vec<Lead>, caller: &Caller) -> Vec<Lead> {
    all.into_iter().filter(|lead| is_visible(lead, caller)).collect()
}

// Editar e excluir direto: só o dono ou um administrador
pub fn can_modify(lead: &Lead, caller: &Caller) -> bool {
    caller.is_admin || lead.created_by == Some(caller.user_id)
}

/// Só lead livre e que ainda não é de quem está pedindo pode ser assumido.
pub fn ensure_claimable(lead: &Lead, caller: &Caller) -> Result<(), AppError> {
    if lead.livre && lead.created_by != Some(caller.user_id) {
        Ok(())
    } else {
        Err(AppError::NotClaimable)
    }
}
