// src/models/auth.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Estrutura de dados ("claims") dentro do JWT emitido pelo serviço de autenticação
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)

    #[serde(default)]
    pub admin: bool,

    // IDs dos membros da equipe do usuário (a hierarquia é calculada fora daqui)
    #[serde(default)]
    pub equipe: Vec<Uuid>,
}

/// Quem está chamando: montado a partir do token em cada requisição.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub is_admin: bool,
    pub equipe: HashSet<Uuid>,
}

impl Caller {
    pub fn member(user_id: Uuid, equipe: impl IntoIterator<Item = Uuid>) -> Self {
        Self { user_id, is_admin: false, equipe: equipe.into_iter().collect() }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, is_admin: true, equipe: HashSet::new() }
    }
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            is_admin: claims.admin,
            equipe: claims.equipe.into_iter().collect(),
        }
    }
}
