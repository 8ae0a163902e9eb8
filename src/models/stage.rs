// src/models/stage.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE stage_category do banco.
// As regras de transição olham SÓ para a categoria, nunca para o nome exibido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stage_category", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum StageCategory {
    /// Envio de cotação: exige documento de cotação e contato.
    QuotationGate,
    /// Negociação: exige telefone ou e-mail.
    ContactRequired,
    /// Fechamento / pós-venda: exige contato e documento de identificação.
    DocumentGate,
    /// Venda realizada.
    Terminal,
    None,
}

impl StageCategory {
    pub fn requires_quotation(self) -> bool {
        matches!(self, StageCategory::QuotationGate)
    }

    pub fn requires_contact(self) -> bool {
        matches!(
            self,
            StageCategory::QuotationGate | StageCategory::ContactRequired | StageCategory::DocumentGate
        )
    }

    pub fn requires_identity_document(self) -> bool {
        matches!(self, StageCategory::DocumentGate)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StageCategory::Terminal)
    }

    /// Deduz a categoria a partir do nome, para etapas cadastradas sem categoria.
    ///
    /// Só é usado uma vez, na criação; a categoria fica gravada na etapa e
    /// renomear a etapa depois não muda as regras.
    pub fn infer_from_name(nome: &str) -> Self {
        let nome = fold_accents(&nome.to_lowercase());

        if nome.contains("venda realizada") {
            StageCategory::Terminal
        } else if nome.contains("cotacao") {
            StageCategory::QuotationGate
        } else if nome.contains("fechamento") || nome.contains("pos-venda") || nome.contains("pos venda") {
            StageCategory::DocumentGate
        } else if nome.contains("negociacao") {
            StageCategory::ContactRequired
        } else {
            StageCategory::None
        }
    }
}

// Remove acentos do português para comparar nomes digitados de formas diferentes.
pub(crate) fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

// --- ETAPA (Coluna do Kanban) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub id: Uuid,
    #[schema(example = "Envio de Cotação")]
    pub nome: String,
    #[schema(example = "#8b5cf6")]
    pub cor: String,
    #[schema(example = 3)]
    pub ordem: i32,
    pub categoria: StageCategory,
    pub created_at: DateTime<Utc>,
}

// O que o registro de etapas recebe para anexar uma nova coluna
#[derive(Debug, Clone)]
pub struct NewStage {
    pub nome: String,
    pub cor: String,
    pub ordem: i32,
    pub categoria: StageCategory,
}
