// src/models/board.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{lead::Lead, stage::Stage};

// Uma coluna do kanban. `stage` nulo = leads sem etapa.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub stage: Option<Stage>,
    pub leads: Vec<Lead>,
    #[schema(example = 12)]
    pub total_leads: usize,
    #[schema(example = "18500.00")]
    pub valor_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub colunas: Vec<BoardColumn>,
    pub total_leads: usize,
    pub valor_total: Decimal,
}
