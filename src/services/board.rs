// src/services/board.rs

use rust_decimal::Decimal;

use crate::{
    models::{
        auth::Caller,
        board::{Board, BoardColumn},
        lead::Lead,
        stage::Stage,
    },
    services::visibility::visible_leads,
};

/// Monta o kanban: uma coluna por etapa (na ordem do registro) e, antes delas,
/// a coluna dos leads sem etapa.
///
/// O filtro de visibilidade é aplicado antes de agrupar, então leads que o
/// usuário não vê não entram nas contagens nem nos valores.
pub fn build_board(all: Vec<Lead>, stages: &[Stage], caller: &Caller) -> Board {
    let leads = visible_leads(all, caller);

    let mut ordered: Vec<&Stage> = stages.iter().collect();
    ordered.sort_by_key(|s| s.ordem);

    let mut sem_etapa = Vec::new();
    let mut por_etapa: Vec<Vec<Lead>> = vec![Vec::new(); ordered.len()];

    for lead in leads {
        match lead.stage_id.and_then(|id| ordered.iter().position(|s| s.id == id)) {
            Some(idx) => por_etapa[idx].push(lead),
            // Etapa removida do registro cai junto com os sem etapa
            None => sem_etapa.push(lead),
        }
    }

    let mut colunas = Vec::with_capacity(ordered.len() + 1);
    colunas.push(column(None, sem_etapa));
    for (stage, leads) in ordered.into_iter().zip(por_etapa) {
        colunas.push(column(Some(stage.clone()), leads));
    }

    let total_leads = colunas.iter().map(|c| c.total_leads).sum();
    let valor_total = colunas.iter().map(|c| c.valor_total).fold(Decimal::ZERO, Decimal::saturating_add);

    Board { colunas, total_leads, valor_total }
}

fn column(stage: Option<Stage>, leads: Vec<Lead>) -> BoardColumn {
    let valor_total = leads
        .iter()
        .filter_map(Lead::valor_estimado)
        .fold(Decimal::ZERO, Decimal::saturating_add);

    BoardColumn { stage, total_leads: leads.len(), leads, valor_total }
}
