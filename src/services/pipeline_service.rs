// src/services/pipeline_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::{LeadStore, StageRegistry},
    models::{
        auth::Caller,
        board::Board,
        lead::{DocumentSlot, Lead, LeadPatch, MoveOutcome, NewLead, SalesHandoff},
        stage::{NewStage, Stage, StageCategory},
    },
    services::{
        board::build_board,
        transition_rules::can_transition,
        visibility::{can_modify, ensure_claimable, is_visible, visible_leads},
    },
};

const DEFAULT_STAGE_COLOR: &str = "#64748b";

#[derive(Clone)]
pub struct PipelineService {
    leads: Arc<dyn LeadStore>,
    stages: Arc<dyn StageRegistry>,
}

impl PipelineService {
    pub fn new(leads: Arc<dyn LeadStore>, stages: Arc<dyn StageRegistry>) -> Self {
        Self { leads, stages }
    }

    // =========================================================================
    //  1. ETAPAS
    // =========================================================================

    pub async fn list_stages(&self) -> Result<Vec<Stage>, AppError> {
        self.stages.list().await
    }

    /// Anexa uma etapa ao fim do funil (ou na `ordem` pedida). Só administrador.
    ///
    /// Sem categoria explícita, ela é deduzida do nome agora e fica gravada.
    pub async fn create_stage(
        &self,
        caller: &Caller,
        nome: &str,
        cor: Option<&str>,
        ordem: Option<i32>,
        categoria: Option<StageCategory>,
    ) -> Result<Stage, AppError> {
        if !caller.is_admin {
            return Err(AppError::Forbidden);
        }

        let ordem = match ordem {
            Some(ordem) => ordem,
            None => {
                let stages = self.stages.list().await?;
                stages
                    .iter()
                    .map(|s| s.ordem)
                    .max()
                    .unwrap_or(0)
                    .checked_add(1)
                    .ok_or_else(|| invalid_field("ordem", "invalid_order"))?
            }
        };

        let stage = self
            .stages
            .create(NewStage {
                nome: nome.trim().to_string(),
                cor: cor.unwrap_or(DEFAULT_STAGE_COLOR).to_string(),
                ordem,
                categoria: categoria.unwrap_or_else(|| StageCategory::infer_from_name(nome)),
            })
            .await?;

        tracing::info!(stage_id = %stage.id, categoria = ?stage.categoria, "Etapa criada: {}", stage.nome);
        Ok(stage)
    }

    // =========================================================================
    //  2. LEITURA (QUADRO)
    // =========================================================================

    pub async fn list_leads(&self, caller: &Caller) -> Result<Vec<Lead>, AppError> {
        let all = self.leads.list().await?;
        Ok(visible_leads(all, caller))
    }

    pub async fn board(&self, caller: &Caller) -> Result<Board, AppError> {
        let stages = self.stages.list().await?;
        let all = self.leads.list().await?;
        Ok(build_board(all, &stages, caller))
    }

    // Lead que o usuário não enxerga é tratado como inexistente
    async fn load_visible(&self, caller: &Caller, lead_id: Uuid) -> Result<Lead, AppError> {
        self.leads
            .find(lead_id)
            .await?
            .filter(|lead| is_visible(lead, caller))
            .ok_or(AppError::LeadNotFound)
    }

    // =========================================================================
    //  3. MOVIMENTAÇÃO NO FUNIL
    // =========================================================================

    /// Move o lead para `target_stage_id` (ou tira de todas as colunas com `None`).
    ///
    /// Valida antes de gravar: se a regra bloquear, nada é enviado ao banco.
    /// A gravação é condicionada à versão lida; se outra pessoa mexeu no lead
    /// no meio do caminho, devolve `Conflict`.
    pub async fn request_move(
        &self,
        caller: &Caller,
        lead_id: Uuid,
        target_stage_id: Option<Uuid>,
        expected_versao: Option<i64>,
    ) -> Result<MoveOutcome, AppError> {
        let lead = self.load_visible(caller, lead_id).await?;

        // O quadro do cliente está desatualizado
        if expected_versao.is_some_and(|v| v != lead.versao) {
            return Err(AppError::Conflict);
        }

        let stages = self.stages.list().await?;
        if let Err(reason) = can_transition(&lead, target_stage_id, &stages) {
            tracing::debug!(lead_id = %lead.id, "Movimentação bloqueada: {}", reason);
            return Err(reason.into());
        }

        let moved = self
            .leads
            .update(lead.id, lead.versao, LeadPatch::move_to(target_stage_id))
            .await?
            .ok_or(AppError::Conflict)?;

        let terminal = target_stage_id
            .and_then(|id| stages.iter().find(|s| s.id == id))
            .is_some_and(|s| s.categoria.is_terminal());

        tracing::info!(
            lead_id = %moved.id,
            user_id = %caller.user_id,
            stage_id = ?moved.stage_id,
            "Lead movido{}",
            if terminal { " (venda realizada)" } else { "" }
        );

        let handoff = terminal.then(|| SalesHandoff::from(&moved));
        Ok(MoveOutcome { lead: moved, celebrar: terminal, handoff, invalidar: true })
    }

    // =========================================================================
    //  4. ASSUMIR LEAD LIVRE
    // =========================================================================

    pub async fn claim(&self, caller: &Caller, lead_id: Uuid) -> Result<Lead, AppError> {
        let lead = self.load_visible(caller, lead_id).await?;
        ensure_claimable(&lead, caller)?;

        // A condição `livre = TRUE` também vai na escrita: dois pedidos
        // simultâneos não assumem o mesmo lead
        let claimed = self
            .leads
            .claim(lead.id, lead.versao, caller.user_id)
            .await?
            .ok_or(AppError::Conflict)?;

        tracing::info!(lead_id = %claimed.id, user_id = %caller.user_id, "Lead livre assumido");
        Ok(claimed)
    }

    // =========================================================================
    //  5. CADASTRO E MANUTENÇÃO
    // =========================================================================

    pub async fn create_lead(&self, caller: &Caller, mut novo: NewLead) -> Result<Lead, AppError> {
        novo.created_by = Some(caller.user_id);

        // Entrar direto numa etapa segue as mesmas regras de mover
        if novo.stage_id.is_some() {
            let stages = self.stages.list().await?;
            can_transition(&draft(&novo), novo.stage_id, &stages)?;
        }

        let lead = self.leads.create(novo).await?;
        tracing::info!(lead_id = %lead.id, user_id = %caller.user_id, "Lead criado");
        Ok(lead)
    }

    /// Captação pública (site, landing page): entra livre, sem dono e sem etapa.
    pub async fn capture_public_lead(&self, mut novo: NewLead) -> Result<Lead, AppError> {
        novo.created_by = None;
        novo.livre = true;
        novo.stage_id = None;

        let lead = self.leads.create(novo).await?;
        tracing::info!(lead_id = %lead.id, "Lead recebido pela captação pública");
        Ok(lead)
    }

    /// Edição direta dos dados do lead. Quem não é dono nem administrador
    /// recebe `Forbidden` e deve usar a solicitação de alteração.
    pub async fn update_lead(
        &self,
        caller: &Caller,
        lead_id: Uuid,
        mut patch: LeadPatch,
        expected_versao: Option<i64>,
    ) -> Result<Lead, AppError> {
        let lead = self.load_visible(caller, lead_id).await?;
        if !can_modify(&lead, caller) {
            return Err(AppError::Forbidden);
        }

        let versao = expected_versao.unwrap_or(lead.versao);
        if versao != lead.versao {
            return Err(AppError::Conflict);
        }

        // Dono, "livre" e etapa só mudam pelos fluxos próprios (assumir / mover)
        patch.created_by = None;
        patch.livre = None;
        patch.stage_id = None;
        if patch.is_empty() {
            return Ok(lead);
        }
        self.ensure_stage_still_satisfied(&lead, &patch).await?;

        let updated = self
            .leads
            .update(lead.id, versao, patch)
            .await?
            .ok_or(AppError::Conflict)?;

        tracing::info!(lead_id = %updated.id, user_id = %caller.user_id, "Lead atualizado");
        Ok(updated)
    }

    pub async fn delete_lead(&self, caller: &Caller, lead_id: Uuid) -> Result<(), AppError> {
        let lead = self.load_visible(caller, lead_id).await?;
        if !can_modify(&lead, caller) {
            return Err(AppError::Forbidden);
        }

        if !self.leads.delete(lead.id).await? {
            return Err(AppError::LeadNotFound);
        }

        tracing::info!(lead_id = %lead.id, user_id = %caller.user_id, "Lead excluído");
        Ok(())
    }

    /// Grava (ou limpa, com `None`) o caminho de um documento já enviado ao storage.
    pub async fn attach_document(
        &self,
        caller: &Caller,
        lead_id: Uuid,
        slot: DocumentSlot,
        path: Option<String>,
    ) -> Result<Lead, AppError> {
        let lead = self.load_visible(caller, lead_id).await?;
        if !can_modify(&lead, caller) {
            return Err(AppError::Forbidden);
        }

        let path = path.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        let patch = LeadPatch::document(slot, path);
        self.ensure_stage_still_satisfied(&lead, &patch).await?;

        let updated = self
            .leads
            .update(lead.id, lead.versao, patch)
            .await?
            .ok_or(AppError::Conflict)?;

        tracing::info!(lead_id = %updated.id, documento = slot.column(), "Documento do lead atualizado");
        Ok(updated)
    }

    // O lead continua na etapa atual, então o resultado da edição precisa
    // cumprir as mesmas exigências de quem entra nela
    async fn ensure_stage_still_satisfied(&self, lead: &Lead, patch: &LeadPatch) -> Result<(), AppError> {
        let Some(stage_id) = lead.stage_id else {
            return Ok(());
        };

        let stages = self.stages.list().await?;
        if !stages.iter().any(|s| s.id == stage_id) {
            return Ok(());
        }

        let mut editado = lead.clone();
        patch.apply_to(&mut editado);
        if let Err(reason) = can_transition(&editado, Some(stage_id), &stages) {
            tracing::debug!(lead_id = %lead.id, "Edição bloqueada pela etapa atual: {}", reason);
            return Err(reason.into());
        }
        Ok(())
    }
}

fn invalid_field(field: &'static str, code: &'static str) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new(code));
    AppError::ValidationError(errors)
}

// Lead ainda não gravado, só para passar pelo validador de transição
fn draft(novo: &NewLead) -> Lead {
    let now = Utc::now();
    Lead {
        id: Uuid::nil(),
        tipo: novo.tipo.clone(),
        nome: novo.nome.clone(),
        telefone: novo.telefone.clone(),
        email: novo.email.clone(),
        endereco: novo.endereco.clone(),
        idade: novo.idade,
        created_by: novo.created_by,
        livre: novo.livre,
        stage_id: None,
        doc_identidade: None,
        doc_empresa: None,
        comprovante_endereco: None,
        cotacao: None,
        dados_extras: novo.dados_extras.clone(),
        versao: 0,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryLeadStore, MemoryStageRegistry};
    use crate::models::lead::fixtures::lead;
    use crate::services::transition_rules::{
        fixtures::{by_name, default_pipeline},
        TransitionBlocked,
    };
    use serde_json::json;

    struct Setup {
        service: PipelineService,
        store: Arc<MemoryLeadStore>,
        stages: Vec<Stage>,
    }

    fn setup(leads: Vec<Lead>) -> Setup {
        let stages = default_pipeline();
        let store = Arc::new(MemoryLeadStore::with(leads));
        let registry = Arc::new(MemoryStageRegistry::with(stages.clone()));
        Setup { service: PipelineService::new(store.clone(), registry), store, stages }
    }

    fn owned_pf(owner: Uuid) -> Lead {
        let mut l = lead("PF");
        l.created_by = Some(owner);
        l
    }

    // Cenário A
    #[tokio::test]
    async fn move_to_quotation_without_document_is_rejected_and_not_persisted() {
        let dono = Uuid::new_v4();
        let l = owned_pf(dono);
        let s = setup(vec![l.clone()]);
        let cotacao = by_name(&s.stages, "Envio de Cotação").id;

        let err = s
            .service
            .request_move(&Caller::member(dono, []), l.id, Some(cotacao), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TransitionBlocked(TransitionBlocked::MissingQuotation)));
        assert!(err.to_string().contains("cotação"));
        assert_eq!(s.store.writes(), 0);
        assert_eq!(s.store.get(l.id).await.unwrap().stage_id, None);
    }

    // Cenário B
    #[tokio::test]
    async fn move_to_quotation_with_document_updates_stage() {
        let dono = Uuid::new_v4();
        let mut l = owned_pf(dono);
        l.cotacao = Some("leads/1/cotacao.pdf".into());
        l.telefone = Some("11 91234-5678".into());
        let s = setup(vec![l.clone()]);
        let cotacao = by_name(&s.stages, "Envio de Cotação").id;

        let outcome = s
            .service
            .request_move(&Caller::member(dono, []), l.id, Some(cotacao), Some(1))
            .await
            .unwrap();

        assert_eq!(outcome.lead.stage_id, Some(cotacao));
        assert_eq!(outcome.lead.versao, 2);
        assert!(!outcome.celebrar);
        assert!(outcome.handoff.is_none());
        assert!(outcome.invalidar);
        assert_eq!(s.store.get(l.id).await.unwrap().stage_id, Some(cotacao));
    }

    // Cenário C
    #[tokio::test]
    async fn move_to_won_stage_fires_handoff_with_contact() {
        let dono = Uuid::new_v4();
        let mut l = owned_pf(dono);
        l.nome = "João Pereira".into();
        l.email = Some("joao@email.com".into());
        l.telefone = Some("21 99876-5432".into());
        let s = setup(vec![l.clone()]);
        let ganho = by_name(&s.stages, "Venda Realizada").id;

        let outcome = s
            .service
            .request_move(&Caller::member(dono, []), l.id, Some(ganho), None)
            .await
            .unwrap();

        assert_eq!(outcome.lead.stage_id, Some(ganho));
        assert!(outcome.celebrar);
        let handoff = outcome.handoff.unwrap();
        assert_eq!(handoff.lead_id, l.id);
        assert_eq!(handoff.nome, "João Pereira");
        assert_eq!(handoff.email.as_deref(), Some("joao@email.com"));
        assert_eq!(handoff.telefone.as_deref(), Some("21 99876-5432"));
        // O lead continua existindo, parado na etapa final
        assert!(s.store.get(l.id).await.is_some());
    }

    // Cenário D
    #[tokio::test]
    async fn free_lead_is_claimed_once() {
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let user_c = Uuid::new_v4();
        let mut l = owned_pf(user_a);
        l.livre = true;
        let s = setup(vec![l.clone()]);

        let claimed = s.service.claim(&Caller::member(user_b, []), l.id).await.unwrap();
        assert_eq!(claimed.created_by, Some(user_b));
        assert!(!claimed.livre);

        // Já não está livre; para C (fora da equipe de B) ele nem aparece mais
        let err = s.service.claim(&Caller::member(user_c, []), l.id).await.unwrap_err();
        assert!(matches!(err, AppError::LeadNotFound));

        // Mesmo um colega de equipe que enxerga o lead não consegue assumir
        let err = s.service.claim(&Caller::member(user_c, [user_b]), l.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotClaimable));

        let stored = s.store.get(l.id).await.unwrap();
        assert_eq!(stored.created_by, Some(user_b));
        assert!(!stored.livre);
    }

    #[tokio::test]
    async fn creator_cannot_claim_own_free_lead() {
        let dono = Uuid::new_v4();
        let mut l = owned_pf(dono);
        l.livre = true;
        let s = setup(vec![l.clone()]);

        let err = s.service.claim(&Caller::member(dono, []), l.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotClaimable));
        assert_eq!(s.store.writes(), 0);
        assert!(s.store.get(l.id).await.unwrap().livre);
    }

    #[tokio::test]
    async fn removing_from_pipeline_is_always_allowed() {
        let dono = Uuid::new_v4();
        let s0 = default_pipeline();
        let mut l = owned_pf(dono);
        l.stage_id = Some(by_name(&s0, "Negociação").id);
        let s = setup(vec![l.clone()]);

        let outcome = s.service.request_move(&Caller::member(dono, []), l.id, None, None).await.unwrap();
        assert_eq!(outcome.lead.stage_id, None);
    }

    #[tokio::test]
    async fn stale_client_version_is_a_conflict() {
        let dono = Uuid::new_v4();
        let l = owned_pf(dono);
        let s = setup(vec![l.clone()]);
        let novo = by_name(&s.stages, "Novo Lead").id;

        s.store.bump_version(l.id).await;

        let err = s
            .service
            .request_move(&Caller::member(dono, []), l.id, Some(novo), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict));
        assert_eq!(s.store.get(l.id).await.unwrap().stage_id, None);
    }

    #[tokio::test]
    async fn store_failure_leaves_lead_unchanged_and_is_retryable() {
        let dono = Uuid::new_v4();
        let l = owned_pf(dono);
        let s = setup(vec![l.clone()]);
        let novo = by_name(&s.stages, "Novo Lead").id;

        s.store.fail_writes();
        let err = s
            .service
            .request_move(&Caller::member(dono, []), l.id, Some(novo), None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
        let stored = s.store.get(l.id).await.unwrap();
        assert_eq!(stored.stage_id, None);
        assert_eq!(stored.versao, 1);
    }

    #[tokio::test]
    async fn invisible_lead_cannot_be_moved() {
        let l = owned_pf(Uuid::new_v4());
        let s = setup(vec![l.clone()]);
        let novo = by_name(&s.stages, "Novo Lead").id;

        let err = s
            .service
            .request_move(&Caller::member(Uuid::new_v4(), []), l.id, Some(novo), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LeadNotFound));
    }

    #[tokio::test]
    async fn team_member_can_move_a_colleague_lead() {
        let dono = Uuid::new_v4();
        let colega = Uuid::new_v4();
        let l = owned_pf(dono);
        let s = setup(vec![l.clone()]);
        let novo = by_name(&s.stages, "Novo Lead").id;

        let outcome = s
            .service
            .request_move(&Caller::member(colega, [dono]), l.id, Some(novo), None)
            .await
            .unwrap();
        assert_eq!(outcome.lead.stage_id, Some(novo));
    }

    #[tokio::test]
    async fn non_owner_cannot_edit_or_delete_directly() {
        let dono = Uuid::new_v4();
        let colega = Uuid::new_v4();
        let l = owned_pf(dono);
        let s = setup(vec![l.clone()]);
        let caller = Caller::member(colega, [dono]);

        let patch = LeadPatch { nome: Some("Outro nome".into()), ..Default::default() };
        let err = s.service.update_lead(&caller, l.id, patch, None).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = s.service.delete_lead(&caller, l.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        assert_eq!(s.store.writes(), 0);
        assert_eq!(s.store.get(l.id).await.unwrap().nome, l.nome);
    }

    #[tokio::test]
    async fn owner_edit_cannot_touch_ownership_or_stage() {
        let dono = Uuid::new_v4();
        let l = owned_pf(dono);
        let s = setup(vec![l.clone()]);
        let ganho = by_name(&s.stages, "Venda Realizada").id;

        let patch = LeadPatch {
            telefone: Some(Some("11 90000-0000".into())),
            dados_extras: Some(json!({ "valor_estimado": 890 })),
            livre: Some(true),
            stage_id: Some(Some(ganho)),
            ..Default::default()
        };
        let updated = s
            .service
            .update_lead(&Caller::member(dono, []), l.id, patch, Some(1))
            .await
            .unwrap();

        assert_eq!(updated.telefone.as_deref(), Some("11 90000-0000"));
        assert_eq!(updated.dados_extras["valor_estimado"], 890);
        assert!(!updated.livre);
        assert_eq!(updated.stage_id, None);
    }

    #[tokio::test]
    async fn admin_can_delete_any_lead() {
        let l = owned_pf(Uuid::new_v4());
        let s = setup(vec![l.clone()]);

        s.service.delete_lead(&Caller::admin(Uuid::new_v4()), l.id).await.unwrap();
        assert!(s.store.get(l.id).await.is_none());
    }

    #[tokio::test]
    async fn attached_quotation_unlocks_the_quotation_stage() {
        let dono = Uuid::new_v4();
        let mut l = owned_pf(dono);
        l.email = Some("maria@email.com".into());
        let s = setup(vec![l.clone()]);
        let caller = Caller::member(dono, []);
        let cotacao = by_name(&s.stages, "Envio de Cotação").id;

        assert!(s.service.request_move(&caller, l.id, Some(cotacao), None).await.is_err());

        let updated = s
            .service
            .attach_document(&caller, l.id, DocumentSlot::Cotacao, Some("leads/x/cotacao.pdf".into()))
            .await
            .unwrap();
        assert_eq!(updated.cotacao.as_deref(), Some("leads/x/cotacao.pdf"));

        let outcome = s.service.request_move(&caller, l.id, Some(cotacao), None).await.unwrap();
        assert_eq!(outcome.lead.stage_id, Some(cotacao));
    }

    #[tokio::test]
    async fn create_lead_into_gated_stage_is_validated() {
        let s = setup(vec![]);
        let dono = Uuid::new_v4();
        let negociacao = by_name(&s.stages, "Negociação").id;

        let novo = NewLead {
            tipo: "PF".into(),
            nome: "Ana".into(),
            stage_id: Some(negociacao),
            dados_extras: json!({}),
            ..Default::default()
        };
        let err = s.service.create_lead(&Caller::member(dono, []), novo.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::TransitionBlocked(TransitionBlocked::MissingContact)));

        let novo = NewLead { telefone: Some("11 95555-0000".into()), ..novo };
        let created = s.service.create_lead(&Caller::member(dono, []), novo).await.unwrap();
        assert_eq!(created.created_by, Some(dono));
        assert_eq!(created.stage_id, Some(negociacao));
    }

    #[tokio::test]
    async fn public_capture_lands_free_and_unassigned() {
        let s = setup(vec![]);
        let negociacao = by_name(&s.stages, "Negociação").id;

        let created = s
            .service
            .capture_public_lead(NewLead {
                tipo: "Familiar".into(),
                nome: "Família Souza".into(),
                created_by: Some(Uuid::new_v4()),
                stage_id: Some(negociacao),
                dados_extras: json!({}),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(created.livre);
        assert_eq!(created.created_by, None);
        assert_eq!(created.stage_id, None);

        // Qualquer membro enxerga e pode assumir
        let qualquer = Caller::member(Uuid::new_v4(), []);
        assert_eq!(s.service.list_leads(&qualquer).await.unwrap().len(), 1);
        let claimed = s.service.claim(&qualquer, created.id).await.unwrap();
        assert_eq!(claimed.created_by, Some(qualquer.user_id));
    }

    #[tokio::test]
    async fn only_admin_appends_stages_and_category_is_inferred() {
        let s = setup(vec![]);

        let err = s
            .service
            .create_stage(&Caller::member(Uuid::new_v4(), []), "Reunião", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let created = s
            .service
            .create_stage(&Caller::admin(Uuid::new_v4()), "Nova Cotação", None, None, None)
            .await
            .unwrap();
        assert_eq!(created.categoria, StageCategory::QuotationGate);
        assert_eq!(created.ordem, 7);
        assert_eq!(created.cor, DEFAULT_STAGE_COLOR);
    }

    #[tokio::test]
    async fn board_only_counts_visible_leads() {
        let eu = Uuid::new_v4();
        let mut meu = owned_pf(eu);
        meu.dados_extras = json!({ "valor_estimado": 300 });
        let mut alheio = owned_pf(Uuid::new_v4());
        alheio.dados_extras = json!({ "valor_estimado": 700 });
        let s = setup(vec![meu, alheio]);

        let board = s.service.board(&Caller::member(eu, [])).await.unwrap();
        assert_eq!(board.total_leads, 1);
        assert_eq!(board.valor_total, rust_decimal::Decimal::new(300, 0));

        let board = s.service.board(&Caller::admin(eu)).await.unwrap();
        assert_eq!(board.total_leads, 2);
    }

    #[tokio::test]
    async fn claim_lost_to_a_colleague_is_a_conflict() {
        let criador = Uuid::new_v4();
        let vencedor = Uuid::new_v4();
        let mut l = owned_pf(criador);
        l.livre = true;
        let s = setup(vec![l.clone()]);

        // Outro membro assume entre a leitura e a gravação
        s.store.interfere_before_next_write(move |lead| {
            lead.created_by = Some(vencedor);
            lead.livre = false;
            lead.versao += 1;
        });

        let perdedor = Caller::member(Uuid::new_v4(), []);
        let err = s.service.claim(&perdedor, l.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        let stored = s.store.get(l.id).await.unwrap();
        assert_eq!(stored.created_by, Some(vencedor));
        assert!(!stored.livre);
    }

    #[tokio::test]
    async fn claim_after_concurrent_edit_leaves_ownership_untouched() {
        let criador = Uuid::new_v4();
        let mut l = owned_pf(criador);
        l.livre = true;
        let s = setup(vec![l.clone()]);

        s.store.interfere_before_next_write(|lead| lead.versao += 1);

        let err = s.service.claim(&Caller::member(Uuid::new_v4(), []), l.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        let stored = s.store.get(l.id).await.unwrap();
        assert_eq!(stored.created_by, Some(criador));
        assert!(stored.livre);
    }

    #[tokio::test]
    async fn stale_version_on_edit_is_a_conflict() {
        let dono = Uuid::new_v4();
        let l = owned_pf(dono);
        let s = setup(vec![l.clone()]);
        let caller = Caller::member(dono, []);
        let patch = LeadPatch { nome: Some("Maria Souza".into()), ..Default::default() };

        let err = s.service.update_lead(&caller, l.id, patch.clone(), Some(5)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));
        assert_eq!(s.store.writes(), 0);

        // Versão certa na leitura, mas alguém gravou antes
        s.store.interfere_before_next_write(|lead| lead.versao += 1);
        let err = s.service.update_lead(&caller, l.id, patch, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));
        assert_eq!(s.store.get(l.id).await.unwrap().nome, l.nome);
    }

    #[tokio::test]
    async fn edit_cannot_break_the_current_stage_requirements() {
        let dono = Uuid::new_v4();
        let s0 = default_pipeline();
        let mut l = owned_pf(dono);
        l.telefone = Some("11 91111-2222".into());
        l.doc_identidade = Some("leads/x/rg.pdf".into());
        l.stage_id = Some(by_name(&s0, "Fechamento").id);
        let s = setup(vec![l.clone()]);
        let caller = Caller::member(dono, []);

        // Virar empresa no fechamento exige o documento da empresa
        let patch = LeadPatch { tipo: Some("PME".into()), ..Default::default() };
        let err = s.service.update_lead(&caller, l.id, patch, None).await.unwrap_err();
        assert!(matches!(err, AppError::TransitionBlocked(TransitionBlocked::MissingCompanyDocument)));

        let patch = LeadPatch { telefone: Some(None), ..Default::default() };
        let err = s.service.update_lead(&caller, l.id, patch, None).await.unwrap_err();
        assert!(matches!(err, AppError::TransitionBlocked(TransitionBlocked::MissingContact)));

        let err = s
            .service
            .attach_document(&caller, l.id, DocumentSlot::Identidade, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TransitionBlocked(TransitionBlocked::MissingIdentity)));
        assert_eq!(s.store.writes(), 0);

        // O que não mexe nas exigências passa normalmente
        let patch = LeadPatch { email: Some(Some("maria@email.com".into())), ..Default::default() };
        let updated = s.service.update_lead(&caller, l.id, patch, None).await.unwrap();
        assert_eq!(updated.email.as_deref(), Some("maria@email.com"));
    }

    #[tokio::test]
    async fn quotation_cannot_be_removed_while_in_quotation_stage() {
        let dono = Uuid::new_v4();
        let s0 = default_pipeline();
        let mut l = owned_pf(dono);
        l.email = Some("maria@email.com".into());
        l.cotacao = Some("leads/x/cotacao.pdf".into());
        l.stage_id = Some(by_name(&s0, "Envio de Cotação").id);
        let s = setup(vec![l.clone()]);

        let err = s
            .service
            .attach_document(&Caller::member(dono, []), l.id, DocumentSlot::Cotacao, Some("  ".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TransitionBlocked(TransitionBlocked::MissingQuotation)));
        assert_eq!(s.store.get(l.id).await.unwrap().cotacao, l.cotacao);
    }

    #[tokio::test]
    async fn appending_after_the_last_possible_order_is_rejected() {
        let mut topo = crate::services::transition_rules::fixtures::stage("Topo", 1, StageCategory::None);
        topo.ordem = i32::MAX;
        let store = Arc::new(MemoryLeadStore::with(vec![]));
        let registry = Arc::new(MemoryStageRegistry::with(vec![topo]));
        let service = PipelineService::new(store, registry);

        let err = service
            .create_stage(&Caller::admin(Uuid::new_v4()), "Outra", None, None, None)
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(errors) => assert!(errors.field_errors().contains_key("ordem")),
            other => panic!("esperava erro de validação, veio {other:?}"),
        }
        assert_eq!(service.list_stages().await.unwrap().len(), 1);
    }
}
