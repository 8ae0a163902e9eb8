// src/db/memory.rs
//
// Implementações em memória dos stores, usadas pelos testes dos serviços.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

// Escrita de outro usuário que acontece entre a leitura e a gravação do serviço
type Interference = Box<dyn FnOnce(&mut Lead) + Send>;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{ApprovalQueue, LeadStore, StageRegistry},
    models::{
        change_request::{ChangeRequest, ChangeStatus, NewChangeRequest},
        lead::{Lead, LeadPatch, NewLead},
        stage::{NewStage, Stage},
    },
};

#[derive(Default)]
pub struct MemoryLeadStore {
    leads: Mutex<Vec<Lead>>,
    writes: AtomicUsize,
    // Simula banco fora do ar nas escritas
    failing: AtomicBool,
    interference: std::sync::Mutex<Option<Interference>>,
}

impl MemoryLeadStore {
    pub fn with(leads: Vec<Lead>) -> Self {
        Self { leads: Mutex::new(leads), ..Default::default() }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub async fn get(&self, id: Uuid) -> Option<Lead> {
        self.leads.lock().await.iter().find(|l| l.id == id).cloned()
    }

    pub fn interfere_before_next_write(&self, change: impl FnOnce(&mut Lead) + Send + 'static) {
        *self.interference.lock().unwrap() = Some(Box::new(change));
    }

    fn apply_interference(&self, leads: &mut [Lead], id: Uuid) {
        let change = self.interference.lock().unwrap().take();
        if let (Some(change), Some(lead)) = (change, leads.iter_mut().find(|l| l.id == id)) {
            change(lead);
        }
    }

    // Outro usuário gravou por fora: só sobe a versão
    pub async fn bump_version(&self, id: Uuid) {
        if let Some(lead) = self.leads.lock().await.iter_mut().find(|l| l.id == id) {
            lead.versao += 1;
        }
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn list(&self) -> Result<Vec<Lead>, AppError> {
        Ok(self.leads.lock().await.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(self.get(id).await)
    }

    async fn create(&self, novo: NewLead) -> Result<Lead, AppError> {
        self.check_available()?;
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            tipo: novo.tipo,
            nome: novo.nome,
            telefone: novo.telefone,
            email: novo.email,
            endereco: novo.endereco,
            idade: novo.idade,
            created_by: novo.created_by,
            livre: novo.livre,
            stage_id: novo.stage_id,
            doc_identidade: None,
            doc_empresa: None,
            comprovante_endereco: None,
            cotacao: None,
            dados_extras: novo.dados_extras,
            versao: 1,
            created_at: now,
            updated_at: now,
        };
        self.leads.lock().await.push(lead.clone());
        Ok(lead)
    }

    async fn update(
        &self,
        id: Uuid,
        expected_versao: i64,
        patch: LeadPatch,
    ) -> Result<Option<Lead>, AppError> {
        self.check_available()?;
        let mut leads = self.leads.lock().await;
        self.apply_interference(&mut leads, id);
        let Some(lead) = leads.iter_mut().find(|l| l.id == id && l.versao == expected_versao) else {
            return Ok(None);
        };
        patch.apply_to(lead);
        lead.versao += 1;
        lead.updated_at = Utc::now();
        Ok(Some(lead.clone()))
    }

    async fn claim(
        &self,
        id: Uuid,
        expected_versao: i64,
        new_owner: Uuid,
    ) -> Result<Option<Lead>, AppError> {
        self.check_available()?;
        let mut leads = self.leads.lock().await;
        self.apply_interference(&mut leads, id);
        let Some(lead) = leads
            .iter_mut()
            .find(|l| l.id == id && l.versao == expected_versao && l.livre)
        else {
            return Ok(None);
        };
        LeadPatch::claim_by(new_owner).apply_to(lead);
        lead.versao += 1;
        Ok(Some(lead.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.check_available()?;
        let mut leads = self.leads.lock().await;
        let before = leads.len();
        leads.retain(|l| l.id != id);
        Ok(leads.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryStageRegistry {
    stages: Mutex<Vec<Stage>>,
    reads: Arc<AtomicUsize>,
}

impl MemoryStageRegistry {
    pub fn with(stages: Vec<Stage>) -> Self {
        Self { stages: Mutex::new(stages), ..Default::default() }
    }

    // Quantas vezes o "banco" foi lido
    pub fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }
}

#[async_trait]
impl StageRegistry for MemoryStageRegistry {
    async fn list(&self) -> Result<Vec<Stage>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut stages = self.stages.lock().await.clone();
        stages.sort_by_key(|s| s.ordem);
        Ok(stages)
    }

    async fn create(&self, novo: NewStage) -> Result<Stage, AppError> {
        let stage = Stage {
            id: Uuid::new_v4(),
            nome: novo.nome,
            cor: novo.cor,
            ordem: novo.ordem,
            categoria: novo.categoria,
            created_at: Utc::now(),
        };
        self.stages.lock().await.push(stage.clone());
        Ok(stage)
    }
}

#[derive(Default)]
pub struct MemoryApprovalQueue {
    requests: Mutex<Vec<ChangeRequest>>,
}

impl MemoryApprovalQueue {
    pub async fn all(&self) -> Vec<ChangeRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ApprovalQueue for MemoryApprovalQueue {
    async fn enqueue(&self, request: NewChangeRequest) -> Result<ChangeRequest, AppError> {
        let created = ChangeRequest {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            tipo: request.tipo,
            registro_id: request.registro_id,
            motivo: request.motivo,
            dados: request.dados,
            status: ChangeStatus::Pendente,
            created_at: Utc::now(),
        };
        self.requests.lock().await.push(created.clone());
        Ok(created)
    }

    async fn list_pending(&self) -> Result<Vec<ChangeRequest>, AppError> {
        Ok(self
            .requests
            .lock()
            .await
            .iter()
            .filter(|r| r.status == ChangeStatus::Pendente)
            .cloned()
            .collect())
    }
}
