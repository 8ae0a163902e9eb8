// src/db/stage_repo.rs

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::store::StageRegistry,
    models::stage::{NewStage, Stage},
};

#[derive(Clone)]
pub struct StageRepository {
    pool: PgPool,
}

impl StageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StageRegistry for StageRepository {
    async fn list(&self) -> Result<Vec<Stage>, AppError> {
        let stages = sqlx::query_as::<_, Stage>(
            r#"
            SELECT id, nome, cor, ordem, categoria, created_at
            FROM stages
            ORDER BY ordem ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stages)
    }

    async fn create(&self, stage: NewStage) -> Result<Stage, AppError> {
        let created = sqlx::query_as::<_, Stage>(
            r#"
            INSERT INTO stages (nome, cor, ordem, categoria)
            VALUES ($1, $2, $3, $4)
            RETURNING id, nome, cor, ordem, categoria, created_at
            "#,
        )
        .bind(&stage.nome)
        .bind(&stage.cor)
        .bind(stage.ordem)
        .bind(stage.categoria)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}

/// Cache de leitura na frente do registro de etapas.
///
/// Etapas quase nunca mudam; toda inclusão invalida o cache e a próxima
/// leitura vai ao banco de novo.
pub struct CachedStageRegistry<R> {
    inner: R,
    cache: RwLock<Option<Arc<Vec<Stage>>>>,
}

impl<R: StageRegistry> CachedStageRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, cache: RwLock::new(None) }
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}

#[async_trait]
impl<R: StageRegistry> StageRegistry for CachedStageRegistry<R> {
    async fn list(&self) -> Result<Vec<Stage>, AppError> {
        if let Some(stages) = self.cache.read().await.as_ref() {
            return Ok(stages.as_ref().clone());
        }

        let mut guard = self.cache.write().await;
        // Outra requisição pode ter preenchido enquanto esperávamos o lock
        if let Some(stages) = guard.as_ref() {
            return Ok(stages.as_ref().clone());
        }

        let stages = Arc::new(self.inner.list().await?);
        *guard = Some(stages.clone());
        Ok(stages.as_ref().clone())
    }

    async fn create(&self, stage: NewStage) -> Result<Stage, AppError> {
        let created = self.inner.create(stage).await?;
        self.invalidate().await;
        Ok(created)
    }
}
