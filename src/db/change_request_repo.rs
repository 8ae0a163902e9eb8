// src/db/change_request_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::store::ApprovalQueue,
    models::change_request::{ChangeRequest, ChangeStatus, NewChangeRequest},
};

#[derive(Clone)]
pub struct ChangeRequestRepository {
    pool: PgPool,
}

impl ChangeRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalQueue for ChangeRequestRepository {
    async fn enqueue(&self, request: NewChangeRequest) -> Result<ChangeRequest, AppError> {
        let created = sqlx::query_as::<_, ChangeRequest>(
            r#"
            INSERT INTO change_requests (user_id, tipo, registro_id, motivo, dados, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, tipo, registro_id, motivo, dados, status, created_at
            "#,
        )
        .bind(request.user_id)
        .bind(request.tipo)
        .bind(request.registro_id)
        .bind(&request.motivo)
        .bind(&request.dados)
        .bind(ChangeStatus::Pendente)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_pending(&self) -> Result<Vec<ChangeRequest>, AppError> {
        let pending = sqlx::query_as::<_, ChangeRequest>(
            r#"
            SELECT id, user_id, tipo, registro_id, motivo, dados, status, created_at
            FROM change_requests
            WHERE status = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(ChangeStatus::Pendente)
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }
}
