// src/db/lead_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::LeadStore,
    models::lead::{Lead, LeadPatch, NewLead},
};

const LEAD_COLUMNS: &str = r#"
    id, tipo, nome, telefone, email, endereco, idade,
    created_by, livre, stage_id,
    doc_identidade, doc_empresa, comprovante_endereco, cotacao,
    dados_extras, versao, created_at, updated_at
"#;

// O repositório de leads, responsável por todas as interações com a tabela 'leads'
#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for LeadRepository {
    async fn list(&self) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    async fn create(&self, lead: NewLead) -> Result<Lead, AppError> {
        let created = sqlx::query_as::<_, Lead>(&format!(
            r#"
            INSERT INTO leads (
                tipo, nome, telefone, email, endereco, idade,
                created_by, livre, stage_id, dados_extras
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(&lead.tipo)
        .bind(&lead.nome)
        .bind(&lead.telefone)
        .bind(&lead.email)
        .bind(&lead.endereco)
        .bind(lead.idade)
        .bind(lead.created_by)
        .bind(lead.livre)
        .bind(lead.stage_id)
        .bind(&lead.dados_extras)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(
        &self,
        id: Uuid,
        expected_versao: i64,
        patch: LeadPatch,
    ) -> Result<Option<Lead>, AppError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE leads SET versao = versao + 1, updated_at = NOW()");

        // Só entram no SET as colunas presentes no patch
        if let Some(v) = patch.tipo { query.push(", tipo = ").push_bind(v); }
        if let Some(v) = patch.nome { query.push(", nome = ").push_bind(v); }
        if let Some(v) = patch.telefone { query.push(", telefone = ").push_bind(v); }
        if let Some(v) = patch.email { query.push(", email = ").push_bind(v); }
        if let Some(v) = patch.endereco { query.push(", endereco = ").push_bind(v); }
        if let Some(v) = patch.idade { query.push(", idade = ").push_bind(v); }
        if let Some(v) = patch.created_by { query.push(", created_by = ").push_bind(v); }
        if let Some(v) = patch.livre { query.push(", livre = ").push_bind(v); }
        if let Some(v) = patch.stage_id { query.push(", stage_id = ").push_bind(v); }
        if let Some(v) = patch.doc_identidade { query.push(", doc_identidade = ").push_bind(v); }
        if let Some(v) = patch.doc_empresa { query.push(", doc_empresa = ").push_bind(v); }
        if let Some(v) = patch.comprovante_endereco { query.push(", comprovante_endereco = ").push_bind(v); }
        if let Some(v) = patch.cotacao { query.push(", cotacao = ").push_bind(v); }
        if let Some(v) = patch.dados_extras { query.push(", dados_extras = ").push_bind(v); }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND versao = ")
            .push_bind(expected_versao)
            .push(" RETURNING ")
            .push(LEAD_COLUMNS);

        let updated = query
            .build_query_as::<Lead>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn claim(
        &self,
        id: Uuid,
        expected_versao: i64,
        new_owner: Uuid,
    ) -> Result<Option<Lead>, AppError> {
        let claimed = sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads
            SET created_by = $2, livre = FALSE, versao = versao + 1, updated_at = NOW()
            WHERE id = $1
              AND versao = $3
              AND livre = TRUE -- Só pega se ainda estiver livre
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_owner)
        .bind(expected_versao)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claimed)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
