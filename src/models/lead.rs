// src/models/lead.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::stage::fold_accents;

// Chave dentro de `dados_extras` que alimenta os totais por etapa
pub const VALOR_ESTIMADO_KEY: &str = "valor_estimado";

// Modalidades de pessoa física. Qualquer outra é tratada como empresa.
const MODALIDADES_PF: &[&str] = &["pf", "individual", "familiar", "adesao"];

// --- LEAD (O registro do funil) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,

    #[schema(example = "PF")]
    pub tipo: String,
    #[schema(example = "Maria da Silva")]
    pub nome: String,

    #[schema(example = "+55 11 91234-5678")]
    pub telefone: Option<String>,
    #[schema(example = "maria@email.com")]
    pub email: Option<String>,
    pub endereco: Option<String>,
    #[schema(example = 34)]
    pub idade: Option<i32>,

    // Dono do lead. Nulo quando veio da captação pública.
    pub created_by: Option<Uuid>,
    // Lead livre pode ser assumido por qualquer membro da equipe
    pub livre: bool,

    // Nulo = fora de qualquer coluna
    pub stage_id: Option<Uuid>,

    // Caminhos no storage. O núcleo só olha se estão preenchidos.
    pub doc_identidade: Option<String>,
    pub doc_empresa: Option<String>,
    pub comprovante_endereco: Option<String>,
    pub cotacao: Option<String>,

    // Campos livres do formulário (dependentes, coparticipação, carências...)
    #[schema(value_type = Object, example = json!({"valor_estimado": 1500.5}))]
    pub dados_extras: Value,

    #[schema(example = 3)]
    pub versao: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn is_pessoa_fisica(&self) -> bool {
        let tipo = fold_accents(&self.tipo.trim().to_lowercase());
        MODALIDADES_PF.contains(&tipo.as_str())
    }

    pub fn has_contact(&self) -> bool {
        is_filled(&self.telefone) || is_filled(&self.email)
    }

    pub fn document(&self, slot: DocumentSlot) -> Option<&str> {
        let value = match slot {
            DocumentSlot::Identidade => &self.doc_identidade,
            DocumentSlot::Empresa => &self.doc_empresa,
            DocumentSlot::ComprovanteEndereco => &self.comprovante_endereco,
            DocumentSlot::Cotacao => &self.cotacao,
        };
        value.as_deref().filter(|path| !path.trim().is_empty())
    }

    pub fn valor_estimado(&self) -> Option<Decimal> {
        parse_valor(self.dados_extras.get(VALOR_ESTIMADO_KEY)?)
    }
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// Teto de um valor de negociação; acima disso o dado é lixo e não entra nos totais
const VALOR_MAXIMO: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0); // 1_000_000_000_000

// Aceita número JSON, "1500.50" ou o formato brasileiro "1.500,50" / "1.500"
fn parse_valor(value: &Value) -> Option<Decimal> {
    let valor = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok()?,
        Value::String(s) => {
            let s = s.trim().trim_start_matches("R$").trim();
            if s.contains(',') || is_thousands_grouped(s) {
                Decimal::from_str(&s.replace('.', "").replace(',', ".")).ok()?
            } else {
                Decimal::from_str(s).ok()?
            }
        }
        _ => return None,
    };

    (Decimal::ZERO..=VALOR_MAXIMO).contains(&valor).then_some(valor)
}

// "1.500" ou "12.345.678": pontos só como separador de milhar
fn is_thousands_grouped(s: &str) -> bool {
    let mut grupos = s.split('.');
    let primeiro = grupos.next().unwrap_or_default();
    let resto: Vec<&str> = grupos.collect();

    !resto.is_empty()
        && (1..=3).contains(&primeiro.len())
        && !primeiro.starts_with('0')
        && primeiro.chars().all(|c| c.is_ascii_digit())
        && resto.iter().all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

// --- SLOTS DE DOCUMENTO ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    /// RG / CNH
    Identidade,
    /// Cartão CNPJ / contrato social
    Empresa,
    ComprovanteEndereco,
    Cotacao,
}

impl DocumentSlot {
    pub fn column(self) -> &'static str {
        match self {
            DocumentSlot::Identidade => "doc_identidade",
            DocumentSlot::Empresa => "doc_empresa",
            DocumentSlot::ComprovanteEndereco => "comprovante_endereco",
            DocumentSlot::Cotacao => "cotacao",
        }
    }
}

// --- ESCRITAS ---

// Dados para inserir um lead novo
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub tipo: String,
    pub nome: String,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub endereco: Option<String>,
    pub idade: Option<i32>,
    pub created_by: Option<Uuid>,
    pub livre: bool,
    pub stage_id: Option<Uuid>,
    pub dados_extras: Value,
}

/// Atualização parcial de um lead.
///
/// `None` deixa a coluna como está; `Some(None)` grava NULL.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub tipo: Option<String>,
    pub nome: Option<String>,
    pub telefone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub endereco: Option<Option<String>>,
    pub idade: Option<Option<i32>>,
    pub created_by: Option<Option<Uuid>>,
    pub livre: Option<bool>,
    pub stage_id: Option<Option<Uuid>>,
    pub doc_identidade: Option<Option<String>>,
    pub doc_empresa: Option<Option<String>>,
    pub comprovante_endereco: Option<Option<String>>,
    pub cotacao: Option<Option<String>>,
    pub dados_extras: Option<Value>,
}

impl LeadPatch {
    pub fn move_to(stage_id: Option<Uuid>) -> Self {
        Self { stage_id: Some(stage_id), ..Default::default() }
    }

    // Os dois campos mudam juntos ou nenhum muda
    pub fn claim_by(user_id: Uuid) -> Self {
        Self { created_by: Some(Some(user_id)), livre: Some(false), ..Default::default() }
    }

    pub fn document(slot: DocumentSlot, path: Option<String>) -> Self {
        let mut patch = Self::default();
        match slot {
            DocumentSlot::Identidade => patch.doc_identidade = Some(path),
            DocumentSlot::Empresa => patch.doc_empresa = Some(path),
            DocumentSlot::ComprovanteEndereco => patch.comprovante_endereco = Some(path),
            DocumentSlot::Cotacao => patch.cotacao = Some(path),
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.tipo.is_none()
            && self.nome.is_none()
            && self.telefone.is_none()
            && self.email.is_none()
            && self.endereco.is_none()
            && self.idade.is_none()
            && self.created_by.is_none()
            && self.livre.is_none()
            && self.stage_id.is_none()
            && self.doc_identidade.is_none()
            && self.doc_empresa.is_none()
            && self.comprovante_endereco.is_none()
            && self.cotacao.is_none()
            && self.dados_extras.is_none()
    }

    /// Aplica o patch sobre uma cópia em memória (sem mexer em versão/datas).
    pub fn apply_to(&self, lead: &mut Lead) {
        if let Some(v) = &self.tipo { lead.tipo = v.clone(); }
        if let Some(v) = &self.nome { lead.nome = v.clone(); }
        if let Some(v) = &self.telefone { lead.telefone = v.clone(); }
        if let Some(v) = &self.email { lead.email = v.clone(); }
        if let Some(v) = &self.endereco { lead.endereco = v.clone(); }
        if let Some(v) = self.idade { lead.idade = v; }
        if let Some(v) = self.created_by { lead.created_by = v; }
        if let Some(v) = self.livre { lead.livre = v; }
        if let Some(v) = self.stage_id { lead.stage_id = v; }
        if let Some(v) = &self.doc_identidade { lead.doc_identidade = v.clone(); }
        if let Some(v) = &self.doc_empresa { lead.doc_empresa = v.clone(); }
        if let Some(v) = &self.comprovante_endereco { lead.comprovante_endereco = v.clone(); }
        if let Some(v) = &self.cotacao { lead.cotacao = v.clone(); }
        if let Some(v) = &self.dados_extras { lead.dados_extras = v.clone(); }
    }
}

// Distingue campo ausente (None) de `null` explícito (Some(None)) nos payloads
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- HAND-OFF PARA O CADASTRO DE VENDA ---

// Pré-preenchimento enviado ao fluxo de registro de venda
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesHandoff {
    pub lead_id: Uuid,
    pub nome: String,
    pub tipo: String,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub endereco: Option<String>,
    pub idade: Option<i32>,
}

impl From<&Lead> for SalesHandoff {
    fn from(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id,
            nome: lead.nome.clone(),
            tipo: lead.tipo.clone(),
            telefone: lead.telefone.clone(),
            email: lead.email.clone(),
            endereco: lead.endereco.clone(),
            idade: lead.idade,
        }
    }
}

// Resultado de um "arrastar e soltar" bem-sucedido
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub lead: Lead,
    // Dispara a comemoração na tela
    pub celebrar: bool,
    pub handoff: Option<SalesHandoff>,
    // O quadro em cache no cliente deve ser buscado de novo
    pub invalidar: bool,
}
