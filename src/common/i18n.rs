// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::LazyLock;

pub const DEFAULT_LANG: &str = "pt";
pub const SUPPORTED_LANGS: &[&str] = &["pt", "en"];

// Mensagens de erro por idioma. Chave -> texto.
const PT: &[(&str, &str)] = &[
    ("error.validation", "Um ou mais campos são inválidos."),
    ("error.not_claimable", "Este lead não está livre para ser assumido."),
    ("error.empty_justification", "Informe uma justificativa para a solicitação."),
    ("error.change_request_not_needed", "Você já pode alterar este lead diretamente."),
    ("error.conflict", "O lead foi alterado por outra pessoa. Atualize o quadro e tente novamente."),
    ("error.forbidden", "Somente o responsável ou um administrador pode alterar este lead. Envie uma solicitação de alteração."),
    ("error.lead_not_found", "Lead não encontrado."),
    ("error.invalid_token", "Token de autenticação inválido ou ausente."),
    ("error.transient", "Serviço temporariamente indisponível. Tente novamente."),
    ("error.internal", "Ocorreu um erro inesperado."),
    ("transition.missing_quotation", "Anexe o documento de cotação antes de mover o lead para esta etapa."),
    ("transition.missing_contact", "Informe telefone ou e-mail do lead antes de mover para esta etapa."),
    ("transition.missing_identity", "Anexe o documento de identificação (RG/CNH) antes de mover o lead para esta etapa."),
    ("transition.missing_company_document", "Anexe o documento da empresa (cartão CNPJ) antes de mover o lead para esta etapa."),
    ("transition.unknown_stage", "Etapa de destino não encontrada."),
    ("field.required", "Campo obrigatório."),
    ("field.invalid_email", "E-mail inválido."),
    ("field.invalid_age", "Idade inválida."),
    ("field.invalid_length", "Tamanho inválido."),
    ("field.invalid_color", "Cor inválida. Use o formato #RRGGBB."),
    ("field.invalid_order", "Ordem inválida para a etapa."),
];

const EN: &[(&str, &str)] = &[
    ("error.validation", "One or more fields are invalid."),
    ("error.not_claimable", "This lead is not free to be claimed."),
    ("error.empty_justification", "A justification is required."),
    ("error.change_request_not_needed", "You can already change this lead directly."),
    ("error.conflict", "The lead was changed by someone else. Refresh the board and try again."),
    ("error.forbidden", "Only the owner or an administrator can change this lead. Submit a change request instead."),
    ("error.lead_not_found", "Lead not found."),
    ("error.invalid_token", "Invalid or missing authentication token."),
    ("error.transient", "Service temporarily unavailable. Please retry."),
    ("error.internal", "An unexpected error occurred."),
    ("transition.missing_quotation", "Attach the quotation document before moving the lead to this stage."),
    ("transition.missing_contact", "Provide a phone or email before moving the lead to this stage."),
    ("transition.missing_identity", "Attach the photo ID document before moving the lead to this stage."),
    ("transition.missing_company_document", "Attach the company registration document before moving the lead to this stage."),
    ("transition.unknown_stage", "Target stage not found."),
    ("field.required", "Required field."),
    ("field.invalid_email", "Invalid email."),
    ("field.invalid_age", "Invalid age."),
    ("field.invalid_length", "Invalid length."),
    ("field.invalid_color", "Invalid color. Use the #RRGGBB format."),
    ("field.invalid_order", "Invalid stage order."),
];

static BUILTIN: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let messages = SUPPORTED_LANGS
            .iter()
            .copied()
            .zip([PT, EN])
            .map(|(lang, entries)| (lang, entries.iter().copied().collect()))
            .collect();
        Self { messages }
    }

    pub fn builtin() -> &'static I18nStore {
        &BUILTIN
    }

    /// Busca a mensagem no idioma pedido, caindo para o português.
    pub fn translate(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.messages
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .copied()
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
