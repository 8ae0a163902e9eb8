// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::{DEFAULT_LANG, SUPPORTED_LANGS};

/// Idioma das mensagens de erro, negociado pelo `Accept-Language`.
pub struct Locale(pub String);

impl Locale {
    // Primeiro idioma da lista (já ordenada por peso) que temos traduzido.
    // "pt-BR" conta como "pt".
    pub fn negotiate(accept_language: Option<&str>) -> Self {
        let lang = accept_language
            .map(accept_language::parse)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tag| tag.split('-').next().map(str::to_lowercase))
            .find(|primary| SUPPORTED_LANGS.contains(&primary.as_str()))
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        Ok(Locale::negotiate(header))
    }
}
