// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Stages ---
        handlers::stages::list_stages,
        handlers::stages::create_stage,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::get_board,
        handlers::leads::create_lead,
        handlers::leads::capture_public_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
        handlers::leads::attach_document,
        handlers::leads::move_lead,
        handlers::leads::claim_lead,
        handlers::leads::request_change,

        // --- Change Requests ---
        handlers::change_requests::list_pending,
    ),
    components(
        schemas(
            // --- Funil ---
            models::stage::StageCategory,
            models::stage::Stage,
            models::lead::Lead,
            models::lead::DocumentSlot,
            models::lead::SalesHandoff,
            models::lead::MoveOutcome,
            models::board::BoardColumn,
            models::board::Board,

            // --- Aprovação ---
            models::change_request::ChangeKind,
            models::change_request::ChangeStatus,
            models::change_request::ChangeRequest,

            // --- Payloads ---
            handlers::stages::CreateStagePayload,
            handlers::leads::CreateLeadPayload,
            handlers::leads::PublicLeadPayload,
            handlers::leads::UpdateLeadPayload,
            handlers::leads::AttachDocumentPayload,
            handlers::leads::MoveLeadPayload,
            handlers::leads::ChangeRequestPayload,
        )
    ),
    tags(
        (name = "Stages", description = "Etapas (colunas) do funil"),
        (name = "Leads", description = "Quadro kanban, cadastro e movimentação de leads"),
        (name = "Change Requests", description = "Fila de aprovação de alterações")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
