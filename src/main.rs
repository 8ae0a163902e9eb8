//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, nível info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", settings.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Formulário do site: sem login
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/public/leads", post(handlers::leads::capture_public_lead));

    let stage_routes = Router::new()
        .route("/"
               ,get(handlers::stages::list_stages)
               .post(handlers::stages::create_stage)
        );

    let lead_routes = Router::new()
        .route("/"
               ,get(handlers::leads::list_leads)
               .post(handlers::leads::create_lead)
        )
        .route("/board", get(handlers::leads::get_board))
        .route("/{id}"
               ,patch(handlers::leads::update_lead)
               .delete(handlers::leads::delete_lead)
        )
        .route("/{id}/move", post(handlers::leads::move_lead))
        .route("/{id}/claim", post(handlers::leads::claim_lead))
        .route("/{id}/documents/{slot}", put(handlers::leads::attach_document))
        .route("/{id}/change-requests", post(handlers::leads::request_change));

    let change_request_routes = Router::new()
        .route("/", get(handlers::change_requests::list_pending));

    // Tudo aqui exige o Bearer do serviço de autenticação
    let protected_routes = Router::new()
        .nest("/api/stages", stage_routes)
        .nest("/api/leads", lead_routes)
        .nest("/api/change-requests", change_request_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
