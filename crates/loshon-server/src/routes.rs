use axum::{
    middleware,
    routing::{delete, get, patch},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::{auth_middleware, optional_auth_middleware};
use crate::handlers::{archives as archive_handlers, documents as document_handlers};
use crate::repository::DynDocumentRepository;
use crate::search::DynSearchSync;
use crate::Config;

#[derive(Clone)]
pub struct AppState {
    pub repo: DynDocumentRepository,
    pub search: DynSearchSync,
    pub config: Config,
}

pub fn create_router(state: AppState) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);
    let allow_anonymous = middleware::from_fn_with_state(state.clone(), optional_auth_middleware);

    let document_routes = Router::new()
        .route(
            "/api/documents",
            get(document_handlers::list_documents)
                .post(document_handlers::create_document)
                .route_layer(require_auth.clone()),
        )
        .route(
            "/api/documents/_archives",
            get(archive_handlers::list_archived).route_layer(require_auth.clone()),
        )
        .route(
            "/api/documents/_restore/:id",
            patch(archive_handlers::restore_document).route_layer(require_auth.clone()),
        )
        .route(
            "/api/documents/_delete/:id",
            delete(archive_handlers::delete_document).route_layer(require_auth.clone()),
        )
        // Reads may be anonymous, writes may not.
        .route(
            "/api/documents/:id",
            get(document_handlers::get_document)
                .route_layer(allow_anonymous)
                .merge(
                    patch(document_handlers::update_document)
                        .delete(archive_handlers::archive_document)
                        .route_layer(require_auth),
                ),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/api", get(ping))
        .merge(document_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ping() -> Json<Value> {
    Json(json!({ "ping": "pong" }))
}
