// Biblioteca do relay OAuth2 do Google
// Expõe módulos e o router para uso em testes e no binário

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod handlers;
pub mod utils;

use auth::{GoogleOAuthClient, OAuth2Config, TokenStore};
use utils::AppResult;

// AppState é imutável depois do startup; nada é alterado por requisição
pub struct AppState {
    pub settings: config::Settings,
    pub oauth_client: GoogleOAuthClient,
    pub token_store: TokenStore,
}

impl AppState {
    pub fn from_settings(settings: config::Settings) -> AppResult<Self> {
        let oauth_client = GoogleOAuthClient::new(OAuth2Config::from(&settings.google))?;
        let token_store = TokenStore::new(&settings.storage.directory);

        Ok(Self {
            settings,
            oauth_client,
            token_store,
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Callback registrado como REDIRECT_URI no Google
        .route("/", get(auth::handle_oauth_callback))
        .route("/authorize", get(auth::start_oauth_flow))
        .route("/refreshToken", post(auth::refresh_access_token))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
