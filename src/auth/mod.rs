//! # Google OAuth2 Relay Module
//!
//! ## Responsabilidades:
//! - Iniciar o consentimento do Google (authorization URL com `state=<clientId>`)
//! - Trocar authorization code por id_token + refresh token
//! - Persistir `{email, refreshToken}` por clientId
//! - Emitir access tokens a partir do refresh token salvo
//!
//! ## Estrutura:
//! - `config.rs`: Credenciais e escopos
//! - `client_id.rs`: Validação do clientId
//! - `client.rs`: Cliente HTTP do endpoint de token
//! - `id_token.rs`: Leitura do email no id_token
//! - `token_store.rs`: Persistência em arquivos
//! - `handlers.rs`: Handlers HTTP

pub mod config;
pub mod client_id;
pub mod client;
pub mod id_token;
pub mod token_store;
pub mod handlers;

pub use config::{OAuth2Config, SCOPES};
pub use client_id::{ClientIdentifier, InvalidClientId};
pub use client::{GoogleOAuthClient, ProviderError, ProviderReply, RefreshCredential};
pub use token_store::{StoredToken, TokenStore, UserToken};
pub use handlers::{start_oauth_flow, handle_oauth_callback, refresh_access_token};
