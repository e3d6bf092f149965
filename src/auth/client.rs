//! OAuth2 HTTP Client
//!
//! Cliente para o servidor OAuth2 do Google. É imutável depois de criado e
//! compartilhado entre requisições: o refresh token de cada chamada chega como
//! um `RefreshCredential` próprio da requisição.

use oauth2::basic::BasicClient;
use oauth2::url::Url;
use oauth2::{AuthUrl, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenUrl};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::utils::{AppError, AppResult, mask_secret};
use crate::utils::logging::*;
use super::config::SCOPES;
use super::{ClientIdentifier, OAuth2Config};

/// Falhas em que não há resposta HTTP utilizável do Google
///
/// Externamente todas viram o mesmo 400; internamente mantemos o motivo.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("falha de rede: {0}")]
    Network(#[source] reqwest::Error),

    #[error("timeout na chamada ao Google")]
    Timeout,

    #[error("resposta malformada: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Network(err)
        }
    }
}

/// Resposta do endpoint de token
#[derive(Debug)]
pub enum ProviderReply<T> {
    /// HTTP 200 com corpo já decodificado
    Ok(T),
    /// Qualquer outro status, com a reason phrase correspondente
    Status { code: u16, reason: String },
}

/// Corpo da troca `authorization_code`
#[derive(Debug, Deserialize)]
pub struct CodeExchange {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Corpo da troca `refresh_token`
#[derive(Debug, Deserialize)]
pub struct AccessGrant {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Credencial de uma única chamada de refresh
#[derive(Debug, Clone)]
pub struct RefreshCredential {
    refresh_token: String,
}

impl RefreshCredential {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self { refresh_token: refresh_token.into() }
    }
}

pub struct GoogleOAuthClient {
    config: OAuth2Config,
    oauth: BasicClient,
    http_client: Client,
}

impl GoogleOAuthClient {
    pub fn new(config: OAuth2Config) -> AppResult<Self> {
        config.validate().map_err(AppError::ConfigError)?;

        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| AppError::ConfigError(format!("URL de autorização inválida: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| AppError::ConfigError(format!("URL de token inválida: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| AppError::ConfigError(format!("REDIRECT_URI inválida: {}", e)))?;

        let oauth = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            config,
            oauth,
            http_client: Client::new(),
        })
    }

    /// URL de consentimento com acesso offline, escopos fixos e `state=<clientId>`
    pub fn authorize_url(&self, client_id: &ClientIdentifier) -> Url {
        let state = client_id.as_str().to_string();

        let (url, _state) = self
            .oauth
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(SCOPES.iter().map(|scope| Scope::new(scope.to_string())))
            .add_extra_param("access_type", "offline")
            .url();

        url
    }

    /// Troca o authorization code por id_token + refresh_token
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderReply<CodeExchange>, ProviderError> {
        log_info(&format!("🔐 [OAuth2] Trocando authorization code {} por tokens...", mask_secret(code, 6)));

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        self.post_token_request("exchange_code", &params).await
    }

    /// Obtém um novo access token a partir do refresh token da requisição
    pub async fn refresh_access_token(
        &self,
        credential: &RefreshCredential,
    ) -> Result<ProviderReply<AccessGrant>, ProviderError> {
        log_info(&format!(
            "🔄 [OAuth2] Renovando access token com refresh token {}",
            mask_secret(&credential.refresh_token, 6)
        ));

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", credential.refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        self.post_token_request("refresh_access_token", &params).await
    }

    async fn post_token_request<T: DeserializeOwned>(
        &self,
        operation: &str,
        params: &[(&str, &str)],
    ) -> Result<ProviderReply<T>, ProviderError> {
        let response = self.http_client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                let err = ProviderError::from(e);
                log_google_api_error(operation, None, &err.to_string());
                err
            })?;

        let status = response.status();

        if status != StatusCode::OK {
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            log_google_api_error(operation, Some(status.as_u16()), &reason);
            return Ok(ProviderReply::Status { code: status.as_u16(), reason });
        }

        let body = response.bytes().await.map_err(ProviderError::from)?;
        let parsed = serde_json::from_slice::<T>(&body).map_err(|e| {
            log_google_api_error(operation, Some(status.as_u16()), &e.to_string());
            ProviderError::MalformedResponse(e.to_string())
        })?;

        Ok(ProviderReply::Ok(parsed))
    }
}
