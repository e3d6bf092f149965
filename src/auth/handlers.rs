//! OAuth2 HTTP Handlers
//!
//! `GET /authorize` inicia o consentimento, `GET /` recebe o callback do Google
//! e `POST /refreshToken` troca o refresh token salvo por um access token.
//!
//! Os textos de erro são consumidos pelo add-on cliente e não devem mudar.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::utils::logging::*;
use crate::AppState;
use super::client::{AccessGrant, ProviderReply, RefreshCredential};
use super::id_token::decode_email;
use super::token_store::UserToken;
use super::ClientIdentifier;

const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
const INVALID_CLIENT_ID: &str = "Invalid clientId";
const AUTH_CODE_OR_CLIENT_ID_MISSING: &str = "Auth Code or clientId Missing";
const NO_RESPONSE_ON_EXCHANGE: &str = "no response from google api.";
const NO_TOKEN_OR_EMAIL: &str = "no token or no email";
const PERSIST_FAILED: &str = "Failed to persist token";
const EXHAUSTIVE_UNHANDLED_ERROR: &str = "Exhaustive Unhandled Error";
const CLIENT_ID_REQUIRED: &str = "Client ID is required";
const NO_TOKEN_FOUND: &str = "No token found";
const NO_TOKEN_AVAILABLE: &str = "no token available";
const NO_RESPONSE_ON_REFRESH: &str = "no response form google api.";

/// Parâmetros de `/authorize` e `/refreshToken`
#[derive(Debug, Deserialize)]
pub struct ClientIdParams {
    #[serde(rename = "clientId")]
    client_id: Option<String>,
}

/// Parâmetros do callback OAuth2
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    /// Authorization code retornado pelo Google
    code: Option<String>,
    /// clientId enviado como `state` em `/authorize`
    state: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Status do Google repassado ao chamador
fn provider_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// GET /authorize?clientId=XXX
///
/// Redireciona (302) para o consentimento do Google com `state=<clientId>`
pub async fn start_oauth_flow(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClientIdParams>,
) -> Result<Response, (StatusCode, String)> {
    log_request_received("/authorize", "GET");

    let raw_client_id = non_empty(params.client_id).ok_or_else(|| {
        log_error("❌ [OAuth2] Error in /authorize: Missing client ID");
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR.to_string())
    })?;

    let client_id = ClientIdentifier::parse(&raw_client_id).map_err(|e| {
        log_validation_error("clientId", &e.to_string());
        (StatusCode::BAD_REQUEST, INVALID_CLIENT_ID.to_string())
    })?;

    let auth_url = state.oauth_client.authorize_url(&client_id);

    log_info(&format!("↗️  [OAuth2] Redirecionando '{}' para o consentimento do Google", client_id));

    Ok((StatusCode::FOUND, [(header::LOCATION, auth_url.to_string())]).into_response())
}

/// Milissegundos desde `start`, saturando em `u64::MAX`
fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// GET /?code=XXX&state=CLIENT_ID
///
/// Troca o code por tokens, salva `{email, refreshToken}` e mostra a confirmação
pub async fn handle_oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    let start_time = Instant::now();
    log_request_received("/", "GET");

    let response = complete_callback(&state, params).await.into_response();

    log_request_processed("/", response.status().as_u16(), elapsed_ms(start_time));
    response
}

async fn complete_callback(
    state: &AppState,
    params: OAuthCallbackParams,
) -> Result<Html<String>, (StatusCode, String)> {
    let (Some(code), Some(raw_client_id)) = (non_empty(params.code), non_empty(params.state)) else {
        log_validation_error("code/state", AUTH_CODE_OR_CLIENT_ID_MISSING);
        return Err((StatusCode::BAD_REQUEST, AUTH_CODE_OR_CLIENT_ID_MISSING.to_string()));
    };

    let client_id = ClientIdentifier::parse(&raw_client_id).map_err(|e| {
        log_validation_error("state", &e.to_string());
        (StatusCode::BAD_REQUEST, INVALID_CLIENT_ID.to_string())
    })?;

    let reply = state.oauth_client.exchange_code(&code).await.map_err(|e| {
        log_error(&format!("❌ [OAuth2] Sem resposta do Google na troca do code: {}", e));
        (StatusCode::BAD_REQUEST, NO_RESPONSE_ON_EXCHANGE.to_string())
    })?;

    let tokens = match reply {
        ProviderReply::Ok(tokens) => tokens,
        ProviderReply::Status { code, reason } => {
            log_error(&format!("❌ [OAuth2] Error exchanging code for tokens. {}", reason));
            return Err((provider_status(code), reason));
        }
    };

    let (Some(id_token), Some(refresh_token)) = (non_empty(tokens.id_token), non_empty(tokens.refresh_token)) else {
        log_error("❌ [OAuth2] Resposta 200 sem id_token ou refresh_token");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, EXHAUSTIVE_UNHANDLED_ERROR.to_string()));
    };

    let email = decode_email(&id_token).ok_or_else(|| {
        log_error("❌ [OAuth2] id_token sem email");
        (StatusCode::INTERNAL_SERVER_ERROR, NO_TOKEN_OR_EMAIL.to_string())
    })?;

    let user_token = UserToken { email, refresh_token };

    state.token_store.save(&client_id, &user_token).map_err(|e| {
        log_error(&format!("❌ [OAuth2] Error saving refresh token: {}", e));
        (StatusCode::INTERNAL_SERVER_ERROR, PERSIST_FAILED.to_string())
    })?;

    Ok(render_success_page(&user_token))
}

/// POST /refreshToken?clientId=XXX
///
/// Retorna `{token, email}` com um access token novo para o clientId
pub async fn refresh_access_token(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClientIdParams>,
) -> Response {
    let start_time = Instant::now();
    log_request_received("/refreshToken", "POST");

    let response = match issue_access_token(&state, params).await {
        Ok(body) => body.into_response(),
        Err(response) => response,
    };

    log_request_processed("/refreshToken", response.status().as_u16(), elapsed_ms(start_time));
    response
}

async fn issue_access_token(state: &AppState, params: ClientIdParams) -> Result<Json<Value>, Response> {
    let Some(raw_client_id) = non_empty(params.client_id) else {
        log_validation_error("clientId", CLIENT_ID_REQUIRED);
        return Err(json_error(StatusCode::BAD_REQUEST, CLIENT_ID_REQUIRED));
    };

    let client_id = ClientIdentifier::parse(&raw_client_id).map_err(|e| {
        log_validation_error("clientId", &e.to_string());
        json_error(StatusCode::BAD_REQUEST, INVALID_CLIENT_ID)
    })?;

    let Some(stored) = state.token_store.load(&client_id) else {
        return Err((StatusCode::NOT_FOUND, NO_TOKEN_FOUND).into_response());
    };

    let UserToken { email, refresh_token } = stored.user_token;

    if refresh_token.is_empty() {
        return Err(json_error(StatusCode::NOT_FOUND, NO_TOKEN_AVAILABLE));
    }

    let credential = RefreshCredential::new(refresh_token);

    match state.oauth_client.refresh_access_token(&credential).await {
        Ok(ProviderReply::Ok(AccessGrant { access_token: Some(token), .. })) if !token.is_empty() => {
            log_info(&format!("✅ [OAuth2] Access token renovado para '{}'", client_id));
            Ok(Json(json!({ "token": token, "email": email })))
        }
        Ok(ProviderReply::Ok(_)) => {
            log_warning(&format!("⚠️  [OAuth2] Google respondeu 200 sem access_token para '{}'", client_id));
            Err((StatusCode::OK, "OK").into_response())
        }
        Ok(ProviderReply::Status { code, reason }) => Err((provider_status(code), reason).into_response()),
        Err(e) => {
            log_error(&format!("❌ [OAuth2] Sem resposta do Google no refresh: {}", e));
            Err((StatusCode::BAD_REQUEST, NO_RESPONSE_ON_REFRESH).into_response())
        }
    }
}

/// Renderizar página de sucesso
///
/// Email e token passam por escape de HTML antes de entrar no markup.
fn render_success_page(user_token: &UserToken) -> Html<String> {
    let email = html_escape::encode_text(&user_token.email);
    let token = html_escape::encode_text(&user_token.refresh_token);

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Authorization Success</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Arial, sans-serif;
               max-width: 700px; margin: 50px auto; padding: 20px; background: #f5f5f5; }}
        .container {{ background: white; padding: 30px; border-radius: 12px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}
        .row {{ display: flex; align-items: center; gap: 5px; }}
        h1 {{ color: #28a745; margin-top: 0; }}
        #token {{ font-family: 'Courier New', monospace; word-break: break-all; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Authorization Successful!</h1>

        <div class="row">
            <div>Email: </div>
            <p id="email">{}</p>
        </div>

        <div class="row">
            <div>Access Token: </div>
            <p id="token">{}</p>
        </div>
    </div>
</body>
</html>
"#,
        email, token
    ))
}
