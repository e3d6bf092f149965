//! OAuth2 Configuration
//!
//! Credenciais da aplicação Google e escopos fixos pedidos no consentimento

use serde::{Deserialize, Serialize};

use crate::config::settings::GoogleSettings;

/// Escopos pedidos no consentimento (fixos, não configuráveis)
pub const SCOPES: [&str; 3] = [
    // Leitura/escrita de planilhas
    "https://www.googleapis.com/auth/spreadsheets",
    // Email do usuário, usado para identificar quem autorizou
    "https://www.googleapis.com/auth/userinfo.email",
    // Arquivos abertos pelo Drive Picker
    "https://www.googleapis.com/auth/drive.file",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Config {
    /// Client ID da aplicação no Google Cloud Console
    pub client_id: String,

    /// Client Secret da aplicação
    pub client_secret: String,

    /// URL de callback registrada no Google (aponta para `GET /`)
    pub redirect_uri: String,

    /// Endpoint de consentimento
    pub auth_url: String,

    /// Endpoint de troca de tokens
    pub token_url: String,
}

impl From<&GoogleSettings> for OAuth2Config {
    fn from(google: &GoogleSettings) -> Self {
        Self {
            client_id: google.client_id.clone(),
            client_secret: google.client_secret.clone(),
            redirect_uri: google.redirect_uri.clone(),
            auth_url: google.auth_url.clone(),
            token_url: google.token_url.clone(),
        }
    }
}

impl OAuth2Config {
    /// Verifica se as credenciais obrigatórias foram preenchidas
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("CLIENT_ID", &self.client_id),
            ("CLIENT_SECRET", &self.client_secret),
            ("REDIRECT_URI", &self.redirect_uri),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} não configurado", name));
            }
        }
        Ok(())
    }
}
