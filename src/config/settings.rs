use serde::{Deserialize, Serialize};
use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};

/// Endpoint de consentimento do Google
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Endpoint de troca de tokens do Google
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Diretório padrão dos refresh tokens (um arquivo por clientId)
pub const DEFAULT_TOKEN_DIR: &str = "RefreshTokens";

/// Variáveis de ambiente "legadas" mapeadas para chaves de configuração
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("CLIENT_ID", "google.client_id"),
    ("CLIENT_SECRET", "google.client_secret"),
    ("REDIRECT_URI", "google.redirect_uri"),
    ("PORT", "server.port"),
    ("TOKEN_STORE_DIR", "storage.directory"),
];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub google: GoogleSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageSettings {
    pub directory: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Self::builder_with_defaults()?
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("OAUTH_RELAY")
                    .prefix_separator("_")
                    .separator("__"),
            );

        // CLIENT_ID, CLIENT_SECRET e REDIRECT_URI têm precedência sobre tudo
        for (var, key) in ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Builder com os valores padrão (porta 3000, endpoints do Google, ./RefreshTokens)
    pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000_i64)?
            .set_default("google.auth_url", GOOGLE_AUTH_URL)?
            .set_default("google.token_url", GOOGLE_TOKEN_URL)?
            .set_default("storage.directory", DEFAULT_TOKEN_DIR)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
