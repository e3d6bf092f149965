//! Token Store
//!
//! Persistência dos refresh tokens: um arquivo JSON por clientId em
//! `<diretório>/<clientId>.json`. Sem lock; a última escrita vence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils::logging::*;
use super::ClientIdentifier;

/// Email do usuário + refresh token obtidos no callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserToken {
    pub email: String,
    pub refresh_token: String,
}

/// Envelope gravado em disco: `{"userToken": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredToken {
    pub user_token: UserToken,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Falha ao criar diretório {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Falha ao gravar {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Falha ao serializar token: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    root: PathBuf,
}

impl TokenStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, client_id: &ClientIdentifier) -> PathBuf {
        self.root.join(format!("{}.json", client_id.as_str()))
    }

    /// Lê o token salvo para o clientId
    ///
    /// Qualquer falha (arquivo inexistente, JSON inválido) vira `None`; o motivo
    /// vai para o log.
    pub fn load(&self, client_id: &ClientIdentifier) -> Option<StoredToken> {
        let path = self.path_for(client_id);

        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                log_warning(&format!("📂 [TokenStore] {:?} ao ler token de '{}'", e.kind(), client_id));
                return None;
            }
        };

        if data.is_empty() {
            return None;
        }

        match serde_json::from_str::<StoredToken>(&data) {
            Ok(stored) => Some(stored),
            Err(e) => {
                log_error(&format!("❌ [TokenStore] Token de '{}' ilegível: {}", client_id, e));
                None
            }
        }
    }

    /// Grava (sobrescrevendo) o token do clientId, criando o diretório se preciso
    pub fn save(&self, client_id: &ClientIdentifier, user_token: &UserToken) -> Result<(), StoreError> {
        log_info(&format!("💾 [TokenStore] Salvando token de '{}'...", client_id));

        std::fs::create_dir_all(&self.root).map_err(|source| StoreError::CreateDir {
            path: self.root.clone(),
            source,
        })?;

        let stored = StoredToken { user_token: user_token.clone() };
        let data = serde_json::to_string(&stored)?;

        let path = self.path_for(client_id);
        std::fs::write(&path, data).map_err(|source| StoreError::Write { path, source })?;

        log_info(&format!("✅ [TokenStore] Token de '{}' salvo com sucesso", client_id));
        Ok(())
    }
}
