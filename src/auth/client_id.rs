//! Identificador do cliente
//!
//! O `clientId` chega como query param, vira o `state` do OAuth e também o nome
//! do arquivo no token store. Só aceitamos um conjunto restrito de caracteres
//! para que ele nunca escape do diretório de armazenamento.

use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidClientId {
    #[error("clientId vazio")]
    Empty,

    #[error("clientId excede 128 caracteres")]
    TooLong,

    #[error("clientId não pode começar com '.'")]
    LeadingDot,

    #[error("caractere inválido no clientId: {0:?}")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentifier(String);

impl ClientIdentifier {
    /// Valida o valor bruto: `[A-Za-z0-9_.-]`, sem '.' inicial, 1..=128 caracteres
    pub fn parse(raw: &str) -> Result<Self, InvalidClientId> {
        if raw.is_empty() {
            return Err(InvalidClientId::Empty);
        }
        if raw.len() > MAX_LEN {
            return Err(InvalidClientId::TooLong);
        }
        if raw.starts_with('.') {
            return Err(InvalidClientId::LeadingDot);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(InvalidClientId::InvalidChar(c));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
