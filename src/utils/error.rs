use thiserror::Error;

/// Falhas de inicialização do serviço
///
/// Erros de requisição não passam por aqui: cada handler responde com o
/// status e o texto exatos do seu endpoint.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type AppResult<T> = Result<T, AppError>;
