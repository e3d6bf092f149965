//! Leitura do email contido no `id_token`
//!
//! A assinatura NÃO é verificada: o token acabou de ser devolvido pelo próprio
//! endpoint de token do Google, então só decodificamos o payload.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    email: Option<String>,
}

/// Extrai o claim `email` do payload de um JWT (`header.payload.signature`)
pub fn decode_email(id_token: &str) -> Option<String> {
    let mut segments = id_token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: IdTokenClaims = serde_json::from_slice(&bytes).ok()?;

    claims.email.filter(|email| !email.is_empty())
}
