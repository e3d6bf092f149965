/// Utilitários de string para logar segredos (codes e tokens) sem expô-los

/// Trunca uma string sem cortar um caractere UTF-8 no meio
///
/// # Exemplo
/// ```
/// use google_oauth_relay::utils::string_utils::truncate_safe;
///
/// assert_eq!(truncate_safe("Olá, mundo!", 3), "Ol");
/// ```
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// Versão mascarada de um segredo para logs: primeiros bytes + "..."
///
/// Segredos curtos demais são omitidos por completo.
pub fn mask_secret(secret: &str, visible_bytes: usize) -> String {
    if secret.len() <= visible_bytes * 2 {
        return "***".to_string();
    }
    format!("{}...", truncate_safe(secret, visible_bytes))
}
