use thiserror::Error;

/// Shown when the backend gives us nothing better to say.
pub const FALLBACK_MESSAGE: &str = "Ocorreu um erro na requisição.";

/// Failure talking to the weather backend or the character API.
///
/// "No data" is deliberately not represented here: empty pages and a missing
/// latest insight are `Option`/empty-vec shaped results, never errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network/transport failure before any backend answer arrived.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status. `message` is already
    /// normalized to a single human-readable line.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The backend answered success but the body did not match the schema.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Reduce a backend error body to one human-readable message.
///
/// Picking order: the first field-error's first message from an `errors`
/// map, else the `detail` string, else [`FALLBACK_MESSAGE`]. Tolerates
/// non-JSON bodies.
pub fn extract_error_message(body: &str) -> String {
    let Ok(data) = serde_json::from_str::<serde_json::Value>(body) else {
        return FALLBACK_MESSAGE.to_string();
    };

    if let Some(errors) = data.get("errors").and_then(|e| e.as_object()) {
        if let Some((_, first)) = errors.iter().next() {
            match first {
                serde_json::Value::Array(values) => {
                    if let Some(msg) = values.first().and_then(|v| v.as_str()) {
                        return msg.to_string();
                    }
                }
                serde_json::Value::String(msg) => return msg.clone(),
                _ => {}
            }
        }
    }

    if let Some(detail) = data.get("detail").and_then(|d| d.as_str()) {
        return detail.to_string();
    }

    FALLBACK_MESSAGE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_field_error_first_message() {
        let body = r#"{"errors": {"email": ["E-mail já cadastrado.", "outro"], "username": ["x"]}}"#;
        assert_eq!(extract_error_message(body), "E-mail já cadastrado.");
    }

    #[test]
    fn field_error_may_be_plain_string() {
        let body = r#"{"errors": {"password": "Senha muito curta."}}"#;
        assert_eq!(extract_error_message(body), "Senha muito curta.");
    }

    #[test]
    fn falls_back_to_detail() {
        let body = r#"{"detail": "Campo 'city' é obrigatório."}"#;
        assert_eq!(extract_error_message(body), "Campo 'city' é obrigatório.");
    }

    #[test]
    fn errors_map_wins_over_detail() {
        let body = r#"{"errors": {"city": ["inválida"]}, "detail": "ignored"}"#;
        assert_eq!(extract_error_message(body), "inválida");
    }

    #[test]
    fn hardcoded_fallback_for_unusable_bodies() {
        assert_eq!(extract_error_message("<html>502</html>"), FALLBACK_MESSAGE);
        assert_eq!(extract_error_message(""), FALLBACK_MESSAGE);
        assert_eq!(extract_error_message(r#"{"detail": {"nested": true}}"#), FALLBACK_MESSAGE);
    }
}
