use super::settings::Settings;
use super::ConfigError;

pub const MAX_EMBEDDING_DIMENSIONS: usize = 8192;

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    validate_required_string("server.host", &settings.server.host)?;
    validate_range(
        "server.request_timeout_secs",
        settings.server.request_timeout_secs,
        1,
        86_400,
    )?;
    for origin in &settings.server.cors_allowed_origins {
        validate_required_string("server.cors_allowed_origins", origin)?;
    }

    validate_required_string("rag.embedding_model", &settings.rag.embedding_model)?;
    if let Some(dims) = settings.rag.embedding_dimensions {
        validate_range(
            "rag.embedding_dimensions",
            dims as u64,
            1,
            MAX_EMBEDDING_DIMENSIONS as u64,
        )?;
    }

    validate_required_string("llm.completion_model", &settings.llm.completion_model)?;
    let base_url = settings.llm.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid("llm.base_url", "must be an http(s) URL"));
    }
    if let Some(temperature) = settings.llm.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }
    }

    Ok(())
}

fn validate_required_string(path: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(path, "must not be empty"));
    }
    Ok(())
}

fn validate_range(path: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(invalid(
            path,
            &format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn invalid(path: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut settings = Settings::default();
        settings.server.request_timeout_secs = 0;

        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("server.request_timeout_secs"));
    }

    #[test]
    fn rejects_oversized_dimensions_and_blank_model() {
        let mut settings = Settings::default();
        settings.rag.embedding_dimensions = Some(MAX_EMBEDDING_DIMENSIONS + 1);
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.rag.embedding_model = "  ".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut settings = Settings::default();
        settings.llm.base_url = "ftp://example.com".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
