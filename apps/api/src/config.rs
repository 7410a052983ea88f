use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Absent key means the screener runs on the deterministic rules alone.
    pub anthropic_api_key: Option<String>,
    pub enable_llm: bool,
    pub port: u16,
    pub rust_log: String,
    pub rate_limit_per_minute: u32,
    pub question_count: usize,
    pub history_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            enable_llm: parse_flag(std::env::var("ENABLE_LLM").ok().as_deref(), true),
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            rate_limit_per_minute: parse_env("RATE_LIMIT_PER_MINUTE", 60)?,
            question_count: parse_env("QUESTION_COUNT", 5)?,
            history_limit: parse_env("HISTORY_LIMIT", 20)?,
        })
    }

    /// The API key to use, if LLM calls are enabled at all.
    pub fn llm_api_key(&self) -> Option<&str> {
        if !self.enable_llm {
            return None;
        }
        self.anthropic_api_key.as_deref()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            database_url: "postgres://localhost/screener".into(),
            redis_url: "redis://localhost".into(),
            s3_bucket: "transcripts".into(),
            s3_endpoint: "http://localhost:9000".into(),
            aws_access_key_id: "minio".into(),
            aws_secret_access_key: "minio123".into(),
            anthropic_api_key: Some("sk-test".into()),
            enable_llm: true,
            port: 8000,
            rust_log: "info".into(),
            rate_limit_per_minute: 60,
            question_count: 5,
            history_limit: 20,
        }
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("TRUE"), false));
        assert!(!parse_flag(Some("off"), true));
        assert!(parse_flag(Some("maybe"), true));
        assert!(!parse_flag(None, false));
    }

    #[test]
    fn test_llm_key_respects_flag() {
        let mut cfg = config();
        assert_eq!(cfg.llm_api_key(), Some("sk-test"));
        cfg.enable_llm = false;
        assert_eq!(cfg.llm_api_key(), None);
        cfg.enable_llm = true;
        cfg.anthropic_api_key = None;
        assert_eq!(cfg.llm_api_key(), None);
    }

    #[test]
    fn test_parse_env_default_and_error() {
        assert_eq!(
            parse_env::<u16>("SCREENER_TEST_UNSET_PORT_VAR", 8000).unwrap(),
            8000
        );
        std::env::set_var("SCREENER_TEST_BAD_COUNT_VAR", "five");
        assert!(parse_env::<usize>("SCREENER_TEST_BAD_COUNT_VAR", 5).is_err());
    }
}
