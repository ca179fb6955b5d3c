/// Sender used when `FROM_EMAIL` is not configured.
pub const DEFAULT_SENDER: &str = "Product inquiry form <onboarding@resend.dev>";

/// Process-wide configuration, read from the environment once at startup and
/// immutable afterwards. Send-critical values stay optional so that the
/// handler can answer a misconfigured deployment with a 500 instead of
/// failing to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub resend_api_key: Option<String>,
    pub recipient: Option<String>,
    pub sender: String,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            resend_api_key: env_non_empty("RESEND_API_KEY"),
            recipient: env_non_empty("CONTACT_EMAIL"),
            sender: env_non_empty("FROM_EMAIL").unwrap_or_else(|| DEFAULT_SENDER.into()),
            allowed_origins: parse_origins(
                &std::env::var("ALLOWED_ORIGINS").unwrap_or_default(),
            ),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
