/// Decides which origin, if any, may be echoed back in
/// `Access-Control-Allow-Origin`.
///
/// Entries are exact origins, except that a trailing `*` turns an entry into
/// a prefix wildcard. An empty allow-list allows any origin; that is a
/// deliberate backward-compatibility default for deployments which never set
/// the variable, kept as-is despite the security trade-off.
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// Returns the value to send as the allowed origin, or `None` when the
    /// request origin is not acceptable and the header must be omitted.
    pub fn allow_origin(&self, request_origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.is_empty() {
            return Some(request_origin.unwrap_or("*").to_string());
        }
        let origin = request_origin?;
        let matches = self.allowed_origins.iter().any(|allowed| {
            match allowed.strip_suffix('*') {
                Some(prefix) => origin.starts_with(prefix),
                None => origin == allowed,
            }
        });
        matches.then(|| origin.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::CorsPolicy;
    use googletest::prelude::*;

    #[test]
    fn empty_allow_list_echoes_any_origin() -> Result<()> {
        let policy = CorsPolicy::new(vec![]);

        verify_that!(
            policy.allow_origin(Some("https://anywhere.example")),
            some(eq("https://anywhere.example"))
        )
    }

    #[test]
    fn empty_allow_list_falls_back_to_wildcard_without_origin_header() -> Result<()> {
        let policy = CorsPolicy::new(vec![]);

        verify_that!(policy.allow_origin(None), some(eq("*")))
    }

    #[test]
    fn echoes_exactly_matching_origin() -> Result<()> {
        let policy = CorsPolicy::new(vec!["https://example.com".into()]);

        verify_that!(
            policy.allow_origin(Some("https://example.com")),
            some(eq("https://example.com"))
        )
    }

    #[test]
    fn rejects_unlisted_origin() -> Result<()> {
        let policy = CorsPolicy::new(vec!["https://example.com".into()]);

        verify_that!(policy.allow_origin(Some("https://evil.test")), none())
    }

    #[test]
    fn rejects_missing_origin_against_non_empty_allow_list() -> Result<()> {
        let policy = CorsPolicy::new(vec!["https://example.com".into()]);

        verify_that!(policy.allow_origin(None), none())
    }

    #[test]
    fn trailing_wildcard_matches_by_prefix() -> Result<()> {
        let policy = CorsPolicy::new(vec!["https://preview-*".into()]);

        verify_that!(
            policy.allow_origin(Some("https://preview-42.example.com")),
            some(eq("https://preview-42.example.com"))
        )
    }

    #[test]
    fn trailing_wildcard_does_not_match_other_prefixes() -> Result<()> {
        let policy = CorsPolicy::new(vec!["https://preview-*".into()]);

        verify_that!(policy.allow_origin(Some("https://prod.example.com")), none())
    }

    #[test]
    fn exact_entry_does_not_match_by_prefix() -> Result<()> {
        let policy = CorsPolicy::new(vec!["https://example.com".into()]);

        verify_that!(
            policy.allow_origin(Some("https://example.com.evil.test")),
            none()
        )
    }
}
