use signflow_tokens::{DOWNLOAD_TOKEN_EXPIRY_DAYS, SIGNING_TOKEN_EXPIRY_DAYS};

/// Engine configuration, passed explicitly into every component
/// constructor. Nothing in the engine reads the environment or any other
/// ambient source.
#[derive(Clone, Debug)]
pub struct SignflowConfig {
    /// Public base URL signing and download links are built against,
    /// without a trailing slash.
    pub base_url: String,
    /// Signing-link lifetime in days, valid range 1..=30.
    pub token_expiry_days: u32,
    /// Download-link lifetime in days after completion.
    pub download_expiry_days: u32,
    /// Sender display name used when the creating user has none on file.
    pub sender_name_fallback: String,
}

impl Default for SignflowConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            token_expiry_days: SIGNING_TOKEN_EXPIRY_DAYS,
            download_expiry_days: DOWNLOAD_TOKEN_EXPIRY_DAYS,
            sender_name_fallback: "Someone".to_string(),
        }
    }
}

impl SignflowConfig {
    /// Set the signing-link lifetime, clamped to the supported 1..=30
    /// day range.
    pub fn with_token_expiry_days(mut self, days: u32) -> Self {
        self.token_expiry_days = days.clamp(1, 30);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Public signing-room link for a session token.
    pub fn signing_url(&self, token: &str) -> String {
        format!("{}/sign/{}", self.base_url, token)
    }

    /// Public download link for a download token.
    pub fn download_url(&self, token: &str) -> String {
        format!("{}/download/{}", self.base_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_expiry_is_clamped_to_supported_range() {
        assert_eq!(SignflowConfig::default().with_token_expiry_days(0).token_expiry_days, 1);
        assert_eq!(SignflowConfig::default().with_token_expiry_days(90).token_expiry_days, 30);
        assert_eq!(SignflowConfig::default().with_token_expiry_days(14).token_expiry_days, 14);
    }

    #[test]
    fn links_are_built_from_base_url() {
        let config = SignflowConfig::default().with_base_url("https://sign.example.com");
        assert_eq!(
            config.signing_url("abc123"),
            "https://sign.example.com/sign/abc123"
        );
        assert_eq!(
            config.download_url("def456"),
            "https://sign.example.com/download/def456"
        );
    }
}
