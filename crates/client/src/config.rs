//! Environment-driven client configuration.

/// Fallback API base URL for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/";

/// Base URL and logging flag consumed from the environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub logging_enabled: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            logging_enabled: false,
        }
    }

    /// Read `BLUEMINE_API_URL` and `BLUEMINE_ENABLE_LOGGING`.
    pub fn from_env() -> Self {
        let base_url = std::env::var("BLUEMINE_API_URL").unwrap_or_else(|_| {
            tracing::warn!("BLUEMINE_API_URL not set; using {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });

        let logging_enabled = std::env::var("BLUEMINE_ENABLE_LOGGING")
            .map(|v| v == "true")
            .unwrap_or(false);

        Self {
            base_url,
            logging_enabled,
        }
    }

    /// Join an API path onto the base URL, tolerating slashes on either side.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Resolve a server-relative asset path (avatars, uploads) against the
    /// base URL. Absolute and data/blob URLs pass through untouched.
    pub fn resolve_asset_url(&self, path: &str) -> Option<String> {
        let raw = path.trim();
        if raw.is_empty() {
            return None;
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://")
            || lower.starts_with("https://")
            || lower.starts_with("//")
            || lower.starts_with("data:")
            || lower.starts_with("blob:")
        {
            return Some(raw.to_string());
        }

        Some(self.endpoint(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_slashes_exactly_once() {
        let config = ClientConfig::new("http://api.local/");
        assert_eq!(config.endpoint("/task"), "http://api.local/task");
        assert_eq!(config.endpoint("task"), "http://api.local/task");

        let config = ClientConfig::new("http://api.local");
        assert_eq!(config.endpoint("/task"), "http://api.local/task");
    }

    #[test]
    fn asset_urls_pass_through_when_absolute() {
        let config = ClientConfig::new("http://api.local/");
        for absolute in [
            "https://cdn.example/avatar.png",
            "http://cdn.example/avatar.png",
            "//cdn.example/avatar.png",
            "data:image/png;base64,AAAA",
            "blob:abc-123",
        ] {
            assert_eq!(config.resolve_asset_url(absolute).as_deref(), Some(absolute));
        }
    }

    #[test]
    fn relative_assets_join_the_base_url() {
        let config = ClientConfig::new("http://api.local/");
        assert_eq!(
            config.resolve_asset_url("uploads/ada.png").as_deref(),
            Some("http://api.local/uploads/ada.png")
        );
        assert_eq!(
            config.resolve_asset_url("/uploads/ada.png").as_deref(),
            Some("http://api.local/uploads/ada.png")
        );
    }

    #[test]
    fn empty_asset_paths_resolve_to_none() {
        let config = ClientConfig::new("http://api.local/");
        assert_eq!(config.resolve_asset_url(""), None);
        assert_eq!(config.resolve_asset_url("   "), None);
    }
}
