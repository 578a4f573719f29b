#[cfg(test)]
mod tests {
    use crate::config::ApiConfig;
    use crate::http::RateLimitedHttpClient;
    use crate::portal::PortalError;

    #[tokio::test]
    async fn test_client_builds_with_session_cookie() {
        let api = ApiConfig {
            session_cookie: Some("abc123".to_string()),
            ..ApiConfig::default()
        };

        let client = RateLimitedHttpClient::new(&api).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");

        // Invalidation is safe on an empty cache
        client.invalidate_cache_pattern("2026-03").await;
    }

    #[test]
    fn test_login_url_uses_web_origin_when_configured() {
        let api = ApiConfig {
            base_url: "https://api.example.com/".to_string(),
            login_base_url: Some("https://portal.example.com".to_string()),
            login_path: "/login".to_string(),
            ..ApiConfig::default()
        };

        let client = RateLimitedHttpClient::new(&api).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(client.login_url(), "https://portal.example.com/login");
    }

    #[test]
    fn test_cookie_with_control_characters_is_rejected() {
        let api = ApiConfig {
            session_cookie: Some("bad\nvalue".to_string()),
            ..ApiConfig::default()
        };

        let err = RateLimitedHttpClient::new(&api).unwrap_err();
        assert!(matches!(err, PortalError::NetworkError(_)));
    }
}
