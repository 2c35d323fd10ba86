//! Process configuration: the environment variables the server reads at
//! startup (spec §6), distinct from the mutable `settings.json` store
//! (spec §3) which lives in [`crate::stores::settings_store`].

use std::path::PathBuf;

/// Whitelisted environment variables. Anything else is ignored, per spec §6.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub presenter_host: String,
    pub presenter_port: u16,
    pub web_host: String,
    pub web_port: u16,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
    pub public_tunnel_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub log_retention_days: u32,
    pub run_mode: RunMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            presenter_host: "127.0.0.1".to_string(),
            presenter_port: 50000,
            web_host: "127.0.0.1".to_string(),
            web_port: 8080,
            oauth_client_id: None,
            oauth_client_secret: None,
            public_tunnel_url: None,
            cors_origins: Vec::new(),
            log_retention_days: 14,
            run_mode: RunMode::Development,
        }
    }
}

impl EnvConfig {
    /// Reads the whitelisted set of environment variables, falling back to
    /// defaults for anything unset. Mirrors `EnvConfig::gather()` in the
    /// teacher's config loader.
    pub fn gather() -> Self {
        let defaults = Self::default();

        let presenter_host = std::env::var("PRESENTER_HOST")
            .ok()
            .map(|h| normalize_host(&h))
            .unwrap_or(defaults.presenter_host);

        let presenter_port = std::env::var("PRESENTER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.presenter_port);

        let web_host = std::env::var("WEB_HOST")
            .ok()
            .map(|h| normalize_host(&h))
            .unwrap_or(defaults.web_host);

        let web_port = std::env::var("WEB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.web_port);

        let oauth_client_id = std::env::var("OAUTH_CLIENT_ID").ok().filter(|s| !s.is_empty());
        let oauth_client_secret =
            std::env::var("OAUTH_CLIENT_SECRET").ok().filter(|s| !s.is_empty());

        let public_tunnel_url =
            std::env::var("PUBLIC_TUNNEL_URL").ok().filter(|s| !s.is_empty());

        let cors_origins = std::env::var("CORS_ORIGINS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let log_retention_days = std::env::var("LOG_RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.log_retention_days);

        let run_mode = match std::env::var("RUN_MODE").ok().as_deref() {
            Some("production") | Some("prod") => RunMode::Production,
            _ => RunMode::Development,
        };

        Self {
            presenter_host,
            presenter_port,
            web_host,
            web_port,
            oauth_client_id,
            oauth_client_secret,
            public_tunnel_url,
            cors_origins,
            log_retention_days,
            run_mode,
        }
    }

    pub fn oauth_configured(&self) -> bool {
        self.oauth_client_id.is_some() && self.oauth_client_secret.is_some()
    }

    /// The base URL browsers use to reach this server: the configured
    /// tunnel URL if set, otherwise `host:port` over plain HTTP (spec §4.4).
    pub fn public_base_url(&self) -> String {
        match &self.public_tunnel_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.web_host, self.web_port),
        }
    }

    /// `secure` cookie attribute is auto-detected from the tunnel URL
    /// scheme, per spec §4.2.
    pub fn serves_https(&self) -> bool {
        self.public_tunnel_url
            .as_deref()
            .map(|u| u.starts_with("https://"))
            .unwrap_or(false)
    }
}

/// Coerces `localhost` to `127.0.0.1` to avoid dual-stack mismatches where
/// the Presenter listens only on IPv4 (spec §9).
pub fn normalize_host(host: &str) -> String {
    if host.eq_ignore_ascii_case("localhost") {
        "127.0.0.1".to_string()
    } else {
        host.to_string()
    }
}

/// Root of the persisted layout, `<user-home>/.<app-id>/` (spec §6).
pub fn data_dir(app_id: &str) -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(format!(".{app_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_localhost_case_insensitively() {
        assert_eq!(normalize_host("localhost"), "127.0.0.1");
        assert_eq!(normalize_host("LOCALHOST"), "127.0.0.1");
        assert_eq!(normalize_host("192.168.1.5"), "192.168.1.5");
    }

    #[test]
    fn public_base_url_prefers_tunnel() {
        let mut cfg = EnvConfig::default();
        cfg.public_tunnel_url = Some("https://example.trycloudflare.com/".to_string());
        assert_eq!(cfg.public_base_url(), "https://example.trycloudflare.com");
        assert!(cfg.serves_https());

        cfg.public_tunnel_url = None;
        cfg.web_host = "127.0.0.1".to_string();
        cfg.web_port = 8080;
        assert_eq!(cfg.public_base_url(), "http://127.0.0.1:8080");
        assert!(!cfg.serves_https());
    }
}
