//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List-valued fields take figment's array syntax in the environment,
/// e.g. `SHELLCACHE_FONT_HOSTS='[fonts.example.com]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding every cache store.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// The page's own origin; requests to it are own-origin static assets.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Naming-convention prefix of every store this core owns.
    ///
    /// Set via SHELLCACHE_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deployer-controlled version tag. Change it whenever cached content changes.
    ///
    /// Set via SHELLCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// App shell URLs, relative to `origin`, pre-cached on install.
    ///
    /// Set via SHELLCACHE_MANIFEST environment variable.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Hosts serving web font stylesheets and font files.
    ///
    /// Set via SHELLCACHE_FONT_HOSTS environment variable.
    #[serde(default = "default_font_hosts")]
    pub font_hosts: Vec<String>,

    /// Translation-service hosts, always network-only.
    ///
    /// Set via SHELLCACHE_TRANSLATE_HOSTS environment variable.
    #[serde(default = "default_translate_hosts")]
    pub translate_hosts: Vec<String>,

    /// Analytics hosts, always network-only.
    ///
    /// Set via SHELLCACHE_ANALYTICS_HOSTS environment variable.
    #[serde(default = "default_analytics_hosts")]
    pub analytics_hosts: Vec<String>,

    /// Maximum number of entries kept in the dynamic store.
    ///
    /// Set via SHELLCACHE_MAX_DYNAMIC_ENTRIES environment variable.
    #[serde(default = "default_max_dynamic_entries")]
    pub max_dynamic_entries: usize,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to read per response.
    ///
    /// Set via SHELLCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_prefix() -> String {
    "vishwa-samvidhan".into()
}

fn default_version() -> String {
    "v3.4".into()
}

fn default_manifest() -> Vec<String> {
    [
        "./",
        "index.html",
        "style.css",
        "script.js",
        "manifest.json",
        "assets/Vishwa-Samvidhan-Anthem.mp3",
        "assets/glogo.png",
        "assets/images/og-vishwa-samvidhan-nebula.jpg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_font_hosts() -> Vec<String> {
    vec!["fonts.googleapis.com".into(), "fonts.gstatic.com".into()]
}

fn default_translate_hosts() -> Vec<String> {
    vec!["translate.google.com".into(), "translate.googleapis.com".into()]
}

fn default_analytics_hosts() -> Vec<String> {
    vec!["google-analytics.com".into(), "googletagmanager.com".into()]
}

fn default_max_dynamic_entries() -> usize {
    50
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    26_214_400 // 25MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            version: default_version(),
            manifest: default_manifest(),
            font_hosts: default_font_hosts(),
            translate_hosts: default_translate_hosts(),
            analytics_hosts: default_analytics_hosts(),
            max_dynamic_entries: default_max_dynamic_entries(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured origin, parsed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        let parsed = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./shellcache.sqlite"));
        assert_eq!(config.origin, "http://localhost:8080");
        assert_eq!(config.cache_prefix, "vishwa-samvidhan");
        assert_eq!(config.version, "v3.4");
        assert_eq!(config.manifest.len(), 8);
        assert_eq!(config.manifest[0], "./");
        assert_eq!(config.font_hosts, vec!["fonts.googleapis.com", "fonts.gstatic.com"]);
        assert_eq!(config.max_dynamic_entries, 50);
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig::default();
        let origin = config.origin_url().unwrap();
        assert_eq!(origin.host_str(), Some("localhost"));
        assert_eq!(origin.port(), Some(8080));
    }

    #[test]
    fn test_origin_url_rejects_file_scheme() {
        let config = AppConfig { origin: "file:///var/www".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_load_from_env_and_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "shellcache.toml",
                r#"
                version = "v4"
                max_dynamic_entries = 10
                "#,
            )?;
            jail.set_env("SHELLCACHE_CONFIG_FILE", "shellcache.toml");
            jail.set_env("SHELLCACHE_MAX_DYNAMIC_ENTRIES", "20");
            jail.set_env("SHELLCACHE_ORIGIN", "https://samvidhan.example");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.version, "v4");
            assert_eq!(config.max_dynamic_entries, 20);
            assert_eq!(config.origin, "https://samvidhan.example");
            assert_eq!(config.cache_prefix, "vishwa-samvidhan");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_version() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SHELLCACHE_VERSION", "v-broken");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { field, .. }) if field == "version"));
            Ok(())
        });
    }
}
