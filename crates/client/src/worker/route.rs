//! Request classification.
//!
//! Every intercepted request maps to exactly one asset class, derived from
//! its method, hostname and path alone.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::Request;
use shellcache_core::AppConfig;

/// Asset classes with distinct caching behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    OwnOriginStatic,
    FontStylesheet,
    FontBinary,
    TranslationService,
    Analytics,
    Unclassified,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::OwnOriginStatic => "own_origin_static",
            AssetClass::FontStylesheet => "font_stylesheet",
            AssetClass::FontBinary => "font_binary",
            AssetClass::TranslationService => "translation_service",
            AssetClass::Analytics => "analytics",
            AssetClass::Unclassified => "unclassified",
        }
    }
}

/// Outcome of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "route", content = "class")]
pub enum Route {
    /// Not intercepted; forwarded to the network untouched.
    Bypass,
    Intercept(AssetClass),
}

/// Host sets and page origin used to classify requests.
#[derive(Debug, Clone)]
pub struct RouteTable {
    origin: Url,
    font_hosts: Vec<String>,
    translate_hosts: Vec<String>,
    analytics_hosts: Vec<String>,
}

impl RouteTable {
    pub fn new(origin: Url, font_hosts: Vec<String>, translate_hosts: Vec<String>, analytics_hosts: Vec<String>) -> Self {
        let lower = |hosts: Vec<String>| -> Vec<String> { hosts.into_iter().map(|h| h.to_ascii_lowercase()).collect() };
        Self {
            origin,
            font_hosts: lower(font_hosts),
            translate_hosts: lower(translate_hosts),
            analytics_hosts: lower(analytics_hosts),
        }
    }

    pub fn from_config(origin: Url, config: &AppConfig) -> Self {
        Self::new(
            origin,
            config.font_hosts.clone(),
            config.translate_hosts.clone(),
            config.analytics_hosts.clone(),
        )
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Classify a request. Rules apply in priority order.
    pub fn classify(&self, request: &Request) -> Route {
        if !request.is_get() {
            return Route::Bypass;
        }
        Route::Intercept(self.classify_url(&request.url))
    }

    fn classify_url(&self, url: &Url) -> AssetClass {
        if let Some(host) = url.host_str() {
            if host_matches(host, &self.translate_hosts) {
                return AssetClass::TranslationService;
            }
            if host_matches(host, &self.analytics_hosts) {
                return AssetClass::Analytics;
            }
            if host_matches(host, &self.font_hosts) {
                return if is_stylesheet_path(url.path()) {
                    AssetClass::FontStylesheet
                } else {
                    AssetClass::FontBinary
                };
            }
        }

        if url.origin() == self.origin.origin() {
            return AssetClass::OwnOriginStatic;
        }

        AssetClass::Unclassified
    }
}

/// Exact host or any subdomain of it.
fn host_matches(host: &str, hosts: &[String]) -> bool {
    hosts.iter().any(|known| {
        host == known || host.strip_suffix(known.as_str()).is_some_and(|rest| rest.ends_with('.'))
    })
}

fn is_stylesheet_path(path: &str) -> bool {
    path.starts_with("/css") || path.ends_with(".css")
}
