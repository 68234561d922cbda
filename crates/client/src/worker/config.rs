//! Resolved worker settings derived from `AppConfig`.

use url::Url;

use super::route::{AssetClass, RouteTable};
use crate::fetch::canonicalize;
use shellcache_core::cache::RequestKey;
use shellcache_core::{AppConfig, Error, StoreName};

pub const ROLE_STATIC: &str = "static";
pub const ROLE_DYNAMIC: &str = "dynamic";
pub const ROLE_FONTS: &str = "fonts";

/// The current version's store names, one per role.
#[derive(Debug, Clone)]
pub struct StorePlan {
    pub shell: StoreName,
    pub dynamic: StoreName,
    pub fonts: StoreName,
}

impl StorePlan {
    pub fn new(prefix: &str, version: &str) -> Result<Self, Error> {
        Ok(Self {
            shell: StoreName::new(prefix, ROLE_STATIC, version)?,
            dynamic: StoreName::new(prefix, ROLE_DYNAMIC, version)?,
            fonts: StoreName::new(prefix, ROLE_FONTS, version)?,
        })
    }
}

/// Where a class reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Stores consulted in order; the first hit wins.
    pub reads: Vec<String>,
    pub write: String,
    /// Entry bound enforced after each write to `write`.
    pub max_entries: Option<usize>,
    /// Only same-origin (`basic`) responses may be stored.
    pub same_origin_only: bool,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub prefix: String,
    pub version: String,
    pub routes: RouteTable,
    /// App shell URLs, resolved against the origin.
    pub manifest: Vec<Url>,
    pub stores: StorePlan,
    pub max_dynamic_entries: usize,
}

impl WorkerConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let manifest = config
            .manifest
            .iter()
            .map(|entry| canonicalize(&origin, entry).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            prefix: config.cache_prefix.clone(),
            version: config.version.clone(),
            routes: RouteTable::from_config(origin, config),
            manifest,
            stores: StorePlan::new(&config.cache_prefix, &config.version)?,
            max_dynamic_entries: config.max_dynamic_entries,
        })
    }

    pub fn origin(&self) -> &Url {
        self.routes.origin()
    }

    pub fn in_manifest(&self, key: &RequestKey) -> bool {
        self.manifest.iter().any(|url| url.as_str() == key.url())
    }

    /// Store placement for a caching class. `None` for network-only classes.
    pub fn placement(&self, class: AssetClass, key: &RequestKey) -> Option<Placement> {
        match class {
            AssetClass::FontStylesheet | AssetClass::FontBinary => Some(Placement {
                reads: vec![self.stores.fonts.to_string()],
                write: self.stores.fonts.to_string(),
                max_entries: None,
                same_origin_only: false,
            }),
            AssetClass::OwnOriginStatic => {
                let shell = self.stores.shell.to_string();
                let dynamic = self.stores.dynamic.to_string();
                let (write, max_entries) = if self.in_manifest(key) {
                    (shell.clone(), None)
                } else {
                    (dynamic.clone(), Some(self.max_dynamic_entries))
                };
                Some(Placement { reads: vec![shell, dynamic], write, max_entries, same_origin_only: true })
            }
            AssetClass::TranslationService | AssetClass::Analytics | AssetClass::Unclassified => None,
        }
    }
}
