//! Versioned store names.
//!
//! A store name is `{prefix}-{role}-{version}`, or `{prefix}-{version}` for
//! the role-less single-store layout. Version tags never contain `-`, so the
//! last dash-separated segment is always the version.

use std::fmt;

use crate::Error;

/// Check that a version tag can be embedded in a store name.
pub fn validate_version(version: &str) -> Result<(), &'static str> {
    if version.is_empty() {
        return Err("must not be empty");
    }
    if version.contains('-') {
        return Err("must not contain '-'");
    }
    if version.chars().any(char::is_whitespace) {
        return Err("must not contain whitespace");
    }
    Ok(())
}

/// A store name decomposed into its naming-convention parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreName {
    prefix: String,
    role: Option<String>,
    version: String,
}

impl StoreName {
    /// Build a role-specific store name.
    pub fn new(prefix: &str, role: &str, version: &str) -> Result<Self, Error> {
        validate_version(version).map_err(|reason| Error::InvalidStoreName(format!("version {version:?} {reason}")))?;
        if role.is_empty() {
            return Err(Error::InvalidStoreName("role must not be empty".into()));
        }
        Ok(Self { prefix: prefix.to_string(), role: Some(role.to_string()), version: version.to_string() })
    }

    /// Build a role-less store name (`{prefix}-{version}`).
    pub fn unscoped(prefix: &str, version: &str) -> Result<Self, Error> {
        validate_version(version).map_err(|reason| Error::InvalidStoreName(format!("version {version:?} {reason}")))?;
        Ok(Self { prefix: prefix.to_string(), role: None, version: version.to_string() })
    }

    /// Parse a raw store name under the given prefix.
    ///
    /// Returns `None` when the name belongs to a different naming convention.
    pub fn parse(prefix: &str, name: &str) -> Option<Self> {
        let rest = name.strip_prefix(prefix)?.strip_prefix('-')?;
        let (role, version) = match rest.rsplit_once('-') {
            Some((role, version)) => (Some(role), version),
            None => (None, rest),
        };
        if validate_version(version).is_err() || role.is_some_and(str::is_empty) {
            return None;
        }
        Some(Self { prefix: prefix.to_string(), role: role.map(String::from), version: version.to_string() })
    }

    /// Whether a raw store name is owned by the given prefix.
    pub fn is_owned_by(prefix: &str, name: &str) -> bool {
        Self::parse(prefix, name).is_some()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// A store is stale once a different version becomes current.
    pub fn is_stale(&self, current_version: &str) -> bool {
        self.version != current_version
    }

    /// Select the names stale for `current_version` among `names`.
    ///
    /// Names outside this prefix's naming convention are never returned.
    pub fn stale_names<'a>(prefix: &str, current_version: &str, names: &'a [String]) -> Vec<&'a str> {
        names
            .iter()
            .filter(|name| Self::parse(prefix, name).is_some_and(|parsed| parsed.is_stale(current_version)))
            .map(String::as_str)
            .collect()
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Some(role) => write!(f, "{}-{}-{}", self.prefix, role, self.version),
            None => write!(f, "{}-{}", self.prefix, self.version),
        }
    }
}
