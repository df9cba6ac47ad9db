//! Manager configuration.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Driver name of the built-in in-memory store.
pub const MEMORY_DRIVER: &str = "memory";

/// Configuration for constructing an [`crate::EntityManager`].
///
/// Can be built in code or loaded from JSON:
///
/// ```rust
/// use rowmap_core::ManagerConfig;
///
/// let config = ManagerConfig::from_json_str(
///     r#"{ "proxies_path": "/tmp", "entity_namespace": "app" }"#,
/// )
/// .unwrap();
/// assert_eq!(config.entity_namespace.as_deref(), Some("app"));
/// assert_eq!(config.database.driver, "memory");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Storage settings.
    pub database: DatabaseConfig,

    /// Directory where generated proxies live. Must exist.
    pub proxies_path: Option<PathBuf>,

    /// Prefix joined to entity type names with `::`.
    pub entity_namespace: Option<String>,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection driver. Only [`MEMORY_DRIVER`] can be opened from
    /// configuration; other connections are passed in directly.
    pub driver: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: MEMORY_DRIVER.to_owned(),
        }
    }
}

impl ManagerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the proxies directory.
    #[must_use]
    pub fn proxies_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proxies_path = Some(path.into());
        self
    }

    /// Sets the entity namespace.
    #[must_use]
    pub fn entity_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.entity_namespace = Some(namespace.into());
        self
    }

    /// Sets the storage driver.
    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.database.driver = driver.into();
        self
    }

    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the document is malformed.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::configuration(format!("invalid configuration: {e}")))
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the file cannot be read or is
    /// malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CoreError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Checks the configuration and returns the proxies directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the proxies path is missing or
    /// is not an existing directory, or the namespace is empty.
    pub fn validate(&self) -> CoreResult<&Path> {
        let path = self
            .proxies_path
            .as_deref()
            .ok_or_else(|| CoreError::configuration("proxies path is not set"))?;
        if !path.is_dir() {
            return Err(CoreError::configuration(format!(
                "proxies path {} is not an existing directory",
                path.display()
            )));
        }
        if matches!(self.entity_namespace.as_deref(), Some("")) {
            return Err(CoreError::configuration("entity namespace is empty"));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ManagerConfig::new();
        assert_eq!(config.database.driver, MEMORY_DRIVER);
        assert!(config.proxies_path.is_none());
        assert!(config.entity_namespace.is_none());
    }

    #[test]
    fn validate_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = ManagerConfig::new().proxies_path(dir.path());
        assert_eq!(config.validate().unwrap(), dir.path());

        let missing = ManagerConfig::new().proxies_path(dir.path().join("nope"));
        assert!(matches!(
            missing.validate(),
            Err(CoreError::Configuration { .. })
        ));
        assert!(matches!(
            ManagerConfig::new().validate(),
            Err(CoreError::Configuration { .. })
        ));
    }

    #[test]
    fn validate_rejects_plain_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = ManagerConfig::new().proxies_path(file.path());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let config = ManagerConfig::new()
            .proxies_path(dir.path())
            .entity_namespace("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let config = ManagerConfig::new()
            .proxies_path("/var/proxies")
            .entity_namespace("app")
            .driver("memory");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ManagerConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn json_rejects_unknown_keys() {
        let err = ManagerConfig::from_json_str(r#"{ "proxy_dir": "/tmp" }"#).unwrap_err();
        assert!(matches!(err, CoreError::Configuration { .. }));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "database": {{ "driver": "memory" }}, "proxies_path": "/tmp" }}"#).unwrap();
        let config = ManagerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.proxies_path.as_deref(), Some(Path::new("/tmp")));

        assert!(ManagerConfig::from_json_file("/definitely/not/here.json").is_err());
    }
}
