//! Loading of container configuration files.
//!
//! TOML support is behind the `toml` feature and JSON support behind the `json` feature.

use std::path::PathBuf;

#[cfg(any(feature = "toml", feature = "json"))]
use std::fs;
#[cfg(any(feature = "toml", feature = "json"))]
use std::path::Path;

#[cfg(any(feature = "toml", feature = "json"))]
use diwire_core::config::ContainerConfig;

/// [`LoadError`] is an error that can be raised while loading a configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("failed to read configuration file `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "toml")]
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "json")]
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(any(feature = "toml", feature = "json"))]
fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Parses a TOML configuration document.
///
/// # Errors
///
/// Returns [`LoadError::Toml`] if the document is not a valid configuration.
#[cfg(feature = "toml")]
pub fn from_toml_str(s: &str) -> Result<ContainerConfig, LoadError> {
    Ok(toml::from_str(s)?)
}

/// Reads and parses a TOML configuration file.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, and [`LoadError::Toml`] if it is not a
/// valid configuration.
#[cfg(feature = "toml")]
pub fn load_toml(path: impl AsRef<Path>) -> Result<ContainerConfig, LoadError> {
    from_toml_str(&read(path.as_ref())?)
}

/// Parses a JSON configuration document.
///
/// # Errors
///
/// Returns [`LoadError::Json`] if the document is not a valid configuration.
#[cfg(feature = "json")]
pub fn from_json_str(s: &str) -> Result<ContainerConfig, LoadError> {
    Ok(serde_json::from_str(s)?)
}

/// Reads and parses a JSON configuration file.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, and [`LoadError::Json`] if it is not a
/// valid configuration.
#[cfg(feature = "json")]
pub fn load_json(path: impl AsRef<Path>) -> Result<ContainerConfig, LoadError> {
    from_json_str(&read(path.as_ref())?)
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[cfg(feature = "toml")]
    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.toml");
        std::fs::write(
            &path,
            r#"
            [container]
            max_depth = 8

            [definitions]
            logger = "FileLogger"

            [definitions.db]
            class = "Database"
            arguments = ["logger", { ref = "pool" }]
            "#,
        )
        .unwrap();

        let config = load_toml(&path).unwrap();
        assert_eq!(config.container.max_depth, 8);
        assert_eq!(config.definitions.len(), 2);
        assert_eq!(config.definitions.get_index(1).unwrap().0, "db");
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_invalid_toml() {
        let err = from_toml_str("[container]\nunknown = 1").unwrap_err();
        assert!(matches!(err, LoadError::Toml(_)));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_from_json_str() {
        let config =
            from_json_str(r#"{ "definitions": { "clock": "SystemClock" } }"#).unwrap();
        assert_eq!(config.container.max_depth, 64);
        assert!(config.definitions.contains_key("clock"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_missing_file() {
        let err = load_json("/nonexistent/container.json").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
