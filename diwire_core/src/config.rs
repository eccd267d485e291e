//! Configuration data model.
//!
//! These types describe definitions and container settings as plain data, so they can be
//! deserialized from any `serde` format. A configuration looks like this in TOML:
//!
//! ```toml
//! [container]
//! max_depth = 32
//! cache_ttl_secs = 3600
//!
//! [definitions]
//! logger = "FileLogger"
//!
//! [definitions.database]
//! class = "Database"
//! arguments = ["config", 5432, { ref = "pool" }, { value = "logger" }]
//! shared = true
//!
//! [definitions.database.methods]
//! set_logger = ["logger"]
//! ```

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::{Literal, Token};

/// Settings of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Maximum number of nested dependencies a single resolution may go through.
    pub max_depth: usize,
    /// Prefix prepended to every key written to the metadata cache store.
    pub cache_prefix: String,
    /// Lifetime of metadata cache entries, in seconds. Entries never expire when unset.
    pub cache_ttl_secs: Option<u64>,
}

impl Settings {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    /// Returns the lifetime of metadata cache entries.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            cache_prefix: "diwire".to_owned(),
            cache_ttl_secs: None,
        }
    }
}

/// A whole configuration document: container settings and definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    pub container: Settings,
    pub definitions: IndexMap<String, DefinitionConfig>,
}

/// The configured form of a single definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinitionConfig {
    /// A bare class identity.
    Target(String),
    /// A class identity with arguments and method calls.
    Record(RecordConfig),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordConfig {
    /// Class identity; defaults to the definition key.
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentConfig>,
    #[serde(default)]
    pub methods: MethodsConfig,
    #[serde(default)]
    pub shared: bool,
}

/// A configured argument token.
///
/// Bare strings are disambiguated at resolution time. `{ ref = "key" }` always refers to
/// another key, `{ value = ... }` is always passed as a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentConfig {
    Literal(Literal),
    Reference {
        #[serde(rename = "ref")]
        reference: String,
    },
    Value {
        value: Literal,
    },
}

/// Configured method calls, in call order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodsConfig {
    /// Method name to arguments. Each method can appear only once.
    Map(IndexMap<String, Vec<ArgumentConfig>>),
    /// A list of calls, which may name the same method several times.
    List(Vec<MethodCallConfig>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodCallConfig {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentConfig>,
}

impl Default for MethodsConfig {
    fn default() -> Self {
        Self::Map(IndexMap::new())
    }
}

impl From<ArgumentConfig> for Token {
    fn from(config: ArgumentConfig) -> Self {
        match config {
            ArgumentConfig::Reference { reference } => Self::Reference(reference),
            ArgumentConfig::Value { value } => Self::Literal(value),
            ArgumentConfig::Literal(Literal::String(s)) => Self::Auto(s),
            ArgumentConfig::Literal(literal) => Self::Literal(literal),
        }
    }
}

impl MethodsConfig {
    /// Returns the configured calls in order, with their arguments as tokens.
    pub fn into_calls(self) -> Vec<(String, Vec<Token>)> {
        fn tokens(arguments: Vec<ArgumentConfig>) -> Vec<Token> {
            arguments.into_iter().map(Token::from).collect()
        }

        match self {
            Self::Map(map) => map
                .into_iter()
                .map(|(name, arguments)| (name, tokens(arguments)))
                .collect(),
            Self::List(list) => list
                .into_iter()
                .map(|call| (call.name, tokens(call.arguments)))
                .collect(),
        }
    }
}

impl DefinitionConfig {
    /// Splits the configuration into the class identity, argument tokens, method calls and
    /// the shared flag. `key` is the class identity of records that do not name one.
    pub fn into_parts(self, key: &str) -> DefinitionParts {
        match self {
            Self::Target(class) => DefinitionParts {
                class,
                ..DefinitionParts::default()
            },
            Self::Record(record) => DefinitionParts {
                class: record.class.unwrap_or_else(|| key.to_owned()),
                arguments: record.arguments.into_iter().map(Token::from).collect(),
                method_calls: record.methods.into_calls(),
                shared: record.shared,
            },
        }
    }
}

/// A [`DefinitionConfig`] split into its parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionParts {
    pub class: String,
    pub arguments: Vec<Token>,
    pub method_calls: Vec<(String, Vec<Token>)>,
    pub shared: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_definitions() {
        let config: ContainerConfig = serde_json::from_str(
            r#"{
                "container": { "max_depth": 8 },
                "definitions": {
                    "logger": "FileLogger",
                    "db": {
                        "class": "Database",
                        "arguments": ["config", 5432, { "ref": "pool" }, { "value": "logger" }],
                        "methods": { "set_logger": ["logger"], "connect": [] }
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.container.max_depth, 8);
        assert_eq!(config.container.cache_prefix, "diwire");

        let mut definitions = config.definitions.into_iter();
        let (key, logger) = definitions.next().unwrap();
        assert_eq!(key, "logger");
        assert_eq!(logger.into_parts(&key).class, "FileLogger");

        let (key, db) = definitions.next().unwrap();
        let parts = db.into_parts(&key);
        assert_eq!(parts.class, "Database");
        assert_eq!(
            parts.arguments,
            vec![
                Token::Auto("config".into()),
                Token::literal(5432),
                Token::reference("pool"),
                Token::literal("logger"),
            ]
        );
        assert_eq!(
            parts.method_calls,
            vec![
                ("set_logger".to_owned(), vec![Token::Auto("logger".into())]),
                ("connect".to_owned(), vec![]),
            ]
        );
        assert!(!parts.shared);
    }

    #[test]
    fn test_record_defaults_class_to_key() {
        let config: DefinitionConfig =
            serde_json::from_str(r#"{ "arguments": [1], "shared": true }"#).unwrap();
        let parts = config.into_parts("Counter");
        assert_eq!(parts.class, "Counter");
        assert_eq!(parts.arguments, vec![Token::literal(1)]);
        assert!(parts.shared);
    }

    #[test]
    fn test_method_list_keeps_repeats() {
        let config: MethodsConfig = serde_json::from_str(
            r#"[{ "name": "push", "arguments": [1] }, { "name": "push", "arguments": [2] }]"#,
        )
        .unwrap();
        let calls = config.into_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], ("push".to_owned(), vec![Token::literal(2)]));
    }

    #[test]
    fn test_unknown_sections_are_rejected() {
        let err = serde_json::from_str::<ContainerConfig>(r#"{ "definition": { "x": "Foo" } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown field `definition`"));

        let config: ContainerConfig = serde_json::from_str("{}").unwrap();
        assert!(config.definitions.is_empty());
    }

    #[test]
    fn test_settings_cache_ttl() {
        let settings = Settings {
            cache_ttl_secs: Some(60),
            ..Settings::default()
        };
        assert_eq!(settings.cache_ttl(), Some(Duration::from_secs(60)));
        assert_eq!(Settings::default().cache_ttl(), None);
    }
}
