//! Argument tokens and the values they resolve to.

use serde::{Deserialize, Serialize};

use crate::instance::Instance;

/// A plain literal value, passed to constructors and methods as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
}

impl Literal {
    /// Returns a short, human readable name of the kind of this literal.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! impl_literal_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Literal {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_literal_from!(
    bool => Bool,
    i64 => Integer,
    i32 => Integer,
    u32 => Integer,
    u16 => Integer,
    u8 => Integer,
    f64 => Float,
    f32 => Float,
    String => String,
    &str => String,
    Vec<Literal> => List,
);

impl From<()> for Literal {
    fn from((): ()) -> Self {
        Self::Null
    }
}

/// A concrete, positional argument: either a literal or an instance built by the container.
#[derive(Debug, Clone)]
pub enum Value {
    Literal(Literal),
    Instance(Instance),
}

impl Value {
    /// Describes the value for diagnostics: the literal kind, or the instance type name.
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(literal) => literal.kind().to_owned(),
            Self::Instance(instance) => format!("instance of `{}`", instance.type_name()),
        }
    }

    pub const fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            Self::Instance(_) => None,
        }
    }

    pub const fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            Self::Literal(_) => None,
        }
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl<T> From<T> for Value
where
    T: Into<Literal>,
{
    fn from(value: T) -> Self {
        Self::Literal(value.into())
    }
}

/// A single positional input of a constructor or method call, as registered.
///
/// Literal and reference tokens are explicit. A bare string is kept as [`Token::Auto`] and is
/// disambiguated when it gets resolved: it refers to a dependency when the container can resolve
/// a key of that name, and is passed as a literal string otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    Literal(Literal),
    Reference(String),
    Auto(String),
}

impl Token {
    /// Creates a token that is always passed through literally.
    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a token that always refers to another key.
    pub fn reference(key: impl Into<String>) -> Self {
        Self::Reference(key.into())
    }

    /// Returns the key this token may refer to.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Reference(key) | Self::Auto(key) => Some(key.as_str()),
            Self::Literal(_) => None,
        }
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::Auto(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self::Auto(value)
    }
}

impl From<Literal> for Token {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

macro_rules! impl_token_from_literal {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Token {
                fn from(value: $ty) -> Self {
                    Self::Literal(value.into())
                }
            }
        )*
    };
}

impl_token_from_literal!(bool, i64, i32, u32, u16, u8, f64, f32, Vec<Literal>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_deserialize_untagged() {
        let got: Vec<Literal> = serde_json::from_str(r#"[null, true, 7, 1.5, "x", [1, "y"]]"#).unwrap();
        assert_eq!(
            got,
            vec![
                Literal::Null,
                Literal::Bool(true),
                Literal::Integer(7),
                Literal::Float(1.5),
                Literal::String("x".into()),
                Literal::List(vec![Literal::Integer(1), Literal::String("y".into())]),
            ]
        );
    }

    #[test]
    fn test_token_from() {
        assert_eq!(Token::from("Bar"), Token::Auto("Bar".into()));
        assert_eq!(Token::from(8080), Token::Literal(Literal::Integer(8080)));
        assert_eq!(Token::literal("Bar"), Token::Literal(Literal::String("Bar".into())));
        assert_eq!(Token::reference("Bar").key(), Some("Bar"));
        assert_eq!(Token::literal(1).key(), None);
    }

    #[test]
    fn test_token_serde_is_tagged() {
        let tokens = vec![Token::reference("Bar"), Token::literal(3)];
        let json = serde_json::to_string(&tokens).unwrap();
        assert_eq!(json, r#"[{"reference":"Bar"},{"literal":3}]"#);
        let back: Vec<Token> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tokens);
    }

    #[test]
    fn test_value_describe() {
        assert_eq!(Value::from(3).describe(), "integer");
        assert_eq!(
            Value::from(Instance::new(1_u8)).describe(),
            "instance of `u8`"
        );
    }
}
