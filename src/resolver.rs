use diwire_core::{Literal, Result, Token, Value};

use crate::chain::Chain;
use crate::container::Container;

/// Turns argument tokens into concrete values within one resolution chain.
pub(crate) struct ArgumentResolver<'c, 'r> {
    container: &'c Container,
    chain: &'r mut Chain,
}

impl<'c, 'r> ArgumentResolver<'c, 'r> {
    pub(crate) const fn new(container: &'c Container, chain: &'r mut Chain) -> Self {
        Self { container, chain }
    }

    /// Resolves a single token.
    ///
    /// A bare string is a dependency when the container can resolve it, and a literal string
    /// otherwise.
    pub(crate) fn resolve(&mut self, token: &Token) -> Result<Value> {
        match token {
            Token::Literal(literal) => Ok(Value::Literal(literal.clone())),
            Token::Reference(key) => self.nested(key),
            Token::Auto(s) if self.container.can_resolve(s) => self.nested(s),
            Token::Auto(s) => Ok(Value::Literal(Literal::String(s.clone()))),
        }
    }

    /// Resolves tokens in order, stopping at the first failure.
    pub(crate) fn resolve_all(&mut self, tokens: &[Token]) -> Result<Vec<Value>> {
        tokens.iter().map(|token| self.resolve(token)).collect()
    }

    fn nested(&mut self, key: &str) -> Result<Value> {
        self.container
            .build(key, Vec::new(), self.chain)
            .map(Value::Instance)
    }
}

#[cfg(test)]
mod tests {
    use diwire_core::{Arguments, Instance};

    use super::*;
    use crate::catalog::Injectable;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Clock;

    impl Injectable for Clock {
        fn construct(_args: &mut Arguments) -> Result<Self> {
            Ok(Self)
        }
    }

    fn resolve(container: &Container, token: &Token) -> Result<Value> {
        let mut chain = Chain::new(8);
        ArgumentResolver::new(container, &mut chain).resolve(token)
    }

    #[test]
    fn test_literal_is_unchanged() {
        let container = Container::new();
        let value = resolve(&container, &Token::literal(7)).unwrap();
        assert_eq!(value.as_literal(), Some(&Literal::Integer(7)));
    }

    #[test]
    fn test_auto_string() {
        let mut container = Container::new();
        container.declare::<Clock>();
        container.add_instance("name", "svc".to_owned());

        let value = resolve(&container, &Token::from("Clock")).unwrap();
        assert!(value.as_instance().is_some_and(Instance::is::<Clock>));

        let value = resolve(&container, &Token::from("name")).unwrap();
        assert!(value.as_instance().is_some_and(Instance::is::<String>));

        let value = resolve(&container, &Token::from("plain text")).unwrap();
        assert_eq!(value.as_literal(), Some(&Literal::from("plain text")));
    }

    #[test]
    fn test_explicit_tokens() {
        let mut container = Container::new();
        container.declare::<Clock>();

        let value = resolve(&container, &Token::literal("Clock")).unwrap();
        assert_eq!(value.as_literal(), Some(&Literal::from("Clock")));

        let err = resolve(&container, &Token::reference("missing")).unwrap_err();
        assert!(err.is_not_found_for("missing"));
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let mut container = Container::new();
        container.declare::<Clock>();

        let mut chain = Chain::new(8);
        let values = ArgumentResolver::new(&container, &mut chain)
            .resolve_all(&[Token::literal(1), Token::from("Clock"), Token::literal(true)])
            .unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].as_literal(), Some(&Literal::Integer(1)));
        assert!(values[1].as_instance().is_some());
        assert_eq!(values[2].as_literal(), Some(&Literal::Bool(true)));
        assert_eq!(chain.depth(), 0);
    }
}
