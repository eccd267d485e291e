//! Synthesis of definitions for classes that were never registered.

use diwire_core::{Error, Result, Token};

use crate::catalog::{Class, Parameter, ParameterKind};
use crate::definition::Definition;
use crate::metadata::MetadataCache;

/// [`Inspector`] derives the argument tokens of a class from its declared parameters.
///
/// Results are read from and written to the [`MetadataCache`], so a class is inspected at most
/// once per cache lifetime. Inspection covers a single level: dependencies are referenced by
/// class identity and synthesized when the container resolves them.
#[derive(Debug, Clone, Default)]
pub struct Inspector {
    cache: MetadataCache,
}

impl Inspector {
    pub const fn new(cache: MetadataCache) -> Self {
        Self { cache }
    }

    #[inline]
    pub const fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Builds the definition of `class`, keyed by its identity.
    ///
    /// # Errors
    ///
    /// See [`arguments_for`](Self::arguments_for).
    pub fn synthesize(&self, class: &Class) -> Result<Definition> {
        let arguments = self.arguments_for(class)?;
        debug!(class = class.name(), "synthesized definition");
        Ok(Definition::synthesized(class.name(), arguments))
    }

    /// Returns the argument tokens that wire every declared parameter of `class`.
    ///
    /// Dependencies become references to their class identity, and scalar parameters become
    /// their default value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `class` is an interface, or [`Error::AutoResolution`] if a
    /// scalar parameter has no default value.
    pub fn arguments_for(&self, class: &Class) -> Result<Vec<Token>> {
        if let Some(arguments) = self.cache.load(class.name()) {
            return Ok(arguments);
        }

        let parameters = class
            .parameters()
            .ok_or_else(|| Error::not_found(class.name()))?;
        let arguments = wire(class, &parameters)?;

        self.cache.store(class.name(), &arguments);
        Ok(arguments)
    }

    /// Returns the argument tokens of the first `count` declared parameters of `class`.
    ///
    /// Used when the remaining parameters are supplied by the caller. Partial lists are never
    /// written to the cache.
    ///
    /// # Errors
    ///
    /// See [`arguments_for`](Self::arguments_for). Parameters past `count` are not inspected.
    pub fn leading_arguments(&self, class: &Class, count: usize) -> Result<Vec<Token>> {
        if let Some(mut arguments) = self.cache.load(class.name()) {
            arguments.truncate(count);
            return Ok(arguments);
        }

        let parameters = class
            .parameters()
            .ok_or_else(|| Error::not_found(class.name()))?;
        wire(class, &parameters[..count.min(parameters.len())])
    }
}

fn wire(class: &Class, parameters: &[Parameter]) -> Result<Vec<Token>> {
    parameters
        .iter()
        .enumerate()
        .map(|(index, parameter)| match (parameter.kind(), parameter.default()) {
            (ParameterKind::Dependency(id), _) => Ok(Token::reference(id.as_ref())),
            (ParameterKind::Scalar, Some(default)) => Ok(Token::Literal(default.clone())),
            (ParameterKind::Scalar, None) => Err(Error::AutoResolution {
                class: class.name().to_owned(),
                parameter: parameter.name().to_owned(),
                index,
            }),
        })
        .collect()
}
