//! Definitions: stored recipes for producing one named entity.

use std::error::Error as StdError;
use std::sync::Arc;

use diwire_core::{Arguments, Error, Instance, Result, Token};

use crate::catalog::{MethodFn, erase_method};

pub(crate) type FactoryFn = Arc<dyn Fn() -> Result<Instance> + Send + Sync>;

/// What a definition produces.
#[derive(Clone)]
pub enum Target {
    /// Construct the class declared under this identity.
    Class(String),
    /// Call a zero-argument function, which owns the whole construction.
    Factory(FactoryFn),
    /// Hand out a clone of a prebuilt value.
    Instance(Instance),
}

impl Target {
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// Creates a factory target from an infallible function.
    pub fn factory<F, T>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(move || Ok(Instance::new(factory()))))
    }

    /// Creates a factory target from a fallible function.
    ///
    /// Errors returned by the function are reported as resolution failures of the key.
    pub fn try_factory<F, T, E>(factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Factory(Arc::new(move || {
            factory().map(Instance::new).map_err(Error::other)
        }))
    }

    pub fn instance<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::Instance(Instance::new(value))
    }

    /// Returns the class identity of a class target.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name.as_str()),
            Self::Factory(_) | Self::Instance(_) => None,
        }
    }

    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::Class(name.to_owned())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Self::Class(name)
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Class(name) => f.debug_tuple("Class").field(name).finish(),
            Self::Factory(_) => f.debug_tuple("Factory").finish_non_exhaustive(),
            Self::Instance(instance) => f.debug_tuple("Instance").field(instance).finish(),
        }
    }
}

/// A call applied to a freshly constructed instance.
#[derive(Clone)]
pub struct MethodCall {
    name: String,
    arguments: Vec<Token>,
    // Calls without a closure are dispatched by name through the class's method table.
    invoke: Option<MethodFn>,
}

impl MethodCall {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arguments(&self) -> &[Token] {
        &self.arguments
    }

    /// Returns `true` if the call is a closure captured at registration time.
    #[inline]
    pub const fn is_closure(&self) -> bool {
        self.invoke.is_some()
    }

    pub(crate) const fn invoke(&self) -> Option<&MethodFn> {
        self.invoke.as_ref()
    }
}

impl std::fmt::Debug for MethodCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodCall")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("closure", &self.is_closure())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Registered,
    Synthesized,
}

/// [`Definition`] describes how to produce the entity registered under a key.
#[derive(Debug, Clone)]
pub struct Definition {
    key: String,
    target: Target,
    arguments: Vec<Token>,
    method_calls: Vec<MethodCall>,
    shared: bool,
    origin: Origin,
}

impl Definition {
    /// Creates a definition with no arguments and no method calls.
    pub fn new(key: impl Into<String>, target: impl Into<Target>) -> Self {
        Self {
            key: key.into(),
            target: target.into(),
            arguments: Vec::new(),
            method_calls: Vec::new(),
            shared: false,
            origin: Origin::Registered,
        }
    }

    /// Creates the definition of an unregistered class from its inspected arguments.
    pub(crate) fn synthesized(class: &str, arguments: Vec<Token>) -> Self {
        Self {
            arguments,
            origin: Origin::Synthesized,
            ..Self::new(class, class)
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    #[inline]
    pub fn arguments(&self) -> &[Token] {
        &self.arguments
    }

    #[inline]
    pub fn method_calls(&self) -> &[MethodCall] {
        &self.method_calls
    }

    #[inline]
    pub const fn is_shared(&self) -> bool {
        self.shared
    }

    /// Returns `true` if the definition was synthesized from a class declaration rather than
    /// registered.
    #[inline]
    pub fn is_synthesized(&self) -> bool {
        self.origin == Origin::Synthesized
    }
}

/// A builder handle to a registered [`Definition`].
///
/// Factory and instance targets own their whole construction, so arguments and method calls
/// attached to them are dropped.
#[derive(Debug)]
pub struct DefinitionBuilder<'a> {
    definition: &'a mut Definition,
}

impl<'a> DefinitionBuilder<'a> {
    pub(crate) const fn new(definition: &'a mut Definition) -> Self {
        Self { definition }
    }

    /// Appends a constructor argument.
    pub fn with_argument(self, token: impl Into<Token>) -> Self {
        if self.accepts("argument") {
            self.definition.arguments.push(token.into());
        }
        self
    }

    /// Appends several constructor arguments, in order.
    pub fn with_arguments<I>(self, tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        if self.accepts("argument") {
            self.definition
                .arguments
                .extend(tokens.into_iter().map(Into::into));
        }
        self
    }

    /// Appends a call to the method `name`, dispatched through the class's method table.
    pub fn with_method_call<I>(self, name: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        self.push_call(name.into(), tokens, None)
    }

    /// Appends a call to a closure, bound to the concrete type `T` of the instance.
    pub fn with_call<T, F, I>(self, name: impl Into<String>, f: F, tokens: I) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&mut T, &mut Arguments) -> Result<()> + Send + Sync + 'static,
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        self.push_call(name.into(), tokens, Some(erase_method(f)))
    }

    /// Keeps the first instance built from this definition and hands it out for later requests.
    pub fn shared(self) -> Self {
        self.definition.shared = true;
        self
    }

    /// Returns the definition being built.
    #[inline]
    pub fn definition(&self) -> &Definition {
        self.definition
    }

    fn push_call<I>(self, name: String, tokens: I, invoke: Option<MethodFn>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        if self.accepts("method call") {
            self.definition.method_calls.push(MethodCall {
                name,
                arguments: tokens.into_iter().map(Into::into).collect(),
                invoke,
            });
        }
        self
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn accepts(&self, what: &str) -> bool {
        let accepts = self.definition.target.is_class();
        if !accepts {
            warn!(
                key = %self.definition.key,
                "ignoring {what} attached to a factory or instance target"
            );
        }
        accepts
    }
}
