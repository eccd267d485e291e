use std::any::type_name;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::{Arc, PoisonError, RwLock};

use diwire_core::config::{ContainerConfig, DefinitionConfig, Settings};
use diwire_core::{
    ArgumentError, Arguments, CacheStore, Error, Instance, Result, Token, Value,
};

use crate::catalog::{Catalog, Class, Injectable};
use crate::chain::Chain;
use crate::definition::{Definition, DefinitionBuilder, Target};
use crate::inspector::Inspector;
use crate::metadata::MetadataCache;
use crate::resolver::ArgumentResolver;

/// A container of definitions that builds instances on request.
///
/// Keys that are not registered fall back to the class declared under the same identity, whose
/// constructor dependencies are wired from its declared parameters.
///
/// # Example
///
/// ```
/// use diwire::{Arguments, Container, Injectable, Parameter, Result, Token};
///
/// #[derive(Clone)]
/// struct Address(String);
///
/// #[derive(Clone)]
/// struct Database {
///     address: Address,
///     pool_size: u32,
/// }
///
/// impl Injectable for Database {
///     fn parameters() -> Vec<Parameter> {
///         vec![
///             Parameter::dependency("address", "address"),
///             Parameter::scalar("pool_size").with_default(4),
///         ]
///     }
///
///     fn construct(args: &mut Arguments) -> Result<Self> {
///         Ok(Self {
///             address: args.component(0)?,
///             pool_size: args.take(1)?,
///         })
///     }
/// }
///
/// # fn main() -> Result<()> {
/// let mut container = Container::builder().with_class::<Database>().build();
/// container.add_instance("address", Address("localhost:5432".to_owned()));
///
/// let db = container.resolve::<Database>("Database")?;
/// assert_eq!(db.address.0, "localhost:5432");
/// assert_eq!(db.pool_size, 4);
///
/// // Registered arguments take precedence over the declared parameters.
/// container
///     .add("Database")
///     .with_arguments([Token::reference("address"), Token::literal(16)]);
/// assert_eq!(container.resolve::<Database>("Database")?.pool_size, 16);
/// # Ok(())
/// # }
/// ```
pub struct Container {
    definitions: HashMap<String, Definition>,
    catalog: Catalog,
    inspector: Inspector,
    shared: RwLock<HashMap<String, Instance>>,
    max_depth: usize,
}

/// A builder for [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    catalog: Catalog,
    store: Option<Arc<dyn CacheStore>>,
    settings: Settings,
    definitions: Vec<(String, DefinitionConfig)>,
}

impl ContainerBuilder {
    /// Declares `T` as a class of the container.
    #[must_use]
    pub fn with_class<T>(mut self) -> Self
    where
        T: Injectable,
    {
        self.catalog.declare::<T>();
        self
    }

    /// Declares an interface, which can only be resolved through a definition.
    #[must_use]
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.catalog.declare_interface(name);
        self
    }

    /// Replaces the class catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Persists inspected metadata in `store`.
    #[must_use]
    pub fn with_store<S>(self, store: S) -> Self
    where
        S: CacheStore + 'static,
    {
        self.with_shared_store(Arc::new(store))
    }

    /// Persists inspected metadata in a store shared with other owners.
    #[must_use]
    pub fn with_shared_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the maximum number of nested dependencies of a single request.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.settings.max_depth = max_depth;
        self
    }

    /// Applies the settings of `config` and queues its definitions.
    #[must_use]
    pub fn with_config(self, config: ContainerConfig) -> Self {
        let ContainerConfig {
            container,
            definitions,
        } = config;
        self.with_settings(container).with_definitions(definitions)
    }

    /// Queues configured definitions, registered in order when the container is built.
    #[must_use]
    pub fn with_definitions<I, K>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = (K, DefinitionConfig)>,
        K: Into<String>,
    {
        self.definitions.extend(
            definitions
                .into_iter()
                .map(|(key, config)| (key.into(), config)),
        );
        self
    }

    /// Finalizes the building process and returns the built container.
    #[must_use]
    pub fn build(self) -> Container {
        let Self {
            catalog,
            store,
            settings,
            definitions,
        } = self;

        let cache = store.map_or_else(MetadataCache::disabled, MetadataCache::new);
        let cache = cache
            .with_prefix(settings.cache_prefix.as_str())
            .with_ttl(settings.cache_ttl());

        let mut container = Container {
            definitions: HashMap::new(),
            catalog,
            inspector: Inspector::new(cache),
            shared: RwLock::default(),
            max_depth: settings.max_depth,
        };
        for (key, config) in definitions {
            container.add_config(key, config);
        }
        container
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Container {
    /// Creates an empty container without a metadata store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new builder for `Container`.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    #[inline]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub const fn inspector(&self) -> &Inspector {
        &self.inspector
    }

    #[inline]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Declares `T` as a class of the container.
    pub fn declare<T>(&mut self) -> Option<Class>
    where
        T: Injectable,
    {
        self.catalog.declare::<T>()
    }

    /// Declares an interface, which can only be resolved through a definition.
    pub fn declare_interface(&mut self, name: impl Into<String>) -> Option<Class> {
        self.catalog.declare_interface(name)
    }

    /// Registers `key` as a class of the same identity.
    pub fn add(&mut self, key: impl Into<String>) -> DefinitionBuilder<'_> {
        let key = key.into();
        let target = Target::Class(key.clone());
        self.insert(Definition::new(key, target))
    }

    /// Registers `key` to be produced by `target`.
    pub fn add_with(
        &mut self,
        key: impl Into<String>,
        target: impl Into<Target>,
    ) -> DefinitionBuilder<'_> {
        self.insert(Definition::new(key, target))
    }

    /// Registers `key` to be produced by calling `factory`, once per request.
    pub fn add_factory<F, T>(&mut self, key: impl Into<String>, factory: F) -> DefinitionBuilder<'_>
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
    {
        self.add_with(key, Target::factory(factory))
    }

    /// Registers `key` to be produced by calling a fallible `factory`, once per request.
    pub fn add_try_factory<F, T, E>(
        &mut self,
        key: impl Into<String>,
        factory: F,
    ) -> DefinitionBuilder<'_>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        self.add_with(key, Target::try_factory(factory))
    }

    /// Registers `key` to be produced by cloning `value`.
    pub fn add_instance<T>(&mut self, key: impl Into<String>, value: T) -> DefinitionBuilder<'_>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.add_with(key, Target::instance(value))
    }

    /// Registers `key` as a shared definition: the first instance built is reused afterwards.
    pub fn share(
        &mut self,
        key: impl Into<String>,
        target: impl Into<Target>,
    ) -> DefinitionBuilder<'_> {
        self.add_with(key, target).shared()
    }

    /// Registers a configured definition.
    pub fn add_config(
        &mut self,
        key: impl Into<String>,
        config: DefinitionConfig,
    ) -> DefinitionBuilder<'_> {
        let key = key.into();
        let parts = config.into_parts(&key);

        let mut builder = self
            .add_with(key, parts.class)
            .with_arguments(parts.arguments);
        for (name, tokens) in parts.method_calls {
            builder = builder.with_method_call(name, tokens);
        }
        if parts.shared {
            builder = builder.shared();
        }
        builder
    }

    /// Reopens the definition registered under `key`.
    ///
    /// Any instance kept for a shared definition is discarded.
    pub fn extend(&mut self, key: &str) -> Option<DefinitionBuilder<'_>> {
        self.shared_slots().remove(key);
        self.definitions.get_mut(key).map(DefinitionBuilder::new)
    }

    fn insert(&mut self, definition: Definition) -> DefinitionBuilder<'_> {
        trace!(key = definition.key(), "registering definition");
        self.shared_slots().remove(definition.key());
        let slot = self
            .definitions
            .entry(definition.key().to_owned())
            .insert_entry(definition)
            .into_mut();
        DefinitionBuilder::new(slot)
    }

    fn shared_slots(&mut self) -> &mut HashMap<String, Instance> {
        self.shared
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if `key` is registered.
    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.definitions.contains_key(key)
    }

    /// Returns `true` if `key` is registered or names a constructible class.
    pub fn can_resolve(&self, key: &str) -> bool {
        self.has(key) || self.catalog.constructible(key).is_some()
    }

    /// Returns the definition registered under `key`.
    #[inline]
    pub fn definition(&self, key: &str) -> Option<&Definition> {
        self.definitions.get(key)
    }

    /// Builds the instance of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `key` cannot be resolved, [`Error::Cycle`] or
    /// [`Error::DepthExceeded`] if the dependencies of `key` loop or nest too deeply, and
    /// [`Error::Resolution`] if a constructor, factory or method call fails.
    pub fn get(&self, key: &str) -> Result<Instance> {
        self.get_with(key, Vec::<Value>::new())
    }

    /// Builds the instance of `key`, passing `extra` after its argument tokens.
    ///
    /// Extra arguments fill the positions after the definition's tokens. When there are more
    /// arguments than the class declares parameters, the extra ones replace trailing tokens,
    /// which are then never resolved.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn get_with<I>(&self, key: &str, extra: I) -> Result<Instance>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut chain = Chain::new(self.max_depth);
        self.build(key, extra.into_iter().map(Into::into).collect(), &mut chain)
    }

    /// Builds the instance of `key` and downcasts it into `T`.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get). A type mismatch is reported as [`Error::Resolution`].
    pub fn resolve<T>(&self, key: &str) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get(key)?.downcast::<T>().map_err(|instance| {
            Error::resolution(
                key,
                ArgumentError::Mismatch {
                    expected: type_name::<T>(),
                    found: format!("instance of `{}`", instance.type_name()),
                },
            )
        })
    }

    pub(crate) fn build(&self, key: &str, extra: Vec<Value>, chain: &mut Chain) -> Result<Instance> {
        chain.enter(key)?;
        let result = self.build_entered(key, extra, chain);
        chain.leave();
        result
    }

    fn build_entered(&self, key: &str, extra: Vec<Value>, chain: &mut Chain) -> Result<Instance> {
        let synthesized;
        let definition = match self.definitions.get(key) {
            Some(definition) => definition,
            None => {
                let class = self
                    .catalog
                    .constructible(key)
                    .ok_or_else(|| Error::not_found(key))?;
                synthesized = if extra.is_empty() {
                    self.inspector.synthesize(class)?
                } else {
                    Definition::synthesized(class.name(), self.wire(class, extra.len())?)
                };
                &synthesized
            }
        };

        if definition.is_shared() {
            let slots = self.shared.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(instance) = slots.get(key) {
                trace!(key, "reusing shared instance");
                return Ok(instance.clone());
            }
        }

        let instance = match definition.target() {
            Target::Factory(factory) => {
                debug!(key, "invoking factory");
                factory().map_err(|err| err.attribute_to(key))?
            }
            Target::Instance(instance) => instance.clone(),
            Target::Class(class) => self.construct(definition, class, extra, chain)?,
        };

        if !definition.is_shared() {
            return Ok(instance);
        }
        let mut slots = self.shared.write().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.entry(key.to_owned()).or_insert(instance).clone())
    }

    fn construct(
        &self,
        definition: &Definition,
        class: &str,
        extra: Vec<Value>,
        chain: &mut Chain,
    ) -> Result<Instance> {
        let key = definition.key();
        let class = self
            .catalog
            .constructible(class)
            .ok_or_else(|| Error::not_found(class))?;

        let wired;
        let tokens = if definition.arguments().is_empty() && !definition.is_synthesized() {
            wired = self.wire(class, extra.len())?;
            wired.as_slice()
        } else {
            definition.arguments()
        };

        let keep = kept_tokens(class, tokens.len(), extra.len());
        let mut resolver = ArgumentResolver::new(self, chain);
        let mut values = resolver.resolve_all(&tokens[..keep])?;
        values.extend(extra);

        let mut args = Arguments::new(key, values);
        let mut instance = class
            .construct(&mut args)
            .map_err(|err| err.attribute_to(key))?;
        args.finish()?;

        for call in definition.method_calls() {
            let name = call.name();
            let invoke = call
                .invoke()
                .or_else(|| class.method(name))
                .ok_or_else(|| {
                    Error::resolution(key, ArgumentError::UnknownMethod(name.to_owned()))
                        .in_method(name)
                })?;

            let values = resolver.resolve_all(call.arguments())?;
            let mut args = Arguments::new(key, values).for_method(name);
            invoke(&mut instance, &mut args)
                .map_err(|err| err.attribute_to(key).in_method(name))?;
            args.finish()?;
        }

        Ok(instance)
    }

    /// Wires the declared parameters of `class` that `extra` extra arguments leave uncovered.
    fn wire(&self, class: &Class, extra: usize) -> Result<Vec<Token>> {
        if extra == 0 {
            return self.inspector.arguments_for(class);
        }
        let declared = class.parameters().map_or(0, |params| params.len());
        self.inspector
            .leading_arguments(class, declared.saturating_sub(extra))
    }
}

/// Returns how many leading tokens survive the merge with `extra` extra arguments.
fn kept_tokens(class: &Class, tokens: usize, extra: usize) -> usize {
    if extra == 0 {
        return tokens;
    }
    let arity = class
        .parameters()
        .map(|params| params.len())
        .filter(|&len| len > 0)
        .unwrap_or(tokens + extra);
    tokens.min(arity.saturating_sub(extra))
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.definitions.len())
            .field("classes", &self.catalog.len())
            .field("cache", self.inspector.cache())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl From<ContainerConfig> for Container {
    fn from(config: ContainerConfig) -> Self {
        Self::builder().with_config(config).build()
    }
}
